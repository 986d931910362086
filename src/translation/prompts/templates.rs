/*!
 * Prompt templates for subtitle translation.
 *
 * Each template is a system prompt with placeholders plus a few worked
 * examples showing the numbered reply format the recovery parser expects
 * first.
 */

use std::collections::{BTreeMap, HashMap};

use crate::errors::TranslationError;
use crate::providers::{CompletionRequest, ExamplePair};
use crate::subtitle_processor::Cue;

/// Style used when none is configured
pub const DEFAULT_STYLE: &str = "standard";

const SYSTEM_PROMPT: &str = r#"You are an expert subtitle translator specializing in {source_language} to {target_language} translation.

## Your Role
- Translate every numbered subtitle into {target_language}
- Keep the meaning and tone of each line; subtitles have limited display time, so stay concise
- Follow the glossary strictly for names and key terms
- Context lines marked [before] or [after] are for understanding only; never translate them

## Style
{style_instructions}

## Output Requirements
- Reply with one entry per subtitle, numbered exactly like the input: `N. translated text`
- Keep the line breaks of each subtitle
- Do not repeat the timestamps and do not add notes or commentary"#;

const STANDARD_INSTRUCTIONS: &str =
    "Translate faithfully. Stay close to the original wording while remaining grammatical.";

const NATURAL_INSTRUCTIONS: &str = "Favor natural, idiomatic dialogue a native speaker would actually say, \
     even when the wording departs from the original.";

const FORMAL_INSTRUCTIONS: &str =
    "Use a formal register and polite forms of address throughout. Avoid slang and contractions.";

/// A named system prompt with its few-shot examples
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Style name used for lookup
    name: String,
    /// Style-specific guidance inserted into the system prompt
    instructions: String,
    /// Worked examples sent ahead of the request
    examples: Vec<ExamplePair>,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(name: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            instructions: instructions.to_string(),
            examples: Vec::new(),
        }
    }

    /// Attach few-shot examples.
    pub fn with_examples(mut self, examples: Vec<ExamplePair>) -> Self {
        self.examples = examples;
        self
    }

    /// Style name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Few-shot examples
    pub fn examples(&self) -> &[ExamplePair] {
        &self.examples
    }

    /// Render the system prompt with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        SYSTEM_PROMPT
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{style_instructions}", &self.instructions)
    }
}

/// The reply shape every built-in template demonstrates
fn format_examples() -> Vec<ExamplePair> {
    vec![ExamplePair::new(
        "Subtitles:\n\
         1. 00:00:01,000 --> 00:00:03,000\n\
         Where are you going?\n\n\
         2. 00:00:03,500 --> 00:00:06,000\n\
         - Home.\n\
         - Already?",
        "1. ¿Adónde vas?\n\
         2. - A casa.\n\
         - ¿Ya?",
    )]
}

/// Templates keyed by style name
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, PromptTemplate>,
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `standard`, `natural` and `formal` styles
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, instructions) in [
            (DEFAULT_STYLE, STANDARD_INSTRUCTIONS),
            ("natural", NATURAL_INSTRUCTIONS),
            ("formal", FORMAL_INSTRUCTIONS),
        ] {
            registry.register(PromptTemplate::new(name, instructions).with_examples(format_examples()));
        }
        registry
    }

    /// Add or replace a template
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Look a template up by style name
    pub fn get(&self, name: &str) -> Result<&PromptTemplate, TranslationError> {
        self.templates
            .get(name)
            .ok_or_else(|| TranslationError::UnknownTemplate(name.to_string()))
    }

    /// Registered style names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Builder for constructing translation prompts with context.
#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    template: &'a PromptTemplate,
    source_language: String,
    target_language: String,
    glossary: Option<&'a BTreeMap<String, String>>,
    context_before: &'a [Cue],
    context_after: &'a [Cue],
    lines: Vec<&'a Cue>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder.
    pub fn new(template: &'a PromptTemplate, source_language: &str, target_language: &str) -> Self {
        Self {
            template,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            glossary: None,
            context_before: &[],
            context_after: &[],
            lines: Vec::new(),
        }
    }

    /// Set the glossary for terminology consistency.
    pub fn with_glossary(mut self, glossary: &'a BTreeMap<String, String>) -> Self {
        self.glossary = Some(glossary);
        self
    }

    /// Set the surrounding context cues.
    pub fn with_context(mut self, before: &'a [Cue], after: &'a [Cue]) -> Self {
        self.context_before = before;
        self.context_after = after;
        self
    }

    /// Set the cues to translate.
    pub fn with_lines(mut self, lines: Vec<&'a Cue>) -> Self {
        self.lines = lines;
        self
    }

    /// Build the user prompt.
    pub fn build_user_prompt(&self) -> String {
        let mut sections = Vec::new();

        if let Some(glossary) = self.glossary.filter(|g| !g.is_empty()) {
            let terms: Vec<String> = glossary
                .iter()
                .map(|(term, translation)| format!("{} => {}", term, translation))
                .collect();
            sections.push(format!("Glossary:\n{}", terms.join("\n")));
        }

        let context: Vec<String> = self
            .context_before
            .iter()
            .map(|cue| ("[before]", cue))
            .chain(self.context_after.iter().map(|cue| ("[after]", cue)))
            .filter(|(_, cue)| !cue.text.trim().is_empty())
            .map(|(label, cue)| format!("{} {}", label, single_line(&cue.text)))
            .collect();
        if !context.is_empty() {
            sections.push(format!("Context (do not translate):\n{}", context.join("\n")));
        }

        let cues: Vec<String> = self
            .lines
            .iter()
            .map(|cue| format!("{}. {}\n{}", cue.index, cue.timing(), cue.text))
            .collect();
        sections.push(format!(
            "Translate these {} subtitles from {} to {}.\n\nSubtitles:\n{}",
            self.lines.len(),
            self.source_language,
            self.target_language,
            cues.join("\n\n")
        ));

        sections.join("\n\n")
    }

    /// Build the full completion request.
    pub fn build(&self) -> CompletionRequest {
        CompletionRequest {
            system_prompt: self.template.render(&self.source_language, &self.target_language),
            user_prompt: self.build_user_prompt(),
            examples: self.template.examples().to_vec(),
        }
    }
}

fn single_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}
