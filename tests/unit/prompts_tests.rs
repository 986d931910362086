/*!
 * Tests for prompt templates and the prompt builder
 */

use std::collections::BTreeMap;

use srtlingo::errors::TranslationError;
use srtlingo::subtitle_processor;
use srtlingo::translation::{PromptBuilder, PromptTemplate, TemplateRegistry};
use crate::common;

/// Test that the built-in registry exposes the three styles
#[test]
fn test_builtinRegistry_shouldListStyles() {
    let registry = TemplateRegistry::builtin();
    assert_eq!(registry.names(), vec!["formal", "natural", "standard"]);
    assert!(!registry.get("standard").unwrap().examples().is_empty());
}

/// Test that an unknown style is reported by name
#[test]
fn test_registry_withUnknownStyle_shouldFail() {
    let registry = TemplateRegistry::builtin();
    match registry.get("pirate") {
        Err(TranslationError::UnknownTemplate(name)) => assert_eq!(name, "pirate"),
        other => panic!("unexpected result: {:?}", other.map(|t| t.name().to_string())),
    }
}

/// Test that registering a template under an existing name replaces it
#[test]
fn test_registry_register_shouldReplaceExisting() {
    let mut registry = TemplateRegistry::builtin();
    registry.register(PromptTemplate::new("formal", "Be very formal."));
    assert!(registry.get("formal").unwrap().examples().is_empty());
    assert_eq!(registry.names().len(), 3);
}

/// Test that the system prompt names both languages and the style
#[test]
fn test_render_shouldFillPlaceholders() {
    let template = PromptTemplate::new("custom", "Rhyme whenever possible.");
    let system = template.render("English", "French");

    assert!(system.contains("English to French"));
    assert!(system.contains("Rhyme whenever possible."));
    assert!(!system.contains('{'));
}

/// Test the layout of a user prompt with glossary and context
#[test]
fn test_buildUserPrompt_shouldListGlossaryContextAndCues() {
    let cues = subtitle_processor::parse_document(common::SAMPLE_DOCUMENT);
    let template = PromptTemplate::new("custom", "");
    let glossary = BTreeMap::from([("Hello".to_string(), "Salut".to_string())]);

    let prompt = PromptBuilder::new(&template, "English", "French")
        .with_glossary(&glossary)
        .with_context(&cues[0..1], &cues[3..5])
        .with_lines(vec![&cues[1], &cues[2]])
        .build_user_prompt();

    assert!(prompt.starts_with("Glossary:\nHello => Salut\n\n"));
    assert!(prompt.contains("[before] <i>Hello there.</i>"));
    assert!(prompt.contains("[after] Plain text at the end."));
    assert!(prompt.contains("Translate these 2 subtitles from English to French."));
    assert!(prompt.contains("2. 00:00:05,000 --> 00:00:09,000\n"));
    assert!(prompt.contains("3. 00:00:10,000 --> 00:00:14,000\n{\\an8}For testing purposes."));
}

/// Test that blank context cues are left out
#[test]
fn test_buildUserPrompt_withBlankContext_shouldSkipIt() {
    let cues = subtitle_processor::parse_document(common::SAMPLE_DOCUMENT);
    let template = PromptTemplate::new("custom", "");

    let prompt = PromptBuilder::new(&template, "English", "French")
        .with_context(&cues[3..4], &[])
        .with_lines(vec![&cues[4]])
        .build_user_prompt();

    assert!(!prompt.contains("[before] <i></i>"));
}

/// Test that the request carries the template's few-shot examples
#[test]
fn test_build_shouldAttachExamples() {
    let registry = TemplateRegistry::builtin();
    let template = registry.get("natural").unwrap();
    let cues = subtitle_processor::parse_document(common::SAMPLE_DOCUMENT);

    let request = PromptBuilder::new(template, "English", "Spanish").with_lines(vec![&cues[4]]).build();

    assert_eq!(request.examples.len(), template.examples().len());
    assert!(request.system_prompt.contains("Spanish"));
}
