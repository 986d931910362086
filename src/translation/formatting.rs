/*!
 * Markup preservation for translated text.
 *
 * Cue text is split into markup tags and plain text so that only the plain
 * text is sent for translation. After translation the tags are put back
 * around the translated text.
 */

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// HTML-like tags (`<i>`, `</font>`, `<font color="red">`) and brace overrides (`{\an8}`)
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z][^<>\n]*>|\{\\[^{}\n]*\}").unwrap()
});

/// A fragment of cue text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Token {
    /// Raw markup, brackets included
    Tag(String),
    /// Plain text between tags
    Text(String),
}

impl Token {
    /// The exact source text of this token
    pub fn as_str(&self) -> &str {
        match self {
            Token::Tag(raw) | Token::Text(raw) => raw,
        }
    }

    /// `</...>` tags close a style; everything else opens one
    pub fn is_closing_tag(&self) -> bool {
        matches!(self, Token::Tag(raw) if raw.starts_with("</"))
    }

    fn is_translatable(&self) -> bool {
        matches!(self, Token::Text(content) if !content.trim().is_empty())
    }
}

/// Split cue text into tags and text, in source order.
///
/// Concatenating the tokens gives back the input. No empty `Text` token is
/// ever produced.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for tag in TAG_REGEX.find_iter(text) {
        if tag.start() > last {
            tokens.push(Token::Text(text[last..tag.start()].to_string()));
        }
        tokens.push(Token::Tag(tag.as_str().to_string()));
        last = tag.end();
    }

    if last < text.len() {
        tokens.push(Token::Text(text[last..].to_string()));
    }

    tokens
}

/// Whether any token is markup
pub fn has_markup(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| matches!(t, Token::Tag(_)))
}

/// All text between the tags, in order
pub fn extract_clean_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Text(content) => Some(content.as_str()),
            Token::Tag(_) => None,
        })
        .collect()
}

/// The text the model gets to see.
///
/// Same as [`extract_clean_text`] minus the lines that hold no text, such as
/// a line that was only `<i></i>` or `{\an8}`. The result never contains a
/// blank line, so it stays a single SubRip record.
pub fn translatable_text(tokens: &[Token]) -> String {
    extract_clean_text(tokens)
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rebuild marked-up text from the original tokens and a translation of
/// their clean text.
///
/// - No translatable text: the translation is wrapped in the opening tags
///   (prepended) and the closing tags (appended), each in source order.
/// - One text slot: the slot receives the whole translation, keeping its own
///   leading and trailing whitespace.
/// - Several slots: translated lines are matched to source lines, see
///   [`distribute_lines`].
///
/// Accepts either [`extract_clean_text`] or [`translatable_text`] of the
/// same tokens (or a translation of either) and gives back the original
/// markup around it.
pub fn apply_translation(tokens: &[Token], translated: &str) -> String {
    let slots: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_translatable())
        .map(|(i, _)| i)
        .collect();

    match slots.as_slice() {
        [] => wrap_markup_only(tokens, translated),
        [slot] => {
            let original = tokens[*slot].as_str();
            let replacement = if translated == original {
                original.to_string()
            } else {
                refill(original, translated.trim())
            };
            tokens
                .iter()
                .enumerate()
                .map(|(i, t)| if i == *slot { replacement.as_str() } else { t.as_str() })
                .collect()
        }
        _ => distribute_lines(tokens, &slots, translated),
    }
}

fn wrap_markup_only(tokens: &[Token], translated: &str) -> String {
    if translated.trim().is_empty() {
        return tokens.iter().map(Token::as_str).collect();
    }

    let tags = tokens.iter().filter(|t| matches!(t, Token::Tag(_)));
    let opening: String = tags.clone().filter(|t| !t.is_closing_tag()).map(Token::as_str).collect();
    let closing: String = tags.filter(|t| t.is_closing_tag()).map(Token::as_str).collect();

    format!("{}{}{}", opening, translated, closing)
}

/// Where one line of one text slot sits in the clean text
struct Segment {
    slot: usize,
    part: usize,
    line: usize,
}

/// Spread a multi-line translation over several text slots.
///
/// Only source lines holding text count, and blank translated lines are
/// ignored. The `k`-th translated line replaces whatever the slots had on
/// the `k`-th text line of the clean source, so a slot spanning `n` text
/// lines receives `n` translated lines. Slots sharing a source line split
/// that translated line by word count, unless the line is unchanged. Slot
/// lines with no translated line left become empty; surplus translated
/// lines go to the last slot. Lossy when the translation merges or reorders
/// lines.
fn distribute_lines(tokens: &[Token], slots: &[usize], translated: &str) -> String {
    let clean = extract_clean_text(tokens);
    let source_lines: Vec<&str> = clean.split('\n').collect();
    let translated_lines: Vec<&str> = translated.split('\n').filter(|l| !l.trim().is_empty()).collect();

    let mut parts: Vec<Vec<String>> = Vec::with_capacity(slots.len());
    let mut segments = Vec::new();
    let mut line = 0;

    for (i, token) in tokens.iter().enumerate() {
        let Token::Text(content) = token else { continue };

        if let Some(slot) = slots.iter().position(|s| *s == i) {
            let slot_parts: Vec<String> = content.split('\n').map(str::to_string).collect();
            for (part, text) in slot_parts.iter().enumerate() {
                if !text.trim().is_empty() {
                    segments.push(Segment { slot, part, line: line + part });
                }
            }
            parts.push(slot_parts);
        }

        line += content.matches('\n').count();
    }

    // segments are pushed in line order
    let mut text_lines: Vec<usize> = segments.iter().map(|s| s.line).collect();
    text_lines.dedup();

    for (ordinal, &k) in text_lines.iter().enumerate() {
        let source_line = source_lines[k];
        let on_line: Vec<&Segment> = segments.iter().filter(|s| s.line == k).collect();

        match translated_lines.get(ordinal) {
            None => {
                for seg in on_line {
                    parts[seg.slot][seg.part].clear();
                }
            }
            Some(line) if *line == source_line => {}
            Some(line) if on_line.len() == 1 => {
                let seg = on_line[0];
                let part = &mut parts[seg.slot][seg.part];
                *part = refill(part, line.trim());
            }
            Some(line) => {
                let weights: Vec<usize> = on_line
                    .iter()
                    .map(|seg| parts[seg.slot][seg.part].split_whitespace().count())
                    .collect();
                for (seg, words) in on_line.iter().zip(split_words(line, &weights)) {
                    let part = &mut parts[seg.slot][seg.part];
                    *part = refill(part, &words);
                }
            }
        }
    }

    let surplus: Vec<&str> = translated_lines.iter().skip(text_lines.len()).copied().collect();
    if let Some(last) = parts.last_mut().and_then(|p| p.last_mut()) {
        for extra in surplus {
            last.push('\n');
            last.push_str(extra);
        }
    }

    let mut rebuilt = parts.into_iter().map(|p| p.join("\n"));
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if slots.contains(&i) {
                rebuilt.next().unwrap_or_default()
            } else {
                t.as_str().to_string()
            }
        })
        .collect()
}

/// Replace the non-whitespace core of `original`, keeping its padding
fn refill(original: &str, core: &str) -> String {
    if core.is_empty() {
        return String::new();
    }
    let lead = &original[..original.len() - original.trim_start().len()];
    let trail = &original[original.trim_end().len()..];
    format!("{}{}{}", lead, core, trail)
}

/// Cut a line into `weights.len()` runs of words, proportional to `weights`
fn split_words(line: &str, weights: &[usize]) -> Vec<String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let total_weight = weights.iter().sum::<usize>().max(1);
    let mut runs = Vec::with_capacity(weights.len());
    let mut cumulative = 0;
    let mut prev = 0;

    for (j, weight) in weights.iter().enumerate() {
        cumulative += weight;
        let end = if j + 1 == weights.len() {
            words.len()
        } else {
            ((words.len() * cumulative * 2 + total_weight) / (2 * total_weight)).clamp(prev, words.len())
        };
        runs.push(words[prev..end].join(" "));
        prev = end;
    }

    runs
}

/// Token lists of the cues that carry markup, keyed by cue index.
///
/// Cues without an entry had no markup and pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatMap(BTreeMap<usize, Vec<Token>>);

impl FormatMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tokens of a cue
    pub fn insert(&mut self, index: usize, tokens: Vec<Token>) {
        self.0.insert(index, tokens);
    }

    /// Tokens recorded for a cue
    pub fn get(&self, index: usize) -> Option<&[Token]> {
        self.0.get(&index).map(Vec::as_slice)
    }

    /// Number of cues with markup
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no cue had markup
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize for the optimize/restore side-car file
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize format map")
    }

    /// Read back a side-car file
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse format map")
    }
}
