/*!
 * Recovery of per-cue translations from free-form model output.
 *
 * Models are asked for a numbered list but answer with JSON, echoed SRT
 * blocks, bullet lists or plain prose often enough that a single parser is
 * not enough. Recovery runs an ordered list of strategies and keeps the
 * first result with exactly the expected number of entries; the last two
 * strategies always produce one.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// `N.` at the start of a line, followed by whitespace or end of line
static NUMBERED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\.(?:\s+|$)(.*)$").unwrap());

/// An echoed SRT timing line
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d{1,}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{1,}:\d{2}:\d{2}[,.]\d{3}").unwrap()
});

/// Entry markers used when regrouping: `-`, `*` or `N.`
static MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*]|\d+\.)(?:\s+|$)?(.*)$").unwrap());

/// Field names accepted for an entry of a JSON `translations` list
const JSON_TEXT_FIELDS: [&str; 3] = ["translated", "translation", "text"];

/// Which strategy produced a recovered list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// `{"translations": [...]}` or a bare JSON array
    Json,
    /// `N. text` entries
    Numbered,
    /// Echoed `start --> end` blocks
    TimestampBlocks,
    /// One non-blank line per entry
    Lines,
    /// Entries regrouped on `-`, `*` or `N.` markers
    Markers,
    /// Non-blank lines spread evenly over the entries
    EvenPartition,
    /// Everything in the first entry
    WholeResponse,
}

type Strategy = fn(&str, usize) -> Option<Vec<String>>;

/// Tried in order; the first list of the expected length wins
const STRATEGIES: [(RecoveryStrategy, Strategy); 7] = [
    (RecoveryStrategy::Json, from_json),
    (RecoveryStrategy::Numbered, from_numbered),
    (RecoveryStrategy::TimestampBlocks, from_timestamp_blocks),
    (RecoveryStrategy::Lines, from_lines),
    (RecoveryStrategy::Markers, from_markers),
    (RecoveryStrategy::EvenPartition, from_even_partition),
    (RecoveryStrategy::WholeResponse, from_whole_response),
];

/// Recover exactly `expected` translations from a model response
pub fn recover(response: &str, expected: usize) -> Vec<String> {
    recover_with_strategy(response, expected).0
}

/// Like [`recover`], also reporting which strategy matched
pub fn recover_with_strategy(response: &str, expected: usize) -> (Vec<String>, RecoveryStrategy) {
    if expected == 0 {
        return (Vec::new(), RecoveryStrategy::WholeResponse);
    }

    let text = strip_fence(response);

    for (strategy, parse) in STRATEGIES {
        if let Some(entries) = parse(text, expected).filter(|e| e.len() == expected) {
            debug!("Recovered {} entries with {:?}", expected, strategy);
            return (entries, strategy);
        }
    }

    // from_whole_response always matches
    let mut entries = vec![String::new(); expected];
    entries[0] = text.trim().to_string();
    (entries, RecoveryStrategy::WholeResponse)
}

/// Unwrap a response that is entirely one fenced code block
fn strip_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    if body.contains("```") {
        return trimmed;
    }

    // Drop the info string (```json)
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

fn from_json(text: &str, _expected: usize) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(text.trim()).ok().or_else(|| {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        (end > start).then(|| serde_json::from_str(&text[start..=end]).ok()).flatten()
    })?;

    let items = match &value {
        Value::Object(map) => map.get("translations")?.as_array()?,
        Value::Array(items) => items,
        _ => return None,
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(entry) => JSON_TEXT_FIELDS
                .iter()
                .find_map(|field| entry.get(*field).and_then(Value::as_str))
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .collect()
}

fn from_numbered(text: &str, _expected: usize) -> Option<Vec<String>> {
    let mut entries: Vec<Vec<&str>> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = NUMBERED_REGEX.captures(line) {
            entries.push(vec![caps.get(1).map_or("", |m| m.as_str())]);
        } else if let Some(entry) = entries.last_mut() {
            entry.push(line);
        }
    }

    let entries = entries
        .into_iter()
        .map(|mut lines| {
            let first_text = lines.iter().position(|l| !l.trim().is_empty());
            if let Some(first) = first_text {
                if TIMING_REGEX.is_match(lines[first]) {
                    lines.remove(first);
                }
            }
            join_non_blank(&lines)
        })
        .collect();

    Some(entries)
}

fn from_timestamp_blocks(text: &str, _expected: usize) -> Option<Vec<String>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    for line in text.lines() {
        if TIMING_REGEX.is_match(line) {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    let count = blocks.len();
    let entries = blocks
        .into_iter()
        .enumerate()
        .map(|(i, mut lines)| {
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
            let next_index = lines.last().is_some_and(|l| l.trim().bytes().all(|b| b.is_ascii_digit()));
            if i + 1 < count && next_index {
                lines.pop();
            }
            join_non_blank(&lines)
        })
        .collect();

    Some(entries)
}

fn from_lines(text: &str, _expected: usize) -> Option<Vec<String>> {
    Some(non_blank_lines(text).into_iter().map(str::to_string).collect())
}

fn from_markers(text: &str, _expected: usize) -> Option<Vec<String>> {
    let mut entries: Vec<Vec<&str>> = Vec::new();
    let mut saw_marker = false;

    for line in non_blank_lines(text) {
        if let Some(caps) = MARKER_REGEX.captures(line) {
            saw_marker = true;
            entries.push(vec![caps.get(1).map_or("", |m| m.as_str())]);
        } else if let Some(entry) = entries.last_mut() {
            entry.push(line);
        } else {
            entries.push(vec![line]);
        }
    }

    saw_marker.then(|| entries.iter().map(|lines| join_non_blank(lines)).collect())
}

fn from_even_partition(text: &str, expected: usize) -> Option<Vec<String>> {
    let lines = non_blank_lines(text);
    if lines.is_empty() {
        return None;
    }

    if lines.len() < expected {
        let mut entries: Vec<String> = lines.into_iter().map(str::to_string).collect();
        entries.resize(expected, String::new());
        return Some(entries);
    }

    let per_bucket = lines.len() / expected;
    let entries = (0..expected)
        .map(|i| {
            let start = i * per_bucket;
            let end = if i + 1 == expected { lines.len() } else { start + per_bucket };
            lines[start..end].join("\n")
        })
        .collect();

    Some(entries)
}

fn from_whole_response(text: &str, expected: usize) -> Option<Vec<String>> {
    let mut entries = vec![String::new(); expected];
    entries[0] = text.trim().to_string();
    Some(entries)
}

fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn join_non_blank(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
