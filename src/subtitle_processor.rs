use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::translation::formatting::{self, FormatMap};

// @module: SubRip parsing, serialization and markup stripping

// @const: SRT timestamp line; trailing position coordinates are ignored
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,}:\d{2}:\d{2}[,.]\d{3})").unwrap()
});

// @const: Largest hour value that fits the two-digit SRT field
const MAX_HOURS: u64 = 99;

/// A subtitle time position with millisecond precision.
///
/// Parsed values are limited to `99:59:59,999`, so they always print back
/// at fixed width. A value built with [`Timestamp::from_millis`] beyond that
/// prints its hours with as many digits as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the start of the media
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl FromStr for Timestamp {
    type Err = SubtitleError;

    /// Parse `HH:MM:SS,mmm`.
    ///
    /// A `.` millisecond separator is accepted; output always uses `,`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SubtitleError::InvalidTimestamp(s.to_string());
        let parts: Vec<&str> = s.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 || parts[3].len() != 3 {
            return Err(invalid());
        }

        let mut values = [0u64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *value = part.parse().map_err(|_| invalid())?;
        }

        let [hours, minutes, seconds, millis] = values;
        if hours > MAX_HOURS || minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        Ok(Self(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis))
    }
}

// @struct: Single timed subtitle record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    // @field: Sequence number as found in the source, never renumbered
    pub index: usize,

    // @field: Display start
    pub start: Timestamp,

    // @field: Display end
    pub end: Timestamp,

    // @field: Subtitle text, lines separated by '\n'
    pub text: String,
}

impl Cue {
    /// Creates a new cue
    pub fn new(index: usize, start: Timestamp, end: Timestamp, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Timing line in SRT form
    pub fn timing(&self) -> String {
        format!("{} --> {}", self.start, self.end)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}", self.timing())?;
        writeln!(f, "{}", self.text)
    }
}

/// Parse a SubRip document into cues, in source order.
///
/// Malformed records are logged and skipped. A record with an index and a
/// timing line but no text is kept with empty text.
pub fn parse_document(content: &str) -> Vec<Cue> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut cues = Vec::new();
    let mut record: Vec<&str> = Vec::new();
    let mut record_start = 0;

    for (line_number, raw_line) in content.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if line.trim().is_empty() {
            if !record.is_empty() {
                push_record(&record, record_start, &mut cues);
                record.clear();
            }
            continue;
        }

        if record.is_empty() {
            record_start = line_number + 1;
        }
        record.push(line);
    }

    if !record.is_empty() {
        push_record(&record, record_start, &mut cues);
    }

    debug!("Parsed {} cues", cues.len());
    cues
}

fn push_record(record: &[&str], line: usize, cues: &mut Vec<Cue>) {
    match parse_record(record, line) {
        Ok(cue) => cues.push(cue),
        Err(e) => warn!("Skipping cue: {}", e),
    }
}

/// Parse one blank-line-delimited record
fn parse_record(record: &[&str], line: usize) -> Result<Cue, SubtitleError> {
    let malformed = |reason: String| SubtitleError::MalformedCue { line, reason };

    let index_line = record[0].trim();
    let index: usize = index_line
        .parse()
        .map_err(|_| malformed(format!("expected a sequence number, found '{}'", index_line)))?;

    let timing_line = record
        .get(1)
        .ok_or_else(|| malformed(format!("cue {} has no timing line", index)))?;
    let caps = TIMESTAMP_REGEX
        .captures(timing_line)
        .ok_or_else(|| malformed(format!("cue {} has no 'start --> end' line", index)))?;

    let start: Timestamp = caps[1].parse()?;
    let end: Timestamp = caps[2].parse()?;
    if start > end {
        return Err(malformed(format!("cue {} ends ({}) before it starts ({})", index, end, start)));
    }

    Ok(Cue::new(index, start, end, record[2..].join("\n")))
}

/// Serialize cues back to SubRip, one blank line between records
pub fn serialize_document(cues: &[Cue]) -> String {
    cues.iter().map(|cue| cue.to_string()).collect::<Vec<_>>().join("\n")
}

/// Strip markup from parsed cues.
///
/// Returned cues carry [`formatting::translatable_text`], which has no blank
/// lines, so each still serializes as one record. Only cues with markup get
/// a FormatMap entry; the others are returned unchanged.
pub fn strip_markup(cues: &[Cue]) -> (Vec<Cue>, FormatMap) {
    let mut format_map = FormatMap::new();

    let clean: Vec<Cue> = cues
        .iter()
        .map(|cue| {
            let tokens = formatting::tokenize(&cue.text);
            if !formatting::has_markup(&tokens) {
                return cue.clone();
            }
            let text = formatting::translatable_text(&tokens);
            format_map.insert(cue.index, tokens);
            Cue { text, ..cue.clone() }
        })
        .collect();

    debug!("Stripped markup from {} of {} cues", format_map.len(), cues.len());
    (clean, format_map)
}

/// Put markup recorded by [`strip_markup`] back into translated cues
pub fn reapply_markup(cues: &mut [Cue], format_map: &FormatMap) {
    for cue in cues {
        if let Some(tokens) = format_map.get(cue.index) {
            cue.text = formatting::apply_translation(tokens, &cue.text);
        }
    }
}

/// Strip markup from every cue of a document.
///
/// Returns the markup-free document and the token lists needed to put the
/// markup back after translation.
pub fn optimize(document: &str) -> (String, FormatMap) {
    let (cues, format_map) = strip_markup(&parse_document(document));
    (serialize_document(&cues), format_map)
}

/// Reapply markup recorded by [`optimize`] to a translated document
pub fn restore(translated_document: &str, format_map: &FormatMap) -> String {
    let mut cues = parse_document(translated_document);
    reapply_markup(&mut cues, format_map);
    serialize_document(&cues)
}

/// Collection of cues read from or written to a file
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Cues in document order
    pub cues: Vec<Cue>,
}

impl SubtitleCollection {
    /// Create an empty collection
    pub fn new(source_file: PathBuf) -> Self {
        Self {
            source_file,
            cues: Vec::new(),
        }
    }

    /// Read and parse an SRT file
    pub fn read_from_srt<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        Ok(Self {
            source_file: path.to_path_buf(),
            cues: parse_document(&content),
        })
    }

    /// Write the collection as an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, serialize_document(&self.cues))
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.cues.len())
    }
}
