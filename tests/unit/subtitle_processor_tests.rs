/*!
 * Tests for cue parsing, serialization and the optimize/restore pair
 */

use anyhow::Result;
use srtlingo::subtitle_processor::{self, Cue, SubtitleCollection, Timestamp};
use crate::common;

/// Test that `.` is accepted as millisecond separator and normalized on output
#[test]
fn test_timestamp_withDotSeparator_shouldNormalizeToComma() {
    let ts: Timestamp = "00:01:02.003".parse().unwrap();
    assert_eq!(ts.as_millis(), 62_003);
    assert_eq!(ts.to_string(), "00:01:02,003");
}

/// Test that out-of-range and truncated timestamps are rejected
#[test]
fn test_timestamp_withInvalidInput_shouldFail() {
    for input in ["00:60:00,000", "00:00:61,000", "00:00:01,00", "aa:00:01,000", "00:01,000"] {
        assert!(input.parse::<Timestamp>().is_err(), "{} should be rejected", input);
    }
}

/// Test that indices are kept verbatim even when not contiguous
#[test]
fn test_parseDocument_withSparseIndices_shouldKeepThem() {
    let document = "3\n00:00:01,000 --> 00:00:02,000\nA\n\n10\n00:00:03,000 --> 00:00:04,000\nB\n";
    let cues = subtitle_processor::parse_document(document);
    assert_eq!(cues.iter().map(|c| c.index).collect::<Vec<_>>(), vec![3, 10]);
}

/// Test that CRLF line endings and a byte order mark are tolerated
#[test]
fn test_parseDocument_withCrlfAndBom_shouldParse() {
    let document = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\nworld\r\n\r\n";
    let cues = subtitle_processor::parse_document(document);
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Hello\nworld");
}

/// Test that malformed records are skipped without losing their neighbours
#[test]
fn test_parseDocument_withMalformedRecord_shouldSkipIt() {
    let document = "1\n00:00:01,000 --> 00:00:02,000\nGood\n\n\
                    x\n00:00:03,000 --> 00:00:04,000\nBad index\n\n\
                    3\nno timing here\n\n\
                    4\n00:00:09,000 --> 00:00:08,000\nEnds before start\n\n\
                    5\n00:00:10,000 --> 00:00:11,000\nAlso good\n";
    let cues = subtitle_processor::parse_document(document);
    assert_eq!(cues.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 5]);
}

/// Test that an hour field too large for the format skips the record
#[test]
fn test_parseDocument_withOversizedHours_shouldSkipRecordAndContinue() {
    let document = "1\n99999999999999999:00:00,000 --> 99999999999999999:00:01,000\nHuge\n\n\
                    2\n100:00:00,000 --> 100:00:01,000\nThree digits\n\n\
                    3\n00:00:02,000 --> 00:00:03,000\nFine\n";
    let cues = subtitle_processor::parse_document(document);
    assert_eq!(cues.iter().map(|c| c.index).collect::<Vec<_>>(), vec![3]);
}

/// Test that the largest two-digit hour still round trips at fixed width
#[test]
fn test_timestamp_withMaxHours_shouldKeepFixedWidth() {
    let ts: Timestamp = "99:59:59,999".parse().unwrap();
    assert_eq!(ts.to_string(), "99:59:59,999");
}

/// Test that a record without text survives a round trip
#[test]
fn test_parseDocument_withEmptyText_shouldKeepCue() {
    let cues = vec![
        Cue::new(1, Timestamp::from_millis(0), Timestamp::from_millis(500), ""),
        Cue::new(2, Timestamp::from_millis(600), Timestamp::from_millis(900), "After"),
    ];
    let reparsed = subtitle_processor::parse_document(&subtitle_processor::serialize_document(&cues));
    assert_eq!(reparsed, cues);
}

/// Test that a normalized document is reproduced byte for byte
#[test]
fn test_serializeDocument_withNormalizedInput_shouldRoundTrip() {
    let document = "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n2\n00:00:03,000 --> 00:00:04,000\nTwo\nlines\n";
    let cues = subtitle_processor::parse_document(document);
    assert_eq!(subtitle_processor::serialize_document(&cues), document);
}

/// Test that optimize strips markup and records only marked-up cues
#[test]
fn test_optimize_withSampleDocument_shouldStripMarkup() {
    let (clean, format_map) = subtitle_processor::optimize(common::SAMPLE_DOCUMENT);

    let cues = subtitle_processor::parse_document(&clean);
    assert_eq!(cues.len(), 5);
    assert_eq!(cues[0].text, "Hello there.");
    assert_eq!(cues[1].text, "It contains\ntwo lines");
    assert_eq!(cues[2].text, "For testing purposes.");
    assert_eq!(cues[3].text, "");
    assert_eq!(format_map.len(), 4);
    assert!(format_map.get(5).is_none());
}

/// Test that restoring an untranslated clean document gives back the source
#[test]
fn test_restore_withUntranslatedDocument_shouldReproduceSource() {
    let (clean, format_map) = subtitle_processor::optimize(common::SAMPLE_DOCUMENT);
    let restored = subtitle_processor::restore(&clean, &format_map);

    assert_eq!(
        subtitle_processor::parse_document(&restored),
        subtitle_processor::parse_document(common::SAMPLE_DOCUMENT)
    );
}

/// Test that SubtitleCollection reads and writes files
#[test]
fn test_subtitleCollection_readWrite_shouldPreserveCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_subtitle(temp_dir.path(), "source.srt")?;

    let collection = SubtitleCollection::read_from_srt(&source)?;
    assert_eq!(collection.cues.len(), 5);

    let copy = temp_dir.path().join("nested").join("copy.srt");
    collection.write_to_srt(&copy)?;
    let reread = SubtitleCollection::read_from_srt(&copy)?;

    assert_eq!(reread.cues, collection.cues);
    assert!(collection.to_string().contains("Cues: 5"));
    Ok(())
}

/// Test that reading a missing file fails with context
#[test]
fn test_subtitleCollection_withMissingFile_shouldFail() {
    let result = SubtitleCollection::read_from_srt("does/not/exist.srt");
    assert!(result.unwrap_err().to_string().contains("Failed to read subtitle file"));
}

/// Test that lines holding only markup never split a record or lose text
#[test]
fn test_optimizeThenRestore_withTagOnlyLines_shouldKeepEveryLine() {
    for text in ["Hello\n<i></i>\nWorld", "{\\an8}\nTop line", "<i>\nHello</i>\n<b>World\n</b>"] {
        let document = format!("1\n00:00:01,000 --> 00:00:02,000\n{}\n\n2\n00:00:03,000 --> 00:00:04,000\nNext\n", text);

        let (clean, format_map) = subtitle_processor::optimize(&document);
        let clean_cues = subtitle_processor::parse_document(&clean);
        assert_eq!(clean_cues.len(), 2, "clean document for {:?}: {:?}", text, clean);
        assert!(!clean_cues[0].text.contains("\n\n"));

        assert_eq!(subtitle_processor::restore(&clean, &format_map), document);
    }
}

/// Test that a translation of stripped cues gets its markup back in memory
#[test]
fn test_stripMarkup_thenReapply_withTranslation_shouldWrapEachLine() {
    let cues = vec![Cue::new(
        4,
        Timestamp::from_millis(0),
        Timestamp::from_millis(1000),
        "<i>Hello</i>\n<i> </i>\n<i>World</i>",
    )];

    let (mut clean, format_map) = subtitle_processor::strip_markup(&cues);
    assert_eq!(clean[0].text, "Hello\nWorld");

    clean[0].text = "Bonjour\nMonde".to_string();
    subtitle_processor::reapply_markup(&mut clean, &format_map);
    assert_eq!(clean[0].text, "<i>Bonjour</i>\n<i> </i>\n<i>Monde</i>");
}
