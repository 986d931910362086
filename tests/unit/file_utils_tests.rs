/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use srtlingo::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/episode.srt"), "/tmp/output", "fr", "srt");
    assert_eq!(output_path, Path::new("/tmp/output/episode.fr.srt"));
}

/// Test that the format map side-car lives next to its subtitle
#[test]
fn test_format_map_path_shouldUseSourceDirectory() {
    assert_eq!(FileManager::format_map_path("/tmp/input/episode.srt"), Path::new("/tmp/input/episode.format.json"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParents_shouldCreateThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("a").join("b").join("out.srt");

    FileManager::write_to_file(&target, "content")?;

    assert_eq!(FileManager::read_to_string(&target)?, "content");
    Ok(())
}

/// Test that find_subtitle_files walks subdirectories and ignores other files
#[test]
fn test_find_subtitle_files_shouldRecurseAndFilter() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("season1");
    fs::create_dir_all(&nested)?;
    common::create_test_file(temp_dir.path(), "b.srt", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    common::create_test_file(&nested, "a.SRT", "")?;

    let files = FileManager::find_subtitle_files(temp_dir.path())?;

    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.ends_with("season1/a.SRT")));
    assert!(files.iter().any(|f| f.ends_with("b.srt")));
    Ok(())
}

/// Test that append_to_log_file appends timestamped lines
#[test]
fn test_append_to_log_file_shouldAppendWithTimestamp() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("issues.log");

    FileManager::append_to_log_file(&log_path, "first")?;
    FileManager::append_to_log_file(&log_path, "second")?;

    let content = FileManager::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));
    Ok(())
}

/// Test that reading a missing file fails
#[test]
fn test_read_to_string_withMissingFile_shouldFail() {
    assert!(FileManager::read_to_string("./non_existent_directory_12345/x.srt").is_err());
}
