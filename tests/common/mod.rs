/*!
 * Common test utilities for the srtlingo test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use srtlingo::app_config::Config;
use srtlingo::providers::mock::MockProvider;
use srtlingo::translation::{BatchTranslator, RetryPolicy, TranslationService};

/// A document mixing plain cues, nested markup, positioning tags and a
/// markup-only cue
pub const SAMPLE_DOCUMENT: &str = "1
00:00:01,000 --> 00:00:04,000
<i>Hello there.</i>

2
00:00:05,000 --> 00:00:09,000
<font color=\"#ffff00\">It contains</font>
<b>two lines</b>

3
00:00:10,000 --> 00:00:14,000
{\\an8}For testing purposes.

4
00:00:15,000 --> 00:00:16,000
<i></i>

5
00:00:17,000 --> 00:00:20,000
Plain text at the end.
";

/// Route `log` output through env_logger for the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the sample subtitle file in the specified directory
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_DOCUMENT)
}

/// Retry policy with millisecond delays
pub fn fast_retry_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
        backoff_factor: 2.0,
        request_timeout: Duration::from_secs(5),
    }
}

/// Configuration with the given chunking and concurrency
pub fn test_config(chunk_size: usize, context_window: usize, concurrent_requests: usize) -> Config {
    let mut config = Config::default();
    config.translation.common.chunk_size = chunk_size;
    config.translation.common.context_window = context_window;
    config.translation.common.concurrent_requests = concurrent_requests;
    config
}

/// Service over a mock provider with fast retries
pub fn mock_service(provider: MockProvider, config: &Config, max_retries: u32) -> TranslationService {
    TranslationService::new(Arc::new(provider), config)
        .expect("test configuration should be valid")
        .with_retry_policy(fast_retry_policy(max_retries))
}

/// Batch translator over a mock provider with fast retries
pub fn mock_translator(provider: MockProvider, chunk_size: usize, concurrent_requests: usize) -> BatchTranslator {
    let config = test_config(chunk_size, 1, concurrent_requests);
    BatchTranslator::new(mock_service(provider, &config, 2))
}
