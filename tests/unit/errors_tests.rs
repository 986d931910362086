/*!
 * Tests for the error types
 */

use srtlingo::errors::{AppError, ProviderError, SubtitleError, TranslationError};

/// Test that an exhausted chunk names its last error
#[test]
fn test_exhausted_display_shouldIncludeLastError() {
    let error = TranslationError::Exhausted {
        chunk_index: 4,
        attempts: 3,
        last_error: ProviderError::Timeout(60_000),
    };
    assert_eq!(error.to_string(), "Chunk 4 failed after 3 attempt(s): Request timed out after 60000 ms");
}

/// Test that provider errors convert into the wrapping types
#[test]
fn test_providerError_conversions_shouldWrap() {
    let translation: TranslationError = ProviderError::EmptyResponse.into();
    assert!(matches!(translation, TranslationError::Provider(ProviderError::EmptyResponse)));

    let app: AppError = translation.into();
    assert!(app.to_string().starts_with("Translation error: Provider error:"));
}

/// Test that subtitle errors report the offending line
#[test]
fn test_subtitleError_display_shouldShowLine() {
    let error = SubtitleError::MalformedCue { line: 12, reason: "no timing".to_string() };
    assert_eq!(error.to_string(), "Malformed cue near line 12: no timing");
}

/// Test that io and anyhow errors become AppError
#[test]
fn test_appError_fromForeignErrors_shouldMapVariants() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(AppError::from(io), AppError::File(_)));
    assert!(matches!(AppError::from(anyhow::anyhow!("boom")), AppError::Unknown(msg) if msg == "boom"));
}

/// Test the retry classification of every provider error
#[test]
fn test_isRetryable_shouldClassifyEveryVariant() {
    let retryable = [
        ProviderError::RequestFailed(String::new()),
        ProviderError::ParseError(String::new()),
        ProviderError::ConnectionError(String::new()),
        ProviderError::RateLimitExceeded(String::new()),
        ProviderError::ApiError { status_code: 408, message: String::new() },
        ProviderError::ApiError { status_code: 502, message: String::new() },
    ];
    assert!(retryable.iter().all(ProviderError::is_retryable));

    let fatal = [
        ProviderError::AuthenticationError(String::new()),
        ProviderError::ApiError { status_code: 404, message: String::new() },
    ];
    assert!(!fatal.iter().any(ProviderError::is_retryable));
}
