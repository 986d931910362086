/*!
 * # srtlingo - markup-preserving subtitle translation
 *
 * A Rust library for translating SubRip subtitles with a language model
 * while keeping inline markup (`<i>`, `<font color=...>`, `{\an8}`) out of
 * the model's sight and putting it back afterwards.
 *
 * ## Features
 *
 * - Lossless markup codec: clean text in, tokens kept aside, markup reapplied
 * - Chunked requests with surrounding context cues
 * - Retry with exponential backoff, per-request timeout and cancellation
 * - Recovery of per-cue translations from free-form model output
 * - Partial-failure reports: untranslated cues keep their source text
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * - `subtitle_processor`: Cue parsing, serialization, optimize/restore
 * - `translation`: Translation engine:
 *   - `translation::formatting`: Markup tokenization and reconstruction
 *   - `translation::chunking`: Chunk planning
 *   - `translation::prompts`: Prompt templates
 *   - `translation::recovery`: Response recovery
 *   - `translation::core`: Retry, timeout and cancellation per chunk
 *   - `translation::batch`: Whole-document runs
 * - `providers`: Completion provider trait, Ollama client and mock
 * - `app_config`: Configuration management
 * - `app_controller`: CLI workflow
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Error types
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use subtitle_processor::{Cue, SubtitleCollection, Timestamp};
pub use translation::{BatchTranslator, CancelSignal, TranslationReport, TranslationService};
