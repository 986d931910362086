/*!
 * Subtitle translation engine.
 *
 * This module contains the core functionality for translating subtitles
 * through a completion provider. It is split into several submodules:
 *
 * - `formatting`: Markup tokenization and reconstruction
 * - `chunking`: Grouping cues into requests with context
 * - `prompts`: Prompt templates and builders for translation
 * - `recovery`: Parsing free-form model output back into per-cue text
 * - `core`: Per-chunk translation with retry, timeout and cancellation
 * - `batch`: Whole-document runs with progress and failure reporting
 * - `cancel`: Cancellation signal shared with the caller
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, ChunkFailure, TranslationReport};
pub use self::cancel::CancelSignal;
pub use self::chunking::Chunk;
pub use self::core::{ChunkTranslation, RetryPolicy, TranslationService};
pub use self::formatting::{FormatMap, Token};
pub use self::recovery::RecoveryStrategy;

// Re-export prompt types
pub use self::prompts::{PromptBuilder, PromptTemplate, TemplateRegistry};

// Submodules
pub mod batch;
pub mod cancel;
pub mod chunking;
pub mod core;
pub mod formatting;
pub mod prompts;
pub mod recovery;
