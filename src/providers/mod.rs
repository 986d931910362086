/*!
 * Completion providers.
 *
 * The translation engine only needs one capability from a language model:
 * turn a system prompt, a user prompt and a few example exchanges into
 * text. This module defines that capability and ships:
 * - Ollama: local LLM server over its chat API
 * - Mock: scriptable provider for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A worked example shown to the model before the real request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    /// What the user would send
    pub source: String,
    /// What the model should answer
    pub translated: String,
}

impl ExamplePair {
    /// Create an example pair
    pub fn new(source: impl Into<String>, translated: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translated: translated.into(),
        }
    }
}

/// One completion call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Instructions for the model
    pub system_prompt: String,
    /// The text to complete
    pub user_prompt: String,
    /// Few-shot examples, sent before `user_prompt`
    pub examples: Vec<ExamplePair>,
}

/// Common trait for all completion providers
///
/// Implementations map every failure onto [`ProviderError`] so the caller
/// can decide whether another attempt is worthwhile. Timeouts and retries
/// are the caller's business.
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug {
    /// Complete a request, returning the raw model text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod ollama;
