/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, which translates one chunk
 * of cues at a time: it builds the prompt, calls the completion provider
 * under a timeout, retries retryable failures with exponential backoff and
 * recovers one translation per cue from the reply.
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::app_config::{Config, TranslationCommonConfig};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::{CompletionProvider, CompletionRequest};
use crate::subtitle_processor::Cue;

use super::cancel::CancelSignal;
use super::chunking::Chunk;
use super::prompts::{PromptBuilder, PromptTemplate, TemplateRegistry};
use super::recovery::{self, RecoveryStrategy};

/// How failed completion calls are retried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Sleep before the first retry
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each sleep
    pub backoff_factor: f64,
    /// Limit for a single completion call
    pub request_timeout: Duration,
}

impl RetryPolicy {
    /// Build the policy from configuration
    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self {
            max_retries: common.max_retries,
            base_delay: Duration::from_millis(common.retry_base_delay_ms),
            backoff_factor: common.backoff_factor.max(1.0),
            request_timeout: Duration::from_secs(common.request_timeout_secs),
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_factor).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationCommonConfig::default())
    }
}

/// Result of a chunk that reached the model and got an answer
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTranslation {
    /// One entry per chunk line; `None` keeps the original text
    pub translations: Vec<Option<String>>,
    /// Cue indices whose recovered translation was empty
    pub empty_slots: Vec<usize>,
    /// Completion calls performed
    pub attempts: u32,
    /// Backoff sleeps taken between attempts, in order
    pub backoff_delays: Vec<Duration>,
    /// Recovery strategy that matched, `None` if nothing was sent
    pub strategy: Option<RecoveryStrategy>,
}

/// Translation service for one source/target language pair
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Completion backend
    provider: Arc<dyn CompletionProvider>,

    /// Prompt style
    template: PromptTemplate,

    /// Display name of the source language
    source_language: String,

    /// Display name of the target language
    target_language: String,

    /// Terms the model must translate consistently
    glossary: BTreeMap<String, String>,

    /// Retry behavior
    retry: RetryPolicy,

    /// Cues per chunk
    pub chunk_size: usize,

    /// Context cues on each side of a chunk
    pub context_window: usize,

    /// Chunks translated at the same time
    pub concurrent_requests: usize,
}

impl TranslationService {
    /// Create a service using the built-in prompt styles
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &Config) -> Result<Self, TranslationError> {
        Self::with_registry(provider, config, &TemplateRegistry::builtin())
    }

    /// Create a service looking its style up in `registry`
    pub fn with_registry(
        provider: Arc<dyn CompletionProvider>,
        config: &Config,
        registry: &TemplateRegistry,
    ) -> Result<Self, TranslationError> {
        config
            .validate()
            .map_err(|e| TranslationError::InvalidConfig(e.to_string()))?;

        let common = &config.translation.common;
        let template = registry.get(&common.style)?.clone();
        let language_name = |code: &str| {
            language_utils::get_language_name(code).map_err(|e| TranslationError::InvalidConfig(e.to_string()))
        };

        Ok(Self {
            provider,
            template,
            source_language: language_name(&config.source_language)?,
            target_language: language_name(&config.target_language)?,
            glossary: common.glossary.clone(),
            retry: RetryPolicy::from_config(common),
            chunk_size: common.chunk_size,
            context_window: common.context_window,
            concurrent_requests: common.concurrent_requests.max(1),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The active retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Test the connection to the provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Build the completion request for the translatable lines of a chunk
    pub fn build_request(&self, chunk: &Chunk) -> CompletionRequest {
        PromptBuilder::new(&self.template, &self.source_language, &self.target_language)
            .with_glossary(&self.glossary)
            .with_context(&chunk.context_before, &chunk.context_after)
            .with_lines(translatable(&chunk.lines))
            .build()
    }

    /// Translate one chunk.
    ///
    /// Retryable failures are retried up to `max_retries` more times with
    /// exponential backoff; anything else, or running out of attempts, ends
    /// in `TranslationError::Exhausted`. Cancellation is honored before the
    /// first call, during calls and during backoff sleeps.
    pub async fn translate_chunk(
        &self,
        chunk: &Chunk,
        cancel: &CancelSignal,
    ) -> Result<ChunkTranslation, TranslationError> {
        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        let sent = translatable(&chunk.lines);
        if sent.is_empty() {
            debug!("Chunk {} has no text to translate", chunk.index);
            return Ok(ChunkTranslation {
                translations: vec![None; chunk.lines.len()],
                empty_slots: Vec::new(),
                attempts: 0,
                backoff_delays: Vec::new(),
                strategy: None,
            });
        }

        let request = self.build_request(chunk);
        let mut attempts: u32 = 0;
        let mut delay = self.retry.base_delay;
        let mut backoff_delays = Vec::new();

        loop {
            attempts += 1;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                result = self.complete_with_timeout(&request) => result,
            };

            let error = match outcome {
                Ok(response) => {
                    let (recovered, strategy) = recovery::recover_with_strategy(&response, sent.len());
                    debug!(
                        "Chunk {} answered on attempt {} ({:?})",
                        chunk.index, attempts, strategy
                    );
                    return Ok(self.assemble(chunk, recovered, attempts, backoff_delays, strategy));
                }
                Err(error) => error,
            };

            if !error.is_retryable() || attempts > self.retry.max_retries {
                return Err(TranslationError::Exhausted {
                    chunk_index: chunk.index,
                    attempts,
                    last_error: error,
                });
            }

            warn!(
                "Chunk {} attempt {}/{} failed: {} (retrying in {:?})",
                chunk.index,
                attempts,
                self.retry.max_retries + 1,
                error,
                delay
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            backoff_delays.push(delay);
            delay = self.retry.next_delay(delay);
        }
    }

    async fn complete_with_timeout(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let response = tokio::time::timeout(self.retry.request_timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.retry.request_timeout.as_millis() as u64))??;

        if response.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(response)
    }

    /// Map recovered strings back onto the chunk lines they were sent for
    fn assemble(
        &self,
        chunk: &Chunk,
        recovered: Vec<String>,
        attempts: u32,
        backoff_delays: Vec<Duration>,
        strategy: RecoveryStrategy,
    ) -> ChunkTranslation {
        let mut recovered = recovered.into_iter().map(|text| sanitize(&text));
        let mut empty_slots = Vec::new();

        let translations = chunk
            .lines
            .iter()
            .map(|cue| {
                if cue.text.trim().is_empty() {
                    return None;
                }
                match recovered.next().filter(|text| !text.is_empty()) {
                    Some(text) => Some(text),
                    None => {
                        warn!("No translation recovered for cue {}, keeping original text", cue.index);
                        empty_slots.push(cue.index);
                        None
                    }
                }
            })
            .collect();

        ChunkTranslation {
            translations,
            empty_slots,
            attempts,
            backoff_delays,
            strategy: Some(strategy),
        }
    }
}

/// Cues with text worth sending
fn translatable(lines: &[Cue]) -> Vec<&Cue> {
    lines.iter().filter(|cue| !cue.text.trim().is_empty()).collect()
}

/// Drop blank lines and surrounding whitespace
fn sanitize(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
