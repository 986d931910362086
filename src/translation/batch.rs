/*!
 * Batch translation processing.
 *
 * This module runs a whole document through the translation service:
 * chunk planning, bounded concurrency, progress tracking and collection of
 * per-chunk failures into a report. A failed chunk never stops the others;
 * its cues keep their original text.
 */

use futures::stream::{self, StreamExt};
use log::{error, info};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::TranslationError;
use crate::subtitle_processor::{self, Cue};

use super::cancel::CancelSignal;
use super::chunking;
use super::core::{ChunkTranslation, TranslationService};

/// A chunk that did not produce translations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// 0-based chunk number
    pub chunk_index: usize,
    /// Source indices of the cues left untranslated
    pub cue_indices: Vec<usize>,
    /// Why the chunk failed
    pub error: String,
}

/// Outcome of a document run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Number of planned chunks
    pub total_chunks: usize,
    /// Chunks translated successfully, in order
    pub succeeded: Vec<usize>,
    /// Chunks that failed or were cancelled, in order
    pub failures: Vec<ChunkFailure>,
    /// Cues whose recovered translation was empty
    pub empty_slots: Vec<usize>,
    /// Whether the run was cancelled
    pub cancelled: bool,
}

impl TranslationReport {
    /// Every chunk succeeded and every cue got a translation
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.empty_slots.is_empty() && !self.cancelled
    }

    /// Cues left in the source language
    pub fn untranslated_cues(&self) -> Vec<usize> {
        let mut cues: Vec<usize> = self
            .failures
            .iter()
            .flat_map(|f| f.cue_indices.iter().copied())
            .chain(self.empty_slots.iter().copied())
            .collect();
        cues.sort_unstable();
        cues
    }
}

impl fmt::Display for TranslationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} chunks translated, {} failed, {} empty cue(s)",
            self.succeeded.len(),
            self.total_chunks,
            self.failures.len(),
            self.empty_slots.len()
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Batch translator for processing whole documents
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,

    /// Maximum number of concurrent requests
    max_concurrent_requests: usize,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(service: TranslationService) -> Self {
        Self {
            max_concurrent_requests: service.concurrent_requests.max(1),
            service,
        }
    }

    /// The underlying service
    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Translate cues, returning them in input order with the report.
    ///
    /// `progress_callback(completed, total)` is called once for every chunk
    /// that succeeds or runs out of attempts. Cancelled chunks are reported
    /// as failures but not counted as progress.
    pub async fn translate_cues(
        &self,
        cues: &[Cue],
        cancel: &CancelSignal,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> (Vec<Cue>, TranslationReport) {
        let chunks = chunking::plan(cues, self.service.chunk_size, self.service.context_window);
        let total_chunks = chunks.len();
        let processed_chunks = AtomicUsize::new(0);

        let service = &self.service;
        let progress = &progress_callback;
        let processed = &processed_chunks;

        let mut results: Vec<(usize, Result<ChunkTranslation, TranslationError>)> = stream::iter(chunks.iter())
            .map(move |chunk| async move {
                let result = service.translate_chunk(chunk, cancel).await;

                if !matches!(result, Err(TranslationError::Cancelled)) {
                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(current, total_chunks);
                }

                (chunk.index, result)
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect()
            .await;

        // Sort results by chunk index to maintain original order
        results.sort_by_key(|(index, _)| *index);

        let mut translated = cues.to_vec();
        let mut report = TranslationReport {
            total_chunks,
            ..TranslationReport::default()
        };

        for ((chunk_index, result), chunk) in results.into_iter().zip(&chunks) {
            match result {
                Ok(chunk_translation) => {
                    for (offset, text) in chunk_translation.translations.into_iter().enumerate() {
                        if let Some(text) = text {
                            translated[chunk.offset + offset].text = text;
                        }
                    }
                    report.succeeded.push(chunk_index);
                    report.empty_slots.extend(chunk_translation.empty_slots);
                }
                Err(e) => {
                    if matches!(e, TranslationError::Cancelled) {
                        report.cancelled = true;
                    } else {
                        error!("{}", e);
                    }
                    report.failures.push(ChunkFailure {
                        chunk_index,
                        cue_indices: chunk.cue_indices(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!("Translation finished: {}", report);
        (translated, report)
    }

    /// Translate a whole SubRip document, markup included.
    ///
    /// Markup is stripped before translation and put back afterwards, so
    /// the model only ever sees plain text. A document is always produced.
    pub async fn translate_document(
        &self,
        document: &str,
        cancel: &CancelSignal,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> (String, TranslationReport) {
        let cues = subtitle_processor::parse_document(document);
        let (clean_cues, format_map) = subtitle_processor::strip_markup(&cues);

        let (mut translated, report) = self.translate_cues(&clean_cues, cancel, progress_callback).await;

        subtitle_processor::reapply_markup(&mut translated, &format_map);
        (subtitle_processor::serialize_document(&translated), report)
    }
}
