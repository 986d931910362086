use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::{FileManager, SUBTITLE_EXTENSION};
use crate::language_utils;
use crate::providers::CompletionProvider;
use crate::providers::ollama::Ollama;
use crate::subtitle_processor;
use crate::translation::{BatchTranslator, CancelSignal, FormatMap, TranslationReport, TranslationService};

// @module: Application controller for subtitle processing

// @const: Issue log written next to translated files
pub const ISSUES_LOG_FILENAME: &str = "srtlingo.issues.log";

/// What happened to one input file
#[derive(Debug)]
pub enum FileOutcome {
    /// Translated document written to the path
    Translated { output_path: PathBuf, report: TranslationReport },
    /// Output already existed and overwriting was not forced
    Skipped(PathBuf),
    /// Run stopped before completion; nothing was written
    Cancelled(TranslationReport),
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Document translator built from the configuration
    translator: BatchTranslator,

    // @field: Shared cancellation signal
    cancel: CancelSignal,
}

impl Controller {
    // @method: Create a controller talking to the configured Ollama endpoint
    pub fn with_config(config: Config) -> Result<Self> {
        let provider = Ollama::new(
            &config.translation.provider.endpoint,
            config.translation.provider.model.clone(),
            config.translation.provider.temperature,
        )?;
        Self::with_provider(config, Arc::new(provider))
    }

    // @method: Create a controller around any completion provider
    pub fn with_provider(config: Config, provider: Arc<dyn CompletionProvider>) -> Result<Self> {
        let service = TranslationService::new(provider, &config)?;
        Ok(Self {
            config,
            translator: BatchTranslator::new(service),
            cancel: CancelSignal::new(),
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A handle on the signal that stops every running translation
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Cancel running translations when Ctrl-C is pressed
    pub fn listen_for_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => {
                            warn!("Interrupted, cancelling translation…");
                            cancel.cancel();
                        }
                        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
                    }
                }
                _ = cancel.cancelled() => {}
            }
        })
    }

    /// Check that the provider answers before starting a long run
    pub async fn test_connection(&self) -> Result<()> {
        self.translator
            .service()
            .test_connection()
            .await
            .with_context(|| format!("Cannot reach provider at {}", self.config.translation.provider.endpoint))
    }

    /// Translate a single subtitle file into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<FileOutcome> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<FileOutcome> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_dir.join(self.get_subtitle_output_filename(input_file)?);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(FileOutcome::Skipped(output_path));
        }

        let document = FileManager::read_to_string(input_file)?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        info!(
            "🚀 srtlingo: {} → {} with {}",
            self.config.source_language, self.config.target_language, self.config.translation.provider.model
        );

        let pb = progress_bar.clone();
        let (translated, report) = self
            .translator
            .translate_document(&document, &self.cancel, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;

        progress_bar.finish_and_clear();

        if !report.is_complete() {
            self.write_issues(input_file, output_dir, &report);
        }

        if report.cancelled {
            warn!("Translation of {:?} cancelled, no output written", input_file);
            return Ok(FileOutcome::Cancelled(report));
        }

        FileManager::write_to_file(&output_path, &translated)?;
        info!("Success: {} ({})", output_path.display(), Self::format_duration(start_time.elapsed()));

        Ok(FileOutcome::Translated { output_path, report })
    }

    /// Translate every subtitle file under a directory, next to its source.
    /// Files that are themselves translations into the target language are ignored.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<Vec<FileOutcome>> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files: Vec<PathBuf> = FileManager::find_subtitle_files(&input_dir)?
            .into_iter()
            .filter(|path| !self.is_target_language_file(path))
            .collect();

        if files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut outcomes = Vec::with_capacity(files.len());
        let (mut success_count, mut skip_count, mut error_count) = (0, 0, 0);

        for file in &files {
            if self.cancel.is_cancelled() {
                warn!("Cancelled, {} file(s) left untouched", files.len() - outcomes.len());
                break;
            }

            let file_name = file.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default();
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = file.parent().map_or_else(|| input_dir.clone(), Path::to_path_buf);
            match self.run_with_progress(file, &output_dir, &multi_progress, force_overwrite).await {
                Ok(outcome) => {
                    match outcome {
                        FileOutcome::Translated { .. } => success_count += 1,
                        FileOutcome::Skipped(_) => skip_count += 1,
                        FileOutcome::Cancelled(_) => {}
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors - Duration: {}",
            success_count,
            skip_count,
            error_count,
            Self::format_duration(start_time.elapsed())
        );
        info!("{}", summary);

        if error_count > 0 {
            let log_path = input_dir.join(ISSUES_LOG_FILENAME);
            if let Err(e) = FileManager::append_to_log_file(&log_path, &summary) {
                warn!("Failed to write folder summary to {:?}: {}", log_path, e);
            }
        }

        Ok(outcomes)
    }

    /// Strip markup from a document, writing the clean text and its format map.
    /// Returns `(clean_path, format_map_path)`.
    pub fn optimize_file(input_file: &Path, force_overwrite: bool) -> Result<(PathBuf, PathBuf)> {
        let dir = input_file.parent().unwrap_or(Path::new("."));
        let clean_path = FileManager::generate_output_path(input_file, dir, "clean", SUBTITLE_EXTENSION);
        let map_path = FileManager::format_map_path(input_file);

        if !force_overwrite && (clean_path.exists() || map_path.exists()) {
            return Err(anyhow!("{:?} already exists (use -f to force overwrite)", clean_path));
        }

        let document = FileManager::read_to_string(input_file)?;
        let (clean, format_map) = subtitle_processor::optimize(&document);

        FileManager::write_to_file(&clean_path, &clean)?;
        FileManager::write_to_file(&map_path, &format_map.to_json()?)?;

        info!("Stored markup of {} cue(s) in {}", format_map.len(), map_path.display());
        Ok((clean_path, map_path))
    }

    /// Reapply markup from a format map to a translated document
    pub fn restore_file(translated_file: &Path, format_map_file: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
        let document = FileManager::read_to_string(translated_file)?;
        let format_map = FormatMap::from_json(&FileManager::read_to_string(format_map_file)?)
            .with_context(|| format!("Invalid format map: {:?}", format_map_file))?;

        let output_path = output.unwrap_or_else(|| {
            let dir = translated_file.parent().unwrap_or(Path::new("."));
            FileManager::generate_output_path(translated_file, dir, "restored", SUBTITLE_EXTENSION)
        });

        FileManager::write_to_file(&output_path, &subtitle_processor::restore(&document, &format_map))?;
        info!("Success: {}", output_path.display());
        Ok(output_path)
    }

    /// Output filename: the source language suffix is replaced by the target
    /// one (`movie.en.srt` → `movie.fr.srt`), otherwise the target is appended.
    pub fn get_subtitle_output_filename(&self, input_file: &Path) -> Result<String> {
        let target = language_utils::normalize_to_part1_or_part2t(&self.config.target_language)?;
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());

        let base = match stem.rsplit_once('.') {
            Some((base, code)) if language_utils::get_language_name(code).is_ok() => base.to_string(),
            _ => stem,
        };

        Ok(format!("{}.{}.{}", base, target, SUBTITLE_EXTENSION))
    }

    fn is_target_language_file(&self, path: &Path) -> bool {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .and_then(|stem| stem.rsplit_once('.').map(|(_, code)| code.to_string()))
            .is_some_and(|code| language_utils::language_codes_match(&code, &self.config.target_language))
    }

    fn write_issues(&self, input_file: &Path, output_dir: &Path, report: &TranslationReport) {
        let log_path = output_dir.join(ISSUES_LOG_FILENAME);
        let mut lines = vec![format!(
            "{} ({} → {}, {}): {}",
            input_file.display(),
            self.config.source_language,
            self.config.target_language,
            self.config.translation.provider.model,
            report
        )];

        for failure in &report.failures {
            lines.push(format!(
                "  chunk {} (cues {:?}): {}",
                failure.chunk_index, failure.cue_indices, failure.error
            ));
        }
        if !report.empty_slots.is_empty() {
            lines.push(format!("  empty translation for cues {:?}", report.empty_slots));
        }

        match FileManager::append_to_log_file(&log_path, &lines.join("\n")) {
            Ok(()) => warn!("{} cue(s) left untranslated, see {}", report.untranslated_cues().len(), log_path.display()),
            Err(e) => warn!("Failed to write issues to {:?}: {}", log_path, e),
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
