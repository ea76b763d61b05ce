//! Pipeline orchestration: sequences the stages over a batch of
//! recordings, contains per-item failures, and aggregates results.
//!
//! Items are processed one at a time, in input order. A failing item never
//! aborts the batch; its error is converted into a failed outcome at this
//! boundary and processing moves on.

use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;

use crate::audio::{self, Recording};
use crate::cleanup::{self, Aggressiveness, Cleaner, OpenAiRewriter, RewriteClient};
use crate::config::Config;
use crate::error::{Result, VoxnoteError};
use crate::markdown::{self, CombinedMetadata, CombinedSection, NoteMetadata};
use crate::transcribe::{self, OpenAiTranscriber, TranscribeClient, Transcriber};
use crate::writer::NoteWriter;

/// Result of processing one recording (or one combined batch).
///
/// Created when processing starts, finalized exactly once, never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    /// Identity of the input, for display and error attribution.
    pub file_name: String,
    pub succeeded: bool,
    pub output_path: Option<PathBuf>,
    pub failure: Option<String>,
    pub text_length: usize,
    pub elapsed_seconds: f64,
}

impl ProcessingOutcome {
    fn success(file_name: String, output_path: PathBuf, text_length: usize, elapsed_seconds: f64) -> Self {
        Self {
            file_name,
            succeeded: true,
            output_path: Some(output_path),
            failure: None,
            text_length,
            elapsed_seconds,
        }
    }

    fn failure(file_name: String, reason: String, elapsed_seconds: f64) -> Self {
        Self {
            file_name,
            succeeded: false,
            output_path: None,
            failure: Some(reason),
            text_length: 0,
            elapsed_seconds,
        }
    }
}

/// Pre-run cost estimate in USD. Advisory only — it feeds the user
/// confirmation prompt and never blocks execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub transcription: f64,
    pub cleanup: f64,
    pub total: f64,
}

/// Aggregate statistics over a finished batch, order-preserving.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_seconds: f64,
    pub average_seconds: f64,
    pub total_characters: usize,
    pub output_paths: Vec<PathBuf>,
    /// (file name, failure reason) per failed item, in input order.
    pub failures: Vec<(String, String)>,
}

/// The orchestrator. Generic over the two remote clients so tests can run
/// the full workflow against mocks.
pub struct Pipeline<T, R> {
    transcriber: Transcriber<T>,
    cleaner: Cleaner<R>,
    writer: NoteWriter,
    filename_pattern: String,
}

impl Pipeline<OpenAiTranscriber, OpenAiRewriter> {
    /// Build the production pipeline from validated configuration.
    pub fn from_config(config: &Config, api_key: &str) -> Result<Self> {
        let vault = config
            .vault
            .path
            .as_ref()
            .ok_or_else(|| VoxnoteError::ConfigValidation {
                message: "vault path not configured".to_string(),
            })?;

        let level = Aggressiveness::parse(&config.processing.aggressiveness)?;

        let transcriber = Transcriber::new(
            OpenAiTranscriber::new(api_key.to_string(), config.transcription.model.clone()),
            config.transcription.language.clone(),
        );
        let cleaner = Cleaner::new(
            OpenAiRewriter::new(api_key.to_string(), config.cleanup.model.clone()),
            level,
            config.filler_words(),
        );
        let writer = NoteWriter::new(vault, &config.vault.output_folder);

        Ok(Self::new(
            transcriber,
            cleaner,
            writer,
            config.vault.filename_pattern.clone(),
        ))
    }
}

impl<T: TranscribeClient, R: RewriteClient> Pipeline<T, R> {
    pub fn new(
        transcriber: Transcriber<T>,
        cleaner: Cleaner<R>,
        writer: NoteWriter,
        filename_pattern: String,
    ) -> Self {
        Self {
            transcriber,
            cleaner,
            writer,
            filename_pattern,
        }
    }

    /// Process one recording through the complete workflow.
    ///
    /// Domain errors become failed outcomes with the error's message;
    /// anything else is contained the same way but tagged as unexpected.
    pub async fn process_one(&self, recording: &Recording) -> ProcessingOutcome {
        let start = Instant::now();
        let file_name = recording.file_name();
        tracing::info!(file = %file_name, "processing recording");

        match self.run_stages(recording).await {
            Ok((output_path, text_length)) => {
                let elapsed = start.elapsed().as_secs_f64();
                tracing::info!(
                    file = %file_name,
                    output = %output_path.display(),
                    elapsed_secs = format!("{elapsed:.1}"),
                    "successfully processed"
                );
                ProcessingOutcome::success(file_name, output_path, text_length, elapsed)
            }
            Err(e) => {
                let reason = if e.is_domain_error() {
                    e.to_string()
                } else {
                    format!("Unexpected error: {e}")
                };
                tracing::error!(file = %file_name, error = %reason, "failed to process");
                ProcessingOutcome::failure(file_name, reason, start.elapsed().as_secs_f64())
            }
        }
    }

    /// The fixed per-item stage sequence.
    async fn run_stages(&self, recording: &Recording) -> Result<(PathBuf, usize)> {
        // Size gate + transcription (retry policy lives in the stage)
        tracing::info!(file = %recording.file_name(), "[1/4] transcribing");
        let raw_transcript = self.transcriber.transcribe(recording).await?;

        tracing::info!(file = %recording.file_name(), "[2/4] cleaning text");
        let cleaned = self.cleaner.clean(&raw_transcript).await?;

        let metadata = NoteMetadata::for_recording(recording);

        tracing::info!(file = %recording.file_name(), "[3/4] formatting markdown");
        let document = markdown::format_note(&cleaned, &metadata);
        let filename = markdown::generate_filename(&self.filename_pattern, &metadata);

        tracing::info!(file = %recording.file_name(), "[4/4] writing note");
        let output_path = self.writer.write(&document, &filename)?;

        Ok((output_path, cleaned.chars().count()))
    }

    /// Process a batch sequentially, one outcome per input, input order
    /// preserved.
    pub async fn process_batch(&self, recordings: &[Recording]) -> Vec<ProcessingOutcome> {
        let total = recordings.len();
        tracing::info!(total, "processing batch");

        let mut outcomes = Vec::with_capacity(total);
        for (index, recording) in recordings.iter().enumerate() {
            tracing::info!(
                file = %recording.file_name(),
                position = index + 1,
                total,
                "processing file"
            );
            outcomes.push(self.process_one(recording).await);
        }

        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        tracing::info!(succeeded, failed = total - succeeded, "batch complete");

        outcomes
    }

    /// Process a batch into one combined note.
    ///
    /// Each recording is transcribed and cleaned independently; items that
    /// fail are dropped from the document (and never appear in its
    /// sections). Only when every item fails does the combined outcome
    /// fail. Formatting and writing happen once.
    pub async fn process_combined(&self, recordings: &[Recording]) -> ProcessingOutcome {
        let start = Instant::now();
        let identity = format!("combined note ({} recordings)", recordings.len());

        let mut sections = Vec::new();
        let mut survivors: Vec<&Recording> = Vec::new();
        let mut reasons = Vec::new();

        for recording in recordings {
            match self.transcribe_and_clean(recording).await {
                Ok(text) => {
                    sections.push(CombinedSection {
                        source: recording.file_name(),
                        text,
                        recorded_at: Some(recording.modified),
                        duration: Some(recording.duration_formatted()),
                    });
                    survivors.push(recording);
                }
                Err(e) => {
                    tracing::warn!(
                        file = %recording.file_name(),
                        error = %e,
                        "skipping recording in combined note"
                    );
                    reasons.push(format!("{}: {e}", recording.file_name()));
                }
            }
        }

        if survivors.is_empty() {
            let reason = format!(
                "all {} recording(s) failed to process: {}",
                recordings.len(),
                reasons.join("; ")
            );
            return ProcessingOutcome::failure(identity, reason, start.elapsed().as_secs_f64());
        }

        let created = survivors.iter().map(|r| r.modified).min();
        let total_duration: f64 = survivors.iter().map(|r| r.duration_seconds).sum();
        let combined_metadata = CombinedMetadata {
            created,
            processed: Some(Local::now()),
            sources: survivors.iter().map(|r| r.file_name()).collect(),
            total_duration: audio::format_duration(total_duration),
            recordings: survivors.len(),
        };

        let document = markdown::format_combined(&sections, &combined_metadata);
        let text_length: usize = sections.iter().map(|s| s.text.chars().count()).sum();

        let filename_metadata = NoteMetadata {
            created,
            source: survivors.first().map(|r| r.file_name()),
            processed: combined_metadata.processed,
            duration: Some(combined_metadata.total_duration.clone()),
            extra: Vec::new(),
        };
        let filename = markdown::generate_filename(&self.filename_pattern, &filename_metadata);

        match self.writer.write(&document, &filename) {
            Ok(output_path) => {
                ProcessingOutcome::success(identity, output_path, text_length, start.elapsed().as_secs_f64())
            }
            Err(e) => ProcessingOutcome::failure(identity, e.to_string(), start.elapsed().as_secs_f64()),
        }
    }

    async fn transcribe_and_clean(&self, recording: &Recording) -> Result<String> {
        let raw = self.transcriber.transcribe(recording).await?;
        self.cleaner.clean(&raw).await
    }
}

/// Estimate the remote cost of a batch before any network access.
///
/// Transcription cost comes from true durations; cleanup cost from a
/// duration-derived character estimate (~150 words/minute, ~6 chars/word),
/// since no transcript exists yet.
pub fn estimate_cost(recordings: &[Recording]) -> CostEstimate {
    let mut transcription = 0.0;
    let mut cleanup_cost = 0.0;

    for recording in recordings {
        transcription += transcribe::estimate_cost(recording.duration_seconds);

        let estimated_words =
            recording.duration_seconds / 60.0 * crate::defaults::WORDS_PER_MINUTE;
        let estimated_chars = estimated_words * crate::defaults::CHARS_PER_WORD;
        cleanup_cost += cleanup::estimate_cost(estimated_chars as usize);
    }

    CostEstimate {
        transcription,
        cleanup: cleanup_cost,
        total: transcription + cleanup_cost,
    }
}

/// Summarize a finished batch. Outcome order (input order) is preserved in
/// `output_paths` and `failures`.
pub fn summarize(outcomes: &[ProcessingOutcome]) -> BatchSummary {
    let total = outcomes.len();
    let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
    let total_seconds: f64 = outcomes.iter().map(|o| o.elapsed_seconds).sum();

    BatchSummary {
        total,
        succeeded,
        failed: total - succeeded,
        total_seconds,
        average_seconds: if total > 0 {
            total_seconds / total as f64
        } else {
            0.0
        },
        total_characters: outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.text_length)
            .sum(),
        output_paths: outcomes
            .iter()
            .filter_map(|o| o.output_path.clone())
            .collect(),
        failures: outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| {
                (
                    o.file_name.clone(),
                    o.failure.clone().unwrap_or_else(|| "unknown".to_string()),
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::Path;

    fn recording_with_duration(name: &str, duration_seconds: f64) -> Recording {
        Recording {
            path: Path::new("/tmp").join(name),
            duration_seconds,
            channels: 1,
            sample_rate: 16000,
            size_bytes: 1024,
            modified: Local::now(),
        }
    }

    #[test]
    fn cost_estimate_is_monotone_in_total_duration() {
        let short = vec![recording_with_duration("a.m4a", 60.0)];
        let long = vec![
            recording_with_duration("a.m4a", 60.0),
            recording_with_duration("b.m4a", 120.0),
        ];

        let short_cost = estimate_cost(&short);
        let long_cost = estimate_cost(&long);

        assert!(short_cost.total >= 0.0);
        assert!(long_cost.total > short_cost.total);
        assert!((short_cost.total - (short_cost.transcription + short_cost.cleanup)).abs() < 1e-12);
    }

    #[test]
    fn cost_estimate_of_empty_batch_is_zero() {
        let estimate = estimate_cost(&[]);
        assert_eq!(estimate.transcription, 0.0);
        assert_eq!(estimate.cleanup, 0.0);
        assert_eq!(estimate.total, 0.0);
    }

    #[test]
    fn summary_preserves_input_order_and_counts() {
        let outcomes = vec![
            ProcessingOutcome::success("a.m4a".to_string(), "/v/a.md".into(), 100, 1.0),
            ProcessingOutcome::failure("b.m4a".to_string(), "boom".to_string(), 2.0),
            ProcessingOutcome::success("c.m4a".to_string(), "/v/c.md".into(), 50, 3.0),
        ];

        let summary = summarize(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_characters, 150);
        assert!((summary.total_seconds - 6.0).abs() < 1e-9);
        assert!((summary.average_seconds - 2.0).abs() < 1e-9);
        assert_eq!(
            summary.output_paths,
            vec![PathBuf::from("/v/a.md"), PathBuf::from("/v/c.md")]
        );
        assert_eq!(summary.failures, vec![("b.m4a".to_string(), "boom".to_string())]);
    }

    #[test]
    fn summary_of_empty_batch_has_zero_average() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_seconds, 0.0);
    }
}
