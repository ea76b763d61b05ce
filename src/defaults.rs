//! Default configuration constants for voxnote.
//!
//! This module provides shared constants used across the pipeline stages
//! to ensure consistency and eliminate duplication.

/// Base URL for the OpenAI REST API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default speech-to-text model.
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Default text-rewrite model.
pub const CLEANUP_MODEL: &str = "gpt-4-turbo-preview";

/// Upload ceiling enforced by the Whisper API.
///
/// Files larger than this are rejected locally, before any network call.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Total transcription attempts per recording, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base retry delay in seconds.
///
/// Rate-limit failures back off exponentially (`base * 2^(attempt-1)`),
/// connection failures linearly (`base * attempt`).
pub const RETRY_BASE_SECS: u64 = 2;

/// Whisper API pricing in USD per minute of audio.
pub const WHISPER_RATE_PER_MINUTE: f64 = 0.006;

/// Rewrite model input pricing in USD per 1K tokens.
pub const REWRITE_INPUT_RATE: f64 = 0.01;

/// Rewrite model output pricing in USD per 1K tokens.
///
/// The estimate assumes the rewritten text is about as long as the input.
pub const REWRITE_OUTPUT_RATE: f64 = 0.03;

/// Rough token estimation divisor: one token per ~4 characters.
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// Assumed speaking rate, used only for pre-run cost estimation.
pub const WORDS_PER_MINUTE: f64 = 150.0;

/// Assumed average word length including trailing space.
pub const CHARS_PER_WORD: f64 = 6.0;

/// Sampling temperature for the rewrite call. Low for consistent formatting.
pub const REWRITE_TEMPERATURE: f64 = 0.3;

/// Completion token cap for the rewrite call.
pub const REWRITE_MAX_TOKENS: u32 = 4000;

/// Subfolder inside the vault that receives generated notes.
pub const DEFAULT_OUTPUT_FOLDER: &str = "Voice Notes";

/// Default filename pattern for generated notes.
pub const DEFAULT_FILENAME_PATTERN: &str = "{date}-{time}-voice-note";

/// Fallback filename when a pattern expands to an empty string.
pub const DEFAULT_NOTE_NAME: &str = "voice-note.md";

/// Extension appended to generated filenames when absent.
pub const NOTE_EXTENSION: &str = ".md";

/// Collision-probe ceiling for the vault writer.
///
/// Guards against pathological collision storms or a templating bug
/// producing the same name forever.
pub const MAX_COLLISION_PROBES: u32 = 1000;

/// Audio extensions the pipeline expects.
///
/// Advisory only: an unknown extension logs a warning, decodability is the
/// real gate.
pub const KNOWN_AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "wav", "flac", "ogg"];

/// Default English filler words removed by the deterministic cleanup pass.
pub fn default_filler_words() -> Vec<String> {
    ["um", "uh", "like", "you know", "sort of", "kind of"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Default Chinese filler words.
///
/// Matched with the same literal word-boundary semantics as the English set.
pub fn default_filler_words_chinese() -> Vec<String> {
    ["嗯", "呃", "那个", "就是说", "然后"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_ceiling_is_25_mb() {
        assert_eq!(MAX_UPLOAD_BYTES, 26_214_400);
    }

    #[test]
    fn default_filler_lists_are_not_empty() {
        assert!(!default_filler_words().is_empty());
        assert!(!default_filler_words_chinese().is_empty());
    }
}
