//! Audio file validation and metadata extraction.
//!
//! A [`Recording`] is immutable once probed. WAV metadata is read directly
//! with hound; every other container goes through `ffprobe`, so decodability
//! is the real gate — the extension check is advisory only.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::defaults;
use crate::error::{Result, VoxnoteError};

/// One input recording and its derived metadata.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub channels: u16,
    pub sample_rate: u32,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
}

impl Recording {
    /// Probe an audio file, validating it and extracting metadata.
    ///
    /// Fails with `InvalidMedia` when the file is missing, not a regular
    /// file, empty, or cannot be decoded.
    pub fn probe(path: &Path) -> Result<Self> {
        let invalid = |message: String| VoxnoteError::InvalidMedia {
            path: path.display().to_string(),
            message,
        };

        if !path.exists() {
            return Err(invalid("file not found".to_string()));
        }
        if !path.is_file() {
            return Err(invalid("path is not a file".to_string()));
        }

        let meta = fs::metadata(path).map_err(|e| invalid(format!("cannot stat file: {e}")))?;
        let size_bytes = meta.len();
        if size_bytes == 0 {
            return Err(invalid("file is empty".to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some(ext) if defaults::KNOWN_AUDIO_EXTENSIONS.contains(&ext) => {}
            other => {
                tracing::warn!(
                    path = %path.display(),
                    extension = other.unwrap_or("(none)"),
                    "unexpected audio extension, attempting to decode anyway"
                );
            }
        }

        let (duration_seconds, channels, sample_rate) = if extension.as_deref() == Some("wav") {
            probe_wav(path)?
        } else {
            probe_ffprobe(path)?
        };

        let modified = meta
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());

        let recording = Self {
            path: path.to_path_buf(),
            duration_seconds,
            channels,
            sample_rate,
            size_bytes,
            modified,
        };

        tracing::info!(
            file = %recording.file_name(),
            duration = %recording.duration_formatted(),
            size = %recording.size_formatted(),
            "loaded audio file"
        );

        Ok(recording)
    }

    /// File name component of the path, for logging and error attribution.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }

    pub fn duration_formatted(&self) -> String {
        format_duration(self.duration_seconds)
    }

    pub fn size_formatted(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Read duration and format characteristics from a WAV header.
fn probe_wav(path: &Path) -> Result<(f64, u16, u32)> {
    let reader = hound::WavReader::open(path).map_err(|e| VoxnoteError::InvalidMedia {
        path: path.display().to_string(),
        message: format!("could not decode WAV file: {e}"),
    })?;
    let spec = reader.spec();
    let duration = reader.duration() as f64 / spec.sample_rate as f64;
    Ok((duration, spec.channels, spec.sample_rate))
}

/// Probe a non-WAV container with ffprobe.
///
/// Parses the JSON report for duration plus the first audio stream's
/// channel count and sample rate.
fn probe_ffprobe(path: &Path) -> Result<(f64, u16, u32)> {
    let invalid = |message: String| VoxnoteError::InvalidMedia {
        path: path.display().to_string(),
        message,
    };

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| {
            invalid(format!(
                "failed to run ffprobe: {e}. Ensure ffmpeg is installed."
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(invalid(format!(
            "could not decode audio file: {}",
            stderr.trim()
        )));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| invalid(format!("unreadable ffprobe output: {e}")))?;

    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| invalid("ffprobe reported no duration".to_string()))?;

    let audio_stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| {
            streams.iter().find(|s| {
                s.get("codec_type").and_then(|t| t.as_str()) == Some("audio")
            })
        });

    let channels = audio_stream
        .and_then(|s| s.get("channels"))
        .and_then(|c| c.as_u64())
        .unwrap_or(1) as u16;
    let sample_rate = audio_stream
        .and_then(|s| s.get("sample_rate"))
        .and_then(|r| r.as_str())
        .and_then(|r| r.parse::<u32>().ok())
        .unwrap_or(0);

    Ok((duration, channels, sample_rate))
}

/// Load a batch of recordings, collecting per-file failures.
///
/// An invalid file never enters the pipeline; it is reported alongside the
/// recordings that did load.
pub fn load_recordings(paths: &[PathBuf]) -> (Vec<Recording>, Vec<(PathBuf, String)>) {
    let mut recordings = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        match Recording::probe(path) {
            Ok(recording) => recordings.push(recording),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load audio file");
                failures.push((path.clone(), e.to_string()));
            }
        }
    }

    if !failures.is_empty() {
        tracing::warn!(
            failed = failures.len(),
            total = paths.len(),
            "some audio files could not be loaded"
        );
    }

    (recordings, failures)
}

/// Aggregate statistics over a loaded batch, for the pre-run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSummary {
    pub count: usize,
    pub total_duration_seconds: f64,
    pub total_size_bytes: u64,
}

impl QueueSummary {
    pub fn new(recordings: &[Recording]) -> Self {
        Self {
            count: recordings.len(),
            total_duration_seconds: recordings.iter().map(|r| r.duration_seconds).sum(),
            total_size_bytes: recordings.iter().map(|r| r.size_bytes).sum(),
        }
    }

    pub fn total_duration_formatted(&self) -> String {
        format_duration(self.total_duration_seconds)
    }

    pub fn total_size_formatted(&self) -> String {
        format_size(self.total_size_bytes)
    }
}

/// Format a duration as `"1h 2m 30s"`, `"5m 23s"` or `"42s"`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Format a byte count with a fixed unit ladder: bytes below 1024,
/// KB below 1024², MB above.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;

    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / MB)
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / KB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_wav(path: &Path, seconds: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for _ in 0..(16000 * seconds) {
            writer.write_sample(0i16).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn probe_missing_file_fails() {
        let err = Recording::probe(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, VoxnoteError::InvalidMedia { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn probe_empty_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.wav");
        fs::File::create(&path).expect("create");

        let err = Recording::probe(&path).unwrap_err();
        assert!(err.to_string().contains("file is empty"));
    }

    #[test]
    fn probe_undecodable_wav_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.wav");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(b"definitely not audio").expect("write");

        let err = Recording::probe(&path).unwrap_err();
        assert!(matches!(err, VoxnoteError::InvalidMedia { .. }));
        assert!(err.to_string().contains("could not decode"));
    }

    #[test]
    fn probe_valid_wav_extracts_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.wav");
        write_test_wav(&path, 2);

        let recording = Recording::probe(&path).expect("probe");
        assert!((recording.duration_seconds - 2.0).abs() < 0.01);
        assert_eq!(recording.channels, 1);
        assert_eq!(recording.sample_rate, 16000);
        assert!(recording.size_bytes > 0);
        assert_eq!(recording.file_name(), "clip.wav");
        assert_eq!(recording.stem(), "clip");
    }

    #[test]
    fn load_recordings_reports_failures_without_aborting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.wav");
        write_test_wav(&good, 1);
        let bad = dir.path().join("missing.wav");

        let (recordings, failures) = load_recordings(&[good.clone(), bad.clone()]);
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].path, good);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, bad);
    }

    #[test]
    fn format_duration_uses_unit_ladder() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(323.0), "5m 23s");
        assert_eq!(format_duration(3750.0), "1h 2m 30s");
    }

    #[test]
    fn format_size_uses_unit_ladder() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(535_000), "522.46 KB");
        assert_eq!(format_size(5_484_052), "5.23 MB");
    }

    #[test]
    fn queue_summary_totals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_test_wav(&a, 1);
        write_test_wav(&b, 2);

        let (recordings, _) = load_recordings(&[a, b]);
        let summary = QueueSummary::new(&recordings);
        assert_eq!(summary.count, 2);
        assert!((summary.total_duration_seconds - 3.0).abs() < 0.01);
        assert!(summary.total_size_bytes > 0);
    }
}
