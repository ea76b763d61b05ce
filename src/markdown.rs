//! Markdown document formatting: YAML frontmatter, combined-note
//! composition and filename templating.

use chrono::{DateTime, Local};
use std::path::Path;

use crate::audio::Recording;
use crate::defaults;

/// Metadata carried into a single note's frontmatter and filename.
#[derive(Debug, Clone, Default)]
pub struct NoteMetadata {
    pub created: Option<DateTime<Local>>,
    pub source: Option<String>,
    pub processed: Option<DateTime<Local>>,
    pub duration: Option<String>,
    /// Remaining keys, emitted after the fixed ones in insertion order.
    pub extra: Vec<(String, String)>,
}

impl NoteMetadata {
    /// Metadata for one recording: creation time comes from the file's
    /// modification timestamp, processing time from the clock.
    pub fn for_recording(recording: &Recording) -> Self {
        Self {
            created: Some(recording.modified),
            source: Some(recording.file_name()),
            processed: Some(Local::now()),
            duration: Some(recording.duration_formatted()),
            extra: Vec::new(),
        }
    }
}

/// One section of a combined note.
#[derive(Debug, Clone)]
pub struct CombinedSection {
    pub source: String,
    pub text: String,
    pub recorded_at: Option<DateTime<Local>>,
    pub duration: Option<String>,
}

/// Aggregate metadata for a combined note.
#[derive(Debug, Clone, Default)]
pub struct CombinedMetadata {
    pub created: Option<DateTime<Local>>,
    pub processed: Option<DateTime<Local>>,
    pub sources: Vec<String>,
    pub total_duration: String,
    pub recordings: usize,
}

fn iso(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Format a cleaned transcript as a complete Markdown document:
/// frontmatter, blank line, trimmed body, trailing newline.
pub fn format_note(text: &str, metadata: &NoteMetadata) -> String {
    let mut lines = vec!["---".to_string()];

    if let Some(created) = &metadata.created {
        lines.push(format!("created: {}", iso(created)));
    }
    if let Some(source) = &metadata.source {
        lines.push(format!("source: {source}"));
    }
    let processed = metadata.processed.unwrap_or_else(Local::now);
    lines.push(format!("processed: {}", iso(&processed)));
    if let Some(duration) = &metadata.duration {
        lines.push(format!("duration: {duration}"));
    }
    for (key, value) in &metadata.extra {
        lines.push(format!("{key}: {value}"));
    }

    lines.push("---".to_string());

    format!("{}\n\n{}\n", lines.join("\n"), text.trim())
}

/// Format multiple cleaned transcripts as one combined document.
///
/// One frontmatter block listing all sources, then a level-2 heading per
/// recording with an italic metadata line (timestamp and duration joined by
/// a middle dot, omitted when neither is present).
pub fn format_combined(sections: &[CombinedSection], metadata: &CombinedMetadata) -> String {
    let mut lines = vec!["---".to_string()];

    if let Some(created) = &metadata.created {
        lines.push(format!("created: {}", iso(created)));
    }
    let processed = metadata.processed.unwrap_or_else(Local::now);
    lines.push(format!("processed: {}", iso(&processed)));
    lines.push("sources:".to_string());
    for source in &metadata.sources {
        lines.push(format!("  - {source}"));
    }
    lines.push(format!("total_duration: {}", metadata.total_duration));
    lines.push(format!("recordings: {}", metadata.recordings));
    lines.push("---".to_string());

    let mut rendered = Vec::with_capacity(sections.len());
    for (index, section) in sections.iter().enumerate() {
        let mut block = format!("## Recording {}: {}\n", index + 1, section.source);

        let mut parts = Vec::new();
        if let Some(recorded_at) = &section.recorded_at {
            parts.push(recorded_at.format("%Y-%m-%d %H:%M").to_string());
        }
        if let Some(duration) = &section.duration {
            parts.push(duration.clone());
        }
        if !parts.is_empty() {
            block.push_str(&format!("*{}*\n", parts.join(" · ")));
        }

        block.push('\n');
        block.push_str(section.text.trim());
        rendered.push(block);
    }

    format!("{}\n\n{}\n", lines.join("\n"), rendered.join("\n\n"))
}

/// Generate a note filename from a pattern.
///
/// The placeholder set is closed: `{date}`, `{time}`, `{datetime}`,
/// `{year}`, `{month}`, `{day}`, `{hour}`, `{minute}`, `{second}`,
/// `{original_name}`, `{original_filename}`. Substitution is literal — no
/// expression evaluation. The reference timestamp is the metadata's
/// `created` time, or now when absent, so generation is idempotent for a
/// fixed timestamp.
pub fn generate_filename(pattern: &str, metadata: &NoteMetadata) -> String {
    let dt = metadata.created.unwrap_or_else(Local::now);

    let mut replacements: Vec<(&str, String)> = vec![
        ("{date}", dt.format("%Y-%m-%d").to_string()),
        ("{time}", dt.format("%H%M%S").to_string()),
        ("{datetime}", dt.format("%Y-%m-%d-%H%M%S").to_string()),
        ("{year}", dt.format("%Y").to_string()),
        ("{month}", dt.format("%m").to_string()),
        ("{day}", dt.format("%d").to_string()),
        ("{hour}", dt.format("%H").to_string()),
        ("{minute}", dt.format("%M").to_string()),
        ("{second}", dt.format("%S").to_string()),
    ];

    if let Some(source) = &metadata.source {
        let source_path = Path::new(source);
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = source_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        replacements.push(("{original_name}", stem));
        replacements.push(("{original_filename}", name));
    }

    let mut filename = pattern.to_string();
    for (placeholder, value) in &replacements {
        filename = filename.replace(placeholder, value);
    }

    if !filename.ends_with(defaults::NOTE_EXTENSION) {
        filename.push_str(defaults::NOTE_EXTENSION);
    }

    sanitize_filename(&filename)
}

/// Replace filesystem-hostile characters, strip leading/trailing dots and
/// spaces, and fall back to a fixed name when nothing is left.
fn sanitize_filename(filename: &str) -> String {
    let replaced: String = filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');

    if trimmed.is_empty() {
        defaults::DEFAULT_NOTE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).single().expect("valid time")
    }

    fn metadata() -> NoteMetadata {
        NoteMetadata {
            created: Some(fixed_time()),
            source: Some("a.m4a".to_string()),
            processed: Some(fixed_time()),
            duration: Some("1m 0s".to_string()),
            extra: Vec::new(),
        }
    }

    #[test]
    fn note_has_frontmatter_then_blank_line_then_body() {
        let doc = format_note("  Hello there.  ", &metadata());
        assert!(doc.starts_with("---\n"));
        assert!(doc.contains("created: 2024-03-15T14:30:05\n"));
        assert!(doc.contains("source: a.m4a\n"));
        assert!(doc.contains("processed: 2024-03-15T14:30:05\n"));
        assert!(doc.contains("duration: 1m 0s\n"));
        assert!(doc.contains("---\n\nHello there.\n"));
    }

    #[test]
    fn frontmatter_keys_keep_fixed_order() {
        let mut meta = metadata();
        meta.extra.push(("tags".to_string(), "voice".to_string()));
        let doc = format_note("body", &meta);

        let created = doc.find("created:").expect("created");
        let source = doc.find("source:").expect("source");
        let processed = doc.find("processed:").expect("processed");
        let duration = doc.find("duration:").expect("duration");
        let tags = doc.find("tags:").expect("tags");
        assert!(created < source && source < processed && processed < duration && duration < tags);
    }

    #[test]
    fn note_without_created_or_duration_omits_those_keys() {
        let meta = NoteMetadata {
            processed: Some(fixed_time()),
            ..Default::default()
        };
        let doc = format_note("body", &meta);
        assert!(!doc.contains("created:"));
        assert!(!doc.contains("duration:"));
        assert!(doc.contains("processed:"));
    }

    #[test]
    fn combined_note_lists_sources_and_sections() {
        let meta = CombinedMetadata {
            created: Some(fixed_time()),
            processed: Some(fixed_time()),
            sources: vec!["a.m4a".to_string(), "b.m4a".to_string()],
            total_duration: "3m 0s".to_string(),
            recordings: 2,
        };
        let sections = vec![
            CombinedSection {
                source: "a.m4a".to_string(),
                text: "First part.".to_string(),
                recorded_at: Some(fixed_time()),
                duration: Some("1m 0s".to_string()),
            },
            CombinedSection {
                source: "b.m4a".to_string(),
                text: "Second part.".to_string(),
                recorded_at: None,
                duration: None,
            },
        ];

        let doc = format_combined(&sections, &meta);
        assert!(doc.contains("sources:\n  - a.m4a\n  - b.m4a\n"));
        assert!(doc.contains("total_duration: 3m 0s\n"));
        assert!(doc.contains("recordings: 2\n"));
        assert!(doc.contains("## Recording 1: a.m4a\n*2024-03-15 14:30 · 1m 0s*\n\nFirst part."));
        // No metadata line when neither timestamp nor duration is present
        assert!(doc.contains("## Recording 2: b.m4a\n\nSecond part."));
    }

    #[test]
    fn filename_expands_all_placeholders() {
        let name = generate_filename("{date}-{time}-{original_name}", &metadata());
        assert_eq!(name, "2024-03-15-143005-a.md");

        let name = generate_filename("{year}/{month}/{day}", &metadata());
        // Path separators are sanitized, not treated as directories
        assert_eq!(name, "2024_03_15.md");
    }

    #[test]
    fn filename_generation_is_idempotent_for_fixed_timestamp() {
        let first = generate_filename("{date}-{time}-voice-note", &metadata());
        let second = generate_filename("{date}-{time}-voice-note", &metadata());
        assert_eq!(first, second);
        assert_eq!(first, "2024-03-15-143005-voice-note.md");
    }

    #[test]
    fn filename_keeps_existing_extension() {
        let name = generate_filename("note.md", &metadata());
        assert_eq!(name, "note.md");
    }

    #[test]
    fn filename_sanitizes_invalid_characters() {
        let name = generate_filename("a<b>c:d\"e|f?g*h", &metadata());
        assert_eq!(name, "a_b_c_d_e_f_g_h.md");
    }

    #[test]
    fn sanitize_falls_back_when_nothing_is_left() {
        assert_eq!(sanitize_filename(" ... "), "voice-note.md");
        assert_eq!(sanitize_filename(""), "voice-note.md");
        assert_eq!(sanitize_filename(".hidden.md"), "hidden.md");
    }
}
