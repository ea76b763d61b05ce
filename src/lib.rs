//! voxnote - Voice recordings into Obsidian notes
//!
//! Transcribes audio with the OpenAI Whisper API, cleans the transcript
//! with a filler-word pass plus an LLM rewrite, and writes Markdown notes
//! with YAML frontmatter into an Obsidian vault.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod transcribe;
pub mod writer;

// Stage seams (transcribe → clean → format → write)
pub use cleanup::{Aggressiveness, Cleaner, RewriteClient};
pub use transcribe::{TranscribeClient, Transcriber};
pub use writer::NoteWriter;

// Pipeline
pub use pipeline::{BatchSummary, Pipeline, ProcessingOutcome};

// Error handling
pub use error::{RemoteError, Result, VoxnoteError};

// Config
pub use config::Config;
