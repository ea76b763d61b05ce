//! Transcription stage: the OpenAI Whisper API behind a client trait,
//! wrapped with upload validation and retry/backoff policy.

use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;

use crate::audio::Recording;
use crate::defaults;
use crate::error::{RemoteError, Result, VoxnoteError};

/// Remote speech-to-text operation.
///
/// This trait allows swapping implementations (real API vs mock).
#[async_trait]
pub trait TranscribeClient: Send + Sync {
    /// Send audio bytes for transcription and return the raw text.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: Option<&str>,
    ) -> std::result::Result<String, RemoteError>;
}

/// Implement TranscribeClient for Arc<T> so tests can keep a handle
/// to a mock while the pipeline owns it.
#[async_trait]
impl<T: TranscribeClient> TranscribeClient for std::sync::Arc<T> {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: Option<&str>,
    ) -> std::result::Result<String, RemoteError> {
        (**self).transcribe(audio, file_name, language).await
    }
}

/// Whisper API client.
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: defaults::OPENAI_BASE_URL.to_string(),
            model,
        }
    }
}

#[async_trait]
impl TranscribeClient for OpenAiTranscriber {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: Option<&str>,
    ) -> std::result::Result<String, RemoteError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| RemoteError::Unexpected {
                message: format!("mime: {e}"),
            })?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        tracing::debug!(model = %self.model, file = file_name, "sending audio to Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(RemoteError::from_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::RateLimited { message: body });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RemoteError::Api {
                message: format!("status {status}: {body}"),
            });
        }

        response.text().await.map_err(|e| RemoteError::Unexpected {
            message: format!("body: {e}"),
        })
    }
}

/// The transcription stage: size gate + retry policy around a client.
pub struct Transcriber<C> {
    client: C,
    language: Option<String>,
}

impl<C: TranscribeClient> Transcriber<C> {
    pub fn new(client: C, language: Option<String>) -> Self {
        Self { client, language }
    }

    /// Reject files over the API upload ceiling.
    ///
    /// Local, synchronous check: no network call is made for an oversize
    /// file and the failure is not a retry case.
    pub fn validate_size(&self, recording: &Recording) -> Result<()> {
        if recording.size_bytes > defaults::MAX_UPLOAD_BYTES {
            let size_mb = recording.size_bytes as f64 / (1024.0 * 1024.0);
            return Err(VoxnoteError::Transcription {
                message: format!(
                    "{} is {size_mb:.2} MB, which exceeds the 25 MB API limit. \
                     Use a shorter recording or compress the file.",
                    recording.file_name()
                ),
            });
        }
        Ok(())
    }

    /// Transcribe one recording, retrying transient failures.
    ///
    /// Up to 3 attempts total. Rate limits back off exponentially
    /// (2s, 4s), connection failures linearly (2s, 4s — base * attempt).
    /// API errors, unexpected errors and empty transcripts are fatal
    /// immediately.
    pub async fn transcribe(&self, recording: &Recording) -> Result<String> {
        self.validate_size(recording)?;

        let file_name = recording.file_name();
        let audio = tokio::fs::read(&recording.path)
            .await
            .map_err(|e| VoxnoteError::Transcription {
                message: format!("could not read {file_name}: {e}"),
            })?;

        for attempt in 1..=defaults::MAX_ATTEMPTS {
            tracing::debug!(file = %file_name, attempt, "transcription attempt");

            match self
                .client
                .transcribe(audio.clone(), &file_name, self.language.as_deref())
                .await
            {
                Ok(raw) => {
                    let text = raw.trim();
                    if text.is_empty() {
                        // Content failure, not a transient one — never retried
                        return Err(VoxnoteError::Transcription {
                            message: "transcription returned empty text".to_string(),
                        });
                    }
                    tracing::info!(
                        file = %file_name,
                        words = text.split_whitespace().count(),
                        attempt,
                        "transcription succeeded"
                    );
                    return Ok(text.to_string());
                }
                Err(RemoteError::RateLimited { .. }) if attempt < defaults::MAX_ATTEMPTS => {
                    let delay = defaults::RETRY_BASE_SECS * 2u64.pow(attempt - 1);
                    tracing::warn!(
                        file = %file_name,
                        attempt,
                        delay_secs = delay,
                        "rate limit hit, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
                Err(RemoteError::Connection { .. }) if attempt < defaults::MAX_ATTEMPTS => {
                    let delay = defaults::RETRY_BASE_SECS * attempt as u64;
                    tracing::warn!(
                        file = %file_name,
                        attempt,
                        delay_secs = delay,
                        "connection error, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
                Err(RemoteError::RateLimited { .. }) => {
                    return Err(VoxnoteError::Transcription {
                        message: format!(
                            "rate limit exceeded after {} attempts. Please try again later.",
                            defaults::MAX_ATTEMPTS
                        ),
                    });
                }
                Err(RemoteError::Connection { .. }) => {
                    return Err(VoxnoteError::Transcription {
                        message: format!(
                            "connection failed after {} attempts. \
                             Please check your internet connection.",
                            defaults::MAX_ATTEMPTS
                        ),
                    });
                }
                Err(e) => {
                    return Err(VoxnoteError::Transcription {
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(VoxnoteError::Transcription {
            message: "transcription failed after all retry attempts".to_string(),
        })
    }
}

/// Estimated transcription cost in USD for a recording duration.
///
/// Advisory only; never gates execution.
pub fn estimate_cost(duration_seconds: f64) -> f64 {
    duration_seconds / 60.0 * defaults::WHISPER_RATE_PER_MINUTE
}

/// Mock transcription client for testing.
///
/// Returns scripted responses in order; once exhausted, repeats the default.
pub struct MockTranscribeClient {
    responses: std::sync::Mutex<std::collections::VecDeque<std::result::Result<String, RemoteError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockTranscribeClient {
    pub fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Queue a successful response.
    pub fn with_response(self, text: &str) -> Self {
        self.push(Ok(text.to_string()));
        self
    }

    /// Queue a failure.
    pub fn with_failure(self, error: RemoteError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, response: std::result::Result<String, RemoteError>) {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(response);
    }

    /// Number of transcribe calls issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Default for MockTranscribeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscribeClient for MockTranscribeClient {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        _file_name: &str,
        _language: Option<&str>,
    ) -> std::result::Result<String, RemoteError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok("mock transcription".to_string()))
    }
}
