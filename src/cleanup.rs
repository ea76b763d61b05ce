//! Text cleanup stage: a deterministic filler-word pass followed by a
//! remote rewrite through a chat-completion model.
//!
//! Both passes always run, in that order. The filler pass is pure and
//! locally testable; the rewrite pass is a single remote call with no
//! retry — one failure is terminal for the item.

use async_trait::async_trait;
use regex::Regex;

use crate::defaults;
use crate::error::{RemoteError, Result, VoxnoteError};

/// How forcefully filler words are stripped before the rewrite call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggressiveness {
    /// Deterministic pass is a no-op; the rewrite model handles fillers.
    Low,
    /// Remove fillers only as standalone interjections.
    #[default]
    Moderate,
    /// Additionally remove every bare occurrence.
    High,
}

impl Aggressiveness {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "low" => Ok(Aggressiveness::Low),
            "moderate" => Ok(Aggressiveness::Moderate),
            "high" => Ok(Aggressiveness::High),
            _ => Err(VoxnoteError::ConfigInvalidValue {
                key: "processing.aggressiveness".to_string(),
                message: format!("'{value}' is not one of: low, moderate, high"),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Aggressiveness::Low => "low",
            Aggressiveness::Moderate => "moderate",
            Aggressiveness::High => "high",
        }
    }
}

/// Compile a pattern built from an escaped literal.
///
/// Escaped input cannot produce invalid syntax, so a failure here means a
/// bug in the pattern template; the filler is skipped rather than panicking.
fn literal_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern, error = %e, "failed to compile filler pattern");
            None
        }
    }
}

/// Deterministic filler-word removal.
///
/// At `Low` this returns the input unchanged. At `Moderate`, each filler is
/// removed only when it stands alone between word boundaries and adjacent
/// punctuation or whitespace, case-insensitively. `High` additionally
/// removes every remaining bare occurrence. Chinese fillers use the same
/// literal boundary semantics as English ones.
pub fn strip_fillers(text: &str, level: Aggressiveness, fillers: &[String]) -> String {
    if level == Aggressiveness::Low {
        return text.to_string();
    }

    let mut result = text.to_string();

    for filler in fillers {
        let escaped = regex::escape(filler);

        // Filler leading into following punctuation/whitespace
        if let Some(re) = literal_regex(&format!(r"(?i)\b{escaped}\b[,\s]+")) {
            result = re.replace_all(&result, " ").into_owned();
        }
        // Filler trailing previous text, bounded by punctuation/whitespace.
        // The regex crate has no lookahead, so the boundary character is
        // captured and re-emitted instead of being asserted.
        if let Some(re) = literal_regex(&format!(r"(?i)[,\s]+\b{escaped}\b([,.\s])")) {
            result = re.replace_all(&result, " $1").into_owned();
        }

        if level == Aggressiveness::High {
            if let Some(re) = literal_regex(&format!(r"(?i)\b{escaped}\b")) {
                result = re.replace_all(&result, " ").into_owned();
            }
        }
    }

    // Normalize whitespace left behind by the substitutions
    if let Some(re) = literal_regex(r"\s+") {
        result = re.replace_all(&result, " ").into_owned();
    }
    if let Some(re) = literal_regex(r"\s+([.,!?])") {
        result = re.replace_all(&result, "$1").into_owned();
    }

    result.trim().to_string()
}

/// Build the system instruction for the rewrite call.
///
/// The instruction preserves the original language(s) — the input may be
/// monolingual or code-switched — and varies its filler directive by
/// aggressiveness level.
pub fn build_system_prompt(level: Aggressiveness, fillers: &[String]) -> String {
    let mut prompt = String::from(
        "You are a professional text editor specializing in cleaning voice transcripts.\n\
         \n\
         Your task is to take raw voice transcript text and transform it into clean, \
         readable text suitable for note-taking.\n\
         \n\
         Instructions:\n\
         1. Preserve the original language or languages of the transcript. Never \
         translate; the input may be in one language or switch between languages\n\
         2. Add punctuation appropriate to each language (periods, commas, question marks)\n\
         3. Organize the text into logical paragraphs\n\
         4. Capitalize sentences properly where the language uses capitalization\n\
         5. Fix any obvious transcription errors\n\
         6. Maintain the speaker's original meaning and tone\n\
         7. Keep the natural, conversational voice\n\
         8. Return ONLY the cleaned text with no additional commentary or explanations\n",
    );

    prompt.push_str(match level {
        Aggressiveness::Low => {
            "9. Remove only the most obvious filler words if they disrupt readability"
        }
        Aggressiveness::Moderate => {
            "9. Remove common filler words while preserving natural speech patterns"
        }
        Aggressiveness::High => {
            "9. Aggressively remove all filler words and verbal tics to create polished, \
             professional text"
        }
    });

    prompt.push_str("\n\nCommon filler words to watch for: ");
    prompt.push_str(&fillers.join(", "));
    prompt.push_str("\n\nRemember: Return ONLY the cleaned text, nothing else.");

    prompt
}

/// Remote text-rewriting operation.
#[async_trait]
pub trait RewriteClient: Send + Sync {
    async fn rewrite(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> std::result::Result<String, RemoteError>;
}

#[async_trait]
impl<T: RewriteClient> RewriteClient for std::sync::Arc<T> {
    async fn rewrite(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> std::result::Result<String, RemoteError> {
        (**self).rewrite(system_prompt, text).await
    }
}

/// Chat-completions client for the rewrite pass.
pub struct OpenAiRewriter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiRewriter {
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
impl RewriteClient for OpenAiRewriter {
    async fn rewrite(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> std::result::Result<String, RemoteError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": text },
            ],
            "temperature": defaults::REWRITE_TEMPERATURE,
            "max_tokens": defaults::REWRITE_MAX_TOKENS,
        });

        tracing::debug!(model = %self.model, chars = text.len(), "sending text for rewrite");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RemoteError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RemoteError::Api {
                message: format!("status {status}: {body}"),
            });
        }

        let json: serde_json::Value =
            response.json().await.map_err(|e| RemoteError::Unexpected {
                message: format!("body: {e}"),
            })?;

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| RemoteError::Unexpected {
                message: "malformed chat completion response".to_string(),
            })
    }
}

/// The cleanup stage: filler pass + rewrite call behind one operation.
pub struct Cleaner<R> {
    client: R,
    level: Aggressiveness,
    fillers: Vec<String>,
}

impl<R: RewriteClient> Cleaner<R> {
    pub fn new(client: R, level: Aggressiveness, fillers: Vec<String>) -> Self {
        Self {
            client,
            level,
            fillers,
        }
    }

    /// Run both cleanup passes over a raw transcript.
    pub async fn clean(&self, raw_text: &str) -> Result<String> {
        let trimmed = strip_fillers(raw_text, self.level, &self.fillers);
        let prompt = build_system_prompt(self.level, &self.fillers);

        let rewritten = self
            .client
            .rewrite(&prompt, &trimmed)
            .await
            .map_err(|e| VoxnoteError::TextProcessing {
                message: e.to_string(),
            })?;

        let cleaned = rewritten.trim();
        if cleaned.is_empty() {
            return Err(VoxnoteError::TextProcessing {
                message: "rewrite returned empty response".to_string(),
            });
        }

        tracing::info!(
            words = cleaned.split_whitespace().count(),
            "text cleanup completed"
        );
        Ok(cleaned.to_string())
    }
}

/// Estimated rewrite cost in USD for an input of the given character count.
///
/// Tokens are approximated at one per four characters; the output is assumed
/// to be about as long as the input.
pub fn estimate_cost(chars: usize) -> f64 {
    let tokens = chars as f64 / defaults::CHARS_PER_TOKEN;
    let input_cost = tokens / 1000.0 * defaults::REWRITE_INPUT_RATE;
    let output_cost = tokens / 1000.0 * defaults::REWRITE_OUTPUT_RATE;
    input_cost + output_cost
}

/// Mock rewrite client for testing.
///
/// Records every (system prompt, text) input and returns scripted responses
/// in order; once exhausted, echoes the input text back.
pub struct MockRewriteClient {
    responses: std::sync::Mutex<std::collections::VecDeque<std::result::Result<String, RemoteError>>>,
    inputs: std::sync::Mutex<Vec<(String, String)>>,
}

impl MockRewriteClient {
    pub fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
            inputs: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, text: &str) -> Self {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn with_failure(self, error: RemoteError) -> Self {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(Err(error));
        self
    }

    /// Inputs seen so far, as (system prompt, user text) pairs.
    pub fn inputs(&self) -> Vec<(String, String)> {
        self.inputs.lock().expect("mock lock poisoned").clone()
    }
}

impl Default for MockRewriteClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RewriteClient for MockRewriteClient {
    async fn rewrite(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> std::result::Result<String, RemoteError> {
        self.inputs
            .lock()
            .expect("mock lock poisoned")
            .push((system_prompt.to_string(), text.to_string()));
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fillers(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn low_aggressiveness_is_identity() {
        let text = "um so like this is, you know, a test";
        let result = strip_fillers(text, Aggressiveness::Low, &fillers(&["um", "like"]));
        assert_eq!(result, text);
    }

    #[test]
    fn moderate_removes_standalone_interjections() {
        let result = strip_fillers(
            "You know, it works. I think, um, mostly.",
            Aggressiveness::Moderate,
            &fillers(&["you know", "um"]),
        );
        assert_eq!(result, "it works. I think, mostly.");
    }

    #[test]
    fn moderate_keeps_embedded_occurrences() {
        let result = strip_fillers(
            "The plumber came by.",
            Aggressiveness::Moderate,
            &fillers(&["um"]),
        );
        assert_eq!(result, "The plumber came by.");
    }

    #[test]
    fn high_removes_every_whole_word_match() {
        let result = strip_fillers(
            "Um, I like UM it",
            Aggressiveness::High,
            &fillers(&["um"]),
        );
        for token in result.split_whitespace() {
            assert!(
                !token.trim_matches(|c: char| !c.is_alphanumeric()).eq_ignore_ascii_case("um"),
                "standalone um survived in: {result}"
            );
        }
    }

    #[test]
    fn high_pass_matches_pipeline_scenario() {
        let result = strip_fillers(
            "um so like this is a test",
            Aggressiveness::High,
            &fillers(&["um", "like"]),
        );
        assert_eq!(result, "so this is a test");
    }

    #[test]
    fn whitespace_is_normalized_after_removal() {
        let result = strip_fillers(
            "well um , that worked um .",
            Aggressiveness::High,
            &fillers(&["um"]),
        );
        assert!(!result.contains("  "));
        assert!(!result.contains(" ."));
        assert!(!result.contains(" ,"));
    }

    #[test]
    fn chinese_fillers_use_the_same_boundary_semantics() {
        let result = strip_fillers(
            "嗯 我觉得 就是说 可以",
            Aggressiveness::High,
            &fillers(&["嗯", "就是说"]),
        );
        assert_eq!(result, "我觉得 可以");
    }

    #[test]
    fn aggressiveness_parses_known_levels_only() {
        assert_eq!(Aggressiveness::parse("low").expect("low"), Aggressiveness::Low);
        assert_eq!(
            Aggressiveness::parse("moderate").expect("moderate"),
            Aggressiveness::Moderate
        );
        assert_eq!(Aggressiveness::parse("high").expect("high"), Aggressiveness::High);
        assert!(Aggressiveness::parse("extreme").is_err());
    }

    #[test]
    fn system_prompt_varies_by_level_and_lists_fillers() {
        let words = fillers(&["um", "嗯"]);
        let low = build_system_prompt(Aggressiveness::Low, &words);
        let high = build_system_prompt(Aggressiveness::High, &words);

        assert_ne!(low, high);
        assert!(high.contains("Aggressively remove"));
        for prompt in [&low, &high] {
            assert!(prompt.contains("Never translate"));
            assert!(prompt.contains("um, 嗯"));
            assert!(prompt.contains("Return ONLY the cleaned text"));
        }
    }

    #[tokio::test]
    async fn cleaner_runs_filler_pass_before_rewrite() {
        let client = std::sync::Arc::new(MockRewriteClient::new().with_response("So, this is a test."));
        let cleaner = Cleaner::new(
            client.clone(),
            Aggressiveness::High,
            fillers(&["um", "like"]),
        );

        let cleaned = cleaner.clean("um so like this is a test").await.expect("clean");
        assert_eq!(cleaned, "So, this is a test.");

        let inputs = client.inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].1, "so this is a test");
    }

    #[tokio::test]
    async fn cleaner_maps_remote_failure_to_text_processing_error() {
        let client = MockRewriteClient::new().with_failure(RemoteError::Api {
            message: "status 500: oops".to_string(),
        });
        let cleaner = Cleaner::new(client, Aggressiveness::Moderate, fillers(&["um"]));

        let err = cleaner.clean("some text").await.unwrap_err();
        assert!(matches!(err, VoxnoteError::TextProcessing { .. }));
    }

    #[tokio::test]
    async fn cleaner_rejects_empty_rewrite() {
        let client = MockRewriteClient::new().with_response("  \n ");
        let cleaner = Cleaner::new(client, Aggressiveness::Moderate, fillers(&["um"]));

        let err = cleaner.clean("some text").await.unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[test]
    fn cost_estimate_follows_token_approximation() {
        // 4000 chars -> 1000 tokens -> $0.01 input + $0.03 output
        assert!((estimate_cost(4000) - 0.04).abs() < 1e-9);
        assert_eq!(estimate_cost(0), 0.0);
        assert!(estimate_cost(8000) > estimate_cost(4000));
    }
}
