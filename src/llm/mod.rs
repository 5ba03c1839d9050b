//! Chat model abstraction and structured generation.
//!
//! Two model roles exist in the pipeline: a fast model for small structured
//! calls and a long-context model for outline and dialogue generation. Both
//! are plain [`ChatModel`] implementations; which model fills which role is
//! configuration.

mod gemini;
mod openai;

pub use gemini::GeminiChatModel;
pub use openai::OpenAiChatModel;

use crate::config::LlmSettings;
use crate::error::{PratError, Result};
use crate::throttle::RateLimiter;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// A chat-completion language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider name, used for rate limiting.
    fn provider(&self) -> &str;

    /// Model name, for logging.
    fn model(&self) -> &str;

    /// Run one system+user completion and return the raw response text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Which configured model role to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Small structured calls: article suggestions, search queries.
    Fast,
    /// Outline and dialogue generation.
    LongContext,
}

/// Build a chat model for the given role from configuration.
pub fn create_chat_model(settings: &LlmSettings, role: ModelRole) -> Result<Arc<dyn ChatModel>> {
    let (provider, model) = match role {
        ModelRole::Fast => (&settings.fast_provider, &settings.fast_model),
        ModelRole::LongContext => (&settings.long_context_provider, &settings.long_context_model),
    };

    match provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiChatModel::new(model, settings.temperature))),
        "gemini" => {
            let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
                PratError::Config("GEMINI_API_KEY is not set but an LLM role uses gemini".into())
            })?;
            Ok(Arc::new(GeminiChatModel::new(
                &api_key,
                model,
                settings.temperature,
            )))
        }
        other => Err(PratError::Config(format!(
            "Unknown LLM provider: {}",
            other
        ))),
    }
}

/// Extract the first top-level JSON object from a model response.
///
/// Models wrap JSON in markdown fences or prose more often than not, so this
/// takes everything between the first `{` and the last `}`.
pub fn extract_json_object(response: &str) -> Result<&str> {
    extract_between(response, '{', '}')
}

/// Extract the first top-level JSON array from a model response.
pub fn extract_json_array(response: &str) -> Result<&str> {
    extract_between(response, '[', ']')
}

fn extract_between(response: &str, open: char, close: char) -> Result<&str> {
    let start = response.find(open);
    let end = response.rfind(close);

    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok(&response[s..=e]),
        _ => Err(PratError::InvalidInput(format!(
            "No JSON found in model response: {}",
            truncate(response, 200)
        ))),
    }
}

/// Shorten a response for inclusion in error messages and logs.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Generate until the parser accepts the response, up to an attempt budget.
///
/// Each attempt goes through the rate limiter (which handles transient
/// provider failures itself); a response the parser rejects is discarded
/// with a warning and regenerated. Once attempts are exhausted the last
/// parse error surfaces, wrapped as invalid input; callers decide whether
/// that is stage-fatal or degrades to a placeholder.
pub async fn generate_structured<T, P>(
    model: &dyn ChatModel,
    limiter: &RateLimiter,
    system: &str,
    user: &str,
    max_attempts: usize,
    parse: P,
) -> Result<T>
where
    P: Fn(&str) -> Result<T>,
{
    let attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let response = limiter
            .call(model.provider(), || model.complete(system, user))
            .await?;

        match parse(&response) {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = e.to_string();
                warn!(
                    attempt,
                    model = model.model(),
                    "Discarding malformed model response: {}",
                    last_error
                );
            }
        }
    }

    Err(PratError::InvalidInput(format!(
        "Model produced no usable response in {} attempt(s): {}",
        attempts, last_error
    )))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted chat model for deterministic tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Chat model that replays canned responses in order.
    ///
    /// Once the canned responses run out it repeats the last one, so tests
    /// can script a short prefix and let the rest of a run coast.
    pub struct ScriptedChatModel {
        responses: Mutex<VecDeque<String>>,
        last: Mutex<String>,
        calls: AtomicUsize,
    }

    impl ScriptedChatModel {
        pub fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
                last: Mutex::new("scripted response".to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChatModel {
        fn provider(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            match responses.pop_front() {
                Some(response) => {
                    *self.last.lock().unwrap() = response.clone();
                    Ok(response)
                }
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedChatModel;
    use super::*;
    use crate::config::RateLimitSettings;

    fn quiet_limiter() -> RateLimiter {
        RateLimiter::new(RateLimitSettings::default())
    }

    #[test]
    fn test_extract_json_object_from_fenced_response() {
        let response = "Here is the outline:\n```json\n{\"sections\": []}\n```\nHope that helps!";
        assert_eq!(extract_json_object(response).unwrap(), "{\"sections\": []}");
    }

    #[test]
    fn test_extract_json_array_plain() {
        let response = "[\"Linux\", \"Linux kernel\"]";
        assert_eq!(
            extract_json_array(response).unwrap(),
            "[\"Linux\", \"Linux kernel\"]"
        );
    }

    #[test]
    fn test_extract_json_missing_brackets() {
        assert!(extract_json_object("no json here").is_err());
        assert!(extract_json_array("} backwards {").is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("æøå-borte", 3), "æøå");
    }

    #[tokio::test]
    async fn test_generate_structured_retries_malformed_then_succeeds() {
        let model = ScriptedChatModel::new(["not json at all", "{\"ok\": true}"]);
        let limiter = quiet_limiter();

        let value: serde_json::Value =
            generate_structured(&model, &limiter, "system", "user", 3, |response| {
                let json = extract_json_object(response)?;
                Ok(serde_json::from_str(json)?)
            })
            .await
            .unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_generate_structured_exhausts_attempts() {
        let model = ScriptedChatModel::new(["nope"]);
        let limiter = quiet_limiter();

        let result: Result<serde_json::Value> =
            generate_structured(&model, &limiter, "system", "user", 2, |response| {
                let json = extract_json_object(response)?;
                Ok(serde_json::from_str(json)?)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(model.calls(), 2);
    }
}
