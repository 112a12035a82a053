use std::sync::LazyLock;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use http::{HeaderMap, HeaderValue};
use leaky_bucket::RateLimiter;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::constants::{
    LLM_BUCKET_MAX, LLM_MAX_OUTPUT_TOKENS, LLM_REFILL_AMOUNT, LLM_REFILL_INTERVAL_MS,
};
use crate::llm::backoff::Backoff;
use crate::llm::{LlmErr, LlmResult};
use crate::util::env::Var;
use crate::var;

static SHARED: LazyLock<OnceCell<Shared>> = LazyLock::new(OnceCell::new);
async fn shared() -> LlmResult<&'static Shared> {
    SHARED
        .get_or_try_init(|| async { Shared::new().await })
        .await
}

/// Process-wide client state: one reqwest client with the auth header baked
/// in, and a leaky bucket pacing every outbound completion call.
struct Shared {
    client: reqwest::Client,
    limiter: RateLimiter,
    base_url: &'static str,
    model: &'static str,
}

impl Shared {
    async fn new() -> LlmResult<Self> {
        let base_url = var!(Var::LlmApiBase).await?;
        let model = var!(Var::LlmModel).await?;
        let api_key = var!(Var::LlmApiKey).await?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let limiter = RateLimiter::builder()
            .max(LLM_BUCKET_MAX)
            .initial(LLM_BUCKET_MAX)
            .refill(LLM_REFILL_AMOUNT)
            .interval(Duration::from_millis(LLM_REFILL_INTERVAL_MS))
            .build();

        Ok(Self {
            client,
            limiter,
            base_url,
            model,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
}

/// Client for the OpenAI-compatible chat-completions endpoint configured via
/// `LLM_API_BASE` / `LLM_API_KEY` / `LLM_MODEL`.
pub struct Llm;

impl Llm {
    /// Single completion attempt. Rate-limit and quota responses come back as
    /// retryable [`LlmErr`] variants; see [`Llm::complete_with_retry`].
    #[instrument(skip(request), fields(prompt_len = request.prompt.len()))]
    pub async fn complete(request: &CompletionRequest) -> LlmResult<Completion> {
        let shared = shared().await?;
        shared.limiter.acquire_one().await;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessageDto {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessageDto {
            role: "user",
            content: request.prompt.clone(),
        });

        let body = ChatRequest {
            model: shared.model,
            messages,
            max_tokens: Some(LLM_MAX_OUTPUT_TOKENS),
            temperature: request.temperature,
            stream: false,
        };

        let response = shared
            .client
            .post(format!("{}/chat/completions", shared.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            429 => {
                let retry_after_ms = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|secs| secs * 1000);

                return Err(LlmErr::RateLimited { retry_after_ms });
            }
            503 => return Err(LlmErr::Unavailable),
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();

                // some providers report exhausted quota with a plain 4xx
                if body.to_ascii_lowercase().contains("quota") {
                    return Err(LlmErr::RateLimited {
                        retry_after_ms: None,
                    });
                }

                return Err(LlmErr::FetchErrWithBody {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let parsed: ChatResponse = response.json().await?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmErr::EmptyResponse)?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            usage,
        })
    }

    /// Completion with bounded retries on rate-limit/quota failures. The
    /// final attempt's error propagates as the hard failure for this unit of
    /// work.
    #[instrument(skip(request))]
    pub async fn complete_with_retry(request: &CompletionRequest) -> LlmResult<Completion> {
        let policy = Backoff::default();
        let mut attempt = 0u32;

        loop {
            match Self::complete(request).await {
                Ok(completion) => return Ok(completion),

                Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                    let mut delay_ms = policy.jittered_delay_ms(attempt);
                    if let LlmErr::RateLimited {
                        retry_after_ms: Some(hint),
                    } = err
                    {
                        delay_ms = delay_ms.max(hint);
                    }

                    tracing::warn!(
                        attempt,
                        delay_ms,
                        error = ?err,
                        "retryable completion failure; backing off"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }

                Err(err) => {
                    tracing::error!(attempt, error = ?err, "completion failed");
                    return Err(err);
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessageDto {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<UsageDto>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageDto,
}

#[derive(Debug, Deserialize)]
struct MessageDto {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageDto {
    prompt_tokens: i64,
    completion_tokens: i64,
}
