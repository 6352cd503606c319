use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::clients::UpstreamError;
use crate::core::error::CapabilityError;
use crate::core::model::LanguageModel;
use crate::infra::config::PlannerConfig;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client_with;

/// OpenAI-compatible chat completions endpoint (OpenRouter by default).
#[derive(Clone)]
pub struct ChatCompletionsRemote {
    base: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    http: Client,
}

impl ChatCompletionsRemote {
    pub fn from_config(cfg: &PlannerConfig) -> Result<Self, CapabilityError> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| CapabilityError::internal("OPENAI_API_KEY is not set; the planner cannot start"))?;
        let http = make_http_client_with(cfg.timeouts())
            .map_err(|e| CapabilityError::internal(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key,
            max_tokens: cfg.max_tokens,
            http,
        })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsRemote {
    async fn complete(&self, instruction: &str, input: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base.trim_end_matches('/'));
        tracing::debug!(endpoint = %url, model = %self.model, "chat.completions request");
        let body = ChatReq {
            model: &self.model,
            temperature: 0.0,
            max_tokens: self.max_tokens,
            // instruction and query both go in as user turns
            messages: [
                ChatMsg { role: "user", content: instruction },
                ChatMsg { role: "user", content: input },
            ],
        };

        let start = Instant::now();
        let (builder, _rid) = add_standard_headers(self.http.post(url), None);
        let resp = builder.bearer_auth(&self.api_key).json(&body).send().await?;
        if !resp.status().is_success() {
            crate::infra::logging::count("planner", "remote_error_total");
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        let wire: ChatResp = resp.json().await?;
        crate::infra::logging::log_metric(
            "planner",
            "remote_latency_ms",
            start.elapsed().as_millis() as f64,
        );

        wire.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| UpstreamError::Decode("model returned no message content".into()))
    }
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMsg<'a>; 2],
}

#[derive(Serialize)]
struct ChatMsg<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
