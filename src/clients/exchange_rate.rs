use std::collections::HashMap;
use std::time::Instant;

use reqwest::Client;
use serde::Deserialize;

use crate::clients::UpstreamError;
use crate::core::error::CapabilityError;
use crate::infra::config::ToolConfig;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client_with;

const DEFAULT_BASE: &str = "https://v6.exchangerate-api.com";

/// exchangerate-api.com `latest/<BASE>` client.
#[derive(Clone)]
pub struct ExchangeRateRemote {
    base: String,
    api_key: String,
    http: Client,
}

impl ExchangeRateRemote {
    pub fn from_config(cfg: &ToolConfig) -> Result<Self, CapabilityError> {
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            CapabilityError::internal("FX_API_KEY is not set; live exchange rates are unavailable")
        })?;
        let http = make_http_client_with(cfg.timeouts())
            .map_err(|e| CapabilityError::internal(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base: cfg.base_url.clone().unwrap_or_else(|| DEFAULT_BASE.to_string()),
            api_key,
            http,
        })
    }

    /// All rates quoted against `base_code` (upper-case ISO code).
    pub async fn latest(&self, base_code: &str) -> Result<HashMap<String, f64>, UpstreamError> {
        let url = format!(
            "{}/v6/{}/latest/{}",
            self.base.trim_end_matches('/'),
            self.api_key,
            base_code
        );
        tracing::debug!(base = %base_code, "exchange_rate.latest request");
        let start = Instant::now();
        let (builder, _rid) = add_standard_headers(self.http.get(url), None);
        let resp = builder.send().await?;
        let status = resp.status();
        let wire: RatesWire = match resp.json().await {
            Ok(w) => w,
            Err(_) if !status.is_success() => return Err(UpstreamError::Status(status.as_u16())),
            Err(e) => return Err(e.into()),
        };
        crate::infra::logging::log_metric("fx", "remote_latency_ms", start.elapsed().as_millis() as f64);

        if wire.result.as_deref() != Some("success") {
            let reason = wire.error_type.unwrap_or_else(|| format!("status {status}"));
            return Err(UpstreamError::Service(format!("exchange rate service error: {reason}")));
        }
        Ok(wire.conversion_rates)
    }
}

#[derive(Deserialize)]
struct RatesWire {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}
