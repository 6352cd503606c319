use std::time::Instant;

use reqwest::Client;
use serde::Deserialize;

use crate::clients::UpstreamError;
use crate::core::error::CapabilityError;
use crate::infra::config::ToolConfig;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client_with;

const DEFAULT_BASE: &str = "https://api.weatherapi.com";

/// Current conditions for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub condition: String,
}

/// weatherapi.com `current.json` client.
#[derive(Clone)]
pub struct WeatherApiRemote {
    base: String,
    api_key: String,
    http: Client,
}

impl WeatherApiRemote {
    pub fn from_config(cfg: &ToolConfig) -> Result<Self, CapabilityError> {
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            CapabilityError::internal("WEATHER_API_KEY is not set; live weather lookups are unavailable")
        })?;
        let http = make_http_client_with(cfg.timeouts())
            .map_err(|e| CapabilityError::internal(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base: cfg.base_url.clone().unwrap_or_else(|| DEFAULT_BASE.to_string()),
            api_key,
            http,
        })
    }

    pub async fn current(&self, city: &str) -> Result<CurrentConditions, UpstreamError> {
        let url = format!("{}/v1/current.json", self.base.trim_end_matches('/'));
        tracing::debug!(endpoint = %url, city = %city, "weather.current request");
        let start = Instant::now();
        let (builder, _rid) = add_standard_headers(self.http.get(url), None);
        let resp = builder
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .send()
            .await?;

        // weatherapi reports lookup failures as a 4xx with an `error` body, so read the body first
        let status = resp.status();
        let wire: WeatherWire = match resp.json().await {
            Ok(w) => w,
            Err(_) if !status.is_success() => return Err(UpstreamError::Status(status.as_u16())),
            Err(e) => return Err(e.into()),
        };
        crate::infra::logging::log_metric(
            "weather",
            "remote_latency_ms",
            start.elapsed().as_millis() as f64,
        );

        if let Some(err) = wire.error {
            return Err(UpstreamError::Service(err.message));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        let current = wire
            .current
            .ok_or_else(|| UpstreamError::Decode("missing 'current' block".into()))?;
        Ok(CurrentConditions {
            temp_c: current.temp_c,
            condition: current.condition.text,
        })
    }
}

#[derive(Deserialize)]
struct WeatherWire {
    current: Option<CurrentWire>,
    error: Option<ServiceErrorWire>,
}

#[derive(Deserialize)]
struct CurrentWire {
    temp_c: f64,
    condition: ConditionWire,
}

#[derive(Deserialize)]
struct ConditionWire {
    text: String,
}

#[derive(Deserialize)]
struct ServiceErrorWire {
    message: String,
}
