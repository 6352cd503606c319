use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::clients::exchange_rate::ExchangeRateRemote;
use crate::clients::UpstreamError;
use crate::core::error::CapabilityError;
use crate::core::plan::{ToolArgs, ToolId};
use crate::core::tool::{args, format_number, round2, Capability, ToolOutput, ToolSpec};
use crate::infra::config::{BackendMode, ToolConfig};

/// Resolves a conversion rate for an upper-case currency pair.
/// `Ok(None)` means the pair is not known to the source.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn rate(&self, from: &str, to: &str) -> Result<Option<f64>, UpstreamError>;
}

#[derive(Clone)]
pub struct StaticRates {
    rates: HashMap<(String, String), f64>,
}

impl Default for StaticRates {
    fn default() -> Self {
        let rates = [
            ("USD", "EUR", 0.91),
            ("EUR", "USD", 1.1),
            ("USD", "GBP", 0.79),
            ("GBP", "USD", 1.27),
        ]
        .into_iter()
        .map(|(from, to, rate)| ((from.to_string(), to.to_string()), rate))
        .collect();
        Self { rates }
    }
}

#[async_trait]
impl RateSource for StaticRates {
    async fn rate(&self, from: &str, to: &str) -> Result<Option<f64>, UpstreamError> {
        Ok(self.rates.get(&(from.to_string(), to.to_string())).copied())
    }
}

#[async_trait]
impl RateSource for ExchangeRateRemote {
    async fn rate(&self, from: &str, to: &str) -> Result<Option<f64>, UpstreamError> {
        let rates = self.latest(from).await?;
        Ok(rates.get(to).copied())
    }
}

#[derive(Clone)]
pub struct FxTool {
    source: Arc<dyn RateSource>,
}

impl FxTool {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self { source }
    }

    pub fn offline() -> Self {
        Self::new(Arc::new(StaticRates::default()))
    }

    pub fn from_config(cfg: &ToolConfig) -> Result<Self, CapabilityError> {
        match cfg.mode {
            BackendMode::Offline => Ok(Self::offline()),
            BackendMode::Live => Ok(Self::new(Arc::new(ExchangeRateRemote::from_config(cfg)?))),
        }
    }
}

impl ToolSpec for FxTool {
    fn id(&self) -> ToolId {
        ToolId::Fx
    }
    fn description(&self) -> &'static str {
        "Convert an amount between two currencies"
    }
    fn input_schema(&self) -> Value {
        json!({
          "type":"object",
          "properties": {
            "amount": { "type": ["number", "string"] },
            "from": { "type":"string" },
            "to": { "type":"string" }
          },
          "required": ["amount", "from", "to"]
        })
    }
}

#[async_trait]
impl Capability for FxTool {
    async fn execute(&self, arguments: &ToolArgs) -> Result<ToolOutput, CapabilityError> {
        for field in ["amount", "from", "to"] {
            if !arguments.contains_key(field) {
                return Err(CapabilityError::invalid_argument(format!(
                    "Missing required field: {field}"
                )));
            }
        }
        let amount = args::number_like(arguments, "amount")
            .ok_or_else(|| CapabilityError::invalid_argument("Amount must be a number"))?;
        let from = currency_code(arguments, "from")?;
        let to = currency_code(arguments, "to")?;

        let unsupported = || CapabilityError::upstream(format!("Unsupported currency pair: {from}/{to}"));
        let rate = self
            .source
            .rate(&from, &to)
            .await
            .map_err(|e| CapabilityError::upstream(format!("Exchange rate lookup failed for {from}/{to}: {e}")))?
            .ok_or_else(unsupported)?;

        let converted = round2(amount * rate);
        if !converted.is_finite() {
            return Err(CapabilityError::invalid_argument(format!(
                "Amount is too large to convert: {amount}"
            )));
        }
        Ok(ToolOutput::Text(format!("{} {to}", format_number(converted))))
    }
}

/// Three ASCII letters, upper-cased. Anything else never reaches a rate source.
fn currency_code(arguments: &ToolArgs, key: &str) -> Result<String, CapabilityError> {
    args::str_arg(arguments, key)
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| s.len() == 3 && s.bytes().all(|b| b.is_ascii_alphabetic()))
        .ok_or_else(|| {
            CapabilityError::invalid_argument(format!(
                "Currency '{key}' must be a three-letter code"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use httpmock::prelude::*;

    fn args(v: Value) -> ToolArgs {
        v.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn converts_supported_pair() {
        let out = FxTool::offline()
            .execute(&args(json!({"amount": 100, "from": "usd", "to": "eur"})))
            .await
            .unwrap();
        assert_eq!(out.to_string(), "91.0 EUR");
    }

    #[tokio::test]
    async fn accepts_numeric_strings_and_rounds() {
        let out = FxTool::offline()
            .execute(&args(json!({"amount": "12.345", "from": "GBP", "to": "usd"})))
            .await
            .unwrap();
        // 12.345 * 1.27 = 15.67815
        assert_eq!(out.to_string(), "15.68 USD");
    }

    #[tokio::test]
    async fn unsupported_pair_is_upstream_failure() {
        let err = FxTool::offline()
            .execute(&args(json!({"amount": 100, "from": "usd", "to": "bdt"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamFailure);
        assert_eq!(err.message, "Unsupported currency pair: USD/BDT");
    }

    #[tokio::test]
    async fn validates_fields() {
        let tool = FxTool::offline();
        let err = tool.execute(&args(json!({"from": "usd", "to": "eur"}))).await.unwrap_err();
        assert_eq!(err.message, "Missing required field: amount");
        let err = tool.execute(&args(json!({"amount": 1, "from": "usd"}))).await.unwrap_err();
        assert_eq!(err.message, "Missing required field: to");
        let err = tool
            .execute(&args(json!({"amount": "lots", "from": "usd", "to": "eur"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.message, "Amount must be a number");
        let err = tool
            .execute(&args(json!({"amount": 1, "from": 840, "to": "eur"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn malformed_codes_never_reach_the_rate_service() {
        let server = MockServer::start();
        let any = server.mock(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({
                "result": "success",
                "conversion_rates": {"EUR": 5.0}
            }));
        });
        let tool = FxTool::from_config(&ToolConfig {
            mode: BackendMode::Live,
            base_url: Some(server.base_url()),
            api_key: Some("fk".into()),
            ..ToolConfig::default()
        })
        .unwrap_or_else(|e| panic!("{e}"));
        for bad in ["usd/../../evil", "usd?x=1", "us", "usdx", "u$d", "", "€ur"] {
            let err = tool
                .execute(&args(json!({"amount": 1, "from": bad, "to": "eur"})))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidArgument, "from={bad:?}");
            assert_eq!(err.message, "Currency 'from' must be a three-letter code");
        }
        let err = tool
            .execute(&args(json!({"amount": 1, "from": "usd", "to": "eur#x"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(any.hits(), 0);
    }

    #[tokio::test]
    async fn overflowing_conversion_is_rejected() {
        let err = FxTool::offline()
            .execute(&args(json!({"amount": "1e308", "from": "eur", "to": "usd"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(err.message.starts_with("Amount is too large to convert"));
    }

    #[tokio::test]
    async fn live_mode_uses_remote_rates() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/v6/fk/latest/USD");
            then.status(200).json_body(json!({
                "result": "success",
                "conversion_rates": {"BDT": 117.25, "EUR": 0.91}
            }));
        });
        let tool = FxTool::from_config(&ToolConfig {
            mode: BackendMode::Live,
            base_url: Some(server.base_url()),
            api_key: Some("fk".into()),
            ..ToolConfig::default()
        })
        .unwrap_or_else(|e| panic!("{e}"));
        let out = tool
            .execute(&args(json!({"amount": 100, "from": "usd", "to": "bdt"})))
            .await
            .unwrap();
        m.assert();
        assert_eq!(out.to_string(), "11725.0 BDT");

        let err = tool
            .execute(&args(json!({"amount": 100, "from": "usd", "to": "xyz"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamFailure);
        assert_eq!(err.message, "Unsupported currency pair: USD/XYZ");
    }

    #[tokio::test]
    async fn live_mode_outage_is_upstream_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v6/fk/latest/USD");
            then.status(500).body("down");
        });
        let tool = FxTool::from_config(&ToolConfig {
            mode: BackendMode::Live,
            base_url: Some(server.base_url()),
            api_key: Some("fk".into()),
            ..ToolConfig::default()
        })
        .unwrap_or_else(|e| panic!("{e}"));
        let err = tool
            .execute(&args(json!({"amount": 1, "from": "usd", "to": "eur"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamFailure);
        assert!(err.message.contains("upstream status 500"));
    }

    #[test]
    fn live_mode_without_key_fails_construction() {
        let cfg = ToolConfig { mode: BackendMode::Live, ..ToolConfig::default() };
        let err = FxTool::from_config(&cfg).err().unwrap();
        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(err.message.contains("FX_API_KEY"));
    }
}
