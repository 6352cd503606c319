use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::clients::weatherapi::{CurrentConditions, WeatherApiRemote};
use crate::clients::UpstreamError;
use crate::core::error::CapabilityError;
use crate::core::plan::{ToolArgs, ToolId};
use crate::core::tool::{args, format_number, round2, Capability, ToolOutput, ToolSpec};
use crate::infra::config::{BackendMode, ToolConfig};

/// Fixed offset added to multi-city averages.
pub const AVERAGE_OFFSET_C: f64 = 10.0;

const OFFLINE_DEFAULT_C: f64 = 20.0;
const OFFLINE_CONDITION: &str = "Unavailable (offline)";

/// Where current conditions come from.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> Result<CurrentConditions, UpstreamError>;
}

#[async_trait]
impl WeatherSource for WeatherApiRemote {
    async fn current(&self, city: &str) -> Result<CurrentConditions, UpstreamError> {
        WeatherApiRemote::current(self, city).await
    }
}

/// Static temperatures for a handful of cities; everything else reads 20°C.
#[derive(Clone)]
pub struct OfflineWeather {
    temps: HashMap<&'static str, f64>,
}

impl Default for OfflineWeather {
    fn default() -> Self {
        let temps = HashMap::from([
            ("paris", 18.0),
            ("london", 17.0),
            ("dhaka", 31.0),
            ("amsterdam", 19.5),
        ]);
        Self { temps }
    }
}

#[async_trait]
impl WeatherSource for OfflineWeather {
    async fn current(&self, city: &str) -> Result<CurrentConditions, UpstreamError> {
        let key = city.trim().to_lowercase();
        Ok(CurrentConditions {
            temp_c: self.temps.get(key.as_str()).copied().unwrap_or(OFFLINE_DEFAULT_C),
            condition: OFFLINE_CONDITION.to_string(),
        })
    }
}

#[derive(Clone)]
pub struct WeatherTool {
    source: Arc<dyn WeatherSource>,
}

impl WeatherTool {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineWeather::default()))
    }

    /// Pick the backend named in config; live mode requires an API key up front.
    pub fn from_config(cfg: &ToolConfig) -> Result<Self, CapabilityError> {
        match cfg.mode {
            BackendMode::Offline => Ok(Self::offline()),
            BackendMode::Live => Ok(Self::new(Arc::new(WeatherApiRemote::from_config(cfg)?))),
        }
    }

    async fn single(&self, city: &str) -> Result<String, CapabilityError> {
        let name = title_case(city);
        let now = self
            .source
            .current(city)
            .await
            .map_err(|e| CapabilityError::upstream(format!("Weather lookup failed for {name}: {e}")))?;
        Ok(format!(
            "{name}: {}°C Condition:{}",
            format_number(now.temp_c),
            now.condition
        ))
    }

    async fn average(&self, cities: &[String]) -> Result<String, CapabilityError> {
        let mut total = 0.0;
        for city in cities {
            let now = self.source.current(city).await.map_err(|e| {
                CapabilityError::upstream(format!("Weather lookup failed for {}: {e}", title_case(city)))
            })?;
            total += now.temp_c;
        }
        let mean = total / cities.len() as f64;
        let names: Vec<String> = cities.iter().map(|c| title_case(c)).collect();
        Ok(format!(
            "Average temperature for {} + 10 is: {}°C",
            names.join(", "),
            format_number(round2(mean + AVERAGE_OFFSET_C))
        ))
    }
}

impl ToolSpec for WeatherTool {
    fn id(&self) -> ToolId {
        ToolId::Weather
    }
    fn description(&self) -> &'static str {
        "Current weather for a city, or the average temperature (+10) across several cities"
    }
    fn input_schema(&self) -> Value {
        json!({
          "type":"object",
          "properties": {
            "city": { "type":"string" },
            "cities": { "type":"array", "items": { "type":"string" }, "minItems": 1 }
          }
        })
    }
}

#[async_trait]
impl Capability for WeatherTool {
    async fn execute(&self, arguments: &ToolArgs) -> Result<ToolOutput, CapabilityError> {
        if arguments.contains_key("cities") {
            let cities = args::str_list(arguments, "cities")
                .map(|list| list.into_iter().map(|c| c.trim().to_string()).collect::<Vec<_>>())
                .filter(|list| list.iter().all(|c| !c.is_empty()))
                .ok_or_else(|| {
                    CapabilityError::invalid_argument("Cities must be a non-empty list of strings")
                })?;
            return self.average(&cities).await.map(ToolOutput::Text);
        }

        let Some(city) = args::str_arg(arguments, "city") else {
            return Err(CapabilityError::invalid_argument("City must be a string"));
        };
        let city = city.trim();
        if city.is_empty() {
            return Err(CapabilityError::invalid_argument("City must not be empty"));
        }
        self.single(city).await.map(ToolOutput::Text)
    }
}

/// `new york` -> `New York`, `saint-malo` -> `Saint-Malo`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
