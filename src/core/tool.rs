use std::fmt;

use async_trait::async_trait;

use crate::core::error::CapabilityError;
use crate::core::plan::{ToolArgs, ToolId};

/// Minimal metadata every tool must expose.
pub trait ToolSpec {
    fn id(&self) -> ToolId;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> serde_json::Value;
}

/// Capability = Spec + execution. Implementors hold no per-call mutable state.
#[async_trait]
pub trait Capability: ToolSpec + Send + Sync {
    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, CapabilityError>;
}

/// Value a capability hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Number(f64),
    Text(String),
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutput::Number(n) => f.write_str(&format_number(*n)),
            ToolOutput::Text(s) => f.write_str(s),
        }
    }
}

/// Render a float the way users of the service expect: integral values keep
/// a single decimal (`91.0`), everything else uses the shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

/// Round to two decimals, halves away from zero.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Helpers for pulling typed values out of a planner-supplied argument bag.
pub mod args {
    use super::ToolArgs;

    pub fn str_arg<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
        args.get(key).and_then(|v| v.as_str())
    }

    /// Accepts JSON numbers and numeric strings.
    pub fn number_like(args: &ToolArgs, key: &str) -> Option<f64> {
        match args.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// A non-empty array whose items are all strings.
    pub fn str_list(args: &ToolArgs, key: &str) -> Option<Vec<String>> {
        let items = args.get(key)?.as_array()?;
        if items.is_empty() {
            return None;
        }
        items
            .iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect()
    }
}
