//! Planner gateway: model call in, well-formed [`Plan`] out, whatever the model says.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::model::LanguageModel;
use crate::core::plan::{Plan, ToolArgs};

pub mod prompt;

pub use prompt::PLANNER_INSTRUCTION;

pub const FALLBACK_PREFIX: &str = "I'm having trouble processing that request: ";

/// Why a model response could not be turned into a plan.
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("model returned an empty response")]
    Empty,
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected plan shape: {0}")]
    Shape(String),
    #[error("multi-step plans are not supported (planner proposed {count} steps: {tools})")]
    MultiStep { count: usize, tools: String },
    #[error("planner backend error: {0}")]
    Backend(String),
}

#[derive(Clone)]
pub struct PlannerGateway {
    model: Arc<dyn LanguageModel>,
}

impl PlannerGateway {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Never fails: anything unusable becomes a `DirectAnswer` with a diagnostic.
    pub async fn generate_plan(&self, query: &str) -> Plan {
        let parsed = match self.model.complete(PLANNER_INSTRUCTION, query).await {
            Ok(text) => parse_plan(&text),
            Err(e) => Err(PlanParseError::Backend(e.to_string())),
        };
        match parsed {
            Ok(plan) => {
                tracing::debug!(plan = ?plan, "planner produced plan");
                plan
            }
            Err(e) => {
                tracing::warn!(error = %e, "planner output unusable, answering with diagnostic");
                Plan::answer(format!("{FALLBACK_PREFIX}{e}"))
            }
        }
    }
}

/// Interpret model text as a single plan.
pub fn parse_plan(text: &str) -> Result<Plan, PlanParseError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(PlanParseError::Empty);
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Object(obj) => plan_from_object(obj),
        Value::Array(steps) => {
            let tools: Vec<&str> = steps
                .iter()
                .map(|s| s.get("tool").and_then(Value::as_str).unwrap_or("?"))
                .collect();
            Err(PlanParseError::MultiStep {
                count: steps.len(),
                tools: tools.join(", "),
            })
        }
        other => Err(PlanParseError::Shape(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn plan_from_object(mut obj: serde_json::Map<String, Value>) -> Result<Plan, PlanParseError> {
    if let Some(tool) = obj.remove("tool") {
        let Value::String(tool) = tool else {
            return Err(PlanParseError::Shape(format!(
                "\"tool\" must be a string, got {}",
                json_type(&tool)
            )));
        };
        let args = match obj.remove("args") {
            None | Some(Value::Null) => ToolArgs::new(),
            Some(Value::Object(args)) => args,
            Some(other) => {
                return Err(PlanParseError::Shape(format!(
                    "\"args\" must be an object, got {}",
                    json_type(&other)
                )))
            }
        };
        return Ok(Plan::ToolInvocation { tool, args });
    }
    match obj.remove("answer") {
        Some(Value::String(text)) => Ok(Plan::DirectAnswer { text }),
        Some(other) => Err(PlanParseError::Shape(format!(
            "\"answer\" must be a string, got {}",
            json_type(&other)
        ))),
        None => Err(PlanParseError::Shape(
            "expected a \"tool\" or \"answer\" field".into(),
        )),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.split_once('\n') {
        // drop an optional language tag on the opening fence
        Some((tag, body)) if !tag.trim_start().starts_with(|c: char| c == '{' || c == '[') => body.trim(),
        Some(_) => rest.trim(),
        // single-line fence, possibly with a tag: ```json {...}```
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()).trim(),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
