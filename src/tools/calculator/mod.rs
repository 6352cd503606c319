use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::error::CapabilityError;
use crate::core::plan::{ToolArgs, ToolId};
use crate::core::tool::{Capability, ToolOutput, ToolSpec};

pub mod expr;

pub use expr::CalcError;

impl From<CalcError> for CapabilityError {
    fn from(e: CalcError) -> Self {
        CapabilityError::invalid_argument(e.to_string())
    }
}

#[derive(Clone, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn calculate(&self, raw: &str) -> Result<f64, CapabilityError> {
        let expr: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if !expr.contains(|c: char| "+-*/%".contains(c)) {
            return expr
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| CapabilityError::invalid_argument(format!("Invalid numeric value: '{expr}'")));
        }
        Ok(expr::evaluate(&expr)?)
    }
}

impl ToolSpec for CalculatorTool {
    fn id(&self) -> ToolId {
        ToolId::Calc
    }
    fn description(&self) -> &'static str {
        "Evaluate arithmetic with + - * / %, parentheses and 'X% of Y'"
    }
    fn input_schema(&self) -> Value {
        json!({
          "type":"object",
          "properties": { "expr": { "type": ["string", "number"] } },
          "required": ["expr"]
        })
    }
}

#[async_trait]
impl Capability for CalculatorTool {
    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, CapabilityError> {
        let value = match args.get("expr") {
            Some(Value::String(s)) => self.calculate(s)?,
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| CapabilityError::invalid_argument("Invalid expression format"))?,
            _ => return Err(CapabilityError::invalid_argument("Invalid expression format")),
        };
        Ok(ToolOutput::Number(value))
    }
}
