use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Argument bag handed to a capability, exactly as the planner produced it.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// The planner's decision for a single query.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    ToolInvocation { tool: String, args: ToolArgs },
    DirectAnswer { text: String },
}

impl Plan {
    pub fn answer(text: impl Into<String>) -> Self {
        Plan::DirectAnswer { text: text.into() }
    }
}

/// Closed set of tool identifiers the registry understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Calc,
    Weather,
    Kb,
    Fx,
}

impl ToolId {
    pub const ALL: [ToolId; 4] = [ToolId::Calc, ToolId::Weather, ToolId::Kb, ToolId::Fx];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Calc => "calc",
            ToolId::Weather => "weather",
            ToolId::Kb => "kb",
            ToolId::Fx => "fx",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTool(pub String);

impl FromStr for ToolId {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}
