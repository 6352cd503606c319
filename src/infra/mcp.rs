//! MCP face of the agent: one tool, `agent.answer`, served over Streamable HTTP
//! at `/mcp` or over stdio when `MODE=stdio`.

use std::future::Future;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::JsonObject;
use rmcp::ErrorData as McpError;

use crate::agent::Agent;
use crate::infra::runtime::mcp_transport::ServerHandler;

#[derive(Clone)]
pub struct AgentSvc {
    agent: Agent,
}

impl AgentSvc {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl ServerHandler for AgentSvc {}

#[rmcp::tool_router]
impl AgentSvc {
    #[rmcp::tool(
        name = "agent.answer",
        description = "Answer a natural-language query using weather, calculator, knowledge and currency tools. Input {\"query\": string}, output {\"answer\": string}."
    )]
    async fn agent_answer(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<rmcp::Json<serde_json::Value>, McpError> {
        tracing::debug!(params = ?params.0, "agent_answer invoked");
        let query = params
            .0
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("missing required field: query", None))?;
        let answer = self.agent.run(query).await;
        Ok(rmcp::Json(serde_json::json!({ "answer": answer })))
    }
}

pub type AgentRouter = ToolRouter<AgentSvc>;

impl AgentSvc {
    pub fn router() -> AgentRouter {
        Self::tool_router()
    }
}

/// `(handler, tools)` factory for the rmcp transports; every session shares `agent`.
pub fn make_factory(agent: Agent) -> impl Fn() -> (AgentSvc, AgentRouter) + Send + Sync + Clone + 'static {
    move || (AgentSvc::new(agent.clone()), AgentSvc::router())
}
