//! Orchestrator: one query in, one string out, never an error.

use std::sync::Arc;

use crate::clients::openai::ChatCompletionsRemote;
use crate::core::error::{join_error_message, CapabilityError};
use crate::core::model::LanguageModel;
use crate::core::plan::Plan;
use crate::infra::config::AppConfig;
use crate::planner::PlannerGateway;
use crate::tools::registry::{build_registry, ToolRegistry};

/// Planner + registry pair. Cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct Agent {
    planner: PlannerGateway,
    registry: ToolRegistry,
}

impl Agent {
    pub fn new(planner: PlannerGateway, registry: ToolRegistry) -> Self {
        Self { planner, registry }
    }

    /// Wire the remote model and the configured tool backends. Missing keys fail here.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, CapabilityError> {
        let model: Arc<dyn LanguageModel> = Arc::new(ChatCompletionsRemote::from_config(&cfg.planner)?);
        let registry = build_registry(cfg, Some(model.clone()))?;
        Ok(Self::new(PlannerGateway::new(model), registry))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Plan, maybe dispatch, and render. Total: a panic anywhere in the pass
    /// comes back as `System error: ...`.
    pub async fn run(&self, query: &str) -> String {
        let this = self.clone();
        let query = query.to_owned();
        match tokio::spawn(async move { this.run_once(&query).await }).await {
            Ok(out) => out,
            Err(e) => {
                let msg = join_error_message(e);
                tracing::error!(error = %msg, "query pipeline panicked");
                format!("System error: {msg}")
            }
        }
    }

    async fn run_once(&self, query: &str) -> String {
        tracing::info!(query = %query, "plan");
        match self.planner.generate_plan(query).await {
            Plan::ToolInvocation { tool, args } => match self.registry.dispatch(&tool, args).await {
                Ok(out) => out.to_string(),
                Err(e) => format!("Error: {e}"),
            },
            Plan::DirectAnswer { text } => text,
        }
    }
}

/// Build an agent from the environment and answer one query. Never fails.
pub async fn answer(query: &str) -> String {
    let cfg = match AppConfig::from_env_and_toml() {
        Ok(cfg) => cfg,
        Err(e) => return format!("System error: {e}"),
    };
    match Agent::from_config(&cfg) {
        Ok(agent) => agent.run(query).await,
        Err(e) => format!("System error: {e}"),
    }
}
