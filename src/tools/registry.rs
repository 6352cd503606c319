use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::core::error::{join_error_message, CapabilityError};
use crate::core::model::LanguageModel;
use crate::core::plan::{ToolArgs, ToolId};
use crate::core::tool::{Capability, ToolOutput};
use crate::infra::config::AppConfig;
use crate::infra::logging::{count, log_metric};

use super::calculator::CalculatorTool;
use super::fx::FxTool;
use super::knowledge::KnowledgeBaseTool;
use super::weather::WeatherTool;

/// Read-only tool table. Cloning shares the same capabilities.
#[derive(Clone)]
pub struct ToolRegistry {
    by_id: Arc<HashMap<ToolId, Arc<dyn Capability>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

impl ToolRegistry {
    pub fn with_tools<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Capability>>,
    {
        let mut map: HashMap<ToolId, Arc<dyn Capability>> = HashMap::new();
        for t in iter {
            map.insert(t.id(), t);
        }
        Self { by_id: Arc::new(map) }
    }

    pub fn get(&self, id: ToolId) -> Option<Arc<dyn Capability>> {
        self.by_id.get(&id).cloned()
    }

    /// Metadata in stable `ToolId` order.
    pub fn list(&self) -> Vec<ToolMeta> {
        ToolId::ALL
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .map(|t| ToolMeta {
                name: t.id().as_str(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Look up `name` and run it. Capability errors pass through untouched; a panic
    /// inside the capability comes back as an `InternalError`.
    pub async fn dispatch(&self, name: &str, args: ToolArgs) -> Result<ToolOutput, CapabilityError> {
        let tool = name
            .parse::<ToolId>()
            .ok()
            .and_then(|id| self.get(id))
            .ok_or_else(|| CapabilityError::not_found(format!("Unknown tool: {name}")))?;
        let id = tool.id();

        tracing::debug!(tool = %id, args = ?args, "dispatch");
        let start = Instant::now();
        let res = tokio::spawn(async move { tool.execute(&args).await })
            .await
            .unwrap_or_else(|e| {
                Err(CapabilityError::internal(format!(
                    "Tool execution error: {}",
                    join_error_message(e)
                )))
            });
        log_metric(id.as_str(), "dispatch_latency_ms", start.elapsed().as_millis() as f64);

        if let Err(e) = &res {
            count(id.as_str(), "dispatch_error_total");
            tracing::warn!(tool = %id, kind = %e.kind, error = %e, "tool failed");
        }
        res
    }
}

/// Build the four capabilities from config. The knowledge base degrades to empty
/// when its store cannot be read; live backends without keys fail here.
pub fn build_registry(
    cfg: &AppConfig,
    model: Option<Arc<dyn LanguageModel>>,
) -> Result<ToolRegistry, CapabilityError> {
    let mut kb = KnowledgeBaseTool::load_or_empty(&cfg.kb.path);
    if cfg.kb.llm_fallback {
        match model {
            Some(m) => kb = kb.with_fallback(m),
            None => tracing::warn!("kb.llm_fallback is enabled but no model is available"),
        }
    }

    let tools: Vec<Arc<dyn Capability>> = vec![
        Arc::new(CalculatorTool),
        Arc::new(WeatherTool::from_config(&cfg.weather)?),
        Arc::new(kb),
        Arc::new(FxTool::from_config(&cfg.fx)?),
    ];
    tracing::info!(
        weather = ?cfg.weather.mode,
        fx = ?cfg.fx.mode,
        kb = %cfg.kb.path.display(),
        "tool registry built"
    );
    Ok(ToolRegistry::with_tools(tools))
}

/// All four tools on offline backends, with the given knowledge base.
pub fn offline_registry(kb: KnowledgeBaseTool) -> ToolRegistry {
    let tools: Vec<Arc<dyn Capability>> = vec![
        Arc::new(CalculatorTool),
        Arc::new(WeatherTool::offline()),
        Arc::new(kb),
        Arc::new(FxTool::offline()),
    ];
    ToolRegistry::with_tools(tools)
}
