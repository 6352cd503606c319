use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::error::CapabilityError;
use crate::core::model::LanguageModel;
use crate::core::plan::{ToolArgs, ToolId};
use crate::core::tool::{args, Capability, ToolOutput, ToolSpec};

pub const NO_ENTRY: &str = "No entry found.";

const FALLBACK_INSTRUCTION: &str = "You are a concise encyclopedia. Answer the user's question \
about the named person, place or thing in two or three plain sentences. Reply with text only: \
no JSON, no tool calls, no markdown.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KbEntry {
    pub name: String,
    pub summary: String,
}

#[derive(Deserialize)]
struct KbFile {
    #[serde(default)]
    entries: Vec<KbEntry>,
}

/// Read-only name/summary lookup, optionally backed by the model for misses.
#[derive(Clone, Default)]
pub struct KnowledgeBaseTool {
    entries: Arc<Vec<KbEntry>>,
    fallback: Option<Arc<dyn LanguageModel>>,
}

impl KnowledgeBaseTool {
    pub fn from_entries(entries: Vec<KbEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
            fallback: None,
        }
    }

    /// Load `{"entries": [...]}` from disk.
    pub fn load(path: &Path) -> Result<Self, CapabilityError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CapabilityError::internal(format!("KB initialization error: {}: {e}", path.display()))
        })?;
        let file: KbFile = serde_json::from_str(&raw).map_err(|e| {
            CapabilityError::internal(format!("KB initialization error: {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), entries = file.entries.len(), "knowledge base loaded");
        Ok(Self::from_entries(file.entries))
    }

    /// Like [`load`](Self::load), but a broken store degrades to an empty one.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "continuing with an empty knowledge base");
            Self::default()
        })
    }

    /// Answer misses by asking the model directly. The model never plans or dispatches here.
    pub fn with_fallback(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.fallback = Some(model);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry, in store order, whose name contains the query (case-insensitive).
    pub fn lookup(&self, query: &str) -> Option<&KbEntry> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name.to_lowercase().contains(&needle))
    }
}

impl ToolSpec for KnowledgeBaseTool {
    fn id(&self) -> ToolId {
        ToolId::Kb
    }
    fn description(&self) -> &'static str {
        "Look up a short summary of a named person, place or thing"
    }
    fn input_schema(&self) -> Value {
        json!({
          "type":"object",
          "properties": { "q": { "type":"string" } },
          "required": ["q"]
        })
    }
}

#[async_trait]
impl Capability for KnowledgeBaseTool {
    async fn execute(&self, arguments: &ToolArgs) -> Result<ToolOutput, CapabilityError> {
        let Some(q) = args::str_arg(arguments, "q") else {
            return Err(CapabilityError::invalid_argument("Query must be a string"));
        };
        if let Some(entry) = self.lookup(q) {
            return Ok(ToolOutput::Text(entry.summary.clone()));
        }
        match &self.fallback {
            Some(model) => {
                tracing::debug!(q = %q, "kb miss, asking model directly");
                let text = model
                    .complete(FALLBACK_INSTRUCTION, q.trim())
                    .await
                    .map_err(|e| CapabilityError::upstream(format!("Knowledge lookup failed: {e}")))?;
                Ok(ToolOutput::Text(text))
            }
            None => Ok(ToolOutput::Text(NO_ENTRY.to_string())),
        }
    }
}
