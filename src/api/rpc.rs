use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as J};

use crate::agent::Agent;
use crate::core::error::CapabilityError;
use crate::core::plan::ToolArgs;
use crate::core::rpc::{RpcReq, RpcResp, INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::infra::http::json as http_json;
use crate::tools::registry::ToolRegistry;

fn tools_list(reg: &ToolRegistry) -> J {
    let tools: Vec<J> = reg
        .list()
        .into_iter()
        .map(|t| json!({ "name": t.name, "description": t.description, "inputSchema": t.input_schema }))
        .collect();
    json!({ "tools": tools })
}

enum CallError {
    Params(String),
    Tool(CapabilityError),
}

/// Direct dispatch, bypassing the planner.
async fn call_tool(reg: &ToolRegistry, params: &J) -> Result<J, CallError> {
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CallError::Params("missing tool name".into()))?;
    let args = match params.get("arguments") {
        None | Some(J::Null) => ToolArgs::new(),
        Some(J::Object(m)) => m.clone(),
        Some(_) => return Err(CallError::Params("'arguments' must be an object".into())),
    };
    let out = reg.dispatch(name, args).await.map_err(CallError::Tool)?;
    Ok(json!({ "text": out.to_string() }))
}

pub async fn http(
    State(agent): State<Agent>,
    body: Result<Json<RpcReq>, JsonRejection>,
) -> Json<RpcResp> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "rpc request rejected");
            return http_json::parse_error(rejection.body_text());
        }
    };
    tracing::debug!(method = %req.method, id = ?req.id, "rpc handler invoked");
    let id = req.id.clone();
    let resp = match req.method.as_str() {
        "initialize" => http_json::ok(
            id,
            json!({ "serverInfo": { "name": "planner-agent", "version": env!("CARGO_PKG_VERSION") }, "capabilities": {} }),
        ),
        "shutdown" => http_json::ok(id, J::Null),
        "tools.list" | "tools/list" => http_json::ok(id, tools_list(agent.registry())),
        "tools.call" | "tools/call" => match call_tool(agent.registry(), &req.params).await {
            Ok(out) => http_json::ok(id, out),
            Err(CallError::Params(msg)) => http_json::error(id, INVALID_PARAMS, msg),
            Err(CallError::Tool(e)) => http_json::from_capability_error(id, e),
        },
        "agent.answer" | "agent/answer" => match req.params.get("query").and_then(|v| v.as_str()) {
            Some(q) => {
                let answer = agent.run(q).await;
                http_json::ok(id, json!({ "answer": answer }))
            }
            None => http_json::error(id, INVALID_PARAMS, "missing required field: query"),
        },
        _ => http_json::error(id, METHOD_NOT_FOUND, format!("unknown method: {}", req.method)),
    };
    tracing::debug!(response = ?resp.0, "rpc handler completed");
    resp
}
