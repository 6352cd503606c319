use axum::Json;
use serde_json::json;

use crate::core::error::CapabilityError;
use crate::core::rpc::{err as rpc_err, ok as rpc_ok, RpcResp, APPLICATION_ERROR, PARSE_ERROR};

pub fn ok(id: serde_json::Value, result: serde_json::Value) -> Json<RpcResp> {
    Json(rpc_ok(id, result))
}

pub fn error(id: serde_json::Value, code: i32, message: impl Into<String>) -> Json<RpcResp> {
    Json(rpc_err(id, code, message, None))
}

pub fn parse_error(message: impl Into<String>) -> Json<RpcResp> {
    Json(rpc_err(serde_json::Value::Null, PARSE_ERROR, message, None))
}

/// Map a CapabilityError into a JSON-RPC application error carrying its kind.
pub fn from_capability_error(id: serde_json::Value, err: CapabilityError) -> Json<RpcResp> {
    Json(rpc_err(
        id,
        APPLICATION_ERROR,
        err.message,
        Some(json!({ "kind": err.kind })),
    ))
}
