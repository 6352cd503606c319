use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failure categories a capability (or the registry around it) can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    UpstreamFailure,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::InternalError => "internal_error",
        };
        f.write_str(s)
    }
}

/// Structured tool failure. The message is always safe to show an end user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CapabilityError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CapabilityError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamFailure, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}

/// Extract a readable message from a task that panicked or was cancelled.
pub fn join_error_message(err: tokio::task::JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_displays_message_only() {
        let e = CapabilityError::not_found("Unknown tool: translate");
        assert_eq!(e.to_string(), "Unknown tool: translate");
        assert_eq!(e.kind, ErrorKind::NotFound);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let v = serde_json::to_value(ErrorKind::UpstreamFailure).unwrap();
        assert_eq!(v, "upstream_failure");
        assert_eq!(ErrorKind::InvalidArgument.to_string(), "invalid_argument");
    }

    #[tokio::test]
    async fn join_error_message_reads_panic_payload() {
        let err = tokio::spawn(async { panic!("kaboom") }).await.unwrap_err();
        assert_eq!(join_error_message(err), "kaboom");

        let err = tokio::spawn(async {
            let n = 7;
            panic!("bad value {n}")
        })
        .await
        .unwrap_err();
        assert_eq!(join_error_message(err), "bad value 7");
    }
}
