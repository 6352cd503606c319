use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;

#[derive(Debug, Deserialize)]
pub struct AnswerReq {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResp {
    pub answer: String,
}

/// `POST /v1/answer`. Always 200; failures are carried in the answer text.
pub async fn http(State(agent): State<Agent>, Json(req): Json<AnswerReq>) -> Json<AnswerResp> {
    let answer = agent.run(&req.query).await;
    Json(AnswerResp { answer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use axum::{routing::post, Router};
    use hyper::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/v1/answer", post(super::http))
            .with_state(crate::api::test_support::offline_agent())
    }

    async fn post_json(body: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri("/v1/answer")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn answers_with_tool_output() {
        let (status, body) =
            post_json(r#"{"query":"{\"tool\":\"calc\",\"args\":{\"expr\":\"(2+3)*4\"}}"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let resp: AnswerResp = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.answer, "20.0");
    }

    #[tokio::test]
    async fn failures_stay_in_the_answer_text() {
        let (status, body) = post_json(r#"{"query":"not a plan"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let resp: AnswerResp = serde_json::from_slice(&body).unwrap();
        assert!(resp.answer.starts_with("I'm having trouble processing that request: "));
    }

    #[tokio::test]
    async fn missing_query_is_rejected_by_the_extractor() {
        let (status, _) = post_json(r#"{"q":"hi"}"#).await;
        assert!(status.is_client_error());
    }
}
