use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{body::Body, http::Request, http::StatusCode, Router};
use querylane_agent::llm::LlmClient;
use querylane_agent::sheets::DatasetSource;
use querylane_core::Dataset;
use serde_json::Value;
use tower::ServiceExt;

pub(crate) struct ScriptedLlm(Mutex<VecDeque<String>>);

impl ScriptedLlm {
    pub(crate) fn new(responses: &[&str]) -> Self {
        Self(Mutex::new(responses.iter().map(|value| value.to_string()).collect()))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.0.lock().expect("response lock").pop_front().ok_or_else(|| anyhow!("no scripted response"))
    }
}

pub(crate) struct CsvSource(pub(crate) &'static str);

#[async_trait]
impl DatasetSource for CsvSource {
    async fn load(&self) -> Result<Dataset> {
        Ok(Dataset::from_csv(self.0)?)
    }
}

pub(crate) async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = router.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}
