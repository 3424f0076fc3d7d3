use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use querylane_core::Dataset;

use crate::llm::LlmClient;
use crate::sheets::DatasetSource;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let address = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{address}")
}

/// Replays canned completions in order and records every prompt.
#[derive(Default)]
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub(crate) fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|value| value.to_string()).collect()),
            prompts: Mutex::default(),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().expect("prompt lock").push(prompt.to_string());
        self.responses
            .lock()
            .expect("response lock")
            .pop_front()
            .ok_or_else(|| anyhow!("scripted llm ran out of responses"))
    }
}

pub(crate) struct MemorySource(pub(crate) Dataset);

#[async_trait]
impl DatasetSource for MemorySource {
    async fn load(&self) -> Result<Dataset> {
        Ok(self.0.clone())
    }
}

pub(crate) fn crawl_fixture() -> Dataset {
    Dataset::from_csv(
        "Address,Status Code,Title 1,Word Count\n\
https://example.com/,200,Home,540\n\
http://example.com/legacy,301,,\n\
https://example.com/blog,200,Blog,1200\n\
https://example.com/gone,404,Not Found,12\n",
    )
    .expect("fixture should parse")
}
