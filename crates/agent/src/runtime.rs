use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use querylane_core::config::RoutingConfig;
use querylane_core::routing::decide;
use querylane_core::{ApplicationError, QueryRequest, Route};
use serde::Serialize;
use serde_json::Value;

/// Where routed questions are sent. `forward` returns the downstream's JSON
/// body unchanged on success.
#[async_trait]
pub trait Downstream: Send + Sync {
    async fn forward(&self, route: Route, request: &QueryRequest) -> Result<Value, ApplicationError>;
}

/// Forwards to the analytics and SEO services' `POST /query` endpoints.
#[derive(Clone, Debug)]
pub struct HttpDownstream {
    http: reqwest::Client,
    analytics_url: String,
    seo_url: String,
}

impl HttpDownstream {
    pub fn from_config(config: &RoutingConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build downstream http client")?;

        Ok(Self {
            http,
            analytics_url: config.analytics_url.trim_end_matches('/').to_string(),
            seo_url: config.seo_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, route: Route) -> String {
        let base = match route {
            Route::Analytics => &self.analytics_url,
            Route::Seo => &self.seo_url,
        };
        format!("{base}/query")
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn forward(&self, route: Route, request: &QueryRequest) -> Result<Value, ApplicationError> {
        let service = route.as_str();
        let response = self
            .http
            .post(self.endpoint(route))
            .json(request)
            .send()
            .await
            .map_err(|error| ApplicationError::integration(format!("{service} service unreachable: {error}")))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|error| {
            ApplicationError::integration(format!("{service} service returned {status} with a non-JSON body: {error}"))
        })?;

        if let Some(error) = body.get("error").filter(|error| !error.is_null()) {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(ApplicationError::Integration(format!("{service} service failed: {message}")));
        }
        if !status.is_success() {
            return Err(ApplicationError::Integration(format!("{service} service returned {status}")));
        }
        Ok(body)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrchestratedAnswer {
    pub answer: String,
    pub route: Route,
    pub response: Value,
}

/// Routes each question to one downstream service and lifts its prose answer.
pub struct AgentRuntime {
    downstream: Arc<dyn Downstream>,
}

impl AgentRuntime {
    pub fn new(downstream: Arc<dyn Downstream>) -> Self {
        Self { downstream }
    }

    pub async fn handle(&self, request: &QueryRequest) -> Result<OrchestratedAnswer, ApplicationError> {
        let query = request.query_text()?;
        let decision = decide(query);
        tracing::info!(
            event_name = "orchestrator.routed",
            route = decision.route.as_str(),
            matched_keyword = decision.matched_keyword.unwrap_or("<default>"),
            "query routed"
        );

        let response = self.downstream.forward(decision.route, request).await?;
        let answer = ["answer", "explanation", "message"]
            .iter()
            .find_map(|field| response.get(*field).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        Ok(OrchestratedAnswer { answer, route: decision.route, response })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use querylane_core::config::AppConfig;
    use querylane_core::{ApplicationError, DomainError, QueryRequest, Route};
    use serde_json::{json, Value};

    use super::{AgentRuntime, Downstream, HttpDownstream};
    use crate::testing::spawn_router;

    #[derive(Default)]
    struct RecordingDownstream {
        calls: Mutex<Vec<(Route, QueryRequest)>>,
    }

    #[async_trait]
    impl Downstream for RecordingDownstream {
        async fn forward(&self, route: Route, request: &QueryRequest) -> Result<Value, ApplicationError> {
            self.calls.lock().expect("calls lock").push((route, request.clone()));
            Ok(match route {
                Route::Analytics => json!({"type": "analytics", "explanation": "Traffic is up."}),
                Route::Seo => json!({"type": "seo", "answer": "Two pages are broken."}),
            })
        }
    }

    #[tokio::test]
    async fn routes_by_keyword_and_lifts_answer() {
        let downstream = Arc::new(RecordingDownstream::default());
        let runtime = AgentRuntime::new(downstream.clone());

        let seo = runtime.handle(&QueryRequest::new("Which crawl URLs 404?", None)).await.expect("seo");
        let analytics = runtime
            .handle(&QueryRequest::new("GA4 sessions last week", Some("123".to_string())))
            .await
            .expect("analytics");

        assert_eq!(seo.route, Route::Seo);
        assert_eq!(seo.answer, "Two pages are broken.");
        assert_eq!(analytics.route, Route::Analytics);
        assert_eq!(analytics.answer, "Traffic is up.");
        let calls = downstream.calls.lock().expect("calls lock");
        assert_eq!(calls[1].1.property_id(), Some("123"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_forwarding() {
        let downstream = Arc::new(RecordingDownstream::default());
        let runtime = AgentRuntime::new(downstream.clone());

        let error = runtime.handle(&QueryRequest::new("  ", None)).await.expect_err("empty query");

        assert_eq!(error, ApplicationError::Domain(DomainError::EmptyQuery));
        assert!(downstream.calls.lock().expect("calls lock").is_empty());
    }

    fn downstream_for(analytics_url: String, seo_url: String) -> HttpDownstream {
        let mut config = AppConfig::default().routing;
        config.analytics_url = analytics_url;
        config.seo_url = seo_url;
        HttpDownstream::from_config(&config).expect("downstream should build")
    }

    #[tokio::test]
    async fn http_downstream_forwards_property_id() {
        let captured: Arc<Mutex<Vec<Value>>> = Arc::default();
        let sink = captured.clone();
        let router = Router::new().route(
            "/query",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().expect("capture lock").push(body);
                    Json(json!({"type": "analytics", "status": "success", "explanation": "ok"}))
                }
            }),
        );
        let base_url = spawn_router(router).await;

        let body = downstream_for(base_url, "http://127.0.0.1:9".to_string())
            .forward(Route::Analytics, &QueryRequest::new("sessions", Some("987".to_string())))
            .await
            .expect("forward should succeed");

        assert_eq!(body["explanation"], "ok");
        assert_eq!(captured.lock().expect("capture lock")[0], json!({"query": "sessions", "propertyId": "987"}));
    }

    #[tokio::test]
    async fn downstream_failure_body_becomes_integration_error() {
        let router = Router::new().route(
            "/query",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "propertyId is required", "status": "failed", "correlationId": "x"})),
                )
            }),
        );
        let base_url = spawn_router(router).await;

        let error = downstream_for("http://127.0.0.1:9".to_string(), base_url)
            .forward(Route::Seo, &QueryRequest::new("crawl errors", None))
            .await
            .expect_err("downstream failed");

        assert_eq!(
            error,
            ApplicationError::Integration("seo service failed: propertyId is required".to_string())
        );
    }

    #[tokio::test]
    async fn unreachable_downstream_is_an_integration_error() {
        let error = downstream_for("http://127.0.0.1:9".to_string(), "http://127.0.0.1:9".to_string())
            .forward(Route::Analytics, &QueryRequest::new("sessions", Some("1".to_string())))
            .await
            .expect_err("nothing listens on port 9");

        assert!(
            matches!(&error, ApplicationError::Integration(message) if message.starts_with("analytics service unreachable: ")),
            "unexpected error: {error:?}"
        );
    }

    #[tokio::test]
    async fn server_error_without_error_field_is_an_integration_error() {
        let router = Router::new()
            .route("/query", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))) }));
        let base_url = spawn_router(router).await;

        let error = downstream_for(base_url, "http://127.0.0.1:9".to_string())
            .forward(Route::Analytics, &QueryRequest::new("sessions", Some("1".to_string())))
            .await
            .expect_err("downstream returned 500");

        assert_eq!(
            error,
            ApplicationError::Integration("analytics service returned 500 Internal Server Error".to_string())
        );
    }
}
