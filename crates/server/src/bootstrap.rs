use std::sync::Arc;

use axum::Router;
use querylane_agent::{
    analytics::AnalyticsAgent, ga4::Ga4Client, llm::OpenAiCompatibleClient, runtime::AgentRuntime,
    runtime::HttpDownstream, seo::SeoAgent, sheets::SheetCsvSource,
};
use querylane_core::config::{AppConfig, ConfigError, LoadOptions, ServiceRole};
use thiserror::Error;
use tracing::info;

use crate::{analytics, health, orchestrator, seo};

pub struct Application {
    pub config: AppConfig,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to initialize {component}: {message}")]
    Component { component: &'static str, message: String },
}

impl BootstrapError {
    fn component(component: &'static str, error: anyhow::Error) -> Self {
        Self::Component { component, message: format!("{error:#}") }
    }
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let role = config.server.role;
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        service = role.service_name(),
        "starting application bootstrap"
    );

    let service_router = match role {
        ServiceRole::Orchestrator => {
            let downstream = HttpDownstream::from_config(&config.routing)
                .map_err(|error| BootstrapError::component("downstream client", error))?;
            orchestrator::router(Arc::new(AgentRuntime::new(Arc::new(downstream))))
        }
        ServiceRole::Analytics => {
            let llm = llm_client(&config)?;
            let ga4 = Ga4Client::from_config(&config.ga4)
                .map_err(|error| BootstrapError::component("GA4 client", error))?;
            analytics::router(Arc::new(AnalyticsAgent::new(llm, Arc::new(ga4))))
        }
        ServiceRole::Seo => {
            let llm = llm_client(&config)?;
            let source = SheetCsvSource::from_config(&config.seo)
                .map_err(|error| BootstrapError::component("crawl sheet source", error))?;
            seo::router(Arc::new(SeoAgent::new(
                llm,
                Arc::new(source),
                config.seo.max_rows,
                config.seo.sample_rows,
            )))
        }
    };

    let router = service_router.merge(health::router(role.service_name()));
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        service = role.service_name(),
        "application bootstrap complete"
    );

    Ok(Application { config, router })
}

fn llm_client(config: &AppConfig) -> Result<Arc<OpenAiCompatibleClient>, BootstrapError> {
    if config.llm.api_key.is_none() {
        tracing::warn!(
            event_name = "system.bootstrap.llm_key_missing",
            correlation_id = "bootstrap",
            "llm.api_key is not set; requests are sent without authorization"
        );
    }
    OpenAiCompatibleClient::from_config(&config.llm)
        .map(Arc::new)
        .map_err(|error| BootstrapError::component("llm client", error))
}
