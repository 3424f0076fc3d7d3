use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use querylane_core::config::SeoConfig;
use querylane_core::Dataset;

/// Where the crawl export comes from. Loaded fresh for every question.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn load(&self) -> Result<Dataset>;
}

/// Published Google Sheet (or any URL) serving the crawl export as CSV.
#[derive(Clone, Debug)]
pub struct SheetCsvSource {
    http: reqwest::Client,
    url: String,
}

impl SheetCsvSource {
    pub fn from_config(config: &SeoConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build sheet http client")?;

        Ok(Self { http, url: config.sheet_url.clone() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DatasetSource for SheetCsvSource {
    async fn load(&self) -> Result<Dataset> {
        let response =
            self.http.get(&self.url).send().await.context("crawl sheet request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("crawl sheet returned {status}");
        }

        let text = response.text().await.context("failed to read crawl sheet body")?;
        let dataset = Dataset::from_csv(&text).context("crawl sheet is not valid CSV")?;

        tracing::debug!(
            event_name = "seo.sheet.loaded",
            columns = dataset.columns().len(),
            rows = dataset.len(),
            "crawl sheet loaded"
        );
        Ok(dataset)
    }
}
