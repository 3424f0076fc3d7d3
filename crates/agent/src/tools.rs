use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use querylane_core::{apply_filter, FilterSpec};
use serde::Deserialize;
use serde_json::Value;

use crate::sheets::DatasetSource;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| anyhow!("tool `{name}` is not registered"))?;
        tool.execute(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

pub const QUERY_SEO_DATA: &str = "query_seo_data";
pub const FILTER_SEO_DATA: &str = "filter_seo_data";

/// Returns the crawl export's columns, row count and a few sample rows.
pub struct QuerySeoDataTool {
    source: Arc<dyn DatasetSource>,
    sample_rows: usize,
}

impl QuerySeoDataTool {
    pub fn new(source: Arc<dyn DatasetSource>, sample_rows: usize) -> Self {
        Self { source, sample_rows }
    }
}

#[async_trait]
impl Tool for QuerySeoDataTool {
    fn name(&self) -> &'static str {
        QUERY_SEO_DATA
    }

    async fn execute(&self, _input: Value) -> Result<Value> {
        let dataset = self.source.load().await?;
        Ok(serde_json::to_value(dataset.summary(self.sample_rows))?)
    }
}

/// Applies one `{column, operator, value}` filter to the crawl export.
///
/// Domain failures (unknown column or operator, non-numeric threshold) are
/// returned as `DomainError` inside the `anyhow::Error` so callers can
/// recover them with `downcast_ref`.
pub struct FilterSeoDataTool {
    source: Arc<dyn DatasetSource>,
    max_rows: usize,
}

impl FilterSeoDataTool {
    pub fn new(source: Arc<dyn DatasetSource>, max_rows: usize) -> Self {
        Self { source, max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct FilterInput {
    column: String,
    operator: String,
    #[serde(default)]
    value: Value,
}

#[async_trait]
impl Tool for FilterSeoDataTool {
    fn name(&self) -> &'static str {
        FILTER_SEO_DATA
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: FilterInput =
            serde_json::from_value(input).context("filter_seo_data expects column, operator and value")?;
        let spec = FilterSpec {
            column: input.column,
            operator: input.operator.parse()?,
            value: scalar_text(&input.value),
        };

        let dataset = self.source.load().await?;
        let outcome = apply_filter(&dataset, &spec, self.max_rows)?;
        Ok(serde_json::to_value(outcome)?)
    }
}

/// Models emit thresholds as numbers or strings; both compare as text.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
