use std::sync::Arc;

use querylane_core::llm_output::extract_json_object;
use querylane_core::seo::dataset::Record;
use querylane_core::{ApplicationError, DatasetSummary, DomainError, FilterOperator, FilterOutcome, FilterSpec};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::LlmClient;
use crate::prompts::{seo_explanation_prompt, seo_filter_prompt};
use crate::sheets::DatasetSource;
use crate::tools::{scalar_text, FilterSeoDataTool, QuerySeoDataTool, ToolRegistry, FILTER_SEO_DATA, QUERY_SEO_DATA};

#[derive(Clone, Debug, PartialEq)]
pub struct SeoAnswer {
    /// `None` when the model asked for no filter; records are then the sample.
    pub filter: Option<FilterSpec>,
    pub total_matches: usize,
    pub records: Vec<Record>,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct FilterPlan {
    #[serde(default)]
    column: Option<String>,
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    value: Value,
}

pub struct SeoAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl SeoAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        source: Arc<dyn DatasetSource>,
        max_rows: usize,
        sample_rows: usize,
    ) -> Self {
        let mut tools = ToolRegistry::default();
        tools.register(QuerySeoDataTool::new(source.clone(), sample_rows));
        tools.register(FilterSeoDataTool::new(source, max_rows));
        Self { llm, tools }
    }

    pub async fn answer(&self, query: &str) -> Result<SeoAnswer, ApplicationError> {
        let summary: DatasetSummary = self.run_tool(QUERY_SEO_DATA, json!({})).await?;

        let raw_plan = self
            .llm
            .complete(&seo_filter_prompt(query, &summary.columns))
            .await
            .map_err(ApplicationError::integration)?;
        let Some(spec) = resolve_filter(&raw_plan, &summary.columns)? else {
            tracing::info!(event_name = "seo.filter.none", "model requested no filter");
            let answer = self.explain(query, &summary).await?;
            return Ok(SeoAnswer {
                filter: None,
                total_matches: summary.total_rows,
                records: summary.sample,
                answer,
            });
        };

        tracing::info!(
            event_name = "seo.filter.validated",
            column = %spec.column,
            operator = %spec.operator,
            value = %spec.value,
            "SEO filter validated"
        );

        let outcome: FilterOutcome = self
            .run_tool(
                FILTER_SEO_DATA,
                json!({"column": spec.column, "operator": spec.operator, "value": spec.value}),
            )
            .await?;

        let answer = if outcome.total_matches == 0 {
            format!(
                "No rows in the crawl export match {} {} {}.",
                spec.column, spec.operator, spec.value
            )
        } else {
            self.explain(query, &outcome).await?
        };

        Ok(SeoAnswer {
            filter: Some(spec),
            total_matches: outcome.total_matches,
            records: outcome.records,
            answer,
        })
    }

    async fn run_tool<T>(&self, name: &str, input: Value) -> Result<T, ApplicationError>
    where
        T: serde::de::DeserializeOwned,
    {
        let output = self.tools.execute(name, input).await.map_err(tool_error)?;
        serde_json::from_value(output)
            .map_err(|error| ApplicationError::integration(format!("{name} returned an unexpected shape: {error}")))
    }

    async fn explain<T: serde::Serialize>(&self, query: &str, result: &T) -> Result<String, ApplicationError> {
        let result_json = serde_json::to_string_pretty(result)
            .map_err(|error| ApplicationError::integration(format!("failed to encode result: {error}")))?;
        let answer = self
            .llm
            .complete(&seo_explanation_prompt(query, &result_json))
            .await
            .map_err(ApplicationError::integration)?;
        Ok(answer.trim().to_string())
    }
}

/// Decodes the model's filter plan and checks it against the known columns
/// before any filtering happens.
fn resolve_filter(raw: &str, columns: &[String]) -> Result<Option<FilterSpec>, DomainError> {
    let json = extract_json_object(raw).ok_or_else(|| {
        DomainError::MalformedPlan("model response did not contain a JSON object".to_string())
    })?;
    let plan: FilterPlan =
        serde_json::from_str(json).map_err(|error| DomainError::MalformedPlan(error.to_string()))?;

    let column = match plan.column.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(column) if column.eq_ignore_ascii_case("null") => return Ok(None),
        Some(column) => column.to_string(),
    };
    if !columns.iter().any(|known| *known == column) {
        return Err(DomainError::UnknownColumn { column, available: columns.to_vec() });
    }

    let operator: FilterOperator = plan.operator.as_deref().unwrap_or_default().parse()?;
    Ok(Some(FilterSpec { column, operator, value: scalar_text(&plan.value) }))
}

fn tool_error(error: anyhow::Error) -> ApplicationError {
    match error.downcast::<DomainError>() {
        Ok(domain) => ApplicationError::Domain(domain),
        Err(other) => ApplicationError::integration(format!("{other:#}")),
    }
}
