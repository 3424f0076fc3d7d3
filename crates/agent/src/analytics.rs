use std::sync::Arc;

use querylane_core::{validate_plan, ApplicationError, Plan, Report, ValidatedPlan};

use crate::ga4::AnalyticsBackend;
use crate::llm::LlmClient;
use crate::prompts::{analytics_explanation_prompt, ga4_plan_prompt};

pub const NO_DATA_MESSAGE: &str =
    "No data is available for this GA4 property in the selected date range.";

#[derive(Clone, Debug, PartialEq)]
pub struct AnalyticsAnswer {
    pub plan: ValidatedPlan,
    pub report: Report,
    pub explanation: String,
}

/// Question -> plan (LLM) -> allow-list validation -> GA4 report -> explanation (LLM).
pub struct AnalyticsAgent {
    llm: Arc<dyn LlmClient>,
    backend: Arc<dyn AnalyticsBackend>,
}

impl AnalyticsAgent {
    pub fn new(llm: Arc<dyn LlmClient>, backend: Arc<dyn AnalyticsBackend>) -> Self {
        Self { llm, backend }
    }

    pub async fn answer(
        &self,
        query: &str,
        property_id: &str,
    ) -> Result<AnalyticsAnswer, ApplicationError> {
        let raw_plan =
            self.llm.complete(&ga4_plan_prompt(query)).await.map_err(ApplicationError::integration)?;
        let proposed = Plan::from_llm_output(&raw_plan)?;
        let plan = validate_plan(&proposed)?;

        let dropped = (proposed.metrics.len() + proposed.dimensions.len())
            .saturating_sub(plan.metrics.len() + plan.dimensions.len());
        tracing::info!(
            event_name = "analytics.plan.validated",
            metrics = ?plan.metrics,
            dimensions = ?plan.dimensions,
            start_date = %plan.date_range.start_date,
            end_date = %plan.date_range.end_date,
            dropped_fields = dropped,
            "GA4 plan validated"
        );

        let report = self.backend.run_report(property_id, &plan).await?;
        if report.is_empty() {
            tracing::info!(event_name = "analytics.report.empty", "GA4 report returned no rows");
            return Ok(AnalyticsAnswer { plan, report, explanation: NO_DATA_MESSAGE.to_string() });
        }

        let rows_json = serde_json::to_string_pretty(&report.rows)
            .map_err(|error| ApplicationError::integration(format!("failed to encode report: {error}")))?;
        let explanation = self
            .llm
            .complete(&analytics_explanation_prompt(query, &rows_json))
            .await
            .map_err(ApplicationError::integration)?;

        Ok(AnalyticsAnswer { plan, report, explanation: explanation.trim().to_string() })
    }
}
