use serde::Serialize;

use crate::errors::DomainError;
use crate::ga4::plan::{DateRange, Plan};
use crate::ga4::schema::{is_allowed_dimension, is_allowed_metric};

/// A plan whose fields are all on the allow-lists. Only this type is
/// accepted by the reporting client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidatedPlan {
    pub metrics: Vec<String>,
    pub dimensions: Vec<String>,
    pub date_range: DateRange,
}

/// Drops metrics and dimensions that are not allow-listed (silently, one by
/// one) and fails only when no metric survives.
pub fn validate_plan(plan: &Plan) -> Result<ValidatedPlan, DomainError> {
    let metrics = retain_allowed(&plan.metrics, is_allowed_metric);
    let dimensions = retain_allowed(&plan.dimensions, is_allowed_dimension);

    if metrics.is_empty() {
        return Err(DomainError::NoValidMetrics);
    }

    let date_range = DateRange::parse(&plan.start_date, &plan.end_date)?;

    Ok(ValidatedPlan { metrics, dimensions, date_range })
}

fn retain_allowed(fields: &[String], allowed: fn(&str) -> bool) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        if allowed(field) && !kept.contains(field) {
            kept.push(field.clone());
        }
    }
    kept
}
