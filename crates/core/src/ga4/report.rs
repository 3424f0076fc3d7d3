use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ga4::validator::ValidatedPlan;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ReportValue {
    /// Metric cells arrive as strings; integral numbers become `Int`, other
    /// finite numbers `Float`, everything else stays text.
    pub fn from_metric(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 => {
                Self::Int(value as i64)
            }
            Ok(value) if value.is_finite() => Self::Float(value),
            _ => Self::Text(raw.to_string()),
        }
    }
}

/// One report row keyed by header name, dimensions first, then metrics.
pub type ReportRow = IndexMap<String, ReportValue>;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub dimension_headers: Vec<String>,
    pub metric_headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub dimensions: Vec<NamedField>,
    pub metrics: Vec<NamedField>,
    pub date_ranges: Vec<WireDateRange>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDateRange {
    pub start_date: String,
    pub end_date: String,
}

impl From<&ValidatedPlan> for RunReportRequest {
    fn from(plan: &ValidatedPlan) -> Self {
        let named = |names: &[String]| {
            names.iter().map(|name| NamedField { name: name.clone() }).collect::<Vec<_>>()
        };
        Self {
            dimensions: named(&plan.dimensions),
            metrics: named(&plan.metrics),
            date_ranges: vec![WireDateRange {
                start_date: plan.date_range.start_date.clone(),
                end_date: plan.date_range.end_date.clone(),
            }],
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<NamedField>,
    #[serde(default)]
    pub metric_headers: Vec<NamedField>,
    #[serde(default)]
    pub rows: Vec<WireRow>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRow {
    #[serde(default)]
    pub dimension_values: Vec<WireValue>,
    #[serde(default)]
    pub metric_values: Vec<WireValue>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WireValue {
    #[serde(default)]
    pub value: String,
}

impl RunReportResponse {
    /// Flattens the positional GA4 rows into name-keyed rows. Headers from the
    /// response win; the requested names fill in when the API omits them.
    pub fn into_report(self, plan: &ValidatedPlan) -> Report {
        let dimension_headers = headers_or(self.dimension_headers, &plan.dimensions);
        let metric_headers = headers_or(self.metric_headers, &plan.metrics);

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let mut item = ReportRow::new();
                for (name, cell) in dimension_headers.iter().zip(row.dimension_values) {
                    item.insert(name.clone(), ReportValue::Text(cell.value));
                }
                for (name, cell) in metric_headers.iter().zip(row.metric_values) {
                    item.insert(name.clone(), ReportValue::from_metric(&cell.value));
                }
                item
            })
            .collect();

        Report { dimension_headers, metric_headers, rows }
    }
}

fn headers_or(headers: Vec<NamedField>, requested: &[String]) -> Vec<String> {
    if headers.is_empty() {
        requested.to_vec()
    } else {
        headers.into_iter().map(|header| header.name).collect()
    }
}
