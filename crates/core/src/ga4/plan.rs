use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::DomainError;
use crate::llm_output::extract_json_object;

pub const DEFAULT_START_DATE: &str = "30daysAgo";
pub const DEFAULT_END_DATE: &str = "today";

/// Report plan as proposed by the model. Nothing here is trusted yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "name_list")]
    pub metrics: Vec<String>,
    #[serde(default, deserialize_with = "name_list")]
    pub dimensions: Vec<String>,
    #[serde(default = "default_start_date", deserialize_with = "start_date_or_default")]
    pub start_date: String,
    #[serde(default = "default_end_date", deserialize_with = "end_date_or_default")]
    pub end_date: String,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            metrics: Vec::new(),
            dimensions: Vec::new(),
            start_date: default_start_date(),
            end_date: default_end_date(),
        }
    }
}

impl Plan {
    pub fn from_llm_output(raw: &str) -> Result<Self, DomainError> {
        let json = extract_json_object(raw).ok_or_else(|| {
            DomainError::MalformedPlan("model response did not contain a JSON object".to_string())
        })?;
        serde_json::from_str(json).map_err(|error| DomainError::MalformedPlan(error.to_string()))
    }
}

fn default_start_date() -> String {
    DEFAULT_START_DATE.to_string()
}

fn default_end_date() -> String {
    DEFAULT_END_DATE.to_string()
}

fn start_date_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(date_or(deserializer)?.unwrap_or_else(default_start_date))
}

fn end_date_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(date_or(deserializer)?.unwrap_or_else(default_end_date))
}

/// `null` and blank strings count as "not given".
fn date_or<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()))
}

/// Accepts `["sessions"]` as well as `[{"name": "sessions"}]`; anything else
/// in the list is skipped so a single odd entry does not sink the plan.
fn name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name),
            Value::Object(mut object) => match object.remove("name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        })
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self, DomainError> {
        let start = DateToken::parse("start_date", start_date)?;
        let end = DateToken::parse("end_date", end_date)?;

        if let (DateToken::Absolute(start), DateToken::Absolute(end)) = (&start, &end) {
            if start > end {
                return Err(DomainError::InvalidDate {
                    field: "start_date",
                    value: format!("{start} (after end_date {end})"),
                });
            }
        }

        Ok(Self { start_date: start_date.trim().to_string(), end_date: end_date.trim().to_string() })
    }
}

enum DateToken {
    Absolute(NaiveDate),
    Relative,
}

impl DateToken {
    fn parse(field: &'static str, raw: &str) -> Result<Self, DomainError> {
        let value = raw.trim();
        if value == "today" || value == "yesterday" {
            return Ok(Self::Relative);
        }
        if let Some(days) = value.strip_suffix("daysAgo") {
            if !days.is_empty() && days.chars().all(|ch| ch.is_ascii_digit()) {
                return Ok(Self::Relative);
            }
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .filter(|date| date.format("%Y-%m-%d").to_string() == value)
            .map(Self::Absolute)
            .ok_or_else(|| DomainError::InvalidDate { field, value: value.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::{DateRange, Plan};
    use crate::errors::DomainError;

    #[test]
    fn decodes_fenced_plan_with_defaults() {
        let plan = Plan::from_llm_output("```json\n{\"metrics\": [\"sessions\"]}\n```")
            .expect("plan should decode");

        assert_eq!(plan.metrics, vec!["sessions".to_string()]);
        assert!(plan.dimensions.is_empty());
        assert_eq!(plan.start_date, "30daysAgo");
        assert_eq!(plan.end_date, "today");
    }

    #[test]
    fn null_or_blank_dates_fall_back_to_defaults() {
        let plan = Plan::from_llm_output(
            r#"{"metrics": ["sessions"], "start_date": null, "end_date": "  "}"#,
        )
        .expect("plan should decode");

        assert_eq!(plan.start_date, "30daysAgo");
        assert_eq!(plan.end_date, "today");
    }

    #[test]
    fn trailing_prose_with_braces_does_not_break_plan() {
        let plan = Plan::from_llm_output("{\"metrics\": [\"sessions\"]}\nNote: use {date}}")
            .expect("plan should decode");

        assert_eq!(plan.metrics, vec!["sessions".to_string()]);
    }

    #[test]
    fn accepts_named_objects_and_skips_junk_entries() {
        let plan = Plan::from_llm_output(
            r#"{"metrics": [{"name": "activeUsers"}, 7, null, "sessions"], "dimensions": null}"#,
        )
        .expect("plan should decode");

        assert_eq!(plan.metrics, vec!["activeUsers".to_string(), "sessions".to_string()]);
        assert!(plan.dimensions.is_empty());
    }

    #[test]
    fn prose_without_json_is_malformed() {
        let error = Plan::from_llm_output("I cannot help with that.").expect_err("should fail");
        assert!(matches!(error, DomainError::MalformedPlan(_)));
    }

    #[test]
    fn date_range_accepts_ga4_relative_tokens() {
        assert!(DateRange::parse("7daysAgo", "today").is_ok());
        assert!(DateRange::parse("2024-01-01", "yesterday").is_ok());
        assert!(DateRange::parse("2024-01-01", "2024-01-31").is_ok());
    }

    #[test]
    fn date_range_rejects_free_text_and_inverted_ranges() {
        assert!(matches!(
            DateRange::parse("last week", "today"),
            Err(DomainError::InvalidDate { field: "start_date", .. })
        ));
        assert!(matches!(
            DateRange::parse("2024-02-01", "2024-01-01"),
            Err(DomainError::InvalidDate { field: "start_date", .. })
        ));
        assert!(DateRange::parse("daysAgo", "today").is_err());
        assert!(matches!(
            DateRange::parse("2024-1-5", "today"),
            Err(DomainError::InvalidDate { field: "start_date", .. })
        ));
        assert!(matches!(
            DateRange::parse("2024-01-01", "2024-01-5"),
            Err(DomainError::InvalidDate { field: "end_date", .. })
        ));
    }
}
