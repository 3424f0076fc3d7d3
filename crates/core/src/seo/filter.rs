use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::seo::dataset::{Dataset, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    Gt,
    Lt,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::Gt => "gt",
            Self::Lt => "lt",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equals" => Ok(Self::Equals),
            "contains" => Ok(Self::Contains),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            other => Err(DomainError::UnknownOperator(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub total_matches: usize,
    pub records: Vec<Record>,
}

enum Predicate {
    Equals(String),
    Contains(String),
    Gt(f64),
    Lt(f64),
}

impl Predicate {
    fn build(operator: FilterOperator, value: &str) -> Result<Self, DomainError> {
        let numeric = || {
            value.trim().parse::<f64>().map_err(|_| DomainError::NonNumericValue(value.to_string()))
        };
        Ok(match operator {
            FilterOperator::Equals => Self::Equals(value.trim().to_string()),
            FilterOperator::Contains => Self::Contains(value.to_lowercase()),
            FilterOperator::Gt => Self::Gt(numeric()?),
            FilterOperator::Lt => Self::Lt(numeric()?),
        })
    }

    fn matches(&self, cell: &str) -> bool {
        match self {
            Self::Equals(expected) => cell.trim() == expected,
            Self::Contains(needle) => !cell.is_empty() && cell.to_lowercase().contains(needle),
            Self::Gt(threshold) => numeric_cell(cell).is_some_and(|value| value > *threshold),
            Self::Lt(threshold) => numeric_cell(cell).is_some_and(|value| value < *threshold),
        }
    }
}

fn numeric_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Applies one comparison to `spec.column` and returns at most `limit`
/// matching records along with the full match count.
pub fn apply_filter(
    dataset: &Dataset,
    spec: &FilterSpec,
    limit: usize,
) -> Result<FilterOutcome, DomainError> {
    let index = dataset.column_index(&spec.column).ok_or_else(|| DomainError::UnknownColumn {
        column: spec.column.clone(),
        available: dataset.columns().to_vec(),
    })?;
    let predicate = Predicate::build(spec.operator, &spec.value)?;

    let mut total_matches = 0;
    let mut records = Vec::new();
    for row in dataset.rows() {
        if !predicate.matches(&row[index]) {
            continue;
        }
        total_matches += 1;
        if records.len() < limit {
            records.push(dataset.record(row));
        }
    }

    Ok(FilterOutcome { total_matches, records })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{apply_filter, FilterOperator, FilterSpec};
    use crate::errors::DomainError;
    use crate::seo::dataset::Dataset;

    fn crawl() -> Dataset {
        Dataset::from_csv(
            "Address,Status Code,Title 1,Word Count\n\
https://example.com/,200,Home Page,540\n\
http://example.com/legacy,301,,\n\
https://example.com/blog,200,Our BLOG,1200\n\
https://example.com/missing,404,Not Found,12\n",
        )
        .expect("fixture should parse")
    }

    fn spec(column: &str, operator: FilterOperator, value: &str) -> FilterSpec {
        FilterSpec { column: column.to_string(), operator, value: value.to_string() }
    }

    #[test]
    fn operator_parsing_rejects_unknown_names() {
        assert_eq!("GT".parse::<FilterOperator>(), Ok(FilterOperator::Gt));
        assert_eq!(
            "between".parse::<FilterOperator>(),
            Err(DomainError::UnknownOperator("between".to_string()))
        );
    }

    #[test]
    fn equals_compares_text() {
        let outcome =
            apply_filter(&crawl(), &spec("Status Code", FilterOperator::Equals, "200"), 20)
                .expect("filter should run");

        assert_eq!(outcome.total_matches, 2);
    }

    #[test]
    fn contains_is_case_insensitive_and_skips_empty_cells() {
        let outcome = apply_filter(&crawl(), &spec("Title 1", FilterOperator::Contains, "blog"), 20)
            .expect("filter should run");

        assert_eq!(outcome.total_matches, 1);
        assert_eq!(
            outcome.records[0].get("Address"),
            Some(&Value::String("https://example.com/blog".to_string()))
        );
    }

    #[test]
    fn numeric_operators_ignore_non_numeric_cells() {
        let gt = apply_filter(&crawl(), &spec("Word Count", FilterOperator::Gt, "500"), 20)
            .expect("filter should run");
        let lt = apply_filter(&crawl(), &spec("Word Count", FilterOperator::Lt, "100"), 20)
            .expect("filter should run");

        assert_eq!(gt.total_matches, 2);
        assert_eq!(lt.total_matches, 1);
    }

    #[test]
    fn numeric_operator_requires_numeric_value() {
        let error = apply_filter(&crawl(), &spec("Word Count", FilterOperator::Gt, "many"), 20)
            .expect_err("non-numeric threshold must fail");

        assert_eq!(error, DomainError::NonNumericValue("many".to_string()));
    }

    #[test]
    fn unknown_column_lists_available_columns() {
        let error = apply_filter(&crawl(), &spec("H1-1", FilterOperator::Equals, "x"), 20)
            .expect_err("unknown column must fail");

        assert!(error.to_string().contains("Column 'H1-1' not found"));
        assert!(error.to_string().contains("Status Code"));
    }

    #[test]
    fn limit_caps_records_but_not_match_count() {
        let outcome = apply_filter(&crawl(), &spec("Address", FilterOperator::Contains, "https"), 2)
            .expect("filter should run");

        assert_eq!(outcome.total_matches, 3);
        assert_eq!(outcome.records.len(), 2);
    }
}
