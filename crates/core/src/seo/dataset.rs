use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Ordered columns plus string cells, as exported by the crawl sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub columns: Vec<String>,
    pub total_rows: usize,
    pub sample: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Parses CSV text with a header row. Ragged rows are padded or cut to
    /// the header width.
    pub fn from_csv(text: &str) -> Result<Self, csv::Error> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader =
            csv::ReaderBuilder::new().flexible(true).has_headers(true).from_reader(text.as_bytes());

        let columns =
            reader.headers()?.iter().map(|header| header.trim().to_string()).collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(columns, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Empty cells serialize as `null`.
    pub fn record(&self, row: &[String]) -> Record {
        self.columns
            .iter()
            .zip(row)
            .map(|(column, cell)| {
                let value =
                    if cell.is_empty() { Value::Null } else { Value::String(cell.clone()) };
                (column.clone(), value)
            })
            .collect()
    }

    pub fn summary(&self, sample_rows: usize) -> DatasetSummary {
        DatasetSummary {
            columns: self.columns.clone(),
            total_rows: self.len(),
            sample: self.rows().take(sample_rows).map(|row| self.record(row)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::Dataset;

    const CRAWL: &str = "\u{feff}Address,Status Code,Title 1\n\
https://example.com/,200,Home\n\
http://example.com/old,301,\n\
https://example.com/blog,200,Blog\n";

    #[test]
    fn parses_header_and_rows() {
        let dataset = Dataset::from_csv(CRAWL).expect("csv should parse");

        assert_eq!(dataset.columns(), ["Address", "Status Code", "Title 1"]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.column_index("Title 1"), Some(2));
    }

    #[test]
    fn ragged_rows_are_padded_to_header_width() {
        let dataset = Dataset::from_csv("A,B,C\n1,2\n").expect("csv should parse");
        let summary = dataset.summary(5);

        assert_eq!(summary.sample[0].get("C"), Some(&Value::Null));
    }

    #[test]
    fn summary_limits_sample_and_reports_total() {
        let dataset = Dataset::from_csv(CRAWL).expect("csv should parse");
        let summary = dataset.summary(2);

        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.sample.len(), 2);
        assert_eq!(summary.sample[1].get("Title 1"), Some(&Value::Null));
        assert_eq!(
            summary.sample[0].get("Address"),
            Some(&Value::String("https://example.com/".to_string()))
        );
    }
}
