use querylane_core::ga4::schema::{ALLOWED_DIMENSIONS, ALLOWED_METRICS};

pub fn ga4_plan_prompt(query: &str) -> String {
    format!(
        r#"You are a Google Analytics 4 expert.

Convert the following question into a GA4 reporting plan.

Rules:
- Use only these GA4 metric names: {metrics}
- Use only these GA4 dimension names: {dimensions}
- Infer date ranges correctly (YYYY-MM-DD, NdaysAgo, yesterday or today)
- Do NOT explain anything
- Output ONLY valid JSON

JSON schema:
{{
  "metrics": [],
  "dimensions": [],
  "start_date": "YYYY-MM-DD or NdaysAgo",
  "end_date": "today"
}}

User query:
{query}
"#,
        metrics = ALLOWED_METRICS.join(", "),
        dimensions = ALLOWED_DIMENSIONS.join(", "),
    )
}

pub fn analytics_explanation_prompt(query: &str, report_json: &str) -> String {
    format!(
        r#"User question:
{query}

GA4 report rows (JSON):
{report_json}

Explain the insights clearly and concisely for a business user.
"#
    )
}

pub fn seo_filter_prompt(query: &str, columns: &[String]) -> String {
    format!(
        r#"You are a Technical SEO expert working with a site crawl export.

Available columns: {columns}

Choose ONE filter that answers the question below.
Operators: equals, contains (case-insensitive), gt (greater than), lt (less than).
If no filter is needed, return "column": null.

Output ONLY valid JSON:
{{
  "column": "exact column name or null",
  "operator": "equals | contains | gt | lt",
  "value": "value to compare against"
}}

User query:
{query}
"#,
        columns = columns.join(", "),
    )
}

pub fn seo_explanation_prompt(query: &str, result_json: &str) -> String {
    format!(
        r#"User question:
{query}

Matching crawl rows (JSON):
{result_json}

Answer the question for a website owner. Mention concrete URLs where useful and keep it short.
"#
    )
}
