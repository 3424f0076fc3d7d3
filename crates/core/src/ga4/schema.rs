pub const ALLOWED_METRICS: &[&str] =
    &["activeUsers", "sessions", "screenPageViews", "eventCount", "totalUsers", "newUsers"];

pub const ALLOWED_DIMENSIONS: &[&str] = &[
    "date",
    "city",
    "country",
    "pagePath",
    "eventName",
    "deviceCategory",
    "platform",
    "dayOfWeek",
    "sessionSource",
];

pub fn is_allowed_metric(name: &str) -> bool {
    ALLOWED_METRICS.contains(&name)
}

pub fn is_allowed_dimension(name: &str) -> bool {
    ALLOWED_DIMENSIONS.contains(&name)
}
