use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Analytics,
    Seo,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Seo => "seo",
        }
    }
}

/// Branch used when no keyword matches.
pub const DEFAULT_ROUTE: Route = Route::Analytics;

/// Checked in order; the first rule with a matching keyword wins.
const ROUTING_RULES: &[(Route, &[&str])] =
    &[(Route::Analytics, &["ga4"]), (Route::Seo, &["seo", "crawl"])];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub route: Route,
    pub matched_keyword: Option<&'static str>,
}

impl RoutingDecision {
    pub fn is_default(&self) -> bool {
        self.matched_keyword.is_none()
    }
}

pub fn decide(query: &str) -> RoutingDecision {
    let lowered = query.to_lowercase();
    ROUTING_RULES
        .iter()
        .find_map(|(route, keywords)| {
            keywords
                .iter()
                .find(|keyword| lowered.contains(*keyword))
                .map(|keyword| RoutingDecision { route: *route, matched_keyword: Some(*keyword) })
        })
        .unwrap_or(RoutingDecision { route: DEFAULT_ROUTE, matched_keyword: None })
}

pub fn route(query: &str) -> Route {
    decide(query).route
}
