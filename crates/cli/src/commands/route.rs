use querylane_core::routing::decide;
use querylane_core::QueryRequest;
use serde_json::json;

use super::CommandResult;

pub fn run(query: &str) -> CommandResult {
    let request = QueryRequest::new(query, None);
    let text = match request.query_text() {
        Ok(text) => text,
        Err(error) => return CommandResult::failure("route", "invalid_query", error.to_string(), 2),
    };

    let decision = decide(text);
    let message = match decision.matched_keyword {
        Some(keyword) => format!("routed to {} (matched keyword `{keyword}`)", decision.route.as_str()),
        None => format!("routed to {} (no keyword matched, default route)", decision.route.as_str()),
    };

    CommandResult::success(
        "route",
        message,
        Some(json!({
            "query": text,
            "route": decision.route,
            "matched_keyword": decision.matched_keyword,
            "default": decision.is_default(),
        })),
    )
}
