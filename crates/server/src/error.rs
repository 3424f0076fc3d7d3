use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use querylane_core::{ApplicationError, DomainError, InterfaceError, QueryFailure};
use tracing::{error, warn};

/// Failure surfaced at the HTTP boundary as `{error, status: "failed", correlationId}`.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn from_application(error: ApplicationError, correlation_id: &str, service: &str) -> Self {
        let interface = error.into_interface(correlation_id);
        match &interface {
            InterfaceError::BadRequest { message, .. } => warn!(
                event_name = "query.rejected",
                correlation_id = %correlation_id,
                service = %service,
                error = %message,
                "query rejected"
            ),
            InterfaceError::BadGateway { message, .. } | InterfaceError::Internal { message, .. } => {
                error!(
                    event_name = "query.failed",
                    correlation_id = %correlation_id,
                    service = %service,
                    error = %message,
                    "query failed"
                )
            }
        }
        Self(interface)
    }

    pub fn from_rejection(rejection: JsonRejection, correlation_id: &str, service: &str) -> Self {
        Self::from_application(
            DomainError::InvalidRequest(rejection.body_text()).into(),
            correlation_id,
            service,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = QueryFailure::new(self.0.message(), Some(self.0.correlation_id().to_string()));
        (status, Json(body)).into_response()
    }
}

pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use querylane_core::{ApplicationError, DomainError, QueryFailure};

    use super::ApiError;

    #[tokio::test]
    async fn maps_domain_errors_to_bad_request_body() {
        let response =
            ApiError::from_application(DomainError::MissingPropertyId.into(), "corr-1", "analytics_agent")
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let failure: QueryFailure = serde_json::from_slice(&bytes).expect("failure shape");
        assert_eq!(failure.error, "propertyId is required");
        assert_eq!(failure.status, "failed");
        assert_eq!(failure.correlation_id.as_deref(), Some("corr-1"));
    }

    #[test]
    fn maps_integration_errors_to_bad_gateway() {
        let response = ApiError::from_application(
            ApplicationError::Integration("GA4 returned 503".to_string()),
            "corr-2",
            "analytics_agent",
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
