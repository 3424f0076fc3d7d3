use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Body accepted by every `POST /query` endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(rename = "propertyId", default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, property_id: Option<String>) -> Self {
        Self { query: query.into(), property_id }
    }

    pub fn query_text(&self) -> Result<&str, DomainError> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyQuery);
        }
        Ok(trimmed)
    }

    /// Blank property ids are treated as absent.
    pub fn property_id(&self) -> Option<&str> {
        self.property_id.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn require_property_id(&self) -> Result<&str, DomainError> {
        self.property_id().ok_or(DomainError::MissingPropertyId)
    }
}

/// Error body shared by all services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFailure {
    pub error: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl QueryFailure {
    pub fn new(error: impl Into<String>, correlation_id: Option<String>) -> Self {
        Self { error: error.into(), status: "failed".to_string(), correlation_id }
    }
}
