use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("No valid GA4 metrics inferred")]
    NoValidMetrics,
    #[error("invalid date `{value}` for {field} (expected YYYY-MM-DD, NdaysAgo, today or yesterday)")]
    InvalidDate { field: &'static str, value: String },
    #[error("malformed plan: {0}")]
    MalformedPlan(String),
    #[error("Column '{column}' not found. Available: [{}]", .available.join(", "))]
    UnknownColumn { column: String, available: Vec<String> },
    #[error("Unknown operator. Use equals, contains, gt, lt.")]
    UnknownOperator(String),
    #[error("comparison value `{0}` is not a number")]
    NonNumericValue(String),
    #[error("propertyId is required")]
    MissingPropertyId,
    #[error("query text is required")]
    EmptyQuery,
    #[error("invalid request body: {0}")]
    InvalidRequest(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("bad gateway: {message}")]
    BadGateway { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::BadGateway { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::BadGateway { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::BadGateway { .. } => 502,
            Self::Internal { .. } => 500,
        }
    }
}

impl ApplicationError {
    pub fn integration(error: impl std::fmt::Display) -> Self {
        Self::Integration(error.to_string())
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::BadGateway { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Integration(message) => Self::BadGateway { message, correlation_id },
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
