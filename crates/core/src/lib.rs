pub mod config;
pub mod domain;
pub mod errors;
pub mod ga4;
pub mod llm_output;
pub mod routing;
pub mod seo;

pub use domain::query::{QueryFailure, QueryRequest};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ga4::plan::{DateRange, Plan};
pub use ga4::report::{Report, ReportRow, ReportValue};
pub use ga4::validator::{validate_plan, ValidatedPlan};
pub use routing::{route, Route, RoutingDecision};
pub use seo::dataset::{Dataset, DatasetSummary};
pub use seo::filter::{apply_filter, FilterOperator, FilterOutcome, FilterSpec};
