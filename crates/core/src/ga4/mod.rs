//! Google Analytics 4 planning, allow-list validation and report shaping.
//!
//! The model only ever proposes a [`plan::Plan`]; nothing reaches the Data API
//! until [`validator::validate_plan`] has reduced it to permitted fields.

pub mod plan;
pub mod report;
pub mod schema;
pub mod validator;
