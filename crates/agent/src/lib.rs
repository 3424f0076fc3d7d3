//! Agent runtime - LLM-backed planning, execution and explanation
//!
//! This crate holds the moving parts behind each service:
//! - `analytics` turns a question into a GA4 plan, runs it and explains it
//! - `seo` picks a filter over the crawl export and explains the matches
//! - `runtime` routes a question to the analytics or SEO service over HTTP
//!
//! # Key Types
//!
//! - `LlmClient` - completion seam, OpenAI-compatible over HTTP
//! - `AnalyticsBackend` - GA4 Data API seam (see `ga4`)
//! - `DatasetSource` - crawl export seam (see `sheets`)
//! - `ToolRegistry` - named tools the SEO agent drives
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. Its plans are reduced to allow-listed
//! fields (or known columns) before anything reaches an external API.

pub mod analytics;
pub mod ga4;
pub mod llm;
pub mod prompts;
pub mod runtime;
pub mod seo;
pub mod sheets;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;
