//! Crawl-export dataset (Screaming Frog style CSV) and the filter operators
//! the SEO agent may apply to it.

pub mod dataset;
pub mod filter;
