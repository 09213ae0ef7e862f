//! # Storefront Bench
//!
//! Latency comparisons for the storefront read paths.
//!
//! - stock counter: uncached store read vs. cache-aside read
//! - name search: substring scan vs. index-eligible prefix scan

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod report;
pub mod runner;

pub use report::{Comparison, LatencySummary};
pub use runner::{search_comparison, stock_comparison};
