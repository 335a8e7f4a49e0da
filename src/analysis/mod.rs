//! Analysis modules.
//!
//! Aggregation over the record stream and the percentile estimator used
//! for the text-length distribution.

pub mod aggregator;
pub mod percentile;

pub use aggregator::*;
