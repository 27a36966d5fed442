//! Analysis modules.
//!
//! Detection, aggregation and statistics over an in-memory record set.

pub mod aggregator;
pub mod detectors;
pub mod statistics;

pub use aggregator::*;
pub use statistics::*;
