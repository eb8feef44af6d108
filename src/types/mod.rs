//! Type definitions for the credit scoring pipeline

pub mod record;
pub mod scoring;

pub use record::{Record, RecordSet, Value};
pub use scoring::{Decision, ScoringResult};
