//! spelltest-core: Assessment engine, scoring policies, and data model.
//!
//! This crate owns the algorithmic part of the spelling platform: picking
//! questions for a student attempt, scoring each submitted answer, and
//! finalizing the attempt. Persistence and subscription checks are reached
//! through the traits in [`traits`].

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod locks;
pub mod model;
pub mod parser;
pub mod policy;
pub mod selector;
pub mod statistics;
pub mod traits;

pub use engine::{AssessmentEngine, EngineConfig};
pub use error::{EngineError, EngineResult};
