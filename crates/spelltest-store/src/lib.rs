//! spelltest-store: Storage and configuration for the assessment engine.
//!
//! Implements the `AssessmentStore` and `SubscriptionPolicy` traits in
//! memory, provides a fault-injecting wrapper for exercising storage
//! failures, and loads `spelltest.toml` configuration.

pub mod config;
pub mod error;
pub mod faulty;
pub mod memory;

pub use config::{load_config, load_config_from, SpelltestConfig};
pub use error::StoreError;
pub use faulty::{FaultyStore, StoreOp};
pub use memory::MemoryStore;
