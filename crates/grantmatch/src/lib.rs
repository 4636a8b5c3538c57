//! Recommendation engine for funding opportunities.
//!
//! The crate scores catalog grants against a researcher's stated preferences
//! and interaction history, producing a ranked, explainable list. Persistence,
//! similarity search, and the candidate pre-filter live behind traits in
//! [`recommendation::providers`] so the engine itself stays stateless and pure.

pub mod config;
pub mod error;
pub mod recommendation;
pub mod telemetry;
