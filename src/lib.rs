//! Feature derivation for cricket batter expected-runs models: an immutable
//! innings corpus, causal rolling-form and contextual aggregates computed
//! over it, batch assembly into a fixed training schema, and an online
//! assembler that fills missing serving-time inputs through a tiered
//! fallback chain.

pub mod artifact;
pub mod context;
pub mod corpus;
pub mod encoder;
pub mod error;
pub mod features;
pub mod match_context;
pub mod online;
pub mod query;
pub mod rolling;
pub mod store;
