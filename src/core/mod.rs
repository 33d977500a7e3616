//! Shared primitives for the risk gate: record model, configuration,
//! input decoding, error types and output rendering.
//!
//! Nothing in `core` knows about pipeline stage ordering; that lives in
//! [`crate::engine`].

pub mod assets;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod redact;
pub mod time;
