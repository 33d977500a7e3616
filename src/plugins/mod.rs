//! Native-output adapters.
//!
//! Each adapter turns one collaborator tool's documented JSON output into
//! raw records and describes what it reads via `schema()`. Adapters are
//! registered in [`crate::sources`].

pub mod checkov;
pub mod terraform;
pub mod tfsec;
