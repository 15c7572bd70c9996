//! jenv core - scan rules and domain types
//!
//! This crate holds the pieces of installation discovery that need no
//! filesystem access: the path filter, the exclusion matcher, the scan
//! aggregate and the task/outcome types passed between the dispatcher and
//! its workers. Ports describe what the scanner and the management plane
//! need from the outside world; the `jenv` crate provides the adapters.

pub mod app;
pub mod domain;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod ports;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
