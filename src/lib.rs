//! jenv library
//!
//! Exposes the scanner, adapters and service layer used by the `jenv`
//! binary so they can be exercised from integration tests.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod scan;
pub mod services;
