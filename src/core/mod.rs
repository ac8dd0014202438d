//! Core building blocks shared by every fleet-rail operation
//!
//! - **config**: fleet.toml parsing, service descriptors and their validation
//! - **env**: process environment captured once per run
//! - **error**: error categories with exit codes and help messages

pub mod config;
pub mod env;
pub mod error;
