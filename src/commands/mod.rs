//! CLI commands for fleet-rail
//!
//! - **publish**: pack, upload and register every selected service, resuming
//!   an interrupted run from the step table

pub mod publish;

pub use publish::{PublishArgs, run_publish};
