//! Staged, resumable release of a service fleet
//!
//! # Stages
//!
//! Every publishable service moves through four ordered stages:
//!
//! | ordinal | stage        | effect                                        |
//! |---------|--------------|-----------------------------------------------|
//! | 1       | `pack`       | one archive per applicable target             |
//! | 2       | `upload`     | artifact tree pushed, content id (`fid`) kept |
//! | 3       | `set-version`| version record committed for the service id   |
//! | 4       | `finish`     | manifest entry emitted                        |
//!
//! The step table (`.fleet-rail/steps.json`) remembers the furthest stage each
//! service completed. A stage runs only when the recorded ordinal is below its
//! own, so re-running an interrupted release never repeats completed work.
//!
//! # Layout
//!
//! - **version**: channel codes and the `1.1.<channel>.<build>` version string
//! - **stage**: the stage union and its on-disk encoding
//! - **store**: the durable step table
//! - **staging**: staging tree and archive layout for packing
//! - **guard**: balance check run before any stage work
//! - **manifest**: the release manifest written on success
//! - **orchestrator**: the run loop tying it all together

pub mod guard;
pub mod manifest;
pub mod orchestrator;
pub mod stage;
pub mod staging;
pub mod store;
pub mod version;
