//! Integration tests driving the fleet-rail binary against fake external tools

#![cfg(unix)]

mod helpers;
mod test_publish;
mod test_resume;
