//! Domain models for Nexus.
//!
//! These are the core types shared across all crates.

pub mod session;
pub mod user;
