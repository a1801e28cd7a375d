//! HellPot configuration bootstrap library.
//!
//! This module exports the startup configuration components for the binary
//! and for integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
