//! Buildenv library exports for testing.
//!
//! The binary in `main.rs` is the real entry point; this module exposes the
//! internal components so the integration tests can drive them with fake
//! process runners.

pub mod archive;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod keyring;
pub mod preflight;
pub mod process;
pub mod sanitize;
pub mod spec;
