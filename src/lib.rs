//! Multiscreen - pin full-screen video playback to individual monitors
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod monitor;
pub mod orchestrator;
pub mod platform;
pub mod session;
pub mod source;
