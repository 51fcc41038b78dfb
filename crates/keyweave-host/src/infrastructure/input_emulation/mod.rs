//! Synthetic input submission.
//!
//! The SendInput implementation is selected at compile time via
//! `#[cfg(target_os = "windows")]`; the recording mock is always available so
//! integration tests on any host can drive the pipeline.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
