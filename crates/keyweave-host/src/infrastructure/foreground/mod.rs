//! Foreground window queries for application classification.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
