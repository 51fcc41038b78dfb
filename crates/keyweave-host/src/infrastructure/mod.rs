//! Infrastructure layer: OS-facing adapters.
//!
//! Contains the keyboard hook, `SendInput` synthesis, foreground window
//! queries, clipboard access, the engine library binding and configuration
//! storage.  Each adapter module also exposes a `mock` implementation used by
//! unit and integration tests.

pub mod clipboard;
pub mod engine;
pub mod foreground;
pub mod input_capture;
pub mod input_emulation;
pub mod storage;
