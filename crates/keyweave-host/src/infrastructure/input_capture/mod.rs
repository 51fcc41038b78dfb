//! Keyboard capture: the low-level OS hook that feeds [`KeyFilter`].
//!
//! On Windows this installs a `WH_KEYBOARD_LL` hook on a dedicated thread that
//! runs a Win32 message loop.  The hook callback samples modifier state,
//! asks the filter for a verdict and returns it to the OS.  It never blocks:
//! the filter only touches atomics and the non-blocking queue.
//!
//! # Testability
//!
//! The [`KeyboardHookSource`] trait (defined next to [`KeyFilter`]) lets
//! tests drive the filter with synthetic key-downs through
//! [`mock::MockKeyboardHook`].
//!
//! [`KeyFilter`]: crate::application::filter_keys::KeyFilter

pub use crate::application::filter_keys::{HookError, KeyboardHookSource};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
