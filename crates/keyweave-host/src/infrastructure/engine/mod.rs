//! Bindings to the external transformation engine.
//!
//! The engine ships as a native library (`gonhanh_core`) with a flat C ABI.
//! Linking is opt-in through the `native-engine` feature so the rest of the
//! crate, and its tests, build on machines without the library.

pub mod native;

#[cfg(feature = "native-engine")]
pub use native::NativeEngine;
