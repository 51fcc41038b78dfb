//! Domain values shared by the hook, the worker and the injector.
//!
//! Nothing in this module performs I/O.  Each value has a single owner at a
//! time: a [`key_event::KeyEvent`] is created by the hook thread, moved through
//! the queue and consumed exactly once by the worker.
//!
//! # Sub-modules
//!
//! - **`key_event`**     – the captured key-down plus the modifier snapshot.
//! - **`engine_result`** – what the engine answers for one key.
//! - **`shortcut`**      – the toggle hotkey model.
//! - **`injection`**     – foreground classification and strategy.
//! - **`marker`**        – the sentinel stamped on every synthetic event.

pub mod engine_result;
pub mod injection;
pub mod key_event;
pub mod marker;
pub mod shortcut;
