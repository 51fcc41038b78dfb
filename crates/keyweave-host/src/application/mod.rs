//! Application layer use cases for the keystroke pipeline.
//!
//! Use cases in this layer orchestrate the core types to fulfil one step of
//! the pipeline.  They depend on traits ([`filter_keys::KeyboardHookSource`],
//! [`inject_text::InputSynthesizer`], [`classify_app::ForegroundQuery`],
//! [`inject_text::ClipboardAccess`]) rather than OS APIs, so every step runs
//! in tests against the mocks in `infrastructure`.
//!
//! # Sub-modules
//!
//! - **`filter_keys`**  – The per-key-down decision made inside the OS hook.
//!   Runs on every physical key press and must never block.
//! - **`worker`**       – The single consumer thread draining the event queue.
//! - **`process_keys`** – What the worker does with one event: engine call,
//!   then injection or passthrough.
//! - **`classify_app`** – Fast / Slow / Clipboard strategy per foreground app.
//! - **`inject_text`**  – Turns an engine answer into synthetic input batches.
//! - **`settings`**     – Applies configuration to the engine and the filter,
//!   handles the toggle hotkey.
//! - **`pipeline`**     – Owns queue, worker and hook; start and shutdown order.

pub mod classify_app;
pub mod filter_keys;
pub mod inject_text;
pub mod pipeline;
pub mod process_keys;
pub mod settings;
pub mod worker;
