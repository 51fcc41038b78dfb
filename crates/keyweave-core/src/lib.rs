//! # keyweave-core
//!
//! Shared library for Keyweave containing the domain values that travel through
//! the keystroke pipeline, the key translation table, the hook → worker event
//! queue, and the boundary to the external text-transformation engine.
//!
//! This crate has zero dependencies on OS APIs.  Everything that touches the
//! hook, `SendInput`, the clipboard or the foreground window lives in
//! `keyweave-host`.
//!
//! # Architecture overview
//!
//! Keyweave is the delivery mechanism for a live input-method editor.  Every
//! key-down is intercepted system-wide, relevant keys are handed to the
//! transformation engine, and the engine's answer (erase N characters, type
//! these characters instead) is synthesised back into the focused application.
//!
//! ```text
//! OS hook ──► EventQueue ──► Worker ──► engine ──► AppClassifier ──► Injector ──► OS
//! ```
//!
//! This crate defines:
//!
//! - **`domain`** – Immutable values: [`KeyEvent`], [`EngineResult`],
//!   [`KeyboardShortcut`], the injection strategy types and the one
//!   process-wide [`INJECTION_MARKER`].
//!
//! - **`keymap`** – The static table translating Windows virtual-key codes into
//!   the engine's neutral keycode space.
//!
//! - **`queue`** – The single-producer/single-consumer [`EventQueue`] between the
//!   hook thread and the worker thread.
//!
//! - **`engine`** – The [`TransformationEngine`] trait and [`SharedEngine`], the
//!   lock that serialises every call into the engine.

pub mod domain;
pub mod engine;
pub mod keymap;
pub mod queue;

pub use domain::engine_result::{EngineAction, EngineResult, MAX_OUTPUT_CHARS};
pub use domain::injection::{InjectionClassification, InjectionStrategy, WindowHandle};
pub use domain::key_event::{KeyEvent, ModifierState};
pub use domain::marker::INJECTION_MARKER;
pub use domain::shortcut::{KeyboardShortcut, ShortcutParseError};
pub use engine::{EnabledFlag, InputMethod, SharedEngine, TransformationEngine};
pub use keymap::{KeyTranslator, NeutralKey};
pub use queue::{EventQueue, PipelineEvent};
