//! InjectTextUseCase: turns an engine answer into synthetic keyboard input.
//!
//! The injector only builds input batches and decides their timing.  The OS
//! submission is behind [`InputSynthesizer`], the sleeps behind [`Pacer`] and
//! the clipboard behind [`ClipboardAccess`], so every strategy can be verified
//! against recording mocks.
//!
//! Every [`SyntheticInput`] is built through its constructors, which stamp
//! [`INJECTION_MARKER`]; the hook lets marked events through untouched.
//!
//! # Timing
//!
//! | Strategy  | Sequence                                                           |
//! |-----------|--------------------------------------------------------------------|
//! | Fast      | backspaces (1 batch), `fast_delay`, text (1 batch)                 |
//! | Slow      | backspaces (1 batch), `slow_post_delay`, `slow_pre_delay`, then per character one pair + `slow_key_delay` |
//! | Clipboard | save and set clipboard, backspaces (1 batch), `fast_delay`, Ctrl+V, `clipboard_restore_delay`, restore clipboard |
//!
//! Delays attached to backspaces are skipped when there are none.
//!
//! The clipboard is restored on every exit path once the replacement has been
//! placed on it, including when a submission fails.  A clipboard that held no
//! text is cleared again.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keyweave_core::keymap::windows_vk::{VK_BACK, VK_CONTROL, VK_SHIFT, VK_V};
use keyweave_core::{InjectionStrategy, INJECTION_MARKER};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for synthetic input submission.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),
    /// The OS accepted only part of a batch (another thread's input, UIPI).
    #[error("only {sent} of {expected} synthetic inputs were accepted")]
    Partial { sent: usize, expected: usize },
}

/// Error type for clipboard access.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard operation failed: {0}")]
    Operation(String),
}

/// Which key a synthetic input presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKey {
    /// A Windows virtual-key code (backspace, Shift, Ctrl, passthrough keys).
    Virtual(u16),
    /// One UTF-16 code unit typed directly, independent of the keyboard layout.
    Unicode(u16),
}

/// One synthetic key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticInput {
    pub key: SyntheticKey,
    pub key_up: bool,
    /// Always [`INJECTION_MARKER`].
    pub extra_info: usize,
}

impl SyntheticInput {
    pub fn virtual_key(vk: u16, key_up: bool) -> Self {
        Self { key: SyntheticKey::Virtual(vk), key_up, extra_info: INJECTION_MARKER }
    }

    pub fn unicode(unit: u16, key_up: bool) -> Self {
        Self { key: SyntheticKey::Unicode(unit), key_up, extra_info: INJECTION_MARKER }
    }
}

/// Submits batches of synthetic input to the OS.
///
/// A batch is delivered atomically: no physical input interleaves with it.
pub trait InputSynthesizer: Send + Sync {
    fn submit(&self, batch: &[SyntheticInput]) -> Result<(), InjectionError>;
}

/// Blocks the injecting thread between submissions.
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration);
}

/// [`Pacer`] backed by `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Text access to the shared system clipboard.
pub trait ClipboardAccess: Send {
    /// Current clipboard text, `None` if the clipboard holds no text.
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError>;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
    /// Empties the clipboard.
    fn clear(&mut self) -> Result<(), ClipboardError>;
}

/// Delays used by the injection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionTiming {
    pub fast_delay: Duration,
    pub slow_post_delay: Duration,
    pub slow_pre_delay: Duration,
    pub slow_key_delay: Duration,
    pub clipboard_restore_delay: Duration,
}

impl Default for InjectionTiming {
    fn default() -> Self {
        Self {
            fast_delay: Duration::from_millis(2),
            slow_post_delay: Duration::from_millis(3),
            slow_pre_delay: Duration::from_millis(5),
            slow_key_delay: Duration::from_millis(1),
            clipboard_restore_delay: Duration::from_millis(50),
        }
    }
}

/// Builds and paces synthetic input.
pub struct Injector {
    synthesizer: Arc<dyn InputSynthesizer>,
    pacer: Arc<dyn Pacer>,
    clipboard: Option<Box<dyn ClipboardAccess>>,
    timing: InjectionTiming,
}

impl Injector {
    pub fn new(
        synthesizer: Arc<dyn InputSynthesizer>,
        pacer: Arc<dyn Pacer>,
        timing: InjectionTiming,
    ) -> Self {
        Self { synthesizer, pacer, clipboard: None, timing }
    }

    /// Enables the clipboard strategy.  Without a clipboard it degrades to Fast.
    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardAccess>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn timing(&self) -> InjectionTiming {
        self.timing
    }

    /// Erases `backspaces` characters, then types `text`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the OS rejects a submission.  Clipboard
    /// failures are not errors; the text is typed directly instead.
    pub fn inject(
        &mut self,
        text: &[char],
        backspaces: u8,
        strategy: InjectionStrategy,
    ) -> Result<(), InjectionError> {
        if text.is_empty() && backspaces == 0 {
            return Ok(());
        }
        debug!(chars = text.len(), backspaces, ?strategy, "injecting replacement");

        match strategy {
            InjectionStrategy::Fast => self.send_fast(text, backspaces),
            InjectionStrategy::Slow => self.send_slow(text, backspaces),
            InjectionStrategy::Clipboard => self.send_clipboard(text, backspaces),
        }
    }

    /// Re-types one physical key the hook consumed, with Shift if it was held.
    pub fn send_key(&self, vk_code: u16, shift: bool) -> Result<(), InjectionError> {
        let mut batch = Vec::with_capacity(4);
        if shift {
            batch.push(SyntheticInput::virtual_key(VK_SHIFT, false));
        }
        batch.push(SyntheticInput::virtual_key(vk_code, false));
        batch.push(SyntheticInput::virtual_key(vk_code, true));
        if shift {
            batch.push(SyntheticInput::virtual_key(VK_SHIFT, true));
        }
        self.synthesizer.submit(&batch)
    }

    fn send_fast(&self, text: &[char], backspaces: u8) -> Result<(), InjectionError> {
        if backspaces > 0 {
            self.send_backspaces(backspaces)?;
            self.pacer.pause(self.timing.fast_delay);
        }
        if !text.is_empty() {
            self.synthesizer.submit(&unicode_batch(text))?;
        }
        Ok(())
    }

    fn send_slow(&self, text: &[char], backspaces: u8) -> Result<(), InjectionError> {
        if backspaces > 0 {
            self.send_backspaces(backspaces)?;
            self.pacer.pause(self.timing.slow_post_delay);
        }
        if text.is_empty() {
            return Ok(());
        }
        self.pacer.pause(self.timing.slow_pre_delay);
        for &c in text {
            self.synthesizer.submit(&unicode_batch(&[c]))?;
            self.pacer.pause(self.timing.slow_key_delay);
        }
        Ok(())
    }

    fn send_clipboard(&mut self, text: &[char], backspaces: u8) -> Result<(), InjectionError> {
        if text.is_empty() {
            return self.send_fast(text, backspaces);
        }
        let Some(mut clipboard) = self.clipboard.take() else {
            return self.send_fast(text, backspaces);
        };
        let result = self.paste_via(clipboard.as_mut(), text, backspaces);
        self.clipboard = Some(clipboard);
        result
    }

    fn paste_via(
        &self,
        clipboard: &mut dyn ClipboardAccess,
        text: &[char],
        backspaces: u8,
    ) -> Result<(), InjectionError> {
        let replacement: String = text.iter().collect();
        let previous = match clipboard.get_text() {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "clipboard read failed; typing directly");
                return self.send_fast(text, backspaces);
            }
        };
        if let Err(e) = clipboard.set_text(&replacement) {
            warn!(error = %e, "clipboard write failed; typing directly");
            return self.send_fast(text, backspaces);
        }

        let pasted = self.send_paste(backspaces);
        if pasted.is_ok() {
            // The target reads the clipboard asynchronously after the chord.
            self.pacer.pause(self.timing.clipboard_restore_delay);
        }
        restore_clipboard(clipboard, previous);
        pasted
    }

    fn send_paste(&self, backspaces: u8) -> Result<(), InjectionError> {
        if backspaces > 0 {
            self.send_backspaces(backspaces)?;
            self.pacer.pause(self.timing.fast_delay);
        }
        self.synthesizer.submit(&paste_chord())
    }

    fn send_backspaces(&self, count: u8) -> Result<(), InjectionError> {
        let batch: Vec<SyntheticInput> = (0..count)
            .flat_map(|_| {
                [
                    SyntheticInput::virtual_key(VK_BACK, false),
                    SyntheticInput::virtual_key(VK_BACK, true),
                ]
            })
            .collect();
        self.synthesizer.submit(&batch)
    }
}

/// Puts `previous` back, or empties the clipboard if it held no text.
fn restore_clipboard(clipboard: &mut dyn ClipboardAccess, previous: Option<String>) {
    let restored = match previous {
        Some(previous) => clipboard.set_text(&previous),
        None => clipboard.clear(),
    };
    if let Err(e) = restored {
        warn!(error = %e, "could not restore previous clipboard content");
    }
}

/// Down/up pairs for every UTF-16 unit of `text`.
fn unicode_batch(text: &[char]) -> Vec<SyntheticInput> {
    let mut units = [0u16; 2];
    let mut batch = Vec::with_capacity(text.len() * 2);
    for c in text {
        for &unit in c.encode_utf16(&mut units).iter() {
            batch.push(SyntheticInput::unicode(unit, false));
            batch.push(SyntheticInput::unicode(unit, true));
        }
    }
    batch
}

fn paste_chord() -> [SyntheticInput; 4] {
    [
        SyntheticInput::virtual_key(VK_CONTROL, false),
        SyntheticInput::virtual_key(VK_V, false),
        SyntheticInput::virtual_key(VK_V, true),
        SyntheticInput::virtual_key(VK_CONTROL, true),
    ]
}
