//! Windows low-level keyboard hook.
//!
//! Installs `WH_KEYBOARD_LL` from a dedicated thread that owns a Win32
//! message loop.  The OS calls [`keyboard_hook_proc`] on that thread for
//! every physical and synthetic key event system-wide.
//!
//! Only one hook may be active per process: the callback has no user data
//! pointer, so the filter lives in a process-wide slot.
//!
//! # Safety
//!
//! `unsafe` is used only for Windows API FFI calls.  Each block carries a
//! `// SAFETY:` comment.

#![cfg(target_os = "windows")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use keyweave_core::keymap::windows_vk::{VK_CAPITAL, VK_CONTROL, VK_MENU, VK_SHIFT};
use keyweave_core::ModifierState;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, GetKeyState};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS, LLKHF_INJECTED, MSG,
    WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
};

use super::{HookError, KeyboardHookSource};
use crate::application::filter_keys::{HookVerdict, KeyFilter};

/// Filter consulted by the hook callback.  `None` outside start/stop.
static FILTER: RwLock<Option<Arc<KeyFilter>>> = RwLock::new(None);

/// Set while any [`WindowsKeyboardHook`] owns the process-wide slot.
static HOOK_ACTIVE: AtomicBool = AtomicBool::new(false);

const HOOK_THREAD_NAME: &str = "keyweave-hook";

struct HookThread {
    handle: JoinHandle<()>,
    thread_id: u32,
}

/// [`KeyboardHookSource`] backed by `SetWindowsHookExW(WH_KEYBOARD_LL)`.
#[derive(Default)]
pub struct WindowsKeyboardHook {
    thread: Option<HookThread>,
}

impl WindowsKeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyboardHookSource for WindowsKeyboardHook {
    fn start(&mut self, filter: Arc<KeyFilter>) -> Result<(), HookError> {
        if self.thread.is_some() {
            return Ok(());
        }
        if HOOK_ACTIVE.swap(true, Ordering::AcqRel) {
            return Err(HookError::AlreadyActive);
        }
        set_filter(Some(filter));

        // The thread reports its id once the hook is installed, or the error.
        let (ready_tx, ready_rx) = bounded::<Result<u32, String>>(1);
        let spawned = thread::Builder::new()
            .name(HOOK_THREAD_NAME.to_string())
            .spawn(move || run_hook_message_loop(ready_tx));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                release_slot();
                return Err(HookError::InstallFailed(e.to_string()));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.thread = Some(HookThread { handle, thread_id });
                info!(thread_id, "keyboard hook installed");
                Ok(())
            }
            Ok(Err(reason)) => {
                let _ = handle.join();
                release_slot();
                Err(HookError::InstallFailed(reason))
            }
            Err(_) => {
                let _ = handle.join();
                release_slot();
                Err(HookError::InstallFailed("hook thread exited during startup".into()))
            }
        }
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        // SAFETY: posting to a thread id is safe even if the thread has
        // already exited; the call then fails and is reported below.
        let posted =
            unsafe { PostThreadMessageW(thread.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
        if let Err(e) = posted {
            warn!(error = %e, "could not post WM_QUIT to hook thread");
        }
        if thread.handle.join().is_err() {
            error!("hook thread terminated by panic");
        }
        release_slot();
        info!("keyboard hook removed");
    }

    fn is_active(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for WindowsKeyboardHook {
    fn drop(&mut self) {
        self.stop();
    }
}

fn set_filter(filter: Option<Arc<KeyFilter>>) {
    *FILTER.write() = filter;
}

fn release_slot() {
    set_filter(None);
    HOOK_ACTIVE.store(false, Ordering::Release);
}

/// Entry point for the hook thread.
fn run_hook_message_loop(ready: crossbeam_channel::Sender<Result<u32, String>>) {
    // SAFETY: GetModuleHandleW(None) returns the handle of the current
    // executable and does not transfer ownership.
    let module = unsafe { GetModuleHandleW(None) }.ok().map(HINSTANCE::from);

    // SAFETY: keyboard_hook_proc matches HOOKPROC, and this thread runs a
    // message loop below for as long as the hook is installed.
    let installed =
        unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), module, 0) };
    let hook = match installed {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    let mut msg = MSG::default();
    // SAFETY: standard GetMessage/DispatchMessage loop; exits on WM_QUIT (0)
    // or error (-1).
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            DispatchMessageW(&msg);
        }
        if let Err(e) = UnhookWindowsHookEx(hook) {
            warn!(error = %e, "UnhookWindowsHookEx failed");
        }
    }
    debug!("hook message loop exited");
}

/// Modifier snapshot taken inside the callback, before the verdict.
fn sample_modifiers() -> ModifierState {
    // SAFETY: GetAsyncKeyState/GetKeyState only read input state.
    unsafe {
        ModifierState {
            ctrl: GetAsyncKeyState(VK_CONTROL as i32) as u16 & 0x8000 != 0,
            alt: GetAsyncKeyState(VK_MENU as i32) as u16 & 0x8000 != 0,
            shift: GetAsyncKeyState(VK_SHIFT as i32) as u16 & 0x8000 != 0,
            caps_lock: GetKeyState(VK_CAPITAL as i32) & 1 != 0,
        }
    }
}

fn current_filter() -> Option<Arc<KeyFilter>> {
    FILTER.read().clone()
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows on the hook thread.  It must return quickly or the OS
/// silently removes the hook.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: required forwarding for non-action codes.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let message = w_param.0 as u32;
    if message == WM_KEYDOWN || message == WM_SYSKEYDOWN {
        // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
        let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let injected = (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0);

        if let Some(filter) = current_filter() {
            let verdict = filter.on_key_down(
                kbs.vkCode as u16,
                kbs.dwExtraInfo,
                injected,
                sample_modifiers(),
            );
            if verdict == HookVerdict::Consume {
                return LRESULT(1);
            }
        }
    }

    // SAFETY: forward to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;
    use keyweave_core::engine::mock::ScriptedEngine;
    use keyweave_core::{EventQueue, SharedEngine};

    use super::*;

    fn filter() -> Arc<KeyFilter> {
        let engine = SharedEngine::new(ScriptedEngine::new());
        let (tx, _rx) = unbounded();
        Arc::new(KeyFilter::new(Arc::new(EventQueue::new(4)), engine.enabled_flag(), tx))
    }

    #[test]
    fn test_filter_slot_is_shared_until_released() {
        // Arrange
        let installed = filter();

        // Act
        set_filter(Some(Arc::clone(&installed)));
        let during = current_filter();
        release_slot();
        let after = current_filter();

        // Assert
        assert!(during.is_some_and(|f| Arc::ptr_eq(&f, &installed)));
        assert!(after.is_none());
        assert!(!HOOK_ACTIVE.load(Ordering::Acquire));
    }
}
