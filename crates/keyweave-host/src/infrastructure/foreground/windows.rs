//! Windows foreground window and process image lookup.

#![cfg(target_os = "windows")]

use std::ffi::c_void;

use keyweave_core::WindowHandle;
use tracing::trace;
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, HWND};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

use crate::application::classify_app::ForegroundQuery;

/// Longest image path accepted, in UTF-16 units.
const MAX_IMAGE_PATH: usize = 1024;

/// [`ForegroundQuery`] using `GetForegroundWindow` and
/// `QueryFullProcessImageNameW`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsForeground;

impl WindowsForeground {
    pub fn new() -> Self {
        Self
    }
}

impl ForegroundQuery for WindowsForeground {
    fn foreground_window(&self) -> WindowHandle {
        // SAFETY: GetForegroundWindow has no preconditions; it may return null.
        let hwnd = unsafe { GetForegroundWindow() };
        WindowHandle(hwnd.0 as isize)
    }

    fn process_identity(&self, window: WindowHandle) -> Option<String> {
        let hwnd = HWND(window.0 as *mut c_void);
        let mut pid = 0u32;
        // SAFETY: pid outlives the call.
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
        if pid == 0 {
            return None;
        }

        // SAFETY: limited query rights; the handle is closed below on every path.
        let process = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }
            .map_err(|e| trace!(pid, error = %e, "OpenProcess failed"))
            .ok()?;

        let mut buffer = vec![0u16; MAX_IMAGE_PATH];
        let mut len = buffer.len() as u32;
        // SAFETY: buffer holds `len` UTF-16 units; len is updated to the
        // written length on success.
        let queried = unsafe {
            QueryFullProcessImageNameW(
                process,
                PROCESS_NAME_WIN32,
                PWSTR(buffer.as_mut_ptr()),
                &mut len,
            )
        };
        // SAFETY: process was opened above and is not used after this.
        unsafe {
            let _ = CloseHandle(process);
        }

        queried
            .map_err(|e| trace!(pid, error = %e, "QueryFullProcessImageNameW failed"))
            .ok()?;
        Some(String::from_utf16_lossy(&buffer[..len as usize]))
    }
}
