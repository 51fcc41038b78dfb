//! Windows input synthesis via the SendInput API.
//!
//! Unicode units travel as `KEYEVENTF_UNICODE` packets (virtual key 0, unit in
//! `wScan`), so the text is independent of the active keyboard layout.  Every
//! packet carries the batch's `extra_info` in `dwExtraInfo`.

#![cfg(target_os = "windows")]

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

use crate::application::inject_text::{
    InjectionError, InputSynthesizer, SyntheticInput, SyntheticKey,
};

/// [`InputSynthesizer`] that submits each batch with one `SendInput` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendInputSynthesizer;

impl SendInputSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl InputSynthesizer for SendInputSynthesizer {
    fn submit(&self, batch: &[SyntheticInput]) -> Result<(), InjectionError> {
        if batch.is_empty() {
            return Ok(());
        }
        let inputs: Vec<INPUT> = batch.iter().map(to_input).collect();

        // SAFETY: `inputs` is a contiguous slice of initialized INPUT structures
        // and cbSize is the size of one element, as SendInput requires.
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) } as usize;

        if sent == inputs.len() {
            Ok(())
        } else if sent == 0 {
            Err(InjectionError::Platform(format!(
                "SendInput rejected the batch: {}",
                std::io::Error::last_os_error()
            )))
        } else {
            Err(InjectionError::Partial { sent, expected: inputs.len() })
        }
    }
}

fn to_input(input: &SyntheticInput) -> INPUT {
    let (vk, scan, mut flags) = match input.key {
        SyntheticKey::Virtual(vk) => (vk, 0, KEYBD_EVENT_FLAGS(0)),
        SyntheticKey::Unicode(unit) => (0, unit, KEYEVENTF_UNICODE),
    };
    if input.key_up {
        flags |= KEYEVENTF_KEYUP;
    }

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: input.extra_info,
            },
        },
    }
}
