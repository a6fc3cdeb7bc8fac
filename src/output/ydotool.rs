//! ydotool-based keystroke simulation
//!
//! Uses ydotool to press shortcuts in the focused window. This works on all
//! Wayland compositors because ydotool uses the uinput kernel interface.
//!
//! Requires:
//! - ydotool installed
//! - ydotoold daemon running (systemctl --user start ydotool)
//! - User in 'input' group

use super::{command_exists, Keyboard};
use crate::error::OutputError;
use std::process::{Command, Stdio};

// Linux input event codes (linux/input-event-codes.h)
const KEY_LEFTCTRL: u16 = 29;
const KEY_LEFTALT: u16 = 56;
const KEY_LEFTSHIFT: u16 = 42;
const KEY_TAB: u16 = 15;
const KEY_C: u16 = 46;
const KEY_V: u16 = 47;

/// ydotool-based keyboard
#[derive(Debug, Default, Clone, Copy)]
pub struct YdotoolKeyboard;

impl YdotoolKeyboard {
    pub fn new() -> Self {
        Self
    }

    /// Check if ydotool exists in PATH
    pub fn is_available(&self) -> bool {
        command_exists("ydotool")
    }

    /// Press `keys` in order and release them in reverse
    fn chord(&self, keys: &[u16]) -> Result<(), OutputError> {
        let args = chord_args(keys);
        tracing::trace!("ydotool key {}", args.join(" "));

        let output = Command::new("ydotool")
            .arg("key")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OutputError::YdotoolNotFound
                } else {
                    OutputError::KeystrokeFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            // Check for common errors
            if stderr.contains("socket") || stderr.contains("connect") || stderr.contains("daemon")
            {
                return Err(OutputError::YdotoolNotRunning);
            }

            return Err(OutputError::KeystrokeFailed(stderr.to_string()));
        }

        Ok(())
    }
}

fn chord_args(keys: &[u16]) -> Vec<String> {
    keys.iter()
        .map(|k| format!("{}:1", k))
        .chain(keys.iter().rev().map(|k| format!("{}:0", k)))
        .collect()
}

impl Keyboard for YdotoolKeyboard {
    fn copy(&self) -> Result<(), OutputError> {
        tracing::debug!("Sending copy shortcut");
        self.chord(&[KEY_LEFTCTRL, KEY_C])
    }

    fn paste(&self) -> Result<(), OutputError> {
        tracing::debug!("Sending paste shortcut");
        self.chord(&[KEY_LEFTCTRL, KEY_V])
    }

    fn switch_active_window(&self, reverse: bool) -> Result<(), OutputError> {
        if reverse {
            self.chord(&[KEY_LEFTALT, KEY_LEFTSHIFT, KEY_TAB])
        } else {
            self.chord(&[KEY_LEFTALT, KEY_TAB])
        }
    }
}
