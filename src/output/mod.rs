//! OS automation: clipboard access and keystroke simulation
//!
//! The correction workflow needs four primitives from the desktop:
//! read the clipboard, write the clipboard, press ctrl+c and press ctrl+v.
//! They are split into two traits so tests can fake them independently.
//!
//! Backends:
//! - clipboard: wl-paste/wl-copy on Wayland, xclip on X11
//! - keyboard: ydotool (uinput, works on X11/Wayland/TTY, requires daemon)

pub mod capture;
pub mod clipboard;
pub mod ydotool;

use crate::error::OutputError;

pub use capture::ClipboardManager;
pub use clipboard::SystemClipboard;
pub use ydotool::YdotoolKeyboard;

/// Read/write access to the system clipboard
pub trait Clipboard: Send {
    /// Current clipboard text (empty when the clipboard holds no text)
    fn read(&self) -> Result<String, OutputError>;

    /// Replace the clipboard content
    fn write(&self, text: &str) -> Result<(), OutputError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Simulated keyboard shortcuts sent to the focused window
pub trait Keyboard: Send {
    /// Press the copy shortcut (ctrl+c)
    fn copy(&self) -> Result<(), OutputError>;

    /// Press the paste shortcut (ctrl+v)
    fn paste(&self) -> Result<(), OutputError>;

    /// Switch to the next window (alt+tab), or the previous one when
    /// `reverse` is set (alt+shift+tab)
    fn switch_active_window(&self, reverse: bool) -> Result<(), OutputError>;
}

/// Check whether a command exists in PATH
pub(crate) fn command_exists(name: &str) -> bool {
    which::which(name).is_ok()
}
