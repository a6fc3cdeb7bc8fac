//! Subprocess-backed clipboard
//!
//! Uses wl-paste/wl-copy when a Wayland display is present, xclip otherwise.
//!
//! Requires: wl-clipboard (Wayland) or xclip (X11) installed

use super::{command_exists, Clipboard};
use crate::error::OutputError;
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardBackend {
    /// wl-paste / wl-copy
    Wayland,
    /// xclip -selection clipboard
    X11,
}

impl ClipboardBackend {
    /// Pick the backend for the current session
    pub fn detect() -> Self {
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            ClipboardBackend::Wayland
        } else {
            ClipboardBackend::X11
        }
    }

    fn read_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            ClipboardBackend::Wayland => ("wl-paste", &["--no-newline"]),
            ClipboardBackend::X11 => ("xclip", &["-selection", "clipboard", "-o"]),
        }
    }

    fn write_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            ClipboardBackend::Wayland => ("wl-copy", &[]),
            ClipboardBackend::X11 => ("xclip", &["-selection", "clipboard"]),
        }
    }

    fn not_found(&self) -> OutputError {
        match self {
            ClipboardBackend::Wayland => OutputError::WlClipboardNotFound,
            ClipboardBackend::X11 => OutputError::XclipNotFound,
        }
    }
}

/// System clipboard driven through wl-clipboard or xclip
pub struct SystemClipboard {
    backend: ClipboardBackend,
}

impl SystemClipboard {
    pub fn new(backend: ClipboardBackend) -> Self {
        Self { backend }
    }

    /// Clipboard for the current session type
    pub fn detect() -> Self {
        Self::new(ClipboardBackend::detect())
    }

    /// Check if the backend's tools are installed
    pub fn is_available(&self) -> bool {
        let (read, _) = self.backend.read_command();
        let (write, _) = self.backend.write_command();
        command_exists(read) && command_exists(write)
    }

    fn spawn_error(&self, e: std::io::Error) -> OutputError {
        if e.kind() == std::io::ErrorKind::NotFound {
            self.backend.not_found()
        } else {
            OutputError::ClipboardFailed(e.to_string())
        }
    }
}

impl Clipboard for SystemClipboard {
    fn read(&self) -> Result<String, OutputError> {
        let (program, args) = self.backend.read_command();
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            // wl-paste exits non-zero when the clipboard is empty
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No selection") || stderr.contains("Nothing is copied") {
                return Ok(String::new());
            }
            return Err(OutputError::ClipboardFailed(format!(
                "{} exited with error: {}",
                program,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::trace!("Clipboard read ({} chars)", text.chars().count());
        Ok(text)
    }

    fn write(&self, text: &str) -> Result<(), OutputError> {
        let (program, args) = self.backend.write_command();

        // Spawn with stdin pipe; both tools fork to keep serving the selection
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| OutputError::ClipboardFailed(e.to_string()))?;
            // Close stdin to signal EOF
            drop(stdin);
        }

        let status = child
            .wait()
            .map_err(|e| OutputError::ClipboardFailed(e.to_string()))?;

        if !status.success() {
            return Err(OutputError::ClipboardFailed(format!(
                "{} exited with error",
                program
            )));
        }

        tracing::debug!("Text copied to clipboard ({} chars)", text.chars().count());
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.backend {
            ClipboardBackend::Wayland => "wl-clipboard",
            ClipboardBackend::X11 => "xclip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_commands() {
        assert_eq!(ClipboardBackend::Wayland.read_command().0, "wl-paste");
        assert_eq!(ClipboardBackend::Wayland.write_command().0, "wl-copy");
        let (program, args) = ClipboardBackend::X11.read_command();
        assert_eq!(program, "xclip");
        assert!(args.contains(&"-o"));
        assert!(!ClipboardBackend::X11.write_command().1.contains(&"-o"));
    }

    #[test]
    fn test_name_follows_backend() {
        assert_eq!(SystemClipboard::new(ClipboardBackend::X11).name(), "xclip");
        assert_eq!(
            SystemClipboard::new(ClipboardBackend::Wayland).name(),
            "wl-clipboard"
        );
    }

    #[test]
    fn test_missing_tool_maps_to_install_hint() {
        let clipboard = SystemClipboard::new(ClipboardBackend::Wayland);
        let err = clipboard.spawn_error(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, OutputError::WlClipboardNotFound));

        let clipboard = SystemClipboard::new(ClipboardBackend::X11);
        let err = clipboard.spawn_error(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, OutputError::XclipNotFound));
    }
}
