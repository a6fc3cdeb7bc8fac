//! Best-effort capture of the current selection through the clipboard
//!
//! There is no portable way to read another application's selection, so the
//! selection is copied into the clipboard with a simulated ctrl+c and the
//! clipboard is polled until its content changes.

use super::{Clipboard, Keyboard};
use crate::error::OutputError;
use std::time::Duration;

/// Default pause between a copy attempt and the clipboard read
pub const DEFAULT_WAIT: Duration = Duration::from_millis(500);

/// Default number of copy attempts
pub const DEFAULT_RETRIES: u32 = 10;

/// Clipboard plus keyboard, with the capture policy on top
pub struct ClipboardManager {
    clipboard: Box<dyn Clipboard>,
    keyboard: Box<dyn Keyboard>,
    wait: Duration,
    retries: u32,
}

impl ClipboardManager {
    pub fn new(clipboard: Box<dyn Clipboard>, keyboard: Box<dyn Keyboard>) -> Self {
        Self {
            clipboard,
            keyboard,
            wait: DEFAULT_WAIT,
            retries: DEFAULT_RETRIES,
        }
    }

    /// Override the capture timing
    pub fn with_timing(mut self, wait: Duration, retries: u32) -> Self {
        self.wait = wait;
        self.retries = retries;
        self
    }

    /// Copy the current selection and return the clipboard content
    ///
    /// Up to `retries` copy attempts are made, each followed by a pause of
    /// `wait`. The loop stops as soon as the clipboard differs from its
    /// content before the first attempt. When it never changes, a warning is
    /// logged and the unchanged content is returned anyway: the user may have
    /// selected exactly what was already in the clipboard.
    pub fn capture_selection(&self) -> Result<String, OutputError> {
        let baseline = self.clipboard.read()?;
        let mut current = baseline.clone();

        for attempt in 1..=self.retries {
            self.keyboard.copy()?;
            std::thread::sleep(self.wait);
            current = self.clipboard.read()?;

            if current != baseline {
                tracing::debug!("Selection captured after {} attempt(s)", attempt);
                return Ok(current);
            }

            tracing::warn!(
                "Clipboard unchanged after copy attempt {}/{}",
                attempt,
                self.retries
            );
        }

        tracing::warn!(
            "Clipboard did not change after {} attempt(s); using its current content",
            self.retries
        );
        Ok(current)
    }

    /// Put `text` on the clipboard and, when `paste` is set, paste it into
    /// the focused window
    pub fn write_and_optionally_paste(&self, text: &str, paste: bool) -> Result<(), OutputError> {
        self.clipboard.write(text)?;
        if paste {
            self.keyboard.paste()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Desk {
        clipboard: String,
        selection: String,
        copies: u32,
        pastes: u32,
        /// The copy that actually lands in the clipboard
        copy_works_on: Option<u32>,
    }

    #[derive(Clone, Default)]
    struct Fake(Arc<Mutex<Desk>>);

    impl Clipboard for Fake {
        fn read(&self) -> Result<String, OutputError> {
            Ok(self.0.lock().unwrap().clipboard.clone())
        }

        fn write(&self, text: &str) -> Result<(), OutputError> {
            self.0.lock().unwrap().clipboard = text.to_string();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    impl Keyboard for Fake {
        fn copy(&self) -> Result<(), OutputError> {
            let mut desk = self.0.lock().unwrap();
            desk.copies += 1;
            if desk.copy_works_on == Some(desk.copies) {
                desk.clipboard = desk.selection.clone();
            }
            Ok(())
        }

        fn paste(&self) -> Result<(), OutputError> {
            self.0.lock().unwrap().pastes += 1;
            Ok(())
        }

        fn switch_active_window(&self, _reverse: bool) -> Result<(), OutputError> {
            Ok(())
        }
    }

    fn manager(fake: &Fake, retries: u32) -> ClipboardManager {
        ClipboardManager::new(Box::new(fake.clone()), Box::new(fake.clone()))
            .with_timing(Duration::ZERO, retries)
    }

    fn desk(clipboard: &str, selection: &str, copy_works_on: Option<u32>) -> Fake {
        Fake(Arc::new(Mutex::new(Desk {
            clipboard: clipboard.to_string(),
            selection: selection.to_string(),
            copy_works_on,
            ..Desk::default()
        })))
    }

    #[test]
    fn test_capture_stops_on_first_change() {
        let fake = desk("old", "selected", Some(3));
        let captured = manager(&fake, 10).capture_selection().unwrap();
        assert_eq!(captured, "selected");
        assert_eq!(fake.0.lock().unwrap().copies, 3);
    }

    #[test]
    fn test_capture_first_attempt() {
        let fake = desk("", "text", Some(1));
        assert_eq!(manager(&fake, 10).capture_selection().unwrap(), "text");
        assert_eq!(fake.0.lock().unwrap().copies, 1);
    }

    #[test]
    fn test_capture_exhausts_retries_and_returns_baseline() {
        let fake = desk("unchanged", "selected", None);
        let captured = manager(&fake, 4).capture_selection().unwrap();
        assert_eq!(captured, "unchanged");
        assert_eq!(fake.0.lock().unwrap().copies, 4);
    }

    #[test]
    fn test_capture_change_on_last_attempt() {
        let fake = desk("a", "b", Some(5));
        assert_eq!(manager(&fake, 5).capture_selection().unwrap(), "b");
    }

    #[test]
    fn test_zero_retries_never_copies() {
        let fake = desk("kept", "selected", Some(1));
        assert_eq!(manager(&fake, 0).capture_selection().unwrap(), "kept");
        assert_eq!(fake.0.lock().unwrap().copies, 0);
    }

    #[test]
    fn test_write_and_optionally_paste() {
        let fake = desk("", "", None);
        let manager = manager(&fake, 1);

        manager.write_and_optionally_paste("copied", false).unwrap();
        assert_eq!(fake.0.lock().unwrap().clipboard, "copied");
        assert_eq!(fake.0.lock().unwrap().pastes, 0);

        manager.write_and_optionally_paste("pasted", true).unwrap();
        assert_eq!(fake.0.lock().unwrap().clipboard, "pasted");
        assert_eq!(fake.0.lock().unwrap().pastes, 1);
    }
}
