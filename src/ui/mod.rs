//! Dialog surface and the UI event queue
//!
//! All dialogs are shown from the UI thread. Other threads (the hotkey
//! listener, signal handlers) never touch the UI; they post a [`UiEvent`]
//! through an [`EventSender`] and the UI thread picks it up from the
//! [`EventQueue`].

pub mod zenity;

use crate::config::Config;
use crate::error::UiError;
use crate::hotkey::HotkeyAction;
use tokio::sync::mpsc;

pub use zenity::ZenityInterface;

/// Work posted to the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// A registered hotkey was pressed
    Hotkey(HotkeyAction),
    /// Leave the event loop and shut down
    Shutdown,
}

/// Handle for posting events to the UI thread
pub type EventSender = mpsc::UnboundedSender<UiEvent>;

/// The UI thread's inbox
pub struct EventQueue {
    sender: EventSender,
    receiver: mpsc::UnboundedReceiver<UiEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// A new handle for posting events
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Block until the next event arrives
    ///
    /// Must not be called from inside an async context. Never returns
    /// `None` in practice, since the queue holds a sender itself.
    pub fn recv_blocking(&mut self) -> Option<UiEvent> {
        self.receiver.blocking_recv()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The user's answer to a proposed correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Copy the corrected text and paste it over the selection
    Accept,
    /// Only copy the corrected text to the clipboard
    JustCopy,
    /// Discard the correction
    Cancel,
}

impl std::fmt::Display for Confirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confirmation::Accept => write!(f, "accept"),
            Confirmation::JustCopy => write!(f, "just copy"),
            Confirmation::Cancel => write!(f, "cancel"),
        }
    }
}

/// Callback receiving the user's confirmation choice
pub type ConfirmationCallback<'a> = dyn FnMut(Confirmation) -> crate::Result<()> + 'a;

/// Callback receiving the config produced by the config dialog
pub type ConfigCallback<'a> = dyn FnMut(Config) -> crate::Result<()> + 'a;

/// Trait for dialog surfaces
///
/// Dialogs are modal: `show_*` returns after the user has answered and the
/// callback has run. Callback errors are returned to the caller unchanged.
pub trait UserInterface: Send {
    /// Acquire whatever the surface needs (tool checks, windows)
    fn prepare(&mut self) -> Result<(), UiError>;

    /// Mark the surface active; dialogs may be shown from now on
    fn start(&mut self) -> Result<(), UiError>;

    /// Deactivate and release the surface
    fn end(&mut self);

    fn is_activated(&self) -> bool;

    /// Show `before` and `after` and report the user's choice to `on_choice`
    fn show_confirmation(
        &mut self,
        before: &str,
        after: &str,
        on_choice: &mut ConfirmationCallback<'_>,
    ) -> crate::Result<()>;

    /// Let the user edit `current` and pass the result to `on_save`
    ///
    /// Cancelling still calls `on_save`, with the unchanged config.
    fn show_config(
        &mut self,
        current: &Config,
        on_save: &mut ConfigCallback<'_>,
    ) -> crate::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_cross_threads_in_order() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();

        std::thread::spawn(move || {
            sender.send(UiEvent::Hotkey(HotkeyAction::Correct)).unwrap();
            sender.send(UiEvent::Shutdown).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(
            queue.recv_blocking(),
            Some(UiEvent::Hotkey(HotkeyAction::Correct))
        );
        assert_eq!(queue.recv_blocking(), Some(UiEvent::Shutdown));
    }

    #[test]
    fn test_confirmation_display() {
        assert_eq!(Confirmation::JustCopy.to_string(), "just copy");
    }
}
