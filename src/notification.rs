//! Desktop notifications
//!
//! Uses notify-send (libnotify) on Linux. Notifications are best-effort:
//! failures are logged and never propagate.

#[cfg(target_os = "linux")]
use std::process::{Command, Stdio};
use std::sync::Arc;

const APP_NAME: &str = "--app-name=Typofix";

/// Longest body shown before truncation, in characters
const MAX_BODY_CHARS: usize = 200;

/// Shows a notification (title, body); shared by the app and its dialogs
pub type Notifier = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Notifier backed by [`send`]
pub fn desktop() -> Notifier {
    Arc::new(send)
}

/// Send a desktop notification with the given title and body.
///
/// Blocks until notify-send exits, which is immediate for a running
/// notification daemon.
pub fn send(title: &str, body: &str) {
    #[cfg(target_os = "linux")]
    send_linux(title, &truncate(body));

    #[cfg(not(target_os = "linux"))]
    {
        tracing::debug!("Notifications not supported on this platform");
        let _ = (title, body); // Suppress unused warnings
    }
}

/// Send a notification on Linux using notify-send
#[cfg(target_os = "linux")]
fn send_linux(title: &str, body: &str) {
    let result = Command::new("notify-send")
        .args([APP_NAME, "--expire-time=4000", title, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    if let Err(e) = result {
        tracing::debug!("Failed to send notification: {}", e);
    }
}

/// Truncate on a character boundary so multi-byte text stays valid
fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_BODY_CHARS {
        format!("{}...", body.chars().take(MAX_BODY_CHARS).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_body_unchanged() {
        assert_eq!(truncate("Configuration reloaded"), "Configuration reloaded");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "é".repeat(MAX_BODY_CHARS + 10);
        let truncated = truncate(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), MAX_BODY_CHARS + 3);
    }
}
