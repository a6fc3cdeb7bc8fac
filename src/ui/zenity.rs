//! zenity-based dialogs
//!
//! Each dialog is a short-lived `zenity` process; the UI thread blocks on it
//! until the user answers, which makes every dialog modal.
//!
//! - confirmation: `--question` with Paste / Cancel and an extra
//!   "Copy only" button
//! - configuration: `--text-info --editable` prefilled with the config JSON
//!
//! Requires: zenity installed

use super::{Confirmation, ConfigCallback, ConfirmationCallback, UserInterface};
use crate::config::Config;
use crate::error::{TypofixError, UiError};
use crate::notification::{self, Notifier};
use crate::output::{command_exists, Keyboard};
use crate::pipeline::{Pipeline, Step};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

const TITLE: &str = "Typofix";
const PASTE_LABEL: &str = "Paste";
const COPY_LABEL: &str = "Copy only";
const CANCEL_LABEL: &str = "Cancel";

/// Time for the dialog window to map before focus is moved to it
const FOCUS_DELAY: Duration = Duration::from_millis(300);

/// What a finished zenity process reported
#[derive(Debug, Clone, PartialEq, Eq)]
struct DialogOutput {
    /// Exit code; `None` when killed by a signal
    status: Option<i32>,
    stdout: String,
}

impl DialogOutput {
    fn accepted(&self) -> bool {
        self.status == Some(0)
    }

    /// Closed with Cancel, Escape, the window button or a timeout
    fn dismissed(&self) -> bool {
        matches!(self.status, Some(1) | Some(5))
    }
}

/// Dialog surface backed by zenity
pub struct ZenityInterface {
    width: u32,
    height: u32,
    /// Sends alt+shift+tab after a dialog opens, for compositors that do not
    /// focus new windows
    focus_helper: Option<Box<dyn Keyboard>>,
    notifier: Notifier,
    prepared: bool,
    activated: bool,
}

impl ZenityInterface {
    pub fn new() -> Self {
        Self {
            width: 640,
            height: 640,
            focus_helper: None,
            notifier: notification::desktop(),
            prepared: false,
            activated: false,
        }
    }

    pub fn with_focus_helper(mut self, keyboard: Box<dyn Keyboard>) -> Self {
        self.focus_helper = Some(keyboard);
        self
    }

    /// Where rejected edits are reported
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    fn ensure_active(&self) -> Result<(), UiError> {
        if !self.prepared || !self.activated {
            return Err(UiError::NotPrepared);
        }
        Ok(())
    }

    /// Run zenity with `args`, optionally feeding `stdin`, and wait for it
    fn run(&self, args: &[String], stdin: Option<&str>) -> Result<DialogOutput, UiError> {
        let mut child = Command::new("zenity")
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    UiError::ZenityNotFound
                } else {
                    UiError::DialogFailed(e.to_string())
                }
            })?;

        if let (Some(text), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(text.as_bytes())
                .map_err(|e| UiError::DialogFailed(e.to_string()))?;
            // Close stdin so text-info stops reading
            drop(pipe);
        }

        if let Some(keyboard) = &self.focus_helper {
            std::thread::sleep(FOCUS_DELAY);
            if let Err(e) = keyboard.switch_active_window(true) {
                tracing::warn!("Failed to focus dialog: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| UiError::DialogFailed(e.to_string()))?;

        Ok(DialogOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn confirmation_args(&self, before: &str, after: &str) -> Vec<String> {
        vec![
            "--question".to_string(),
            format!("--title={}", TITLE),
            format!("--width={}", self.width),
            "--no-markup".to_string(),
            "--no-wrap".to_string(),
            format!("--text=BEFORE:\n{}\n\nAFTER:\n{}", before, after),
            format!("--ok-label={}", PASTE_LABEL),
            format!("--cancel-label={}", CANCEL_LABEL),
            format!("--extra-button={}", COPY_LABEL),
        ]
    }

    fn config_args(&self) -> Vec<String> {
        vec![
            "--text-info".to_string(),
            "--editable".to_string(),
            format!("--title={} configuration", TITLE),
            format!("--width={}", self.width),
            format!("--height={}", self.height),
        ]
    }
}

impl Default for ZenityInterface {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a question dialog result to the user's choice
///
/// The extra button exits with status 1 like Cancel but prints its label.
fn confirmation_from(output: &DialogOutput) -> Result<Confirmation, UiError> {
    if output.stdout.trim() == COPY_LABEL {
        Ok(Confirmation::JustCopy)
    } else if output.accepted() {
        Ok(Confirmation::Accept)
    } else if output.dismissed() {
        Ok(Confirmation::Cancel)
    } else {
        Err(UiError::DialogFailed(format!(
            "zenity exited with {:?}",
            output.status
        )))
    }
}

/// Map a text-info dialog result to the config to save
///
/// Cancel and unparsable edits both yield the unchanged config; the latter
/// is reported through `notify`.
fn config_from(
    output: &DialogOutput,
    current: &Config,
    notify: &dyn Fn(&str, &str),
) -> Result<Config, UiError> {
    if output.dismissed() {
        tracing::debug!("Config dialog cancelled");
        return Ok(current.clone());
    }
    if !output.accepted() {
        return Err(UiError::DialogFailed(format!(
            "zenity exited with {:?}",
            output.status
        )));
    }

    match serde_json::from_str::<Config>(&output.stdout) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!("Edited config is not valid JSON, keeping the current one: {}", e);
            notify("Configuration not changed", &e.to_string());
            Ok(current.clone())
        }
    }
}

impl UserInterface for ZenityInterface {
    fn prepare(&mut self) -> Result<(), UiError> {
        if self.prepared {
            tracing::warn!("Dialog surface already prepared");
            return Ok(());
        }
        if !command_exists("zenity") {
            return Err(UiError::ZenityNotFound);
        }
        self.prepared = true;
        Ok(())
    }

    fn start(&mut self) -> Result<(), UiError> {
        if !self.prepared {
            return Err(UiError::NotPrepared);
        }
        if self.activated {
            tracing::warn!("Dialog surface already activated");
        }
        self.activated = true;
        Ok(())
    }

    fn end(&mut self) {
        if !self.activated {
            tracing::debug!("Dialog surface was not active");
        }
        self.activated = false;
        self.prepared = false;
    }

    fn is_activated(&self) -> bool {
        self.activated
    }

    fn show_confirmation(
        &mut self,
        before: &str,
        after: &str,
        on_choice: &mut ConfirmationCallback<'_>,
    ) -> crate::Result<()> {
        self.ensure_active()?;
        let output = self.run(&self.confirmation_args(before, after), None)?;

        let mut on_answer = Pipeline::<DialogOutput, Confirmation, TypofixError>::new()
            .then(|_, output| {
                tracing::debug!("Confirmation dialog closed ({:?})", output.status);
                Ok(Step::Skip)
            })
            .then(|_, output| Ok(Step::Emit(confirmation_from(output)?)))
            .then(|choice, _| {
                if let Some(choice) = choice.value() {
                    tracing::info!("Correction answered: {}", choice);
                    on_choice(*choice)?;
                }
                Ok(Step::Skip)
            });

        on_answer.run(&output)?;
        Ok(())
    }

    fn show_config(
        &mut self,
        current: &Config,
        on_save: &mut ConfigCallback<'_>,
    ) -> crate::Result<()> {
        self.ensure_active()?;
        let json = current
            .to_pretty_json()
            .map_err(|e| UiError::DialogFailed(e.to_string()))?;
        let output = self.run(&self.config_args(), Some(&json))?;
        let notifier = self.notifier.clone();

        let mut on_answer = Pipeline::<DialogOutput, Config, TypofixError>::new()
            .then(|_, output| {
                tracing::debug!("Config dialog closed ({:?})", output.status);
                Ok(Step::Skip)
            })
            .then(|_, output| Ok(Step::Emit(config_from(output, current, notifier.as_ref())?)))
            .then(|config, _| {
                if let Some(config) = config.value() {
                    on_save(config.clone())?;
                }
                Ok(Step::Skip)
            });

        on_answer.run(&output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(status: Option<i32>, stdout: &str) -> DialogOutput {
        DialogOutput {
            status,
            stdout: stdout.to_string(),
        }
    }

    #[test]
    fn test_confirmation_mapping() {
        assert_eq!(
            confirmation_from(&output(Some(0), "")).unwrap(),
            Confirmation::Accept
        );
        assert_eq!(
            confirmation_from(&output(Some(1), "Copy only\n")).unwrap(),
            Confirmation::JustCopy
        );
        assert_eq!(
            confirmation_from(&output(Some(1), "")).unwrap(),
            Confirmation::Cancel
        );
        assert_eq!(
            confirmation_from(&output(Some(5), "")).unwrap(),
            Confirmation::Cancel
        );
        assert!(confirmation_from(&output(Some(255), "")).is_err());
        assert!(confirmation_from(&output(None, "")).is_err());
    }

    fn silent(_: &str, _: &str) {}

    #[test]
    fn test_config_mapping() {
        let current = Config::default();
        let mut edited = Config::default();
        edited.example_text = "- teh -> the".to_string();
        let json = edited.to_pretty_json().unwrap();

        assert_eq!(
            config_from(&output(Some(0), &json), &current, &silent).unwrap(),
            edited
        );
        assert_eq!(
            config_from(&output(Some(1), &json), &current, &silent).unwrap(),
            current
        );
        assert!(config_from(&output(Some(-1), ""), &current, &silent).is_err());
    }

    #[test]
    fn test_config_mapping_invalid_json_keeps_current() {
        let current = Config::default();
        let notified = std::cell::RefCell::new(Vec::new());
        let notify = |title: &str, _: &str| notified.borrow_mut().push(title.to_string());

        let result = config_from(&output(Some(0), "{ broken"), &current, &notify).unwrap();
        assert_eq!(result, current);
        assert_eq!(*notified.borrow(), vec!["Configuration not changed".to_string()]);
    }

    #[test]
    fn test_config_mapping_cancel_is_silent() {
        let current = Config::default();
        let notified = std::cell::Cell::new(0);
        let notify = |_: &str, _: &str| notified.set(notified.get() + 1);

        config_from(&output(Some(1), "{ broken"), &current, &notify).unwrap();
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn test_confirmation_args() {
        let ui = ZenityInterface::new();
        let args = ui.confirmation_args("Helo", "Hello");
        assert_eq!(args[0], "--question");
        assert!(args.contains(&"--text=BEFORE:\nHelo\n\nAFTER:\nHello".to_string()));
        assert!(args.contains(&"--extra-button=Copy only".to_string()));
    }

    #[test]
    fn test_dialogs_require_start() {
        let mut ui = ZenityInterface::new();
        let mut called = false;
        let result = ui.show_confirmation("a", "b", &mut |_| {
            called = true;
            Ok(())
        });
        assert!(matches!(result, Err(TypofixError::Ui(UiError::NotPrepared))));
        assert!(!called);
        assert!(!ui.is_activated());
    }

    #[test]
    fn test_end_deactivates() {
        let mut ui = ZenityInterface::new();
        ui.prepared = true;
        ui.start().unwrap();
        assert!(ui.is_activated());
        ui.end();
        assert!(!ui.is_activated());
    }
}
