//! Application lifecycle and hotkey action dispatch
//!
//! Owns the config, the hotkey registration and every collaborator, and
//! drives them through prepare → start → end. [`App::start`] runs the UI
//! event loop on the calling thread: hotkey actions arrive as events from
//! the listener thread and are executed here, one at a time.

use crate::agent::LlmAgent;
use crate::config::{self, Config};
use crate::correction::{build_context, extract_corrected_text};
use crate::error::{Result, TypofixError};
use crate::hotkey::{self, Bindings, HotkeyAction, HotkeyRegistration, ListenerFactory};
use crate::notification::{self, Notifier};
use crate::output::ClipboardManager;
use crate::pipeline::{Pipeline, Step};
use crate::state::AppState;
use crate::ui::{Confirmation, EventQueue, EventSender, UiEvent, UserInterface};
use std::path::{Path, PathBuf};

/// Why the UI event loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The config changed; hotkeys must be rebuilt
    Restart,
    /// Shutdown was requested or the event queue closed
    Shutdown,
}

/// The typofix application
pub struct App {
    config_path: PathBuf,
    state: AppState,
    config: Option<Config>,
    hotkeys: Option<HotkeyRegistration>,
    ui: Box<dyn UserInterface>,
    clipboard: ClipboardManager,
    agent: LlmAgent,
    listeners: Box<dyn ListenerFactory>,
    events: EventQueue,
    notifier: Notifier,
    restart_requested: bool,
}

impl App {
    pub fn new(
        config_path: impl Into<PathBuf>,
        ui: Box<dyn UserInterface>,
        clipboard: ClipboardManager,
        agent: LlmAgent,
        listeners: Box<dyn ListenerFactory>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            state: AppState::new(),
            config: None,
            hotkeys: None,
            ui,
            clipboard,
            agent,
            listeners,
            events: EventQueue::new(),
            notifier: notification::desktop(),
            restart_requested: false,
        }
    }

    /// Replace the desktop notification sink
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Handle for posting events (e.g. shutdown) to the UI loop
    pub fn event_sender(&self) -> EventSender {
        self.events.sender()
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// The loaded config; present only while prepared or running
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The registered hotkeys; present only while prepared or running
    pub fn bindings(&self) -> Option<&Bindings> {
        self.hotkeys.as_ref().map(HotkeyRegistration::bindings)
    }

    pub fn is_listening(&self) -> bool {
        self.hotkeys
            .as_ref()
            .map(HotkeyRegistration::is_listening)
            .unwrap_or(false)
    }

    pub fn ui(&self) -> &dyn UserInterface {
        self.ui.as_ref()
    }

    /// Load the config, register the hotkeys and prepare the UI
    ///
    /// Calling it again while prepared or running is a no-op.
    pub fn prepare(&mut self) -> Result<()> {
        if self.state.holds_resources() {
            tracing::warn!("prepare called while {}; ignoring", self.state);
            return Ok(());
        }
        tracing::info!("Preparing the application...");

        let config = config::load_config(&self.config_path)?;
        tracing::debug!(
            "Config: {}",
            serde_json::to_string(&config).unwrap_or_default()
        );

        let bindings = hotkey::build_bindings(&config);
        let registration =
            HotkeyRegistration::register(self.listeners.as_ref(), bindings, self.events.sender())?;

        self.ui.prepare()?;

        self.config = Some(config);
        self.hotkeys = Some(registration);
        self.state = AppState::Prepared;
        tracing::info!("Preparation has been completed");
        Ok(())
    }

    /// Start listening for hotkeys and run the UI event loop
    ///
    /// Blocks until shutdown is requested or a config change needs a
    /// restart; the returned [`LoopExit`] says which.
    pub fn start(&mut self) -> Result<LoopExit> {
        if self.state != AppState::Prepared {
            return Err(TypofixError::Lifecycle(format!(
                "start requires a prepared application, state is {}",
                self.state
            )));
        }

        let hotkeys = self
            .hotkeys
            .as_mut()
            .ok_or_else(|| TypofixError::Lifecycle("no hotkeys registered".to_string()))?;
        hotkeys.start()?;
        if let Err(e) = self.ui.start() {
            if let Err(stop_err) = hotkeys.stop() {
                tracing::warn!("Failed to stop hotkey listener: {}", stop_err);
            }
            return Err(e.into());
        }
        self.state = AppState::Running;
        tracing::info!("Ready, waiting for hotkeys");

        self.event_loop()
    }

    fn event_loop(&mut self) -> Result<LoopExit> {
        loop {
            match self.events.recv_blocking() {
                Some(UiEvent::Hotkey(action)) => {
                    self.dispatch(action);
                    if std::mem::take(&mut self.restart_requested) {
                        return Ok(LoopExit::Restart);
                    }
                }
                Some(UiEvent::Shutdown) | None => {
                    tracing::info!("Shutdown requested");
                    return Ok(LoopExit::Shutdown);
                }
            }
        }
    }

    /// Run one hotkey action; failures are reported, never fatal
    fn dispatch(&mut self, action: HotkeyAction) {
        tracing::debug!("Dispatching {:?}", action);
        let result = match action {
            HotkeyAction::Correct => self.correct_selected_text(),
            HotkeyAction::EditConfig => self.change_config(),
        };

        if let Err(e) = result {
            tracing::error!("{:?} failed: {}", action, e);
            let title = match action {
                HotkeyAction::Correct => "Correction failed",
                HotkeyAction::EditConfig => "Configuration not saved",
            };
            (self.notifier)(title, &e.to_string());
        }
    }

    /// Stop the hotkeys, end the UI and drop the config
    ///
    /// # Panics
    ///
    /// Panics if the UI still reports itself active afterwards.
    pub fn end(&mut self) {
        if self.state == AppState::Uninitialized {
            tracing::warn!("end called on an uninitialized application");
            return;
        }
        tracing::info!("Ending the application...");
        self.state = AppState::Ending;

        if let Some(mut hotkeys) = self.hotkeys.take() {
            if let Err(e) = hotkeys.stop() {
                tracing::warn!("Failed to stop hotkey listener: {}", e);
            }
        }
        self.ui.end();
        assert!(
            !self.ui.is_activated(),
            "user interface still active after end"
        );

        self.config = None;
        self.state = AppState::Uninitialized;
        tracing::info!("Application has ended");
    }

    /// `end`, then `prepare` and `start` again with a freshly loaded config
    pub fn restart(&mut self) -> Result<LoopExit> {
        tracing::info!("Restarting the application...");
        self.end();
        self.prepare()?;
        self.start()
    }

    /// prepare → start, restarting as long as the loop asks for it, then end
    pub fn run(&mut self) -> Result<()> {
        self.prepare()?;
        let mut exit = self.start();
        while let Ok(LoopExit::Restart) = exit {
            exit = self.restart();
        }
        self.end();
        exit.map(|_| ())
    }

    /// Correct the selected text in the focused window
    ///
    /// Copies the selection, asks the agent for a correction and lets the
    /// user accept it (copy and paste), copy it only, or discard it.
    pub fn correct_selected_text(&mut self) -> Result<()> {
        tracing::info!("Correcting the selected text");
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| TypofixError::Lifecycle("no config loaded".to_string()))?;

        let copied = self.clipboard.capture_selection()?;
        tracing::debug!("Copied text: {:?}", copied);

        let context = build_context(config, &copied);
        let extraction = self.agent.interact(&context, extract_corrected_text)?;
        tracing::debug!("Corrected text: {:?}", extraction.text);

        if extraction.is_degraded() {
            let reason = if extraction.text.is_empty() {
                "The model returned no corrected text"
            } else {
                "The model ignored the answer format; review the result carefully"
            };
            tracing::warn!("{}", reason);
            (self.notifier)("Unexpected model response", reason);
        }

        let clipboard = &self.clipboard;
        let corrected = extraction.text;
        let mut on_choice = |choice: Confirmation| -> Result<()> {
            match choice {
                Confirmation::Accept => clipboard.write_and_optionally_paste(&corrected, true)?,
                Confirmation::JustCopy => clipboard.write_and_optionally_paste(&corrected, false)?,
                Confirmation::Cancel => {
                    tracing::info!("Correction discarded");
                    return Ok(());
                }
            }
            tracing::info!("Correcting text has been completed");
            Ok(())
        };

        self.ui.show_confirmation(&copied, &corrected, &mut on_choice)
    }

    /// Let the user edit the config; a saved config triggers a restart
    ///
    /// The dialog's result is validated, checked against the hotkey
    /// listener, persisted and then a restart is requested. Cancelling the
    /// dialog saves the unchanged config, which restarts as well.
    pub fn change_config(&mut self) -> Result<()> {
        tracing::info!("Changing the configuration");
        let current = self
            .config
            .clone()
            .ok_or_else(|| TypofixError::Lifecycle("no config loaded".to_string()))?;

        let path = self.config_path.clone();
        let listeners = self.listeners.as_ref();
        let events = self.events.sender();
        let mut restart = false;
        let mut on_save = |edited: Config| -> Result<()> {
            let mut apply = Pipeline::<Config, Config, TypofixError>::new()
                .then(|_, edited| {
                    edited.validate()?;
                    Ok(Step::Emit(edited.clone()))
                })
                .then(|config, _| {
                    // Rejected here rather than by the restart; the listener
                    // is dropped without being started
                    if let Some(config) = config.value() {
                        let bindings = hotkey::build_bindings(config);
                        listeners.create(&bindings, events.clone())?;
                    }
                    Ok(Step::Skip)
                })
                .then(|config, _| {
                    if let Some(config) = config.value() {
                        config::save_config(config, &path)?;
                    }
                    Ok(Step::Skip)
                })
                .then(|config, _| {
                    restart = config.value().is_some();
                    Ok(Step::Skip)
                });
            apply.run(&edited)?;
            Ok(())
        };

        self.ui.show_config(&current, &mut on_save)?;

        if restart {
            self.restart_requested = true;
            (self.notifier)("Configuration saved", "Hotkeys are being reloaded");
        }
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.state.holds_resources() {
            self.end();
        }
    }
}
