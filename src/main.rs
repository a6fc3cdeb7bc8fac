//! Typofix - hotkey-driven typo correction for Linux desktops
//!
//! Run with `typofix` or `typofix daemon` to start the daemon.
//! Use `typofix config` to show the configuration and hotkeys.
//! Use `typofix correct` to correct text from stdin once.

use clap::Parser;
use pidlock::Pidlock;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;
use typofix::agent::{LlmAgent, OpenAiModel};
use typofix::config::{self, Config};
use typofix::correction::{build_context, extract_corrected_text};
use typofix::hotkey::{create_hotkey_string, SystemListenerFactory};
use typofix::notification;
use typofix::output::{Clipboard, ClipboardManager, SystemClipboard, YdotoolKeyboard};
use typofix::ui::{UiEvent, ZenityInterface};
use typofix::{App, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("typofix={},warn", log_level))),
        )
        .with_target(false)
        .init();

    let config_path = config::resolve_path(cli.config.as_deref())?;

    // Run the appropriate command
    match cli.command.take().unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            run_daemon(&cli, config_path).await?;
        }

        Commands::Config => {
            show_config(&config_path)?;
        }

        Commands::Correct { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let model = build_model(&cli)?;
            let corrected =
                tokio::task::spawn_blocking(move || correct_once(&config_path, model, &text))
                    .await??;
            println!("{}", corrected);
        }
    }

    Ok(())
}

fn build_model(cli: &Cli) -> anyhow::Result<OpenAiModel> {
    Ok(OpenAiModel::from_env(
        &cli.endpoint,
        &cli.model,
        Duration::from_secs(cli.timeout_secs),
    )?)
}

/// Run the hotkey daemon until SIGINT/SIGTERM
async fn run_daemon(cli: &Cli, config_path: PathBuf) -> anyhow::Result<()> {
    // Single instance check
    let runtime_dir = Config::runtime_dir();
    std::fs::create_dir_all(&runtime_dir)?;
    let lock_path = runtime_dir.join("typofix.lock");
    let lock_path_str = lock_path.to_string_lossy().to_string();
    let mut pidlock = Pidlock::new(&lock_path_str);

    if pidlock.acquire().is_err() {
        anyhow::bail!(
            "Another typofix instance is already running (lock: {})",
            lock_path.display()
        );
    }

    let model = build_model(cli)?;
    tracing::info!("Using model {} at {}", cli.model, cli.endpoint);

    let system_clipboard = SystemClipboard::detect();
    if !system_clipboard.is_available() {
        tracing::warn!(
            "{} tools not found in PATH; corrections will fail",
            system_clipboard.name()
        );
    }
    let keyboard = YdotoolKeyboard::new();
    if !keyboard.is_available() {
        tracing::warn!("ydotool not found in PATH; corrections will fail");
    }

    let clipboard = ClipboardManager::new(Box::new(system_clipboard), Box::new(keyboard))
        .with_timing(Duration::from_millis(cli.wait_ms), cli.retries);

    let notifier = notification::desktop();
    let mut ui = ZenityInterface::new().with_notifier(notifier.clone());
    if cli.focus_dialogs {
        ui = ui.with_focus_helper(Box::new(YdotoolKeyboard::new()));
    }

    let mut app = App::new(
        config_path,
        Box::new(ui),
        clipboard,
        LlmAgent::new(Box::new(model)),
        Box::new(SystemListenerFactory),
    )
    .with_notifier(notifier);

    // Signals end the UI loop through the event queue
    let shutdown = app.event_sender();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown.send(UiEvent::Shutdown);
    });

    // The lifecycle blocks: it owns the UI thread
    let result = tokio::task::spawn_blocking(move || app.run()).await;

    if let Err(e) = pidlock.release() {
        tracing::debug!("Failed to release lock: {:?}", e);
    }

    result??;
    tracing::info!("Goodbye");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Show the config file location, its content and the hotkeys
fn show_config(path: &Path) -> anyhow::Result<()> {
    let config = config::load_config(path)?;

    println!("Config file: {}\n", path.display());
    println!("{}\n", config.to_pretty_json()?);
    println!("[hotkeys]");
    println!(
        "  correct selection = {}",
        create_hotkey_string(&config.activation_keybind)
    );
    println!(
        "  edit config       = {}",
        create_hotkey_string(&config.config_keybind)
    );

    Ok(())
}

/// Correct `text` once with the configured prompt
fn correct_once(config_path: &Path, model: OpenAiModel, text: &str) -> anyhow::Result<String> {
    let config = config::load_config(config_path)?;
    let agent = LlmAgent::new(Box::new(model));

    let context = build_context(&config, text.trim_end_matches('\n'));
    let extraction = agent.interact(&context, extract_corrected_text)?;

    if !extraction.well_formed {
        tracing::warn!("The model ignored the answer format; output may be incomplete");
    }
    if extraction.text.is_empty() {
        tracing::warn!("The model returned no corrected text");
    }

    Ok(extraction.text)
}
