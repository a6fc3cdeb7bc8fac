// Command-line interface definitions for typofix
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "typofix")]
#[command(author, version, about = "Hotkey-driven typo correction for Linux desktops")]
#[command(long_about = "
Typofix corrects the text you have selected in any application.
Select some text, press the activation hotkey, review the proposed
correction and paste it back (or just copy it).

SETUP:
  1. Add yourself to the input group: sudo usermod -aG input $USER
  2. Log out and back in
  3. Start ydotool daemon: systemctl --user enable --now ydotool
  4. Install zenity and wl-clipboard (Wayland) or xclip (X11)
  5. Export TYPOFIX_API_KEY (or OPENAI_API_KEY)
  6. Run: typofix (to start the daemon)

USAGE:
  ctrl+alt+shift+b (default) corrects the selected text.
  ctrl+alt+shift+v (default) opens the configuration editor.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Pause after each copy attempt while capturing the selection
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub wait_ms: u64,

    /// Copy attempts before giving up on a clipboard change
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub retries: u32,

    /// Base URL of an OpenAI-compatible API
    #[arg(
        long,
        value_name = "URL",
        env = "TYPOFIX_ENDPOINT",
        default_value = "https://api.openai.com"
    )]
    pub endpoint: String,

    /// Model used for corrections
    #[arg(long, value_name = "MODEL", env = "TYPOFIX_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Timeout for a single model request
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Send alt+shift+tab after opening a dialog (for compositors that
    /// don't focus new windows)
    #[arg(long)]
    pub focus_dialogs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Show current configuration
    Config,

    /// Correct text once and print the result (no hotkeys, no dialogs)
    Correct {
        /// Text to correct; read from stdin when omitted
        #[arg(long)]
        text: Option<String>,
    },
}
