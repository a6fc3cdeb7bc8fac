//! Typofix: hotkey-driven typo correction for Linux desktops
//!
//! This library provides the core functionality for:
//! - Detecting global hotkeys via evdev (kernel-level, works on all compositors)
//! - Capturing the selected text through the clipboard (ydotool + wl-clipboard/xclip)
//! - Asking a language model for a minimal correction
//! - Letting the user confirm, copy or discard the result in a dialog
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐   UiEvent    ┌─────────────────────────────────────┐
//!   │    Hotkey    │ ───────────▶ │        App (UI thread loop)         │
//!   │   (evdev)    │   channel    │  prepare ─▶ start ─▶ end / restart  │
//!   └──────────────┘              └─────────────────────────────────────┘
//!   ┌──────────────┐   Shutdown          │                      │
//!   │   Signals    │ ────────────────────┘                      │
//!   └──────────────┘                     │ Correct              │ EditConfig
//!                                        ▼                      ▼
//!                               ┌──────────────┐       ┌──────────────┐
//!                               │  Clipboard   │       │    Config    │
//!                               │   capture    │       │    dialog    │
//!                               └──────────────┘       └──────────────┘
//!                                        │ selected text        │ validate
//!                                        ▼                      ▼ persist
//!                               ┌──────────────┐       ┌──────────────┐
//!                               │  LLM agent   │       │   restart    │
//!                               │   (ureq)     │       └──────────────┘
//!                               └──────────────┘
//!                                        │ corrected text
//!                                        ▼
//!                               ┌──────────────┐
//!                               │ Confirmation │ Paste / Copy only / Cancel
//!                               │   dialog     │
//!                               └──────────────┘
//! ```

pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod correction;
pub mod error;
pub mod hotkey;
pub mod notification;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod ui;

pub use app::{App, LoopExit};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{Result, TypofixError};
pub use state::AppState;
