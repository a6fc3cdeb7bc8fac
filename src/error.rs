//! Error types for typofix
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the typofix application
#[derive(Error, Debug)]
pub enum TypofixError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Correction agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("User interface error: {0}")]
    Ui(#[from] UiError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the persisted configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to write config {path}: {message}")]
    Write { path: String, message: String },

    #[error("No key for hotkey trigger '{0}'. Use a letter, digit or common punctuation.")]
    UnbindableKey(char),

    #[error("Activation and config keybinds are both '{0}'. Pick two different combinations.")]
    KeybindCollision(String),

    #[error("No config directory could be determined. Pass --config explicitly.")]
    NoConfigDir,
}

/// Errors related to hotkey registration and detection
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    DeviceAccess(String),

    #[error("No key mapping for trigger character '{0}'. Use a letter, digit or common punctuation.")]
    UnknownKey(char),

    #[error("Malformed hotkey string '{0}'")]
    Malformed(String),

    #[error("No keyboard device found in /dev/input/")]
    NoKeyboard,

    #[error("Global hotkeys are not supported on this platform")]
    NotSupported,

    #[error("evdev error: {0}")]
    Evdev(String),
}

/// Errors related to clipboard access and keystroke simulation
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("ydotool daemon not running.\n  Start with: systemctl --user start ydotool\n  Enable at boot: systemctl --user enable ydotool")]
    YdotoolNotRunning,

    #[error("ydotool not found in PATH. Install via your package manager.")]
    YdotoolNotFound,

    #[error("wl-copy/wl-paste not found in PATH. Install wl-clipboard via your package manager.")]
    WlClipboardNotFound,

    #[error("xclip not found in PATH. Install via your package manager.")]
    XclipNotFound,

    #[error("Clipboard access failed: {0}")]
    ClipboardFailed(String),

    #[error("Key simulation failed: {0}")]
    KeystrokeFailed(String),
}

/// Errors from the external correction agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("No API key configured. Set TYPOFIX_API_KEY or OPENAI_API_KEY.")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote server error: {0}")]
    Remote(String),
}

/// Errors from the dialog surface
#[derive(Error, Debug)]
pub enum UiError {
    #[error("zenity not found in PATH. Install via your package manager.")]
    ZenityNotFound,

    #[error("Dialog failed: {0}")]
    DialogFailed(String),

    #[error("User interface is not prepared")]
    NotPrepared,
}

/// Result type alias using TypofixError
pub type Result<T> = std::result::Result<T, TypofixError>;

