//! Configuration loading and types for typofix
//!
//! The persisted configuration is a small JSON document holding the two
//! keybinds and the user's prompt assumptions:
//!
//! ```json
//! {
//!     "activationKeybind": { "useCtrl": true, "useAlt": true, "useShift": true, "useSuper": false, "char": "b" },
//!     "configKeybind": { "useCtrl": true, "useAlt": true, "useShift": true, "useSuper": false, "char": "v" },
//!     "conditionText": "...",
//!     "exampleText": "..."
//! }
//! ```
//!
//! A missing or invalid file is replaced by the defaults. Runtime settings
//! (model endpoint, capture timing) are not persisted; they come from CLI
//! flags and environment variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A modifier + single character key combination
///
/// `char` is a Rust `char`, so exactly one code point is enforced by the
/// type itself and by serde when reading the JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keybind {
    pub use_ctrl: bool,
    pub use_alt: bool,
    pub use_shift: bool,
    pub use_super: bool,
    pub char: char,
}

impl Keybind {
    pub fn new(use_ctrl: bool, use_alt: bool, use_shift: bool, use_super: bool, char: char) -> Self {
        Self {
            use_ctrl,
            use_alt,
            use_shift,
            use_super,
            char,
        }
    }

    /// Default activation keybind (ctrl+alt+shift+b)
    pub fn default_activation() -> Self {
        Self::new(true, true, true, false, 'b')
    }

    /// Default config-change keybind (ctrl+alt+shift+v)
    pub fn default_config() -> Self {
        Self::new(true, true, true, false, 'v')
    }

    /// Whether two keybinds would be triggered by the same physical keys.
    /// Letters are compared case-insensitively since both map to one key.
    pub fn conflicts_with(&self, other: &Keybind) -> bool {
        self.use_ctrl == other.use_ctrl
            && self.use_alt == other.use_alt
            && self.use_shift == other.use_shift
            && self.use_super == other.use_super
            && self.char.to_lowercase().eq(other.char.to_lowercase())
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Hotkey that triggers a correction of the selected text
    pub activation_keybind: Keybind,

    /// Hotkey that opens the configuration dialog
    pub config_keybind: Keybind,

    /// Correction rules the model has to follow
    pub condition_text: String,

    /// Example corrections shown to the model
    pub example_text: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            activation_keybind: Keybind::default_activation(),
            config_keybind: Keybind::default_config(),
            condition_text: "- Changes should be as minimal as possible;\n\
                             - Do not change the main idea of the text.\n"
                .to_string(),
            example_text: "- Helo world! -> Hello world!\n\
                           - maintanance -> maintenance\n"
                .to_string(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "typofix")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Get the runtime directory for ephemeral files (lock file)
    pub fn runtime_dir() -> PathBuf {
        // Use XDG_RUNTIME_DIR if available, otherwise fall back to /tmp
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("typofix")
    }

    /// Reject configurations whose two hotkeys cannot both be reached
    pub fn validate(&self) -> Result<(), ConfigError> {
        for keybind in [&self.activation_keybind, &self.config_keybind] {
            if !crate::hotkey::is_bindable(keybind.char) {
                return Err(ConfigError::UnbindableKey(keybind.char));
            }
        }
        if self.activation_keybind.conflicts_with(&self.config_keybind) {
            return Err(ConfigError::KeybindCollision(
                crate::hotkey::create_hotkey_string(&self.activation_keybind),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Config, String> {
        let config: Config = serde_json::from_str(text).map_err(|e| e.to_string())?;
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    /// Serialize with 4-space indentation in declaration order
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Resolve the config path from an optional override
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    path.map(PathBuf::from)
        .or_else(Config::default_path)
        .ok_or(ConfigError::NoConfigDir)
}

/// Load configuration from file, creating it with defaults if absent
///
/// An unreadable, unparsable or invalid file is treated like a missing one:
/// it is kept next to the original as `<name>.bak` and replaced by the
/// defaults. Only failing to write the defaults is an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        let config = Config::default();
        tracing::warn!(
            "Config file not found at {:?}, creating it with defaults",
            path
        );
        save_config(&config, path)?;
        return Ok(config);
    }

    tracing::debug!("Loading config from {:?}", path);
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| format!("unreadable: {}", e))
        .and_then(|contents| Config::from_json(&contents));

    match loaded {
        Ok(config) => {
            tracing::info!("Config has been loaded from {:?}", path);
            Ok(config)
        }
        Err(message) => {
            tracing::warn!("Invalid config at {:?}: {}. Using defaults", path, message);
            let backup = backup_path(path);
            if let Err(e) = std::fs::rename(path, &backup) {
                tracing::warn!("Failed to back up invalid config: {}", e);
            } else {
                tracing::info!("Invalid config preserved at {:?}", backup);
            }
            let config = Config::default();
            save_config(&config, path)?;
            Ok(config)
        }
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_error = |message: String| ConfigError::Write {
        path: path.display().to_string(),
        message,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| write_error(format!("failed to create config dir: {}", e)))?;
    }

    let contents = config
        .to_pretty_json()
        .map_err(|e| write_error(format!("failed to serialize config: {}", e)))?;

    std::fs::write(path, contents).map_err(|e| write_error(e.to_string()))?;

    tracing::info!("Config has been saved to {:?}", path);
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn custom_config() -> Config {
        Config {
            activation_keybind: Keybind::new(true, true, true, false, 'a'),
            config_keybind: Keybind::new(true, true, true, false, 'j'),
            condition_text: "condition".to_string(),
            example_text: "example".to_string(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.activation_keybind.char, 'b');
        assert_eq!(config.config_keybind.char, 'v');
        assert!(config.activation_keybind.use_ctrl);
        assert!(!config.activation_keybind.use_super);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_keybinds_are_fresh_values() {
        let mut a = Keybind::default_activation();
        a.char = 'x';
        assert_ne!(a, Keybind::default_activation());
        assert_eq!(Keybind::default_activation().char, 'b');
    }

    #[test]
    fn test_load_valid_file_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let compact = serde_json::to_string(&custom_config()).unwrap();
        std::fs::write(&path, &compact).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, custom_config());
        assert_ne!(loaded, Config::default());

        // Still compact: nothing rewrote the file
        assert_eq!(std::fs::read_to_string(&path).unwrap(), compact);
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, Config::default());

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, Config::default().to_pretty_json().unwrap());
    }

    #[test]
    fn test_load_invalid_file_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, Config::default());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("config.json.bak")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn test_load_non_utf8_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, [0xff, 0xfe, b'{', 0x80]).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, Config::default());
        assert_eq!(
            std::fs::read(dir.path().join("config.json.bak")).unwrap(),
            vec![0xff, 0xfe, b'{', 0x80]
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            Config::default().to_pretty_json().unwrap()
        );
    }

    #[test]
    fn test_defaults_written_only_on_first_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        load_config(&path).unwrap();

        // A rewrite would restore the pretty layout
        let compact = serde_json::to_string(&Config::default()).unwrap();
        std::fs::write(&path, &compact).unwrap();

        assert_eq!(load_config(&path).unwrap(), Config::default());
        assert_eq!(load_config(&path).unwrap(), Config::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), compact);
        assert!(!dir.path().join("config.json.bak").exists());
    }

    #[test]
    fn test_unbindable_trigger_rejected() {
        let mut config = custom_config();
        config.activation_keybind.char = 'é';
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnbindableKey('é')));
    }

    #[test]
    fn test_load_unbindable_trigger_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = custom_config();
        config.config_keybind.char = 'ß';
        save_config(&config, &path).unwrap();

        assert_eq!(load_config(&path).unwrap(), Config::default());
        assert!(dir.path().join("config.json.bak").exists());
    }

    #[test]
    fn test_multi_char_trigger_rejected() {
        let json = r#"{
            "activationKeybind": {"useCtrl": true, "useAlt": false, "useShift": false, "useSuper": false, "char": "ab"},
            "configKeybind": {"useCtrl": true, "useAlt": false, "useShift": false, "useSuper": false, "char": "v"},
            "conditionText": "",
            "exampleText": ""
        }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_colliding_keybinds_rejected() {
        let mut config = custom_config();
        config.config_keybind = Keybind::new(true, true, true, false, 'A');
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::KeybindCollision(_)));
    }

    #[test]
    fn test_save_config_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        save_config(&custom_config(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let expected = "{\n    \"activationKeybind\": {\n        \"useCtrl\": true,\n        \"useAlt\": true,\n        \"useShift\": true,\n        \"useSuper\": false,\n        \"char\": \"a\"\n    },\n";
        assert!(written.starts_with(expected), "unexpected layout:\n{}", written);

        // Key order is stable: declaration order, not alphabetical
        let activation = written.find("activationKeybind").unwrap();
        let config = written.find("configKeybind").unwrap();
        let condition = written.find("conditionText").unwrap();
        let example = written.find("exampleText").unwrap();
        assert!(activation < config && config < condition && condition < example);
    }

    #[test]
    fn test_save_keeps_unicode_unescaped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = custom_config();
        config.example_text = "こんにちわ -> こんにちは".to_string();
        save_config(&config, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("こんにちわ -> こんにちは"));
        assert_eq!(load_config(&path).unwrap(), config);
    }
}
