//! Global hotkey registration
//!
//! Each keybind from the config is rendered to a canonical hotkey string
//! (`<ctrl>+<alt>+<shift>+<cmd>+x`) and mapped to a [`HotkeyAction`].
//! A [`HotkeyListener`] watches the keyboard on its own thread and posts
//! matching actions into the UI event queue; it never calls into the UI
//! directly.
//!
//! On Linux, detection uses evdev at the kernel input level, which works on
//! every Wayland compositor and on X11. Requires the user to be in the
//! 'input' group.

#[cfg(target_os = "linux")]
pub mod evdev_listener;

use crate::config::{Config, Keybind};
use crate::error::HotkeyError;
use crate::ui::EventSender;
use std::collections::HashMap;

/// What a registered hotkey does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    /// Correct the currently selected text
    Correct,
    /// Open the configuration dialog
    EditConfig,
}

/// Hotkey string → action
pub type Bindings = HashMap<String, HotkeyAction>;

const CTRL_TOKEN: &str = "<ctrl>+";
const ALT_TOKEN: &str = "<alt>+";
const SHIFT_TOKEN: &str = "<shift>+";
const SUPER_TOKEN: &str = "<cmd>+";

/// Trigger characters every listener can map to a physical key (US layout).
/// Letters match in either case.
pub const BINDABLE_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789-=[];'`\\,./ ";

/// Whether `c` can be used as a hotkey trigger
pub fn is_bindable(c: char) -> bool {
    BINDABLE_CHARS.contains(c.to_ascii_lowercase())
}

/// Render a keybind as a hotkey string
///
/// Modifiers come in ctrl → alt → shift → cmd order and the trigger
/// character is always last.
pub fn create_hotkey_string(keybind: &Keybind) -> String {
    let mut hotkey = String::new();
    if keybind.use_ctrl {
        hotkey.push_str(CTRL_TOKEN);
    }
    if keybind.use_alt {
        hotkey.push_str(ALT_TOKEN);
    }
    if keybind.use_shift {
        hotkey.push_str(SHIFT_TOKEN);
    }
    if keybind.use_super {
        hotkey.push_str(SUPER_TOKEN);
    }
    hotkey.push(keybind.char);
    hotkey
}

/// Parse a hotkey string back into a keybind
///
/// Modifier tokens may appear in any order; the remainder must be exactly
/// one character (which may itself be `+`).
pub fn parse_hotkey_string(hotkey: &str) -> Result<Keybind, HotkeyError> {
    let mut keybind = Keybind::new(false, false, false, false, ' ');
    let mut rest = hotkey;

    loop {
        let flag = if let Some(r) = rest.strip_prefix(CTRL_TOKEN) {
            rest = r;
            &mut keybind.use_ctrl
        } else if let Some(r) = rest.strip_prefix(ALT_TOKEN) {
            rest = r;
            &mut keybind.use_alt
        } else if let Some(r) = rest.strip_prefix(SHIFT_TOKEN) {
            rest = r;
            &mut keybind.use_shift
        } else if let Some(r) = rest.strip_prefix(SUPER_TOKEN) {
            rest = r;
            &mut keybind.use_super
        } else {
            break;
        };

        if *flag {
            return Err(HotkeyError::Malformed(hotkey.to_string()));
        }
        *flag = true;
    }

    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            keybind.char = c;
            Ok(keybind)
        }
        _ => Err(HotkeyError::Malformed(hotkey.to_string())),
    }
}

/// Build the hotkey map for a config
pub fn build_bindings(config: &Config) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert(
        create_hotkey_string(&config.activation_keybind),
        HotkeyAction::Correct,
    );
    bindings.insert(
        create_hotkey_string(&config.config_keybind),
        HotkeyAction::EditConfig,
    );
    bindings
}

/// Trait for hotkey detection implementations
pub trait HotkeyListener: Send {
    /// Start listening; matching actions are posted to the event queue
    fn start(&mut self) -> Result<(), HotkeyError>;

    /// Stop listening and clean up
    fn stop(&mut self) -> Result<(), HotkeyError>;
}

/// Creates listeners for a set of bindings
pub trait ListenerFactory: Send {
    fn create(
        &self,
        bindings: &Bindings,
        events: EventSender,
    ) -> Result<Box<dyn HotkeyListener>, HotkeyError>;
}

/// Factory for the platform's native listener
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemListenerFactory;

impl ListenerFactory for SystemListenerFactory {
    #[cfg(target_os = "linux")]
    fn create(
        &self,
        bindings: &Bindings,
        events: EventSender,
    ) -> Result<Box<dyn HotkeyListener>, HotkeyError> {
        Ok(Box::new(evdev_listener::EvdevListener::new(bindings, events)?))
    }

    #[cfg(not(target_os = "linux"))]
    fn create(
        &self,
        _bindings: &Bindings,
        _events: EventSender,
    ) -> Result<Box<dyn HotkeyListener>, HotkeyError> {
        Err(HotkeyError::NotSupported)
    }
}

/// Registered hotkeys: owns the listener for one prepare/end cycle
pub struct HotkeyRegistration {
    bindings: Bindings,
    listener: Box<dyn HotkeyListener>,
    listening: bool,
}

impl HotkeyRegistration {
    /// Register the bindings without starting to listen
    pub fn register(
        factory: &dyn ListenerFactory,
        bindings: Bindings,
        events: EventSender,
    ) -> Result<Self, HotkeyError> {
        let listener = factory.create(&bindings, events)?;
        for (hotkey, action) in &bindings {
            tracing::info!("Registered hotkey {} -> {:?}", hotkey, action);
        }
        Ok(Self {
            bindings,
            listener,
            listening: false,
        })
    }

    pub fn start(&mut self) -> Result<(), HotkeyError> {
        if self.listening {
            tracing::warn!("Hotkey listener already started");
            return Ok(());
        }
        self.listener.start()?;
        self.listening = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), HotkeyError> {
        if !self.listening {
            return Ok(());
        }
        self.listening = false;
        self.listener.stop()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl Drop for HotkeyRegistration {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("Failed to stop hotkey listener: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SEP: char = '+';

    fn kb(ctrl: bool, alt: bool, shift: bool, sup: bool, c: char) -> Keybind {
        Keybind::new(ctrl, alt, shift, sup, c)
    }

    fn tokens(s: &str) -> HashSet<&str> {
        s.split(SEP).collect()
    }

    #[test]
    fn test_create_hotkey_string_modifier_sets() {
        let cases = [
            (kb(true, false, false, false, 'a'), "<ctrl>+a"),
            (kb(false, true, false, false, 'b'), "<alt>+b"),
            (kb(true, true, false, false, 'c'), "<ctrl>+<alt>+c"),
            (kb(false, false, true, false, 'd'), "<shift>+d"),
            (kb(true, false, true, false, 'e'), "<ctrl>+<shift>+e"),
            (kb(false, true, true, false, 'f'), "<alt>+<shift>+f"),
            (kb(true, true, true, false, 'g'), "<ctrl>+<alt>+<shift>+g"),
            (kb(false, false, false, true, 'h'), "<cmd>+h"),
            (kb(true, false, false, true, 'i'), "<cmd>+<ctrl>+i"),
            (kb(false, true, false, true, 'j'), "<cmd>+<alt>+j"),
            (kb(true, true, false, true, 'k'), "<cmd>+<ctrl>+<alt>+k"),
            (kb(false, false, true, true, 'l'), "<cmd>+<shift>+l"),
            (kb(true, false, true, true, 'm'), "<cmd>+<ctrl>+<shift>+m"),
            (kb(false, true, true, true, 'n'), "<cmd>+<alt>+<shift>+n"),
            (kb(true, true, true, true, 'o'), "<cmd>+<ctrl>+<alt>+<shift>+o"),
        ];

        for (keybind, expected) in cases {
            let actual = create_hotkey_string(&keybind);
            // Order of modifiers is irrelevant for matching
            assert_eq!(tokens(&actual), tokens(expected), "for {:?}", keybind);
            // The trigger character is always last, right after a separator
            assert!(actual.ends_with(&format!("{}{}", SEP, keybind.char)));
        }
    }

    #[test]
    fn test_create_hotkey_string_canonical_order() {
        assert_eq!(
            create_hotkey_string(&kb(true, true, true, true, 'x')),
            "<ctrl>+<alt>+<shift>+<cmd>+x"
        );
    }

    #[test]
    fn test_create_hotkey_string_no_modifiers() {
        assert_eq!(create_hotkey_string(&kb(false, false, false, false, 'z')), "z");
    }

    #[test]
    fn test_parse_hotkey_string() {
        let keybind = parse_hotkey_string("<cmd>+<ctrl>+k").unwrap();
        assert_eq!(keybind, kb(true, false, false, true, 'k'));

        let plus = parse_hotkey_string("<ctrl>++").unwrap();
        assert_eq!(plus, kb(true, false, false, false, '+'));

        let original = Config::default().activation_keybind;
        let parsed = parse_hotkey_string(&create_hotkey_string(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_hotkey_string_errors() {
        assert!(parse_hotkey_string("").is_err());
        assert!(parse_hotkey_string("<ctrl>+").is_err());
        assert!(parse_hotkey_string("<ctrl>+ab").is_err());
        assert!(parse_hotkey_string("<ctrl>+<ctrl>+a").is_err());
        assert!(parse_hotkey_string("<meta>+a").is_err());
    }

    #[test]
    fn test_is_bindable() {
        assert!(is_bindable('b'));
        assert!(is_bindable('B'));
        assert!(is_bindable('7'));
        assert!(is_bindable('\\'));
        assert!(!is_bindable('é'));
        assert!(!is_bindable('+'));
        assert!(!is_bindable('\n'));
    }

    #[test]
    fn test_build_bindings() {
        let bindings = build_bindings(&Config::default());
        assert_eq!(bindings.len(), 2);
        assert_eq!(
            bindings.get("<ctrl>+<alt>+<shift>+b"),
            Some(&HotkeyAction::Correct)
        );
        assert_eq!(
            bindings.get("<ctrl>+<alt>+<shift>+v"),
            Some(&HotkeyAction::EditConfig)
        );
    }
}
