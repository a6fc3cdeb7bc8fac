//! evdev-based hotkey listener
//!
//! Uses the Linux evdev interface to detect key presses at the kernel level.
//! This works on all Wayland compositors because it bypasses the display server.
//!
//! The user must be in the 'input' group to access /dev/input/* devices.

use super::{parse_hotkey_string, Bindings, HotkeyAction, HotkeyListener};
use crate::error::HotkeyError;
use crate::ui::{EventSender, UiEvent};
use evdev::{Device, InputEventKind, Key};
use std::collections::HashSet;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::thread::JoinHandle;
use tokio::sync::oneshot;

/// Modifier groups held at a point in time (left and right keys are equivalent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Modifiers {
    ctrl: bool,
    alt: bool,
    shift: bool,
    meta: bool,
}

impl Modifiers {
    fn from_held(held: &HashSet<Key>) -> Self {
        let any = |keys: [Key; 2]| keys.iter().any(|k| held.contains(k));
        Self {
            ctrl: any([Key::KEY_LEFTCTRL, Key::KEY_RIGHTCTRL]),
            alt: any([Key::KEY_LEFTALT, Key::KEY_RIGHTALT]),
            shift: any([Key::KEY_LEFTSHIFT, Key::KEY_RIGHTSHIFT]),
            meta: any([Key::KEY_LEFTMETA, Key::KEY_RIGHTMETA]),
        }
    }
}

fn is_modifier(key: Key) -> bool {
    matches!(
        key,
        Key::KEY_LEFTCTRL
            | Key::KEY_RIGHTCTRL
            | Key::KEY_LEFTALT
            | Key::KEY_RIGHTALT
            | Key::KEY_LEFTSHIFT
            | Key::KEY_RIGHTSHIFT
            | Key::KEY_LEFTMETA
            | Key::KEY_RIGHTMETA
    )
}

/// A binding resolved to physical keys
#[derive(Debug, Clone, Copy)]
struct KeyBinding {
    trigger: Key,
    modifiers: Modifiers,
    action: HotkeyAction,
}

/// evdev-based hotkey listener
pub struct EvdevListener {
    bindings: Vec<KeyBinding>,
    /// Paths to keyboard devices
    device_paths: Vec<PathBuf>,
    events: EventSender,
    /// Signal to stop the listener thread
    stop_signal: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl EvdevListener {
    /// Create a new evdev listener for the given hotkey bindings
    pub fn new(bindings: &Bindings, events: EventSender) -> Result<Self, HotkeyError> {
        let bindings = resolve_bindings(bindings)?;

        let device_paths = find_keyboard_devices()?;

        if device_paths.is_empty() {
            return Err(HotkeyError::NoKeyboard);
        }

        tracing::debug!(
            "Found {} keyboard device(s): {:?}",
            device_paths.len(),
            device_paths
        );

        Ok(Self {
            bindings,
            device_paths,
            events,
            stop_signal: None,
            worker: None,
        })
    }
}

impl HotkeyListener for EvdevListener {
    fn start(&mut self) -> Result<(), HotkeyError> {
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);

        let bindings = self.bindings.clone();
        let device_paths = self.device_paths.clone();
        let events = self.events.clone();

        let worker = std::thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || evdev_listener_loop(device_paths, bindings, events, stop_rx))
            .map_err(|e| HotkeyError::Evdev(format!("failed to spawn listener: {}", e)))?;
        self.worker = Some(worker);

        Ok(())
    }

    fn stop(&mut self) -> Result<(), HotkeyError> {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Hotkey listener thread panicked");
            }
        }
        Ok(())
    }
}

/// Main listener loop running on a dedicated thread
fn evdev_listener_loop(
    device_paths: Vec<PathBuf>,
    bindings: Vec<KeyBinding>,
    events: EventSender,
    mut stop_rx: oneshot::Receiver<()>,
) {
    // Open all keyboard devices in non-blocking mode
    let mut devices: Vec<Device> = device_paths
        .iter()
        .filter_map(|path| match Device::open(path) {
            Ok(device) => {
                // Set device to non-blocking mode so fetch_events doesn't block
                let fd = device.as_raw_fd();
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    if flags != -1 {
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                }
                tracing::debug!("Opened device (non-blocking): {:?}", path);
                Some(device)
            }
            Err(e) => {
                tracing::warn!("Failed to open {:?}: {}", path, e);
                None
            }
        })
        .collect();

    if devices.is_empty() {
        tracing::error!("No keyboard devices could be opened");
        return;
    }

    // Track currently held modifier keys
    let mut held: HashSet<Key> = HashSet::new();

    tracing::info!("Listening for {} hotkey(s)", bindings.len());

    loop {
        // Check for stop signal (non-blocking)
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Hotkey listener stopping");
                return;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        for device in &mut devices {
            // fetch_events returns immediately if no events (non-blocking)
            let Ok(fetched) = device.fetch_events() else {
                continue;
            };
            for event in fetched {
                let InputEventKind::Key(key) = event.kind() else {
                    continue;
                };

                if is_modifier(key) {
                    match event.value() {
                        1 => {
                            held.insert(key);
                        }
                        0 => {
                            held.remove(&key);
                        }
                        _ => {}
                    }
                    continue;
                }

                // Only fresh presses; 2 is auto-repeat, 0 release
                if event.value() != 1 {
                    continue;
                }

                if let Some(action) = match_binding(&bindings, key, Modifiers::from_held(&held)) {
                    tracing::debug!("Hotkey pressed: {:?}", action);
                    if events.send(UiEvent::Hotkey(action)).is_err() {
                        return; // UI event queue closed
                    }
                }
            }
        }

        // Small sleep to avoid busy-waiting
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}

/// Exact modifier match: extra held modifiers do not trigger a binding
fn match_binding(bindings: &[KeyBinding], key: Key, modifiers: Modifiers) -> Option<HotkeyAction> {
    bindings
        .iter()
        .find(|b| b.trigger == key && b.modifiers == modifiers)
        .map(|b| b.action)
}

fn resolve_bindings(bindings: &Bindings) -> Result<Vec<KeyBinding>, HotkeyError> {
    bindings
        .iter()
        .map(|(hotkey, action)| {
            let keybind = parse_hotkey_string(hotkey)?;
            Ok(KeyBinding {
                trigger: char_to_key(keybind.char)?,
                modifiers: Modifiers {
                    ctrl: keybind.use_ctrl,
                    alt: keybind.use_alt,
                    shift: keybind.use_shift,
                    meta: keybind.use_super,
                },
                action: *action,
            })
        })
        .collect()
}

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, HotkeyError> {
    let mut keyboards = Vec::new();

    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| HotkeyError::DeviceAccess(format!("/dev/input: {}", e)))?;

    for entry in input_dir {
        let entry = entry.map_err(|e| HotkeyError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        // Only look at event* devices
        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);

        if !is_event_device {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                // A keyboard should have at least some letter keys
                let has_keys = device
                    .supported_keys()
                    .map(|keys| {
                        keys.contains(Key::KEY_A)
                            && keys.contains(Key::KEY_Z)
                            && keys.contains(Key::KEY_ENTER)
                    })
                    .unwrap_or(false);

                if has_keys {
                    tracing::debug!(
                        "Found keyboard: {:?} ({:?})",
                        path,
                        device.name().unwrap_or("unknown")
                    );
                    keyboards.push(path);
                }
            }
            Err(e) => {
                // Permission denied is common for non-input-group users
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(HotkeyError::DeviceAccess(path.display().to_string()));
                }
                tracing::trace!("Skipping {:?}: {}", path, e);
            }
        }
    }

    Ok(keyboards)
}

/// Map a trigger character to the evdev key that produces it on a US layout
fn char_to_key(c: char) -> Result<Key, HotkeyError> {
    let key = match c.to_ascii_lowercase() {
        'a' => Key::KEY_A,
        'b' => Key::KEY_B,
        'c' => Key::KEY_C,
        'd' => Key::KEY_D,
        'e' => Key::KEY_E,
        'f' => Key::KEY_F,
        'g' => Key::KEY_G,
        'h' => Key::KEY_H,
        'i' => Key::KEY_I,
        'j' => Key::KEY_J,
        'k' => Key::KEY_K,
        'l' => Key::KEY_L,
        'm' => Key::KEY_M,
        'n' => Key::KEY_N,
        'o' => Key::KEY_O,
        'p' => Key::KEY_P,
        'q' => Key::KEY_Q,
        'r' => Key::KEY_R,
        's' => Key::KEY_S,
        't' => Key::KEY_T,
        'u' => Key::KEY_U,
        'v' => Key::KEY_V,
        'w' => Key::KEY_W,
        'x' => Key::KEY_X,
        'y' => Key::KEY_Y,
        'z' => Key::KEY_Z,
        '0' => Key::KEY_0,
        '1' => Key::KEY_1,
        '2' => Key::KEY_2,
        '3' => Key::KEY_3,
        '4' => Key::KEY_4,
        '5' => Key::KEY_5,
        '6' => Key::KEY_6,
        '7' => Key::KEY_7,
        '8' => Key::KEY_8,
        '9' => Key::KEY_9,
        '-' => Key::KEY_MINUS,
        '=' => Key::KEY_EQUAL,
        '[' => Key::KEY_LEFTBRACE,
        ']' => Key::KEY_RIGHTBRACE,
        ';' => Key::KEY_SEMICOLON,
        '\'' => Key::KEY_APOSTROPHE,
        '`' => Key::KEY_GRAVE,
        '\\' => Key::KEY_BACKSLASH,
        ',' => Key::KEY_COMMA,
        '.' => Key::KEY_DOT,
        '/' => Key::KEY_SLASH,
        ' ' => Key::KEY_SPACE,
        _ => return Err(HotkeyError::UnknownKey(c)),
    };

    Ok(key)
}
