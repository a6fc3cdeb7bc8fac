//! State machine for the typofix application lifecycle
//!
//! Uninitialized → Prepared → Running → Ending → Uninitialized
//!
//! The config and the hotkey registration exist exactly while the
//! application is Prepared or Running.

/// Application lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Nothing loaded, no hotkeys registered
    #[default]
    Uninitialized,

    /// Config loaded, hotkeys registered but not listening, UI prepared
    Prepared,

    /// Hotkeys active, UI event loop owns the thread
    Running,

    /// Teardown in progress
    Ending,
}

impl AppState {
    /// Create a new uninitialized state
    pub fn new() -> Self {
        AppState::Uninitialized
    }

    /// Whether config and hotkey registration must be present
    pub fn holds_resources(&self) -> bool {
        matches!(self, AppState::Prepared | AppState::Running)
    }
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppState::Uninitialized => write!(f, "uninitialized"),
            AppState::Prepared => write!(f, "prepared"),
            AppState::Running => write!(f, "running"),
            AppState::Ending => write!(f, "ending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_uninitialized() {
        let state = AppState::new();
        assert_eq!(state, AppState::Uninitialized);
        assert!(!state.holds_resources());
    }

    #[test]
    fn test_resource_holding_states() {
        assert!(AppState::Prepared.holds_resources());
        assert!(AppState::Running.holds_resources());
        assert!(!AppState::Ending.holds_resources());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", AppState::Prepared), "prepared");
        assert_eq!(AppState::Running.to_string(), "running");
    }
}
