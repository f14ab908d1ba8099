//! Platform-specific key bindings

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Platform-appropriate modifier for the confirm shortcut
/// - macOS: SUPER (Cmd key), CONTROL also accepted
/// - Linux/Windows: CONTROL (Ctrl key)
#[cfg(target_os = "macos")]
pub const CONFIRM_MODIFIER: KeyModifiers = KeyModifiers::SUPER;

#[cfg(not(target_os = "macos"))]
pub const CONFIRM_MODIFIER: KeyModifiers = KeyModifiers::CONTROL;

/// Confirm shortcut display for the summary help text
#[cfg(target_os = "macos")]
pub const CONFIRM_SHORTCUT: &str = "Cmd+S";

#[cfg(not(target_os = "macos"))]
pub const CONFIRM_SHORTCUT: &str = "Ctrl+S";

/// Whether a key event is the confirm shortcut
pub fn is_confirm(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('s') | KeyCode::Char('S'))
        && (key.modifiers.contains(CONFIRM_MODIFIER)
            || key.modifiers.contains(KeyModifiers::CONTROL))
}
