//! Keyboard shortcuts of the terminal dashboard.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::types::ControlAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Control(ControlAction),
    /// Ask the backend for one immediate `eeg_data` push.
    Snapshot,
    /// Drop the raw-signal history.
    WipeHistory,
    None,
}

pub fn map_key(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') => KeyAction::Control(ControlAction::Connect),
        KeyCode::Char('s') => KeyAction::Control(ControlAction::StartStreaming),
        KeyCode::Char('x') => KeyAction::Control(ControlAction::StopStreaming),
        KeyCode::Char('d') => KeyAction::Control(ControlAction::Disconnect),
        KeyCode::Char('u') => KeyAction::Snapshot,
        KeyCode::Char('w') => KeyAction::WipeHistory,
        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(map_key(key(KeyCode::Esc)), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn control_keys() {
        assert_eq!(
            map_key(key(KeyCode::Char('c'))),
            KeyAction::Control(ControlAction::Connect)
        );
        assert_eq!(
            map_key(key(KeyCode::Char('s'))),
            KeyAction::Control(ControlAction::StartStreaming)
        );
        assert_eq!(
            map_key(key(KeyCode::Char('x'))),
            KeyAction::Control(ControlAction::StopStreaming)
        );
        assert_eq!(
            map_key(key(KeyCode::Char('d'))),
            KeyAction::Control(ControlAction::Disconnect)
        );
    }

    #[test]
    fn data_keys() {
        assert_eq!(map_key(key(KeyCode::Char('u'))), KeyAction::Snapshot);
        assert_eq!(map_key(key(KeyCode::Char('w'))), KeyAction::WipeHistory);
    }

    #[test]
    fn unknown_key() {
        assert_eq!(map_key(key(KeyCode::Char('z'))), KeyAction::None);
    }
}
