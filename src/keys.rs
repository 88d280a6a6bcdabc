use crossterm::event::{KeyCode, KeyEvent};

/// A symbolic key token: either a printable character or a named key.
///
/// Mouse events never become tokens; the controller drops them before
/// dispatch. Modifier-only chords are collapsed here on purpose, so an
/// uppercase letter arrives as `Char('A')` regardless of how the terminal
/// reported shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Esc,
    Enter,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
}

impl KeyToken {
    /// Map a crossterm key event to a token. Keys we have no name for
    /// (function keys, media keys..) are discarded.
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        match event.code {
            KeyCode::Char(c) => Some(KeyToken::Char(c)),
            KeyCode::Esc => Some(KeyToken::Esc),
            KeyCode::Enter => Some(KeyToken::Enter),
            KeyCode::Backspace => Some(KeyToken::Backspace),
            KeyCode::Up => Some(KeyToken::Up),
            KeyCode::Down => Some(KeyToken::Down),
            KeyCode::Left => Some(KeyToken::Left),
            KeyCode::Right => Some(KeyToken::Right),
            KeyCode::PageUp => Some(KeyToken::PageUp),
            KeyCode::PageDown => Some(KeyToken::PageDown),
            KeyCode::Home => Some(KeyToken::Home),
            KeyCode::End => Some(KeyToken::End),
            _ => None,
        }
    }

    /// The uppercase-letter companion of this token, used for batch
    /// dispatch: `Char('A')` folds to `Char('a')`.
    pub fn case_folded(&self) -> Option<KeyToken> {
        match self {
            KeyToken::Char(c) if c.is_uppercase() => {
                let mut lower = c.to_lowercase();
                match (lower.next(), lower.next()) {
                    (Some(lc), None) => Some(KeyToken::Char(lc)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Display form used in help tables and status summaries.
    pub fn label(&self) -> String {
        match self {
            KeyToken::Char(c) => c.to_string(),
            KeyToken::Esc => "esc".into(),
            KeyToken::Enter => "enter".into(),
            KeyToken::Backspace => "backspace".into(),
            KeyToken::Up => "up".into(),
            KeyToken::Down => "down".into(),
            KeyToken::Left => "left".into(),
            KeyToken::Right => "right".into(),
            KeyToken::PageUp => "pageup".into(),
            KeyToken::PageDown => "pagedown".into(),
            KeyToken::Home => "home".into(),
            KeyToken::End => "end".into(),
        }
    }
}
