use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use serde::{Deserialize, Serialize};

/// Keys that do not carry a character
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedKey {
    Backspace,
    Enter,
    Tab,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Insert,
    F(u8),
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
    Unidentified,
}

/// What a key event is, for comparison against the target text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyIdentity {
    Char(char),
    Named(NamedKey),
}

/// What kind of key was pressed, for deciding whether it is acted upon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    Letter,
    Digit,
    Punctuation,
    Symbol,
    Space,
    Backspace,
    Enter,
    Tab,
    Escape,
    Navigation,
    Function,
    Modifier,
    Other,
}

impl KeyCategory {
    /// Letters, digits, punctuation, symbols and space
    pub fn is_typable(self) -> bool {
        matches!(
            self,
            KeyCategory::Letter
                | KeyCategory::Digit
                | KeyCategory::Punctuation
                | KeyCategory::Symbol
                | KeyCategory::Space
        )
    }

    pub fn of_char(c: char) -> Self {
        if c == ' ' {
            KeyCategory::Space
        } else if c.is_alphabetic() {
            KeyCategory::Letter
        } else if c.is_numeric() {
            KeyCategory::Digit
        } else if c.is_ascii_punctuation() {
            if matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '-') {
                KeyCategory::Punctuation
            } else {
                KeyCategory::Symbol
            }
        } else if c.is_control() || c.is_whitespace() {
            KeyCategory::Other
        } else {
            KeyCategory::Symbol
        }
    }

    pub fn of_named(key: NamedKey) -> Self {
        match key {
            NamedKey::Backspace => KeyCategory::Backspace,
            NamedKey::Enter => KeyCategory::Enter,
            NamedKey::Tab => KeyCategory::Tab,
            NamedKey::Escape => KeyCategory::Escape,
            NamedKey::Left
            | NamedKey::Right
            | NamedKey::Up
            | NamedKey::Down
            | NamedKey::Home
            | NamedKey::End
            | NamedKey::PageUp
            | NamedKey::PageDown
            | NamedKey::Delete
            | NamedKey::Insert => KeyCategory::Navigation,
            NamedKey::F(_) => KeyCategory::Function,
            NamedKey::Shift
            | NamedKey::Control
            | NamedKey::Alt
            | NamedKey::Meta
            | NamedKey::CapsLock => KeyCategory::Modifier,
            NamedKey::Unidentified => KeyCategory::Other,
        }
    }
}

/// One normalized keystroke as handed to the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyStroke {
    pub identity: KeyIdentity,
    pub category: KeyCategory,
}

impl KeyStroke {
    pub fn new(identity: KeyIdentity, category: KeyCategory) -> Self {
        Self { identity, category }
    }

    pub fn from_char(c: char) -> Self {
        Self::new(KeyIdentity::Char(c), KeyCategory::of_char(c))
    }

    pub fn named(key: NamedKey) -> Self {
        Self::new(KeyIdentity::Named(key), KeyCategory::of_named(key))
    }

    pub fn backspace() -> Self {
        Self::named(NamedKey::Backspace)
    }

    /// The character carried by a typable keystroke
    pub fn typed_char(&self) -> Option<char> {
        match self.identity {
            KeyIdentity::Char(c) if self.category.is_typable() => Some(c),
            _ => None,
        }
    }

    /// Normalize a terminal key event.
    ///
    /// Release events and Ctrl/Alt chords come back as `Other` so the
    /// engine ignores them.
    pub fn from_crossterm(event: &KeyEvent) -> Self {
        if event.kind == KeyEventKind::Release {
            return Self::named(NamedKey::Unidentified);
        }
        if event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            if let KeyCode::Char(c) = event.code {
                return Self::new(KeyIdentity::Char(c), KeyCategory::Other);
            }
        }

        match event.code {
            KeyCode::Char(c) => Self::from_char(c),
            KeyCode::Backspace => Self::named(NamedKey::Backspace),
            KeyCode::Enter => Self::named(NamedKey::Enter),
            KeyCode::Tab | KeyCode::BackTab => Self::named(NamedKey::Tab),
            KeyCode::Esc => Self::named(NamedKey::Escape),
            KeyCode::Left => Self::named(NamedKey::Left),
            KeyCode::Right => Self::named(NamedKey::Right),
            KeyCode::Up => Self::named(NamedKey::Up),
            KeyCode::Down => Self::named(NamedKey::Down),
            KeyCode::Home => Self::named(NamedKey::Home),
            KeyCode::End => Self::named(NamedKey::End),
            KeyCode::PageUp => Self::named(NamedKey::PageUp),
            KeyCode::PageDown => Self::named(NamedKey::PageDown),
            KeyCode::Delete => Self::named(NamedKey::Delete),
            KeyCode::Insert => Self::named(NamedKey::Insert),
            KeyCode::F(n) => Self::named(NamedKey::F(n)),
            KeyCode::CapsLock => Self::named(NamedKey::CapsLock),
            KeyCode::Modifier(m) => Self::named(modifier_key(m)),
            _ => Self::named(NamedKey::Unidentified),
        }
    }
}

fn modifier_key(code: ModifierKeyCode) -> NamedKey {
    match code {
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => NamedKey::Shift,
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => NamedKey::Control,
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => NamedKey::Alt,
        _ => NamedKey::Meta,
    }
}
