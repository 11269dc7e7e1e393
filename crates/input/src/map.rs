//! Key mapping from terminal events to game actions.
//!
//! Bindings are written with `KeyboardEvent.code`-style names (`ArrowLeft`,
//! `Space`, `KeyX`, `Digit1`, ...) and resolved to crossterm key codes once.

use arrayvec::ArrayVec;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

use crate::types::{Action, InputEvent};

const MAX_BINDINGS: usize = Action::ALL.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name {name:?} bound to {action}")]
pub struct UnknownKey {
    pub action: &'static str,
    pub name: String,
}

/// Resolve a key name. Letters match regardless of case.
pub fn key_code_from_name(name: &str) -> Option<KeyCode> {
    let code = match name {
        "ArrowLeft" => KeyCode::Left,
        "ArrowRight" => KeyCode::Right,
        "ArrowUp" => KeyCode::Up,
        "ArrowDown" => KeyCode::Down,
        "Space" => KeyCode::Char(' '),
        "Enter" => KeyCode::Enter,
        "Escape" => KeyCode::Esc,
        "Tab" => KeyCode::Tab,
        "Backspace" => KeyCode::Backspace,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        _ => {
            let ch = name
                .strip_prefix("Key")
                .or_else(|| name.strip_prefix("Digit"))
                .unwrap_or(name);
            let mut chars = ch.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_graphic() => KeyCode::Char(c.to_ascii_lowercase()),
                _ => return None,
            }
        }
    };
    Some(code)
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Physical key per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    keys: ArrayVec<(KeyCode, Action), MAX_BINDINGS>,
}

impl KeyBindings {
    /// Build from `(action, key name)` pairs. Empty names leave the action unbound.
    pub fn new<'a>(names: impl IntoIterator<Item = (Action, &'a str)>) -> Result<Self, UnknownKey> {
        let mut keys: ArrayVec<(KeyCode, Action), MAX_BINDINGS> = ArrayVec::new();
        for (action, name) in names {
            if name.is_empty() {
                continue;
            }
            let code = key_code_from_name(name).ok_or_else(|| UnknownKey {
                action: action.as_str(),
                name: name.to_string(),
            })?;
            if keys.iter().all(|&(_, bound)| bound != action) {
                let _ = keys.try_push((code, action));
            }
        }
        Ok(Self { keys })
    }

    pub fn action_for(&self, code: KeyCode) -> Option<Action> {
        let code = normalize(code);
        self.keys
            .iter()
            .find(|&&(bound, _)| bound == code)
            .map(|&(_, action)| action)
    }

    pub fn key_for(&self, action: Action) -> Option<KeyCode> {
        self.keys
            .iter()
            .find(|&&(_, bound)| bound == action)
            .map(|&(code, _)| code)
    }

    /// Ctrl-C always quits. `q` quits unless it is bound to an action.
    pub fn should_quit(&self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
            && self.action_for(key.code).is_none()
    }

    /// Press and release become action-down/up. Terminal auto-repeat is dropped;
    /// the session's repeater produces repeats itself.
    pub fn translate(&self, key: KeyEvent) -> Option<InputEvent> {
        let action = self.action_for(key.code)?;
        match key.kind {
            KeyEventKind::Press => Some(InputEvent::down(action)),
            KeyEventKind::Release => Some(InputEvent::up(action)),
            KeyEventKind::Repeat => None,
        }
    }
}

impl Default for KeyBindings {
    /// The stock layout: arrows, space, X/Z rotate, C hold, P pause, R reset.
    fn default() -> Self {
        let keys = [
            (KeyCode::Left, Action::Left),
            (KeyCode::Right, Action::Right),
            (KeyCode::Down, Action::SoftDrop),
            (KeyCode::Char(' '), Action::HardDrop),
            (KeyCode::Char('x'), Action::RotateCw),
            (KeyCode::Char('z'), Action::RotateCcw),
            (KeyCode::Char('c'), Action::Hold),
            (KeyCode::Char('p'), Action::Pause),
            (KeyCode::Char('r'), Action::Reset),
        ];
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}
