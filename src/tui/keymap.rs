//! Terminal keys to shell actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::command::CommandRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Activate a command, as a click on its button would.
    Command(String),
    MenuUp,
    MenuDown,
    MenuConfirm,
    /// Close whatever popup or input is on top.
    Dismiss,
    BeginSearch,
    CycleTheme,
}

/// Plain keys bound to command ids.
const BINDINGS: &[(char, &str)] = &[
    ('+', "zoomIn"),
    ('=', "zoomIn"),
    ('-', "zoomOut"),
    ('j', "nextPage"),
    ('k', "previousPage"),
    (']', "rotateClockwise"),
    ('[', "rotateCounterClockwise"),
    ('s', "sidebar"),
    ('m', "menuCtr"),
    ('z', "zoom"),
    ('a', "annotate"),
    ('v', "view"),
    ('h', "highlight"),
    ('u', "undo"),
    ('r', "redo"),
    ('c', "commitAnnotations"),
    ('x', "deleteAnnotation"),
    ('f', "enterFS"),
    ('p', "print"),
    ('d', "download"),
    ('P', "panMode"),
    ('o', "pointerMode"),
];

/// Name of `key` in the command catalog's shortcut notation.
pub fn shortcut_name(key: &KeyEvent) -> Option<String> {
    let base = match key.code {
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        _ => return None,
    };
    let meta = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META);
    match (meta, key.code) {
        (true, _) => Some(format!("Meta+{base}")),
        (false, KeyCode::Char(_)) => None,
        (false, _) => Some(base),
    }
}

/// What `key` does, given whether the command menu is open.
pub fn map_key(key: &KeyEvent, commands: &CommandRegistry, menu_open: bool) -> Option<KeyAction> {
    if key.code == KeyCode::Char('q') && key.modifiers.is_empty() {
        return Some(KeyAction::Quit);
    }
    if menu_open {
        return match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(KeyAction::MenuDown),
            KeyCode::Char('k') | KeyCode::Up => Some(KeyAction::MenuUp),
            KeyCode::Enter | KeyCode::Char('l') => Some(KeyAction::MenuConfirm),
            KeyCode::Esc | KeyCode::Char('h') => Some(KeyAction::Dismiss),
            _ => None,
        };
    }

    if let Some(item) = shortcut_name(key).and_then(|name| commands.find_by_shortcut(&name)) {
        return Some(KeyAction::Command(item.id.clone()));
    }
    match key.code {
        KeyCode::Esc => Some(KeyAction::Dismiss),
        KeyCode::PageDown => Some(KeyAction::Command("nextPage".into())),
        KeyCode::PageUp => Some(KeyAction::Command("previousPage".into())),
        KeyCode::Char('/') => Some(KeyAction::BeginSearch),
        KeyCode::Char('t') => Some(KeyAction::CycleTheme),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => BINDINGS
            .iter()
            .find(|(bound, _)| *bound == c)
            .map(|(_, id)| KeyAction::Command((*id).to_string())),
        _ => None,
    }
}
