//! Input normalization and keybinding resolution

use app_core::{KeybindingsConfig, Operation};
use std::collections::{BTreeSet, HashMap};
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::{Key, ModifiersState, NamedKey as WinitKey};

/// Modifier keys, ordered the way they appear in canonical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Alt,
    Ctrl,
    Shift,
}

impl Modifier {
    pub fn name(self) -> &'static str {
        match self {
            Modifier::Alt => "alt",
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "alt" => Some(Modifier::Alt),
            "ctrl" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            _ => None,
        }
    }
}

/// Named keys the viewer binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Delete,
    Escape,
    Tab,
    Enter,
}

impl NamedKey {
    pub fn name(self) -> &'static str {
        match self {
            NamedKey::ArrowLeft => "ArrowLeft",
            NamedKey::ArrowRight => "ArrowRight",
            NamedKey::ArrowUp => "ArrowUp",
            NamedKey::ArrowDown => "ArrowDown",
            NamedKey::Delete => "Delete",
            NamedKey::Escape => "Escape",
            NamedKey::Tab => "Tab",
            NamedKey::Enter => "Enter",
        }
    }
}

/// A raw input event, before modifiers are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// A character key, as typed
    Char(String),
    Named(NamedKey),
    /// A modifier key on its own; never dispatched
    Modifier(Modifier),
    WheelUp,
    WheelDown,
    RightClick,
    MiddleClick,
}

impl RawInput {
    pub fn char(c: impl Into<String>) -> Self {
        RawInput::Char(c.into())
    }

    /// Key name before lower-casing
    pub fn key_name(&self) -> &str {
        match self {
            RawInput::Char(c) => c,
            RawInput::Named(key) => key.name(),
            RawInput::Modifier(Modifier::Alt) => "Alt",
            RawInput::Modifier(Modifier::Ctrl) => "Control",
            RawInput::Modifier(Modifier::Shift) => "Shift",
            RawInput::WheelUp => "WheelUp",
            RawInput::WheelDown => "WheelDown",
            RawInput::RightClick => "RightClick",
            RawInput::MiddleClick => "MiddleClick",
        }
    }
}

/// Build the canonical lookup key: `"ctrl,shift:t"`, or the bare key without modifiers.
///
/// Returns `None` for pure modifier events.
pub fn canonical_key(input: &RawInput, modifiers: &BTreeSet<Modifier>) -> Option<String> {
    if matches!(input, RawInput::Modifier(_)) {
        return None;
    }

    let key = input.key_name().to_lowercase();
    if modifiers.is_empty() {
        return Some(key);
    }

    let mods: Vec<&str> = modifiers.iter().map(|m| m.name()).collect();
    Some(format!("{}:{}", mods.join(","), key))
}

/// Normalize a configured key the same way input is canonicalized
fn normalize_binding(key: &str) -> String {
    let key = key.trim().to_lowercase();
    if let Some((prefix, rest)) = key.split_once(':') {
        let mods: Option<BTreeSet<Modifier>> = prefix
            .split(',')
            .map(|m| Modifier::from_name(m.trim()))
            .collect();
        if let Some(mods) = mods.filter(|m| !m.is_empty()) {
            let names: Vec<&str> = mods.iter().map(|m| m.name()).collect();
            return format!("{}:{}", names.join(","), rest);
        }
    }
    key
}

/// Canonical key -> operation for one input mode
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<String, Operation>,
}

impl Keymap {
    /// Invert an `operation id -> keys` table
    pub fn from_table(table: &HashMap<String, Vec<String>>) -> Self {
        let mut bindings = HashMap::new();

        for (id, keys) in table {
            let Ok(op) = id.parse::<Operation>() else {
                tracing::warn!("Unknown operation in keybindings: {}", id);
                continue;
            };
            for key in keys {
                if let Some(previous) = bindings.insert(normalize_binding(key), op) {
                    if previous != op {
                        tracing::warn!("Key {:?} bound to both {} and {}", key, previous, op);
                    }
                }
            }
        }

        Self { bindings }
    }

    pub fn get(&self, key: &str) -> Option<Operation> {
        self.bindings.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Two-mode dispatcher from raw input to operations
#[derive(Debug, Clone)]
pub struct InputRouter {
    view: Keymap,
    edit: Keymap,
    modifiers: BTreeSet<Modifier>,
}

impl InputRouter {
    pub fn new(bindings: &KeybindingsConfig) -> Self {
        Self {
            view: Keymap::from_table(&bindings.view),
            edit: Keymap::from_table(&bindings.edit),
            modifiers: BTreeSet::new(),
        }
    }

    pub fn down(&mut self, modifier: Modifier) {
        self.modifiers.insert(modifier);
    }

    pub fn up(&mut self, modifier: Modifier) {
        self.modifiers.remove(&modifier);
    }

    /// Forget every held modifier (e.g. when the window loses focus)
    pub fn reset(&mut self) {
        self.modifiers.clear();
    }

    /// Replace the modifier set with the one reported by the windowing system
    pub fn sync_modifiers(&mut self, state: ModifiersState) {
        self.modifiers.clear();
        if state.alt_key() {
            self.modifiers.insert(Modifier::Alt);
        }
        if state.control_key() {
            self.modifiers.insert(Modifier::Ctrl);
        }
        if state.shift_key() {
            self.modifiers.insert(Modifier::Shift);
        }
    }

    pub fn modifiers(&self) -> &BTreeSet<Modifier> {
        &self.modifiers
    }

    pub fn canonical_key(&self, input: &RawInput) -> Option<String> {
        canonical_key(input, &self.modifiers)
    }

    /// Resolve `input` against the keymap of the active mode.
    ///
    /// Modifier presses update the modifier set and never dispatch. While
    /// `gated` nothing is dispatched but modifiers are still tracked.
    pub fn resolve(&mut self, input: &RawInput, edit_mode: bool, gated: bool) -> Option<Operation> {
        if let RawInput::Modifier(modifier) = input {
            self.down(*modifier);
            return None;
        }

        let key = self.canonical_key(input)?;
        if gated {
            tracing::debug!("Input suppressed while a dialog is open: {}", key);
            return None;
        }

        let keymap = if edit_mode { &self.edit } else { &self.view };
        let op = keymap.get(&key);
        tracing::debug!("Key {} -> {:?}", key, op);
        op
    }

    /// Handle the release of `input`; only modifier releases matter
    pub fn release(&mut self, input: &RawInput) {
        if let RawInput::Modifier(modifier) = input {
            self.up(*modifier);
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(&KeybindingsConfig::default())
    }
}

// ===== winit translation =====

/// Translate a winit logical key
pub fn translate_key(key: &Key) -> Option<RawInput> {
    match key {
        Key::Character(c) => Some(RawInput::Char(c.to_string())),
        Key::Named(named) => match named {
            WinitKey::ArrowLeft => Some(RawInput::Named(NamedKey::ArrowLeft)),
            WinitKey::ArrowRight => Some(RawInput::Named(NamedKey::ArrowRight)),
            WinitKey::ArrowUp => Some(RawInput::Named(NamedKey::ArrowUp)),
            WinitKey::ArrowDown => Some(RawInput::Named(NamedKey::ArrowDown)),
            WinitKey::Delete => Some(RawInput::Named(NamedKey::Delete)),
            WinitKey::Escape => Some(RawInput::Named(NamedKey::Escape)),
            WinitKey::Tab => Some(RawInput::Named(NamedKey::Tab)),
            WinitKey::Enter => Some(RawInput::Named(NamedKey::Enter)),
            WinitKey::Space => Some(RawInput::Char(" ".to_string())),
            WinitKey::Control => Some(RawInput::Modifier(Modifier::Ctrl)),
            WinitKey::Shift => Some(RawInput::Modifier(Modifier::Shift)),
            WinitKey::Alt => Some(RawInput::Modifier(Modifier::Alt)),
            _ => None,
        },
        _ => None,
    }
}

/// Translate a mouse button press into a pseudo-key
pub fn translate_mouse_button(button: MouseButton) -> Option<RawInput> {
    match button {
        MouseButton::Right => Some(RawInput::RightClick),
        MouseButton::Middle => Some(RawInput::MiddleClick),
        _ => None,
    }
}

/// Translate a wheel movement into a pseudo-key
pub fn translate_wheel(delta: MouseScrollDelta) -> Option<RawInput> {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(pos) => pos.y,
    };

    if y > 0.0 {
        Some(RawInput::WheelUp)
    } else if y < 0.0 {
        Some(RawInput::WheelDown)
    } else {
        None
    }
}
