//! Key name table for `Keys`-mode identifiers (spec §4.2), mirroring the
//! `GoofyTokenKey` enumeration in the Ducky-Script engine this crate's
//! specification was distilled from (`original_source/.../goofy_token.h`).

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    Ctrl,
    RCtrl,
    Alt,
    RAlt,
    Shift,
    RShift,
    Gui,
    RGui,
    Ins,
    Del,
    Backspace,
    Esc,
    Pause,
    Menu,
    ScrollLock,
    Tab,
    Space,
    Enter,
    PrintScreen,
    CapsLock,
    NumLock,
    Home,
    End,
    PageUp,
    PageDown,
    Numpad(u8),
    F(u8),
    /// A single alphanumeric character key, e.g. the `a` in `hold ctrl a`.
    Char(u8),
}

/// Bitmask of held modifier keys, composed with bitwise OR at call sites
/// (spec §9 flags a bug in the source that used AND here; this crate uses
/// OR as the specification requires).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const CTRL: Modifiers = Modifiers(1 << 0);
    pub const SHIFT: Modifiers = Modifiers(1 << 1);
    pub const ALT: Modifiers = Modifiers(1 << 2);
    pub const GUI: Modifiers = Modifiers(1 << 3);

    pub fn or(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub fn from_key(key: Key) -> Option<Modifiers> {
        match key {
            Key::Ctrl | Key::RCtrl => Some(Modifiers::CTRL),
            Key::Shift | Key::RShift => Some(Modifiers::SHIFT),
            Key::Alt | Key::RAlt => Some(Modifiers::ALT),
            Key::Gui | Key::RGui => Some(Modifiers::GUI),
            _ => None,
        }
    }
}

static KEY_NAMES: Lazy<HashMap<&'static str, Key>> = Lazy::new(|| {
    use Key::*;
    let mut m = HashMap::new();
    for (names, key) in [
        (&["up", "uparrow"][..], UpArrow),
        (&["down", "downarrow"][..], DownArrow),
        (&["left", "leftarrow"][..], LeftArrow),
        (&["right", "rightarrow"][..], RightArrow),
        (&["ctrl", "lctrl", "control"][..], Ctrl),
        (&["rctrl"][..], RCtrl),
        (&["alt", "lalt", "option"][..], Alt),
        (&["ralt"][..], RAlt),
        (&["shift", "lshift"][..], Shift),
        (&["rshift"][..], RShift),
        (&["gui", "windows", "command", "lgui"][..], Gui),
        (&["rgui"][..], RGui),
        (&["ins", "insert"][..], Ins),
        (&["del", "delete"][..], Del),
        (&["back", "backspace"][..], Backspace),
        (&["esc", "escape"][..], Esc),
        (&["pause", "break"][..], Pause),
        (&["menu", "app"][..], Menu),
        (&["scrolllock", "scrollock"][..], ScrollLock),
        (&["tab"][..], Tab),
        (&["space"][..], Space),
        (&["enter"][..], Enter),
        (&["printscreen"][..], PrintScreen),
        (&["capslock"][..], CapsLock),
        (&["numlock"][..], NumLock),
        (&["home"][..], Home),
        (&["end"][..], End),
        (&["pageup"][..], PageUp),
        (&["pagedown"][..], PageDown),
    ] {
        for name in names {
            m.insert(*name, key);
        }
    }
    for n in 0..=9u8 {
        let fixed: &'static str =
            Box::leak(format!("numpad{n}").into_boxed_str());
        let short: &'static str = Box::leak(format!("np{n}").into_boxed_str());
        m.insert(fixed, Numpad(n));
        m.insert(short, Numpad(n));
    }
    for n in 1..=12u8 {
        let name: &'static str = Box::leak(format!("f{n}").into_boxed_str());
        m.insert(name, F(n));
    }
    m
});

/// Look up a `Keys`-mode identifier, case-insensitively. A bare single
/// alphanumeric character that isn't a known name falls back to
/// `Key::Char`, matching spec §4.2's "single alphanumeric character in Keys
/// mode binds to a generic character-key marker".
pub fn lookup_key(ident: &str) -> Option<Key> {
    let lower = ident.to_ascii_lowercase();
    if let Some(key) = KEY_NAMES.get(lower.as_str()) {
        return Some(*key);
    }
    let mut chars = ident.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(Key::Char(c as u8));
        }
    }
    None
}
