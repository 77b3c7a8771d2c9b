//! Input primitives shared by native events and widget events.

bitflags::bitflags! {
    /// Keyboard modifiers held while an event was generated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
        const NUM_LOCK = 1 << 4;
        const SCROLL_LOCK = 1 << 5;
        const CAPS_LOCK = 1 << 6;
    }
}

/// Keys that do not produce a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Backspace,
    Tab,
    Enter,
    Escape,
    Delete,
    Space,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Left,
    Up,
    Right,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    SuperLeft,
    SuperRight,
    Menu,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Character(char),
    Named(NamedKey),
    /// A key the platform reported but that has no portable name.
    Unidentified,
}

impl Key {
    /// Lowercases ASCII letters, returning whether the key was uppercase.
    pub fn to_lowercase(self) -> (Key, bool) {
        match self {
            Key::Character(c) if c.is_ascii_uppercase() => {
                (Key::Character(c.to_ascii_lowercase()), true)
            }
            other => (other, false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Conventional button number: 1 left, 2 middle, 3 right.
    pub fn number(self) -> u32 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::Back => 8,
            MouseButton::Forward => 9,
            MouseButton::Other(n) => n as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    /// Continuous scrolling, see the event delta.
    #[default]
    Smooth,
}

/// Why a view gained or lost focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrossingMode {
    #[default]
    Normal,
    Grab,
    Ungrab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseCursor {
    #[default]
    Arrow,
    Caret,
    Crosshair,
    Hand,
    NotAllowed,
    LeftRightResize,
    UpDownResize,
    DiagonalResize,
    AntiDiagonalResize,
}
