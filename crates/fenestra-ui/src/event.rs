//! Events delivered to widgets.
//!
//! Pointer events carry two positions: `pos`, local to the widget receiving the event, and
//! `absolute_pos`, in the coordinate space of the window (or of the nearest viewport-scaled
//! ancestor). Keyboard events carry no position at all.

use fenestra_core::{
    geometry::Size,
    math::{DVec2, IVec2},
};

pub use fenestra_core::input::{
    CrossingMode, Key, Modifiers, MouseButton, MouseCursor, NamedKey, ScrollDirection,
};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u32 {
        /// Generated by the toolkit rather than the OS.
        const SYNTHETIC = 1 << 0;
        /// Motion hint, the position may be stale.
        const HINT = 1 << 1;
    }
}

/// Fields shared by every input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaseEvent {
    pub mods: Modifiers,
    pub flags: EventFlags,
    /// Milliseconds, only meaningful relative to other events.
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardEvent {
    pub base: BaseEvent,
    pub press: bool,
    pub key: Key,
    /// Platform scancode.
    pub keycode: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterInputEvent {
    pub base: BaseEvent,
    pub keycode: u32,
    pub character: char,
    /// UTF-8 text produced by the key press, may hold more than one character.
    pub string: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub base: BaseEvent,
    pub button: MouseButton,
    pub press: bool,
    pub pos: DVec2,
    pub absolute_pos: DVec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionEvent {
    pub base: BaseEvent,
    pub pos: DVec2,
    pub absolute_pos: DVec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollEvent {
    pub base: BaseEvent,
    pub pos: DVec2,
    pub absolute_pos: DVec2,
    pub delta: DVec2,
    pub direction: ScrollDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub size: Size<u32>,
    pub old_size: Size<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChangedEvent {
    pub pos: IVec2,
    pub old_pos: IVec2,
}

/// Events that are routed by position.
pub trait PointerEvent: Clone {
    fn pos(&self) -> DVec2;
    fn set_pos(&mut self, pos: DVec2);
    fn absolute_pos(&self) -> DVec2;
    fn set_absolute_pos(&mut self, pos: DVec2);
}

macro_rules! impl_pointer_event {
    ($($ty:ty),*) => {
        $(
            impl PointerEvent for $ty {
                fn pos(&self) -> DVec2 {
                    self.pos
                }

                fn set_pos(&mut self, pos: DVec2) {
                    self.pos = pos;
                }

                fn absolute_pos(&self) -> DVec2 {
                    self.absolute_pos
                }

                fn set_absolute_pos(&mut self, pos: DVec2) {
                    self.absolute_pos = pos;
                }
            }
        )*
    };
}

impl_pointer_event!(MouseEvent, MotionEvent, ScrollEvent);

impl MouseEvent {
    /// A button event at window position `pos`.
    pub fn new(button: MouseButton, press: bool, pos: DVec2) -> Self {
        Self {
            base: BaseEvent::default(),
            button,
            press,
            pos,
            absolute_pos: pos,
        }
    }
}

impl MotionEvent {
    pub fn new(pos: DVec2) -> Self {
        Self {
            base: BaseEvent::default(),
            pos,
            absolute_pos: pos,
        }
    }
}

impl ScrollEvent {
    pub fn new(pos: DVec2, delta: DVec2, direction: ScrollDirection) -> Self {
        Self {
            base: BaseEvent::default(),
            pos,
            absolute_pos: pos,
            delta,
            direction,
        }
    }
}

impl KeyboardEvent {
    pub fn new(key: Key, press: bool) -> Self {
        Self {
            base: BaseEvent::default(),
            press,
            key,
            keycode: 0,
        }
    }
}
