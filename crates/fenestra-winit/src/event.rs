//! Translation of winit window events into [`NativeEvent`]s.
//!
//! Events are collected into an [`EventQueue`] while the event loop is pumped and handed to the
//! application in one batch per [`update`](fenestra_core::platform::Platform::update).

use std::collections::VecDeque;

use fenestra_core::{
    input::{CrossingMode, Key, Modifiers, MouseButton, MouseCursor, NamedKey, ScrollDirection},
    math::DVec2,
    platform::{NativeButton, NativeEvent, NativeKey, NativeMotion, NativeScroll, NativeText, ViewHandle},
};
use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{self, KeyLocation, ModifiersState, PhysicalKey},
    window::CursorIcon,
};

/// Pixels of a touchpad scroll that count as one wheel notch.
pub const PIXELS_PER_LINE: f64 = 20.0;

/// Event queue with batching and deduplication.
///
/// Pointer motion and scale factor changes only keep their latest value per view, and so do
/// exposes. A pending motion is flushed before any other input of the same view so button
/// presses still see the pointer where it was.
#[derive(Debug, Default)]
pub struct EventQueue {
    /// Close, configure and focus changes
    priority: VecDeque<(ViewHandle, NativeEvent)>,
    pending: VecDeque<(ViewHandle, NativeEvent)>,
    latest_motion: Vec<(ViewHandle, NativeMotion)>,
    latest_scale_factor: Vec<(ViewHandle, f64)>,
    exposes: Vec<ViewHandle>,
    stats: EventStats,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EventStats {
    pub events_received: usize,
    pub events_processed: usize,
    pub events_dropped: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, view: ViewHandle, event: NativeEvent) {
        self.stats.events_received += 1;

        match event {
            NativeEvent::Close | NativeEvent::Configure { .. } | NativeEvent::Focus { .. } => {
                self.priority.push_back((view, event));
            }
            NativeEvent::Motion(motion) => replace_or_push(&mut self.latest_motion, view, motion),
            NativeEvent::ScaleFactorChanged(factor) => {
                replace_or_push(&mut self.latest_scale_factor, view, factor)
            }
            NativeEvent::Expose => {
                if !self.exposes.contains(&view) {
                    self.exposes.push(view);
                }
            }
            event => {
                self.flush_motion(view);
                self.pending.push_back((view, event));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_empty()
            && self.pending.is_empty()
            && self.latest_motion.is_empty()
            && self.latest_scale_factor.is_empty()
            && self.exposes.is_empty()
    }

    /// Removes everything queued for `view`.
    pub fn forget(&mut self, view: ViewHandle) {
        self.priority.retain(|(v, _)| *v != view);
        self.pending.retain(|(v, _)| *v != view);
        self.latest_motion.retain(|(v, _)| *v != view);
        self.latest_scale_factor.retain(|(v, _)| *v != view);
        self.exposes.retain(|v| *v != view);
    }

    /// Returns the batch: scale factors, priority events, input, then exposes.
    pub fn drain(&mut self) -> Vec<(ViewHandle, NativeEvent)> {
        let mut events = Vec::with_capacity(
            self.latest_scale_factor.len()
                + self.priority.len()
                + self.pending.len()
                + self.latest_motion.len()
                + self.exposes.len(),
        );

        events.extend(
            self.latest_scale_factor
                .drain(..)
                .map(|(view, factor)| (view, NativeEvent::ScaleFactorChanged(factor))),
        );
        events.extend(self.priority.drain(..));
        events.extend(self.pending.drain(..));
        events.extend(
            self.latest_motion
                .drain(..)
                .map(|(view, motion)| (view, NativeEvent::Motion(motion))),
        );
        events.extend(self.exposes.drain(..).map(|view| (view, NativeEvent::Expose)));

        self.stats.events_processed += events.len();
        self.stats.events_dropped = self.stats.events_received - self.stats.events_processed;
        events
    }

    pub fn stats(&self) -> &EventStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EventStats::default();
    }

    fn flush_motion(&mut self, view: ViewHandle) {
        if let Some(index) = self.latest_motion.iter().position(|(v, _)| *v == view) {
            let (view, motion) = self.latest_motion.remove(index);
            self.pending.push_back((view, NativeEvent::Motion(motion)));
        }
    }
}

fn replace_or_push<T>(slots: &mut Vec<(ViewHandle, T)>, view: ViewHandle, value: T) {
    match slots.iter_mut().find(|(v, _)| *v == view) {
        Some(slot) => slot.1 = value,
        None => slots.push((view, value)),
    }
}

/// Per-view input state winit does not repeat on every event.
#[derive(Debug, Default, Clone)]
pub struct ViewInput {
    pub(crate) cursor: DVec2,
    pub(crate) mods: Modifiers,
    pub ignore_key_repeat: bool,
}

impl ViewInput {
    pub fn cursor(&self) -> DVec2 {
        self.cursor
    }

    pub fn modifiers(&self) -> Modifiers {
        self.mods
    }

    /// Translates one window event, queueing whatever it produces for `view`.
    ///
    /// `time` is a millisecond timestamp; winit does not report one itself.
    pub fn translate(
        &mut self,
        view: ViewHandle,
        event: WindowEvent,
        time: u32,
        queue: &mut EventQueue,
    ) {
        match event {
            WindowEvent::Resized(size) => {
                // minimized windows report a zero size on some platforms
                if size.width > 0 && size.height > 0 {
                    queue.push(
                        view,
                        NativeEvent::Configure {
                            width: size.width as f64,
                            height: size.height as f64,
                        },
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                queue.push(view, NativeEvent::ScaleFactorChanged(scale_factor));
            }
            WindowEvent::RedrawRequested => queue.push(view, NativeEvent::Expose),
            WindowEvent::CloseRequested => queue.push(view, NativeEvent::Close),
            WindowEvent::Focused(focused) => queue.push(
                view,
                NativeEvent::Focus {
                    focused,
                    mode: CrossingMode::Normal,
                },
            ),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.mods = convert_modifiers(modifiers.state());
            }
            WindowEvent::KeyboardInput { event, .. } => self.key_event(view, &event, time, queue),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = DVec2::new(position.x, position.y);
                queue.push(
                    view,
                    NativeEvent::Motion(NativeMotion {
                        x: position.x,
                        y: position.y,
                        mods: self.mods,
                        time,
                    }),
                );
            }
            WindowEvent::MouseInput { state, button, .. } => queue.push(
                view,
                NativeEvent::Button(NativeButton {
                    press: state == ElementState::Pressed,
                    button: convert_button(button),
                    x: self.cursor.x,
                    y: self.cursor.y,
                    mods: self.mods,
                    time,
                }),
            ),
            WindowEvent::MouseWheel { delta, .. } => {
                let (delta, direction) = convert_scroll(delta);
                queue.push(
                    view,
                    NativeEvent::Scroll(NativeScroll {
                        x: self.cursor.x,
                        y: self.cursor.y,
                        dx: delta.x,
                        dy: delta.y,
                        direction,
                        mods: self.mods,
                        time,
                    }),
                );
            }
            WindowEvent::CursorEntered { .. }
            | WindowEvent::CursorLeft { .. }
            | WindowEvent::Moved(_)
            | WindowEvent::Occluded(_)
            | WindowEvent::Destroyed
            | WindowEvent::TouchpadPressure { .. } => {}
            unknown => tracing::trace!("unhandled window event: {:?}", unknown),
        }
    }

    fn key_event(&mut self, view: ViewHandle, event: &KeyEvent, time: u32, queue: &mut EventQueue) {
        if event.repeat && self.ignore_key_repeat {
            return;
        }
        let press = event.state == ElementState::Pressed;
        let keycode = keycode(event.physical_key);

        queue.push(
            view,
            NativeEvent::Key(NativeKey {
                press,
                key: convert_key(&event.logical_key, event.location),
                keycode,
                mods: self.mods,
                time,
            }),
        );

        if !press {
            return;
        }
        let Some(text) = event.text.as_deref() else {
            return;
        };
        if let Some(character) = text.chars().next() {
            queue.push(
                view,
                NativeEvent::Text(NativeText {
                    keycode,
                    character,
                    string: text.to_owned(),
                    mods: self.mods,
                    time,
                }),
            );
        }
    }
}

#[cfg(any(windows, all(unix, not(any(target_os = "ios", target_os = "android")))))]
fn keycode(key: PhysicalKey) -> u32 {
    use winit::platform::scancode::PhysicalKeyExtScancode;
    key.to_scancode().unwrap_or(0)
}

#[cfg(not(any(windows, all(unix, not(any(target_os = "ios", target_os = "android"))))))]
fn keycode(_key: PhysicalKey) -> u32 {
    0
}

pub fn convert_modifiers(state: ModifiersState) -> Modifiers {
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, state.shift_key());
    mods.set(Modifiers::CONTROL, state.control_key());
    mods.set(Modifiers::ALT, state.alt_key());
    mods.set(Modifiers::SUPER, state.super_key());
    mods
}

pub fn convert_button(button: winit::event::MouseButton) -> MouseButton {
    use winit::event::MouseButton as Winit;
    match button {
        Winit::Left => MouseButton::Left,
        Winit::Middle => MouseButton::Middle,
        Winit::Right => MouseButton::Right,
        Winit::Back => MouseButton::Back,
        Winit::Forward => MouseButton::Forward,
        Winit::Other(n) => MouseButton::Other(n),
    }
}

/// Returns the delta in wheel notches and the direction of a single-axis notch.
///
/// Positive deltas scroll up and left, matching winit's "content moves right and down".
pub fn convert_scroll(delta: MouseScrollDelta) -> (DVec2, ScrollDirection) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            let direction = if x == 0.0 && y > 0.0 {
                ScrollDirection::Up
            } else if x == 0.0 && y < 0.0 {
                ScrollDirection::Down
            } else if y == 0.0 && x > 0.0 {
                ScrollDirection::Left
            } else if y == 0.0 && x < 0.0 {
                ScrollDirection::Right
            } else {
                ScrollDirection::Smooth
            };
            (DVec2::new(x as f64, y as f64), direction)
        }
        MouseScrollDelta::PixelDelta(pos) => (
            DVec2::new(pos.x, pos.y) / PIXELS_PER_LINE,
            ScrollDirection::Smooth,
        ),
    }
}

pub fn convert_key(key: &keyboard::Key, location: KeyLocation) -> Key {
    use keyboard::NamedKey as W;

    let named = match key {
        keyboard::Key::Character(text) => {
            return text.chars().next().map_or(Key::Unidentified, Key::Character);
        }
        keyboard::Key::Named(named) => named,
        keyboard::Key::Dead(Some(c)) => return Key::Character(*c),
        _ => return Key::Unidentified,
    };
    let right = location == KeyLocation::Right;

    let key = match named {
        W::Backspace => NamedKey::Backspace,
        W::Tab => NamedKey::Tab,
        W::Enter => NamedKey::Enter,
        W::Escape => NamedKey::Escape,
        W::Delete => NamedKey::Delete,
        W::Space => NamedKey::Space,
        W::F1 => NamedKey::F1,
        W::F2 => NamedKey::F2,
        W::F3 => NamedKey::F3,
        W::F4 => NamedKey::F4,
        W::F5 => NamedKey::F5,
        W::F6 => NamedKey::F6,
        W::F7 => NamedKey::F7,
        W::F8 => NamedKey::F8,
        W::F9 => NamedKey::F9,
        W::F10 => NamedKey::F10,
        W::F11 => NamedKey::F11,
        W::F12 => NamedKey::F12,
        W::ArrowLeft => NamedKey::Left,
        W::ArrowUp => NamedKey::Up,
        W::ArrowRight => NamedKey::Right,
        W::ArrowDown => NamedKey::Down,
        W::PageUp => NamedKey::PageUp,
        W::PageDown => NamedKey::PageDown,
        W::Home => NamedKey::Home,
        W::End => NamedKey::End,
        W::Insert => NamedKey::Insert,
        W::Shift if right => NamedKey::ShiftRight,
        W::Shift => NamedKey::ShiftLeft,
        W::Control if right => NamedKey::ControlRight,
        W::Control => NamedKey::ControlLeft,
        W::Alt if right => NamedKey::AltRight,
        W::Alt => NamedKey::AltLeft,
        W::Super | W::Meta if right => NamedKey::SuperRight,
        W::Super | W::Meta => NamedKey::SuperLeft,
        W::ContextMenu => NamedKey::Menu,
        W::CapsLock => NamedKey::CapsLock,
        W::ScrollLock => NamedKey::ScrollLock,
        W::NumLock => NamedKey::NumLock,
        W::PrintScreen => NamedKey::PrintScreen,
        W::Pause => NamedKey::Pause,
        _ => return Key::Unidentified,
    };
    Key::Named(key)
}

pub fn convert_cursor(cursor: MouseCursor) -> CursorIcon {
    match cursor {
        MouseCursor::Arrow => CursorIcon::Default,
        MouseCursor::Caret => CursorIcon::Text,
        MouseCursor::Crosshair => CursorIcon::Crosshair,
        MouseCursor::Hand => CursorIcon::Pointer,
        MouseCursor::NotAllowed => CursorIcon::NotAllowed,
        MouseCursor::LeftRightResize => CursorIcon::EwResize,
        MouseCursor::UpDownResize => CursorIcon::NsResize,
        MouseCursor::DiagonalResize => CursorIcon::NwseResize,
        MouseCursor::AntiDiagonalResize => CursorIcon::NeswResize,
    }
}
