//! Native view contract.
//!
//! A [`Platform`] creates native views, reports their events and exposes the per-view
//! [`GraphicsContext`]. It is the only place where OS specifics live; everything above it works
//! with [`ViewHandle`]s and [`NativeEvent`]s in physical pixels.

use std::time::Duration;

use crate::{
    geometry::{Rect, Size},
    graphics::GraphicsContext,
    input::{CrossingMode, Key, Modifiers, MouseButton, MouseCursor, ScrollDirection},
    math::IVec2,
};

/// Platform-assigned identifier of a native view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(u64);

impl ViewHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// OS window handle (`HWND`, `NSView*`, X11 `Window`) as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub usize);

#[derive(Debug, Clone)]
pub struct ViewDescriptor {
    pub title: String,
    pub size: Size<u32>,
    pub resizable: bool,
    pub ignore_key_repeat: bool,
    /// Host view to embed into.
    pub parent: Option<NativeHandle>,
    /// View this one should stay above, for modal windows.
    pub transient_for: Option<ViewHandle>,
}

/// Area a redraw request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Damage {
    Full,
    Areas(Vec<Rect<u32>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeKey {
    pub press: bool,
    pub key: Key,
    pub keycode: u32,
    pub mods: Modifiers,
    pub time: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeText {
    pub keycode: u32,
    pub character: char,
    pub string: String,
    pub mods: Modifiers,
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeButton {
    pub press: bool,
    pub button: MouseButton,
    pub x: f64,
    pub y: f64,
    pub mods: Modifiers,
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeMotion {
    pub x: f64,
    pub y: f64,
    pub mods: Modifiers,
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeScroll {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub direction: ScrollDirection,
    pub mods: Modifiers,
    pub time: u32,
}

/// Event reported by a native view, coordinates in physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Configure { width: f64, height: f64 },
    Expose,
    Close,
    Focus { focused: bool, mode: CrossingMode },
    Key(NativeKey),
    Text(NativeText),
    Button(NativeButton),
    Motion(NativeMotion),
    Scroll(NativeScroll),
    ScaleFactorChanged(f64),
    Timer { id: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("failed to create native view: {0}")]
    ViewCreation(String),
    #[error("unknown view {0:?}")]
    UnknownView(ViewHandle),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("event loop error: {0}")]
    EventLoop(String),
}

/// Native windowing backend.
///
/// Methods taking an unknown view return an error, `None` or `false`; they never panic.
pub trait Platform {
    /// Application class name used by some window managers.
    #[allow(unused_variables)]
    fn set_class_name(&mut self, name: &str) {}

    fn create_view(&mut self, descriptor: &ViewDescriptor) -> Result<ViewHandle, PlatformError>;

    fn destroy_view(&mut self, view: ViewHandle);

    fn show(&mut self, view: ViewHandle) -> Result<(), PlatformError>;

    fn hide(&mut self, view: ViewHandle) -> Result<(), PlatformError>;

    fn size(&self, view: ViewHandle) -> Option<Size<u32>>;

    fn set_size(&mut self, view: ViewHandle, size: Size<u32>) -> Result<(), PlatformError>;

    fn set_geometry_constraints(
        &mut self,
        view: ViewHandle,
        min_size: Size<u32>,
        keep_aspect_ratio: bool,
    ) -> Result<(), PlatformError>;

    fn set_resizable(&mut self, view: ViewHandle, resizable: bool) -> Result<(), PlatformError>;

    fn set_title(&mut self, view: ViewHandle, title: &str) -> Result<(), PlatformError>;

    fn offset(&self, view: ViewHandle) -> Option<IVec2>;

    fn set_offset(&mut self, view: ViewHandle, offset: IVec2) -> Result<(), PlatformError>;

    fn raise(&mut self, view: ViewHandle);

    fn grab_focus(&mut self, view: ViewHandle);

    /// Asks for an [`NativeEvent::Expose`] on a later [`update`](Platform::update).
    fn post_redisplay(&mut self, view: ViewHandle, damage: &Damage);

    fn desktop_scale_factor(&self, view: ViewHandle) -> Option<f64>;

    fn native_handle(&self, view: ViewHandle) -> Option<NativeHandle>;

    fn set_clipboard(&mut self, view: ViewHandle, mime_type: &str, data: &[u8]) -> bool;

    fn clipboard(&mut self, view: ViewHandle) -> Option<ClipboardData>;

    fn set_cursor(&mut self, view: ViewHandle, cursor: MouseCursor) -> bool;

    /// Starts a repeating timer reported as [`NativeEvent::Timer`] with the same `id`.
    fn start_timer(&mut self, view: ViewHandle, id: u64, interval: Duration) -> bool;

    fn stop_timer(&mut self, view: ViewHandle, id: u64) -> bool;

    #[allow(unused_variables)]
    fn set_ignore_key_repeat(&mut self, view: ViewHandle, ignore: bool) {}

    /// Polls native events, blocking for at most `timeout`. A zero timeout never blocks.
    fn update(&mut self, timeout: Duration) -> Vec<(ViewHandle, NativeEvent)>;

    fn graphics(&mut self, view: ViewHandle) -> Option<&mut (dyn GraphicsContext + 'static)>;
}
