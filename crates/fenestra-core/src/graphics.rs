//! Viewport/scissor contract between the widget compositor and a rendering backend.
//!
//! The compositor only ever configures where a widget may draw. Drawing itself happens inside a
//! widget's paint hook, which reaches the concrete backend through
//! `<dyn GraphicsContext>::downcast_mut`.

use std::any::Any;

use crate::geometry::{Rect, Size};

/// Immediate-mode drawing surface shared by every widget of one native view.
///
/// Rectangles are in surface pixels with a bottom-left origin, the convention of OpenGL-style
/// contexts. Viewport state is global and not stacked, so the compositor resets it before every
/// widget paint.
pub trait GraphicsContext: Any {
    /// Called once per expose before any widget paints.
    #[allow(unused_variables)]
    fn begin_frame(&mut self, size: Size<u32>) {}

    fn set_viewport(&mut self, viewport: Rect<i32>);

    /// Enables scissoring to `scissor`.
    fn set_scissor(&mut self, scissor: Rect<i32>);

    fn disable_scissor(&mut self);
}

impl dyn GraphicsContext {
    pub fn downcast_mut<T: GraphicsContext>(&mut self) -> Option<&mut T> {
        (self as &mut (dyn Any + 'static)).downcast_mut::<T>()
    }
}

/// Context for views without a rendering backend; it only traces what it is asked to do.
#[derive(Debug, Default)]
pub struct StubGraphics {
    frames: u64,
}

impl StubGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl GraphicsContext for StubGraphics {
    fn begin_frame(&mut self, size: Size<u32>) {
        self.frames += 1;
        tracing::trace!(width = size.width, height = size.height, "begin frame");
    }

    fn set_viewport(&mut self, viewport: Rect<i32>) {
        tracing::trace!(?viewport, "set viewport");
    }

    fn set_scissor(&mut self, scissor: Rect<i32>) {
        tracing::trace!(?scissor, "set scissor");
    }

    fn disable_scissor(&mut self) {
        tracing::trace!("disable scissor");
    }
}
