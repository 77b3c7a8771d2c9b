//! Recording implementation of `GraphicsContext`.

use std::sync::Arc;

use fenestra_core::{
    geometry::{Rect, Size},
    graphics::GraphicsContext,
};
use parking_lot::Mutex;

/// Records a graphics state change for verification in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsCall {
    BeginFrame(Size<u32>),
    SetViewport(Rect<i32>),
    SetScissor(Rect<i32>),
    DisableScissor,
    /// Emitted by test widgets from their paint hook.
    Mark(String),
}

/// Graphics context that records calls instead of drawing.
///
/// Clones share the same log, so a test can keep one clone while the platform owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingGraphics {
    calls: Arc<Mutex<Vec<GraphicsCall>>>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<GraphicsCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Appends a marker, typically the name of the widget being painted.
    pub fn mark(&self, label: impl Into<String>) {
        self.calls.lock().push(GraphicsCall::Mark(label.into()));
    }

    /// Labels of all markers in paint order.
    pub fn marks(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                GraphicsCall::Mark(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn viewports(&self) -> Vec<Rect<i32>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                GraphicsCall::SetViewport(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn scissors(&self) -> Vec<Rect<i32>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                GraphicsCall::SetScissor(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn count_frames(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, GraphicsCall::BeginFrame(_)))
            .count()
    }

    pub fn count_scissor_disables(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, GraphicsCall::DisableScissor))
            .count()
    }

    /// Calls recorded between the viewport set right before marker `label` and the next marker.
    pub fn calls_around(&self, label: &str) -> Vec<GraphicsCall> {
        let calls = self.calls.lock();
        let Some(mark) = calls
            .iter()
            .position(|call| matches!(call, GraphicsCall::Mark(l) if l == label))
        else {
            return Vec::new();
        };
        let start = calls[..mark]
            .iter()
            .rposition(|call| matches!(call, GraphicsCall::SetViewport(_)))
            .unwrap_or(mark);
        let end = calls[mark + 1..]
            .iter()
            .position(|call| {
                matches!(
                    call,
                    GraphicsCall::Mark(_) | GraphicsCall::SetViewport(_) | GraphicsCall::BeginFrame(_)
                )
            })
            .map_or(calls.len(), |offset| mark + 1 + offset);
        calls[start..end].to_vec()
    }
}

impl GraphicsContext for RecordingGraphics {
    fn begin_frame(&mut self, size: Size<u32>) {
        self.calls.lock().push(GraphicsCall::BeginFrame(size));
    }

    fn set_viewport(&mut self, viewport: Rect<i32>) {
        self.calls.lock().push(GraphicsCall::SetViewport(viewport));
    }

    fn set_scissor(&mut self, scissor: Rect<i32>) {
        self.calls.lock().push(GraphicsCall::SetScissor(scissor));
    }

    fn disable_scissor(&mut self) {
        self.calls.lock().push(GraphicsCall::DisableScissor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let observer = RecordingGraphics::new();
        let mut context = observer.clone();
        context.set_viewport(Rect::new(0, 0, 10, 10));
        context.set_scissor(Rect::new(1, 1, 2, 2));
        observer.mark("w");
        context.disable_scissor();

        assert_eq!(observer.viewports(), vec![Rect::new(0, 0, 10, 10)]);
        assert_eq!(
            observer.calls_around("w"),
            vec![
                GraphicsCall::SetViewport(Rect::new(0, 0, 10, 10)),
                GraphicsCall::SetScissor(Rect::new(1, 1, 2, 2)),
                GraphicsCall::Mark("w".into()),
                GraphicsCall::DisableScissor,
            ]
        );
    }
}
