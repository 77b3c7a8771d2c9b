use std::any::Any;

use fenestra_core::{geometry::Size, math::IVec2};

use super::{
    Notification, SubWidgetFlags, WidgetBehavior, WidgetId, WidgetKind, WidgetNode, WidgetRef,
};
use crate::{
    application::Application,
    dispatch,
    event::{PositionChangedEvent, ResizeEvent},
};

/// Mutable access to a widget.
///
/// Setters that change observable state are no-ops when the value does not change. Otherwise
/// they run the matching hook (if any) and request a repaint of the widget's area.
pub struct WidgetMut<'a> {
    pub(crate) app: &'a mut Application,
    pub(crate) id: WidgetId,
}

impl<'a> WidgetMut<'a> {
    pub fn handle(&self) -> WidgetId {
        self.id
    }

    pub fn as_ref(&self) -> Option<WidgetRef<'_>> {
        self.app.widget(self.id)
    }

    pub fn app(&mut self) -> &mut Application {
        self.app
    }

    fn node(&self) -> Option<&WidgetNode> {
        self.app.widgets.node(self.id)
    }

    fn node_mut(&mut self) -> Option<&mut WidgetNode> {
        self.app.widgets.node_mut(self.id)
    }

    /// The widget's behavior, unless one of its own hooks is running.
    pub fn behavior_mut<T: WidgetBehavior>(&mut self) -> Option<&mut T> {
        let behavior: &mut (dyn WidgetBehavior + 'static) =
            self.node_mut()?.behavior.as_deref_mut()?;
        (behavior as &mut (dyn Any + 'static)).downcast_mut::<T>()
    }

    pub fn set_visible(&mut self, visible: bool) {
        let Some(node) = self.node_mut() else {
            return;
        };
        if node.visible == visible {
            return;
        }
        node.visible = visible;
        tracing::debug!(widget = ?self.id, visible, "widget visibility changed");
        self.request_repaint();
    }

    pub fn show(&mut self) {
        self.set_visible(true);
    }

    pub fn hide(&mut self) {
        self.set_visible(false);
    }

    pub fn set_width(&mut self, width: u32) {
        let height = self.node().map_or(0, |node| node.size.height);
        self.set_size(width, height);
    }

    pub fn set_height(&mut self, height: u32) {
        let width = self.node().map_or(0, |node| node.size.width);
        self.set_size(width, height);
    }

    /// Resizes the widget; on a top-level widget this resizes its window instead.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let Some(node) = self.node() else {
            return;
        };
        if let WidgetKind::TopLevel { window } = node.kind {
            if let Some(mut window) = self.app.window_mut(window) {
                window.set_size(width, height);
            }
            return;
        }
        self.resize(Size::new(width, height));
    }

    /// Widget-level resize, never touching the window.
    pub(crate) fn resize(&mut self, size: Size<u32>) {
        let Some(node) = self.node_mut() else {
            return;
        };
        let old_size = node.size;
        if old_size == size {
            return;
        }
        node.size = size;

        let ev = ResizeEvent { size, old_size };
        dispatch::notify(self.app, self.id, Notification::Resize(ev));
        self.request_repaint();
    }

    pub fn set_absolute_x(&mut self, x: i32) {
        let y = self.node().map_or(0, |node| node.absolute_pos().y);
        self.set_absolute_pos(x, y);
    }

    pub fn set_absolute_y(&mut self, y: i32) {
        let x = self.node().map_or(0, |node| node.absolute_pos().x);
        self.set_absolute_pos(x, y);
    }

    /// Moves a sub-widget within its window. Top-level widgets are always at the origin.
    pub fn set_absolute_pos(&mut self, x: i32, y: i32) {
        let Some(sub) = self.node_mut().and_then(WidgetNode::sub_mut) else {
            return;
        };
        let pos = IVec2::new(x, y);
        let old_pos = sub.absolute_pos;
        if old_pos == pos {
            return;
        }
        sub.absolute_pos = pos;

        let ev = PositionChangedEvent { pos, old_pos };
        dispatch::notify(self.app, self.id, Notification::PositionChanged(ev));
        self.request_repaint();
    }

    /// Offset added to pointer positions delivered to this widget.
    pub fn set_margin(&mut self, x: i32, y: i32) {
        if let Some(sub) = self.node_mut().and_then(WidgetNode::sub_mut) {
            sub.margin = IVec2::new(x, y);
        }
    }

    pub fn set_id(&mut self, id: u32) {
        if let Some(node) = self.node_mut() {
            node.id = id;
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        if let Some(node) = self.node_mut() {
            node.name = Some(name.into());
        }
    }

    /// Paint last and receive events first among siblings.
    pub fn to_front(&mut self) {
        self.app.widgets.to_front(self.id);
    }

    /// Paint first and receive events last among siblings.
    pub fn to_bottom(&mut self) {
        self.app.widgets.to_bottom(self.id);
    }

    pub fn set_needs_full_viewport_for_drawing(&mut self, needs: bool) {
        self.set_flag(SubWidgetFlags::FULL_VIEWPORT, needs);
    }

    /// Paint at a private resolution; `factor` of `0.0` means `1.0`.
    pub fn set_needs_viewport_scaling(&mut self, needs: bool, factor: f64) {
        self.set_flag(SubWidgetFlags::VIEWPORT_SCALING, needs);
        if let Some(sub) = self.node_mut().and_then(WidgetNode::sub_mut) {
            sub.viewport_scale_factor = factor;
        }
    }

    pub fn set_skip_drawing(&mut self, skip: bool) {
        self.set_flag(SubWidgetFlags::SKIP_DRAWING, skip);
    }

    fn set_flag(&mut self, flag: SubWidgetFlags, enabled: bool) {
        if let Some(sub) = self.node_mut().and_then(WidgetNode::sub_mut) {
            sub.flags.set(flag, enabled);
        }
    }

    /// Requests a redraw of this widget on the next idle iteration.
    ///
    /// Invisible sub-widgets are not repainted.
    pub fn repaint(&mut self) {
        let Some(node) = self.node() else {
            return;
        };
        if node.sub().is_some() && !node.visible {
            return;
        }
        self.request_repaint();
    }

    /// Repaint after a state change, regardless of visibility.
    fn request_repaint(&mut self) {
        let Some(node) = self.node() else {
            return;
        };
        let window = node.window;
        let area = match node.sub() {
            Some(sub) if !sub.flags.contains(SubWidgetFlags::FULL_VIEWPORT) => {
                Some(node.constrained_absolute_area())
            }
            _ => None,
        };
        let Some(mut window) = self.app.window_mut(window) else {
            return;
        };
        match area {
            Some(area) => window.repaint_area(area),
            None => window.repaint(),
        }
    }
}
