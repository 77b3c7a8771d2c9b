//! Widget nodes and read access to them.
//!
//! Every widget is a node in the application's [`WidgetTree`](crate::tree::WidgetTree). A node
//! is either a top-level widget, mounted directly on a window and always window-sized, or a
//! sub-widget with a window-relative absolute position. The tree decides ownership and z-order;
//! it never composes coordinates.

mod behavior;
mod handle;

pub use behavior::{DisplayCtx, EventCtx, NoBehavior, WidgetBehavior};
pub use handle::WidgetMut;

use std::any::Any;

use fenestra_core::{
    alloc::sparse_set::IndexSlot,
    geometry::{Rect, Size},
    math::{DVec2, IVec2},
};

use crate::{
    event::{PositionChangedEvent, ResizeEvent},
    tree::WidgetTree,
    window::WindowId,
};

/// Handle to a widget owned by an [`Application`](crate::Application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) IndexSlot);

bitflags::bitflags! {
    /// Drawing options of a sub-widget, consulted by the compositor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SubWidgetFlags: u8 {
        /// Paint with a full-surface viewport and no scissor.
        const FULL_VIEWPORT = 1 << 0;
        /// Paint at a private resolution, and rebase pointer coordinates for descendants.
        const VIEWPORT_SCALING = 1 << 1;
        /// Skip painting this widget and its subtree.
        const SKIP_DRAWING = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SubWidgetData {
    pub parent: WidgetId,
    pub absolute_pos: IVec2,
    pub margin: IVec2,
    pub flags: SubWidgetFlags,
    pub viewport_scale_factor: f64,
}

#[derive(Debug, Clone)]
pub(crate) enum WidgetKind {
    TopLevel { window: WindowId },
    Sub(SubWidgetData),
}

pub(crate) struct WidgetNode {
    pub id: u32,
    pub name: Option<String>,
    pub size: Size<u32>,
    pub visible: bool,
    pub children: Vec<WidgetId>,
    pub top_level: Option<WidgetId>,
    pub window: WindowId,
    pub kind: WidgetKind,
    /// Taken out while one of its hooks runs.
    pub behavior: Option<Box<dyn WidgetBehavior>>,
    /// Notifications raised while `behavior` was taken out, oldest first.
    pub deferred: Vec<Notification>,
}

/// A state-change hook aimed at a widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Notification {
    Resize(ResizeEvent),
    PositionChanged(PositionChangedEvent),
    SizeRequest(Size<u32>),
}

impl WidgetNode {
    pub(crate) fn sub(&self) -> Option<&SubWidgetData> {
        match &self.kind {
            WidgetKind::Sub(data) => Some(data),
            WidgetKind::TopLevel { .. } => None,
        }
    }

    pub(crate) fn sub_mut(&mut self) -> Option<&mut SubWidgetData> {
        match &mut self.kind {
            WidgetKind::Sub(data) => Some(data),
            WidgetKind::TopLevel { .. } => None,
        }
    }

    pub(crate) fn absolute_pos(&self) -> IVec2 {
        self.sub().map_or(IVec2::ZERO, |sub| sub.absolute_pos)
    }

    pub(crate) fn flags(&self) -> SubWidgetFlags {
        self.sub().map_or(SubWidgetFlags::empty(), |sub| sub.flags)
    }

    pub(crate) fn contains(&self, pos: DVec2) -> bool {
        Rect::new(0.0, 0.0, self.size.width as f64, self.size.height as f64).contains(pos.x, pos.y)
    }

    pub(crate) fn absolute_area(&self) -> Rect<i32> {
        let pos = self.absolute_pos();
        Rect::new(pos.x, pos.y, self.size.width as i32, self.size.height as i32)
    }

    /// Absolute area with the origin clamped to the window.
    pub(crate) fn constrained_absolute_area(&self) -> Rect<u32> {
        let pos = self.absolute_pos();
        Rect::new(
            pos.x.max(0) as u32,
            pos.y.max(0) as u32,
            self.size.width,
            self.size.height,
        )
    }
}

/// Read access to a widget.
#[derive(Clone, Copy)]
pub struct WidgetRef<'a> {
    pub(crate) handle: WidgetId,
    pub(crate) node: &'a WidgetNode,
    pub(crate) tree: &'a WidgetTree,
}

impl<'a> WidgetRef<'a> {
    pub fn handle(&self) -> WidgetId {
        self.handle
    }

    /// Application-assigned numeric id, `0` unless set.
    pub fn id(&self) -> u32 {
        self.node.id
    }

    pub fn name(&self) -> Option<&'a str> {
        self.node.name.as_deref()
    }

    pub fn size(&self) -> Size<u32> {
        self.node.size
    }

    pub fn width(&self) -> u32 {
        self.node.size.width
    }

    pub fn height(&self) -> u32 {
        self.node.size.height
    }

    pub fn is_visible(&self) -> bool {
        self.node.visible
    }

    pub fn is_top_level(&self) -> bool {
        matches!(self.node.kind, WidgetKind::TopLevel { .. })
    }

    /// Local hit test against `(0, 0, width, height)`.
    pub fn contains(&self, pos: DVec2) -> bool {
        self.node.contains(pos)
    }

    /// Window-relative position; always zero for top-level widgets.
    pub fn absolute_pos(&self) -> IVec2 {
        self.node.absolute_pos()
    }

    pub fn absolute_x(&self) -> i32 {
        self.node.absolute_pos().x
    }

    pub fn absolute_y(&self) -> i32 {
        self.node.absolute_pos().y
    }

    pub fn margin(&self) -> IVec2 {
        self.node.sub().map_or(IVec2::ZERO, |sub| sub.margin)
    }

    pub fn absolute_area(&self) -> Rect<i32> {
        self.node.absolute_area()
    }

    pub fn constrained_absolute_area(&self) -> Rect<u32> {
        self.node.constrained_absolute_area()
    }

    pub fn flags(&self) -> SubWidgetFlags {
        self.node.flags()
    }

    pub fn needs_full_viewport_for_drawing(&self) -> bool {
        self.flags().contains(SubWidgetFlags::FULL_VIEWPORT)
    }

    pub fn needs_viewport_scaling(&self) -> bool {
        self.flags().contains(SubWidgetFlags::VIEWPORT_SCALING)
    }

    pub fn viewport_scale_factor(&self) -> f64 {
        self.node.sub().map_or(0.0, |sub| sub.viewport_scale_factor)
    }

    pub fn skip_drawing(&self) -> bool {
        self.flags().contains(SubWidgetFlags::SKIP_DRAWING)
    }

    /// Parent widget of a sub-widget.
    pub fn parent(&self) -> Option<WidgetId> {
        self.node.sub().map(|sub| sub.parent)
    }

    pub fn top_level(&self) -> Option<WidgetId> {
        self.node.top_level
    }

    pub fn window(&self) -> WindowId {
        self.node.window
    }

    /// Children in paint order; the last one is in front.
    pub fn children(&self) -> &'a [WidgetId] {
        &self.node.children
    }

    /// First descendant with numeric id `id`, depth first in paint order.
    pub fn find_child_by_id(&self, id: u32) -> Option<WidgetId> {
        self.node
            .children
            .iter()
            .find_map(|child| self.tree.find_by_id(*child, id))
    }

    /// The widget's behavior, unless one of its own hooks is running.
    pub fn behavior<T: WidgetBehavior>(&self) -> Option<&'a T> {
        let behavior: &'a (dyn WidgetBehavior + 'static) = self.node.behavior.as_deref()?;
        (behavior as &'a (dyn Any + 'static)).downcast_ref::<T>()
    }
}

impl std::fmt::Debug for WidgetRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRef")
            .field("handle", &self.handle)
            .field("id", &self.node.id)
            .field("name", &self.node.name)
            .field("size", &self.node.size)
            .field("visible", &self.node.visible)
            .field("kind", &self.node.kind)
            .finish()
    }
}
