//! Per-widget viewport and scissor setup.
//!
//! Every widget paints into the same surface, whose viewport state is global and not stacked. Before
//! each paint hook the compositor sets the viewport (and a scissor for widgets that need clipping)
//! from the widget's absolute position, the surface size `W×H` and the window's auto-scale factor
//! `s`. Rectangles use a bottom-left origin.

use std::ops::{Deref, DerefMut};

use fenestra_core::{
    geometry::{Rect, Size},
    graphics::GraphicsContext,
    math::{IVec2, round_i32},
    profiling::profile_function,
};

use crate::{
    tree::WidgetTree,
    widget::{DisplayCtx, SubWidgetFlags, WidgetId, WidgetNode},
};

/// Enables a scissor for as long as it lives.
pub struct ScissorScope<'a> {
    graphics: &'a mut (dyn GraphicsContext + 'static),
}

impl<'a> ScissorScope<'a> {
    pub fn new(graphics: &'a mut (dyn GraphicsContext + 'static), scissor: Rect<i32>) -> Self {
        graphics.set_scissor(scissor);
        Self { graphics }
    }
}

impl Deref for ScissorScope<'_> {
    type Target = dyn GraphicsContext;

    fn deref(&self) -> &Self::Target {
        &*self.graphics
    }
}

impl DerefMut for ScissorScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.graphics
    }
}

impl Drop for ScissorScope<'_> {
    fn drop(&mut self) {
        self.graphics.disable_scissor();
    }
}

/// How a sub-widget is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubWidgetPaint {
    /// Neither the widget nor its subtree is painted.
    Skip,
    /// Private resolution.
    Scaled { viewport: Rect<i32> },
    Full { viewport: Rect<i32> },
    Clipped { viewport: Rect<i32>, scissor: Rect<i32> },
}

/// Full-surface viewport: `(0, -round(H*s - H), round(W*s), round(H*s))`.
pub fn full_viewport(surface: Size<u32>, scale: f64) -> Rect<i32> {
    let (w, h) = (surface.width as f64, surface.height as f64);
    Rect::new(0, -round_i32(h * scale - h), round_i32(w * scale), round_i32(h * scale))
}

/// Viewport of a widget painting at its own resolution `factor` (`0.0` means `1.0`).
///
/// Only the widget's own extent is multiplied; the window surface keeps its size.
pub fn scaled_viewport(pos: IVec2, size: Size<u32>, surface: Size<u32>, factor: f64) -> Rect<i32> {
    let factor = if factor == 0.0 { 1.0 } else { factor };
    let (w, h) = (size.width as f64, size.height as f64);
    Rect::new(
        pos.x,
        surface.height as i32 - round_i32(pos.y as f64 + h * factor),
        round_i32(w * factor),
        round_i32(h * factor),
    )
}

/// Surface-sized viewport shifted to the widget's position.
pub fn offset_viewport(pos: IVec2, surface: Size<u32>, scale: f64) -> Rect<i32> {
    let (w, h) = (surface.width as f64, surface.height as f64);
    let (x, y) = (pos.x as f64, pos.y as f64);
    Rect::new(
        round_i32(x * scale),
        -round_i32(h * scale - h + y * scale),
        round_i32(w * scale),
        round_i32(h * scale),
    )
}

/// Scissor covering exactly the widget's area.
pub fn widget_scissor(pos: IVec2, size: Size<u32>, surface: Size<u32>, scale: f64) -> Rect<i32> {
    let (x, y) = (pos.x as f64, pos.y as f64);
    let (w, h) = (size.width as f64, size.height as f64);
    Rect::new(
        round_i32(x * scale),
        surface.height as i32 - round_i32((y + h) * scale),
        round_i32(w * scale),
        round_i32(h * scale),
    )
}

/// Chooses the paint setup of a sub-widget; the first matching rule wins.
pub fn plan_sub_widget(
    flags: SubWidgetFlags,
    viewport_scale_factor: f64,
    pos: IVec2,
    size: Size<u32>,
    surface: Size<u32>,
    scale: f64,
) -> SubWidgetPaint {
    if flags.contains(SubWidgetFlags::SKIP_DRAWING) {
        return SubWidgetPaint::Skip;
    }
    if flags.contains(SubWidgetFlags::VIEWPORT_SCALING) {
        return SubWidgetPaint::Scaled {
            viewport: scaled_viewport(pos, size, surface, viewport_scale_factor),
        };
    }
    if flags.contains(SubWidgetFlags::FULL_VIEWPORT) || (pos == IVec2::ZERO && size == surface) {
        return SubWidgetPaint::Full {
            viewport: full_viewport(surface, scale),
        };
    }
    SubWidgetPaint::Clipped {
        viewport: offset_viewport(pos, surface, scale),
        scissor: widget_scissor(pos, size, surface, scale),
    }
}

fn plan_node(node: &WidgetNode, surface: Size<u32>, scale: f64) -> SubWidgetPaint {
    let factor = node.sub().map_or(0.0, |sub| sub.viewport_scale_factor);
    plan_sub_widget(node.flags(), factor, node.absolute_pos(), node.size, surface, scale)
}

/// Paints a top-level widget and its visible subtree.
pub(crate) fn display_top_level(
    graphics: &mut (dyn GraphicsContext + 'static),
    tree: &mut WidgetTree,
    id: WidgetId,
    surface: Size<u32>,
    scale: f64,
) {
    profile_function!();
    if !tree.node(id).is_some_and(|node| node.visible) {
        return;
    }
    graphics.set_viewport(full_viewport(surface, scale));
    paint(graphics, tree, id, surface, scale);
    display_children(graphics, tree, id, surface, scale);
}

fn display_children(
    graphics: &mut (dyn GraphicsContext + 'static),
    tree: &mut WidgetTree,
    id: WidgetId,
    surface: Size<u32>,
    scale: f64,
) {
    for child in tree.children(id) {
        if tree.node(child).is_some_and(|node| node.visible) {
            display_sub_widget(graphics, tree, child, surface, scale);
        }
    }
}

fn display_sub_widget(
    graphics: &mut (dyn GraphicsContext + 'static),
    tree: &mut WidgetTree,
    id: WidgetId,
    surface: Size<u32>,
    scale: f64,
) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let plan = plan_node(node, surface, scale);
    tracing::trace!(widget = ?id, ?plan, "paint sub-widget");

    match plan {
        SubWidgetPaint::Skip => return,
        SubWidgetPaint::Scaled { viewport } | SubWidgetPaint::Full { viewport } => {
            graphics.set_viewport(viewport);
            paint(graphics, tree, id, surface, scale);
        }
        SubWidgetPaint::Clipped { viewport, scissor } => {
            graphics.set_viewport(viewport);
            let mut scope = ScissorScope::new(graphics, scissor);
            paint(&mut *scope, tree, id, surface, scale);
        }
    }

    display_children(graphics, tree, id, surface, scale);
}

fn paint(
    graphics: &mut (dyn GraphicsContext + 'static),
    tree: &mut WidgetTree,
    id: WidgetId,
    surface: Size<u32>,
    scale: f64,
) {
    let Some(mut behavior) = tree.take_behavior(id) else {
        return;
    };
    if let Some(widget) = tree.get(id) {
        let mut ctx = DisplayCtx {
            graphics,
            widget,
            surface,
            scale_factor: scale,
        };
        behavior.on_display(&mut ctx);
    }
    tree.restore_behavior(id, behavior);
}
