use std::any::Any;

use fenestra_core::{geometry::Size, graphics::GraphicsContext, math::DVec2};

use super::{WidgetId, WidgetMut, WidgetRef};
use crate::{
    application::Application,
    dispatch,
    event::{
        CharacterInputEvent, KeyboardEvent, MotionEvent, MouseEvent, PositionChangedEvent,
        ResizeEvent, ScrollEvent,
    },
};

/// What a widget does: paints itself and reacts to input.
///
/// Input hooks return `true` when the event was handled, which stops the search for a handler.
/// Their default implementations forward the event to the widget's children, so an override
/// that wants the children to see unhandled events chains explicitly:
///
/// ```
/// use fenestra_ui::{EventCtx, MouseEvent, WidgetBehavior};
///
/// struct Panel {
///     clicks: u32,
/// }
///
/// impl WidgetBehavior for Panel {
///     fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> bool {
///         if ctx.mouse_to_children(ev) {
///             return true;
///         }
///         if ev.press && ctx.contains(ev.pos) {
///             self.clicks += 1;
///             return true;
///         }
///         false
///     }
/// }
/// ```
pub trait WidgetBehavior: Any {
    /// Paint the widget. The viewport (and scissor, if any) is already configured.
    #[allow(unused_variables)]
    fn on_display(&mut self, ctx: &mut DisplayCtx<'_>) {}

    fn on_keyboard(&mut self, ctx: &mut EventCtx<'_>, ev: &KeyboardEvent) -> bool {
        ctx.keyboard_to_children(ev)
    }

    fn on_character_input(&mut self, ctx: &mut EventCtx<'_>, ev: &CharacterInputEvent) -> bool {
        ctx.character_input_to_children(ev)
    }

    fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> bool {
        ctx.mouse_to_children(ev)
    }

    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> bool {
        ctx.motion_to_children(ev)
    }

    fn on_scroll(&mut self, ctx: &mut EventCtx<'_>, ev: &ScrollEvent) -> bool {
        ctx.scroll_to_children(ev)
    }

    #[allow(unused_variables)]
    fn on_resize(&mut self, ctx: &mut EventCtx<'_>, ev: &ResizeEvent) {}

    #[allow(unused_variables)]
    fn on_position_changed(&mut self, ctx: &mut EventCtx<'_>, ev: &PositionChangedEvent) {}

    /// Forward a size request to the plugin host.
    ///
    /// Only called on the first top-level widget of a window whose size is owned by the host.
    /// The host answers, if at all, with an ordinary configure event later on.
    #[allow(unused_variables)]
    fn request_size_change(&mut self, width: u32, height: u32) {}
}

/// Behavior for widgets that only group children.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBehavior;

impl WidgetBehavior for NoBehavior {}

/// Access to the application from inside a widget hook.
pub struct EventCtx<'a> {
    pub(crate) app: &'a mut Application,
    pub(crate) widget: WidgetId,
}

impl<'a> EventCtx<'a> {
    pub(crate) fn new(app: &'a mut Application, widget: WidgetId) -> Self {
        Self { app, widget }
    }

    /// The widget whose hook is running.
    pub fn handle(&self) -> WidgetId {
        self.widget
    }

    pub fn widget(&self) -> Option<WidgetRef<'_>> {
        self.app.widget(self.widget)
    }

    pub fn widget_mut(&mut self) -> Option<WidgetMut<'_>> {
        self.app.widget_mut(self.widget)
    }

    pub fn app(&mut self) -> &mut Application {
        self.app
    }

    pub fn size(&self) -> Size<u32> {
        self.widget().map(|w| w.size()).unwrap_or_default()
    }

    /// Local hit test of the running widget.
    pub fn contains(&self, pos: DVec2) -> bool {
        self.widget().is_some_and(|w| w.contains(pos))
    }

    pub fn repaint(&mut self) {
        if let Some(mut widget) = self.widget_mut() {
            widget.repaint();
        }
    }

    pub fn keyboard_to_children(&mut self, ev: &KeyboardEvent) -> bool {
        dispatch::keyboard_to_children(self.app, self.widget, ev)
    }

    pub fn character_input_to_children(&mut self, ev: &CharacterInputEvent) -> bool {
        dispatch::character_input_to_children(self.app, self.widget, ev)
    }

    pub fn mouse_to_children(&mut self, ev: &MouseEvent) -> bool {
        dispatch::pointer_to_children(self.app, self.widget, ev, |b, ctx, ev| b.on_mouse(ctx, ev))
    }

    pub fn motion_to_children(&mut self, ev: &MotionEvent) -> bool {
        dispatch::pointer_to_children(self.app, self.widget, ev, |b, ctx, ev| b.on_motion(ctx, ev))
    }

    pub fn scroll_to_children(&mut self, ev: &ScrollEvent) -> bool {
        dispatch::pointer_to_children(self.app, self.widget, ev, |b, ctx, ev| b.on_scroll(ctx, ev))
    }
}

/// Paint-time access to the drawing surface and the widget being painted.
pub struct DisplayCtx<'a> {
    pub(crate) graphics: &'a mut (dyn GraphicsContext + 'static),
    pub(crate) widget: WidgetRef<'a>,
    pub(crate) surface: Size<u32>,
    pub(crate) scale_factor: f64,
}

impl<'a> DisplayCtx<'a> {
    pub fn graphics(&mut self) -> &mut (dyn GraphicsContext + 'static) {
        &mut *self.graphics
    }

    /// The concrete rendering backend, if it is a `T`.
    pub fn graphics_as<T: GraphicsContext>(&mut self) -> Option<&mut T> {
        self.graphics.downcast_mut::<T>()
    }

    pub fn widget(&self) -> WidgetRef<'a> {
        self.widget
    }

    pub fn size(&self) -> Size<u32> {
        self.widget.size()
    }

    /// Size of the whole drawing surface.
    pub fn surface_size(&self) -> Size<u32> {
        self.surface
    }

    /// The window's auto-scale factor, `1.0` unless auto-scaling is enabled.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
