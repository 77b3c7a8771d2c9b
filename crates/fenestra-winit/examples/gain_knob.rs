//! A standalone window with one knob, driven by the winit backend.
//!
//! Drag vertically to change the value, hold Ctrl for fine steps, Shift-click to reset.
//! Run with `RUST_LOG=debug` to watch events arrive.

use std::time::Duration;

use fenestra_core::{logging, profiling};
use fenestra_ui::{
    Application, DisplayCtx, EventCtx, KnobEventHandler, KnobResponse, MotionEvent, MouseEvent,
    ScrollEvent, WidgetBehavior, WindowDescriptor,
};
use fenestra_winit::WinitPlatform;

struct Panel;

impl WidgetBehavior for Panel {
    fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> bool {
        ctx.mouse_to_children(ev)
    }

    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> bool {
        ctx.motion_to_children(ev)
    }

    fn on_scroll(&mut self, ctx: &mut EventCtx<'_>, ev: &ScrollEvent) -> bool {
        ctx.scroll_to_children(ev)
    }

    fn on_display(&mut self, ctx: &mut DisplayCtx<'_>) {
        tracing::trace!(surface = ?ctx.surface_size(), "panel");
    }
}

struct Knob {
    handler: KnobEventHandler,
}

impl Knob {
    fn report(&self, response: KnobResponse) -> bool {
        if let KnobResponse::ValueChanged(value) = response {
            tracing::info!(value, "gain");
        }
        response.is_handled()
    }
}

impl WidgetBehavior for Knob {
    fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> bool {
        let response = self.handler.mouse_event(ctx, ev);
        self.report(response)
    }

    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> bool {
        let response = self.handler.motion_event(ctx, ev);
        self.report(response)
    }

    fn on_scroll(&mut self, ctx: &mut EventCtx<'_>, ev: &ScrollEvent) -> bool {
        let response = self.handler.scroll_event(ctx, ev);
        self.report(response)
    }
}

fn main() {
    logging::init();
    profiling::init_profiling(profiling::ProfilingBackend::PuffinHttp);

    let platform = match WinitPlatform::new() {
        Ok(platform) => platform,
        Err(err) => {
            tracing::error!("{err}");
            return;
        }
    };

    let mut app = Application::new(platform);
    app.set_class_name("fenestra-gain");
    let window = app.create_window(WindowDescriptor::new("Gain", 400, 300));
    let Some(root) = app.add_top_level_widget(window, Panel) else {
        tracing::error!("window was not created");
        return;
    };

    let mut handler = KnobEventHandler::default();
    handler.set_default(0.5);
    if let Some(knob) = app.add_sub_widget(root, Knob { handler })
        && let Some(mut widget) = app.widget_mut(knob)
    {
        widget.set_size(96, 96);
        widget.set_absolute_pos(152, 102);
    }

    if let Some(mut window) = app.window_mut(window) {
        window.set_geometry_constraints(200, 150, true, true, false);
        window.show();
    }
    app.exec(Duration::from_millis(16));
}
