//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc, time::Duration};

use fenestra_core::platform::ViewHandle;
use fenestra_test_utils::{MockPlatform, MockPlatformHandle, RecordingGraphics};
use fenestra_ui::{
    Application, DisplayCtx, EventCtx, KeyboardEvent, MotionEvent, MouseEvent,
    PositionChangedEvent, ResizeEvent, ScrollEvent, WidgetBehavior, WidgetId, WindowDescriptor,
    WindowId,
};

/// Event log shared between a test and its tracers.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Widget that logs every hook and claims presses inside its bounds.
pub struct Tracer {
    pub name: String,
    pub log: Log,
    pub claims: bool,
    /// Size the tracer gives itself when pressed.
    pub resize_on_press: Option<(u32, u32)>,
    /// Position the tracer moves itself to when pressed.
    pub move_on_press: Option<(i32, i32)>,
}

impl Tracer {
    pub fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_owned(),
            log: log.clone(),
            claims: true,
            resize_on_press: None,
            move_on_press: None,
        }
    }

    pub fn resizing_on_press(mut self, width: u32, height: u32) -> Self {
        self.resize_on_press = Some((width, height));
        self
    }

    pub fn moving_on_press(mut self, x: i32, y: i32) -> Self {
        self.move_on_press = Some((x, y));
        self
    }

    /// Logs events but never reports them handled.
    pub fn passive(name: &str, log: &Log) -> Self {
        Self {
            claims: false,
            ..Self::new(name, log)
        }
    }
}

impl WidgetBehavior for Tracer {
    fn on_display(&mut self, ctx: &mut DisplayCtx<'_>) {
        if let Some(graphics) = ctx.graphics_as::<RecordingGraphics>() {
            graphics.mark(self.name.clone());
        }
    }

    fn on_keyboard(&mut self, ctx: &mut EventCtx<'_>, ev: &KeyboardEvent) -> bool {
        if ctx.keyboard_to_children(ev) {
            return true;
        }
        self.log
            .push(format!("{} key {:?} {:?}", self.name, ev.key, ev.base.mods));
        self.claims
    }

    fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> bool {
        if ctx.mouse_to_children(ev) {
            return true;
        }
        self.log.push(format!(
            "{} mouse {},{} abs {},{}",
            self.name, ev.pos.x, ev.pos.y, ev.absolute_pos.x, ev.absolute_pos.y
        ));
        if ev.press
            && ctx.contains(ev.pos)
            && let Some(mut widget) = ctx.widget_mut()
        {
            if let Some((width, height)) = self.resize_on_press {
                widget.set_size(width, height);
            }
            if let Some((x, y)) = self.move_on_press {
                widget.set_absolute_pos(x, y);
            }
        }
        self.claims && ev.press && ctx.contains(ev.pos)
    }

    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> bool {
        if ctx.motion_to_children(ev) {
            return true;
        }
        self.log
            .push(format!("{} motion {},{}", self.name, ev.pos.x, ev.pos.y));
        false
    }

    fn on_scroll(&mut self, ctx: &mut EventCtx<'_>, ev: &ScrollEvent) -> bool {
        if ctx.scroll_to_children(ev) {
            return true;
        }
        self.log
            .push(format!("{} scroll {},{}", self.name, ev.pos.x, ev.pos.y));
        self.claims && ctx.contains(ev.pos)
    }

    fn on_resize(&mut self, _ctx: &mut EventCtx<'_>, ev: &ResizeEvent) {
        self.log.push(format!(
            "{} resize {}x{}",
            self.name, ev.size.width, ev.size.height
        ));
    }

    fn on_position_changed(&mut self, _ctx: &mut EventCtx<'_>, ev: &PositionChangedEvent) {
        self.log
            .push(format!("{} moved {},{}", self.name, ev.pos.x, ev.pos.y));
    }

    fn request_size_change(&mut self, width: u32, height: u32) {
        self.log
            .push(format!("{} size request {width}x{height}", self.name));
    }
}

pub struct Fixture {
    pub app: Application,
    pub platform: MockPlatformHandle,
    pub window: WindowId,
    pub root: WidgetId,
    pub log: Log,
}

impl Fixture {
    /// A shown 640x480 window with a passive top-level tracer named `root`.
    pub fn new() -> Self {
        Self::with_platform(MockPlatform::new())
    }

    pub fn with_platform(platform: MockPlatform) -> Self {
        let handle = platform.handle();
        let mut app = Application::new(platform);
        let log = Log::default();
        let window = app.create_window(WindowDescriptor::new("test", 640, 480));
        let root = app
            .add_top_level_widget(window, Tracer::passive("root", &log))
            .expect("window exists");
        app.window_mut(window).expect("window exists").show();
        Self {
            app,
            platform: handle,
            window,
            root,
            log,
        }
    }

    pub fn view(&self) -> ViewHandle {
        self.app
            .window(self.window)
            .and_then(|w| w.view())
            .expect("window is realized")
    }

    /// Adds a tracer under `parent` at `(x, y)` with size `w×h`.
    pub fn add_tracer(
        &mut self,
        parent: WidgetId,
        tracer: Tracer,
        (x, y, w, h): (i32, i32, u32, u32),
    ) -> WidgetId {
        let id = self
            .app
            .add_sub_widget(parent, tracer)
            .expect("parent exists");
        let mut widget = self.app.widget_mut(id).expect("widget exists");
        widget.set_size(w, h);
        widget.set_absolute_pos(x, y);
        id
    }

    /// Runs idle iterations until the platform queue is drained.
    pub fn settle(&mut self) {
        for _ in 0..4 {
            self.app.idle(Duration::ZERO);
        }
    }
}
