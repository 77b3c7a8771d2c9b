//! [`Platform`] implementation on top of a pumped winit event loop.
//!
//! winit only creates windows from inside its event handler, so [`WinitPlatform`] keeps the
//! event loop itself and drives it with `pump_app_events`: view creation pumps once with a zero
//! timeout and [`Platform::update`] pumps for at most the requested timeout.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use fenestra_core::{
    alloc::HashMap,
    geometry::Size,
    graphics::{GraphicsContext, StubGraphics},
    input::MouseCursor,
    math::IVec2,
    platform::{
        ClipboardData, Damage, NativeEvent, NativeHandle, Platform, PlatformError, ViewDescriptor,
        ViewHandle,
    },
    profiling::profile_function,
};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{WindowAttributes, WindowId},
};

use crate::{
    event::{EventQueue, ViewInput, convert_cursor},
    window::{self, WinitWindow},
};

/// Creates the drawing context of a freshly realized window.
pub type GraphicsFactory = Box<dyn FnMut(&Arc<WinitWindow>) -> Box<dyn GraphicsContext>>;

struct View {
    window: Arc<WinitWindow>,
    input: ViewInput,
    graphics: Box<dyn GraphicsContext>,
    /// Width and height ratio enforced after user resizes.
    aspect: Option<(u32, u32)>,
}

struct Timer {
    view: ViewHandle,
    id: u64,
    interval: Duration,
    deadline: Instant,
}

struct PendingView {
    view: ViewHandle,
    attributes: WindowAttributes,
    ignore_key_repeat: bool,
    error: Option<String>,
}

struct PlatformState {
    views: HashMap<ViewHandle, View>,
    by_window: HashMap<WindowId, ViewHandle>,
    pending: Option<PendingView>,
    next_view: u64,
    queue: EventQueue,
    timers: Vec<Timer>,
    clipboard: Option<ClipboardData>,
    class_name: Option<String>,
    graphics_factory: Option<GraphicsFactory>,
    start: Instant,
}

/// Native views backed by winit windows.
///
/// The clipboard is process-local, winit has no access to the system one. Damage areas are
/// widened to the whole window.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    state: PlatformState,
}

impl WinitPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        Ok(Self {
            event_loop,
            state: PlatformState {
                views: HashMap::new(),
                by_window: HashMap::new(),
                pending: None,
                next_view: 1,
                queue: EventQueue::new(),
                timers: Vec::new(),
                clipboard: None,
                class_name: None,
                graphics_factory: None,
                start: Instant::now(),
            },
        })
    }

    /// Installs the factory every later view gets its [`GraphicsContext`] from.
    ///
    /// Without one, views paint into a [`StubGraphics`].
    pub fn with_graphics<F>(mut self, factory: F) -> Self
    where
        F: FnMut(&Arc<WinitWindow>) -> Box<dyn GraphicsContext> + 'static,
    {
        self.state.graphics_factory = Some(Box::new(factory));
        self
    }

    pub fn window(&self, view: ViewHandle) -> Option<&Arc<WinitWindow>> {
        self.state.views.get(&view).map(|v| &v.window)
    }

    pub fn event_stats(&self) -> &crate::event::EventStats {
        self.state.queue.stats()
    }

    fn pump(&mut self, timeout: Duration) {
        let mut handler = Pump {
            state: &mut self.state,
        };
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(Some(timeout), &mut handler)
        {
            tracing::warn!(code, "winit event loop exited");
        }
    }

    fn with_window<R>(
        &self,
        view: ViewHandle,
        f: impl FnOnce(&WinitWindow) -> R,
    ) -> Result<R, PlatformError> {
        self.state
            .views
            .get(&view)
            .map(|v| f(&v.window))
            .ok_or(PlatformError::UnknownView(view))
    }
}

impl PlatformState {
    fn time(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn realize_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if pending.error.is_some() || self.views.contains_key(&pending.view) {
            return;
        }

        match event_loop.create_window(pending.attributes.clone()) {
            Ok(window) => {
                let window = Arc::new(window);
                let graphics = match self.graphics_factory.as_mut() {
                    Some(factory) => factory(&window),
                    None => Box::new(StubGraphics::new()),
                };
                let input = ViewInput {
                    ignore_key_repeat: pending.ignore_key_repeat,
                    ..ViewInput::default()
                };
                tracing::debug!(view = pending.view.raw(), id = ?window.id(), "realized window");
                self.by_window.insert(window.id(), pending.view);
                self.views.insert(
                    pending.view,
                    View {
                        window,
                        input,
                        graphics,
                        aspect: None,
                    },
                );
            }
            Err(err) => pending.error = Some(err.to_string()),
        }
    }

    fn window_event(&mut self, id: WindowId, event: WindowEvent) {
        let Some(&view) = self.by_window.get(&id) else {
            return;
        };
        let time = self.time();
        let Some(state) = self.views.get_mut(&view) else {
            return;
        };

        if let (WindowEvent::Resized(size), Some((w, h))) = (&event, state.aspect)
            && size.width > 0
        {
            let height = (size.width as u64 * h as u64 / w as u64) as u32;
            if height.abs_diff(size.height) > 1 {
                let _ = state
                    .window
                    .request_inner_size(window::to_physical(Size::new(size.width, height)));
            }
        }

        state.input.translate(view, event, time, &mut self.queue);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    fn fire_timers(&mut self, now: Instant) {
        for timer in &mut self.timers {
            if timer.deadline > now {
                continue;
            }
            self.queue.push(timer.view, NativeEvent::Timer { id: timer.id });
            timer.deadline += timer.interval;
            // a stalled loop fires once, not once per missed interval
            if timer.deadline <= now {
                timer.deadline = now + timer.interval;
            }
        }
    }
}

struct Pump<'a> {
    state: &'a mut PlatformState,
}

impl ApplicationHandler for Pump<'_> {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: StartCause) {
        self.state.realize_pending(event_loop);
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.state.realize_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        self.state.window_event(id, event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.state.realize_pending(event_loop);
    }
}

impl Platform for WinitPlatform {
    fn set_class_name(&mut self, name: &str) {
        self.state.class_name = Some(name.to_owned());
    }

    fn create_view(&mut self, descriptor: &ViewDescriptor) -> Result<ViewHandle, PlatformError> {
        profile_function!();
        let attributes = window::attributes(descriptor, self.state.class_name.as_deref())?;
        if let Some(owner) = descriptor.transient_for {
            tracing::trace!(owner = owner.raw(), "transient hint not supported by winit");
        }

        let view = ViewHandle::new(self.state.next_view);
        self.state.next_view += 1;
        self.state.pending = Some(PendingView {
            view,
            attributes,
            ignore_key_repeat: descriptor.ignore_key_repeat,
            error: None,
        });
        self.pump(Duration::ZERO);

        let error = self.state.pending.take().and_then(|p| p.error);
        if self.state.views.contains_key(&view) {
            return Ok(view);
        }
        Err(PlatformError::ViewCreation(
            error.unwrap_or_else(|| "event loop did not realize the window".to_owned()),
        ))
    }

    fn destroy_view(&mut self, view: ViewHandle) {
        let Some(state) = self.state.views.remove(&view) else {
            return;
        };
        self.state.by_window.remove(&state.window.id());
        self.state.timers.retain(|t| t.view != view);
        self.state.queue.forget(view);
        tracing::debug!(view = view.raw(), "destroyed window");
    }

    fn show(&mut self, view: ViewHandle) -> Result<(), PlatformError> {
        self.with_window(view, |w| w.set_visible(true))
    }

    fn hide(&mut self, view: ViewHandle) -> Result<(), PlatformError> {
        self.with_window(view, |w| w.set_visible(false))
    }

    fn size(&self, view: ViewHandle) -> Option<Size<u32>> {
        self.with_window(view, |w| window::from_physical(w.inner_size()))
            .ok()
    }

    fn set_size(&mut self, view: ViewHandle, size: Size<u32>) -> Result<(), PlatformError> {
        let applied = self.with_window(view, |w| w.request_inner_size(window::to_physical(size)))?;
        if let Some(size) = applied {
            self.state.queue.push(
                view,
                NativeEvent::Configure {
                    width: size.width as f64,
                    height: size.height as f64,
                },
            );
        }
        Ok(())
    }

    fn set_geometry_constraints(
        &mut self,
        view: ViewHandle,
        min_size: Size<u32>,
        keep_aspect_ratio: bool,
    ) -> Result<(), PlatformError> {
        let state = self
            .state
            .views
            .get_mut(&view)
            .ok_or(PlatformError::UnknownView(view))?;
        let min = min_size.is_valid().then(|| window::to_physical(min_size));
        state.window.set_min_inner_size(min);
        state.aspect = (keep_aspect_ratio && min_size.is_valid())
            .then_some((min_size.width, min_size.height));
        Ok(())
    }

    fn set_resizable(&mut self, view: ViewHandle, resizable: bool) -> Result<(), PlatformError> {
        self.with_window(view, |w| w.set_resizable(resizable))
    }

    fn set_title(&mut self, view: ViewHandle, title: &str) -> Result<(), PlatformError> {
        self.with_window(view, |w| w.set_title(title))
    }

    fn offset(&self, view: ViewHandle) -> Option<IVec2> {
        let position = self.with_window(view, |w| w.outer_position()).ok()?.ok()?;
        Some(IVec2::new(position.x, position.y))
    }

    fn set_offset(&mut self, view: ViewHandle, offset: IVec2) -> Result<(), PlatformError> {
        self.with_window(view, |w| {
            w.set_outer_position(PhysicalPosition::new(offset.x, offset.y))
        })
    }

    fn raise(&mut self, view: ViewHandle) {
        let _ = self.with_window(view, |w| w.focus_window());
    }

    fn grab_focus(&mut self, view: ViewHandle) {
        let _ = self.with_window(view, |w| w.focus_window());
    }

    fn post_redisplay(&mut self, view: ViewHandle, _damage: &Damage) {
        let _ = self.with_window(view, |w| w.request_redraw());
    }

    fn desktop_scale_factor(&self, view: ViewHandle) -> Option<f64> {
        self.with_window(view, |w| w.scale_factor()).ok()
    }

    fn native_handle(&self, view: ViewHandle) -> Option<NativeHandle> {
        self.state
            .views
            .get(&view)
            .and_then(|v| window::native_handle(&v.window))
    }

    fn set_clipboard(&mut self, view: ViewHandle, mime_type: &str, data: &[u8]) -> bool {
        if !self.state.views.contains_key(&view) {
            return false;
        }
        self.state.clipboard = Some(ClipboardData {
            mime_type: mime_type.to_owned(),
            data: data.to_vec(),
        });
        true
    }

    fn clipboard(&mut self, view: ViewHandle) -> Option<ClipboardData> {
        if !self.state.views.contains_key(&view) {
            return None;
        }
        self.state.clipboard.clone()
    }

    fn set_cursor(&mut self, view: ViewHandle, cursor: MouseCursor) -> bool {
        self.with_window(view, |w| w.set_cursor(convert_cursor(cursor)))
            .is_ok()
    }

    fn start_timer(&mut self, view: ViewHandle, id: u64, interval: Duration) -> bool {
        if !self.state.views.contains_key(&view) || interval.is_zero() {
            return false;
        }
        self.state.timers.retain(|t| !(t.view == view && t.id == id));
        self.state.timers.push(Timer {
            view,
            id,
            interval,
            deadline: Instant::now() + interval,
        });
        true
    }

    fn stop_timer(&mut self, view: ViewHandle, id: u64) -> bool {
        let before = self.state.timers.len();
        self.state.timers.retain(|t| !(t.view == view && t.id == id));
        self.state.timers.len() != before
    }

    fn set_ignore_key_repeat(&mut self, view: ViewHandle, ignore: bool) {
        if let Some(state) = self.state.views.get_mut(&view) {
            state.input.ignore_key_repeat = ignore;
        }
    }

    fn update(&mut self, timeout: Duration) -> Vec<(ViewHandle, NativeEvent)> {
        profile_function!();
        let now = Instant::now();
        let mut wait = match self.state.next_deadline() {
            Some(deadline) => timeout.min(deadline.saturating_duration_since(now)),
            None => timeout,
        };
        if !self.state.queue.is_empty() {
            wait = Duration::ZERO;
        }

        self.pump(wait);
        self.state.fire_timers(Instant::now());
        self.state.queue.drain()
    }

    fn graphics(&mut self, view: ViewHandle) -> Option<&mut (dyn GraphicsContext + 'static)> {
        self.state
            .views
            .get_mut(&view)
            .map(|v| v.graphics.as_mut())
    }
}
