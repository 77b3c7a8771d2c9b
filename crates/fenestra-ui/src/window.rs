//! Windows: one native view, the top-level widgets mounted on it, and its modal linkage.
//!
//! A window is realized when it is created. Standalone and modal windows start closed and hidden
//! and are counted as visible by the application from their first `show()` until `close()`.
//! Embedded windows live inside a host-provided view: they are visible from creation and ignore
//! `show`, `hide` and `close`.

use std::time::Duration;

use fenestra_core::{
    alloc::sparse_set::IndexSlot,
    geometry::{Rect, Size},
    input::{CrossingMode, MouseCursor},
    math::{IVec2, round_u32},
    platform::{ClipboardData, Damage, NativeHandle, ViewHandle},
    safe_assert,
};

use crate::{
    application::Application,
    dispatch,
    event::MotionEvent,
    idle::IdleCallbackId,
    widget::{Notification, WidgetId},
};

/// Handle to a window owned by an [`Application`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) IndexSlot);

/// Window-level notifications.
pub trait WindowHandler {
    /// Close requested by the user. Returning `false` keeps the window open.
    fn on_close(&mut self) -> bool {
        true
    }

    #[allow(unused_variables)]
    fn on_focus(&mut self, focused: bool, mode: CrossingMode) {}

    /// Called with the new size before the top-level widgets are resized.
    #[allow(unused_variables)]
    fn on_reshape(&mut self, width: u32, height: u32) {}

    #[allow(unused_variables)]
    fn on_scale_factor_changed(&mut self, scale_factor: f64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Modal {
    /// Fixed at creation.
    pub parent: Option<WindowId>,
    /// Modal window currently stealing input from this one.
    pub child: Option<WindowId>,
    pub enabled: bool,
}

/// Pending redraw for the next idle iteration.
#[derive(Debug, Default)]
pub(crate) struct RepaintState {
    pending: bool,
    full: bool,
    areas: Vec<Rect<u32>>,
}

impl RepaintState {
    pub fn request_full(&mut self) {
        self.pending = true;
        self.full = true;
        self.areas.clear();
    }

    pub fn request_area(&mut self, area: Rect<u32>) {
        self.pending = true;
        if !self.full {
            self.areas.push(area);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn take(&mut self) -> Option<Damage> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        if std::mem::take(&mut self.full) {
            self.areas.clear();
            return Some(Damage::Full);
        }
        Some(Damage::Areas(std::mem::take(&mut self.areas)))
    }
}

pub(crate) struct Window {
    /// `None` when the native view failed to realize.
    pub view: Option<ViewHandle>,
    pub embed: bool,
    pub visible: bool,
    pub closed: bool,
    pub uses_size_request: bool,
    /// Last configured size, used when the platform cannot report one.
    pub size: Size<u32>,
    pub title: String,
    pub resizable: bool,
    pub ignore_key_repeat: bool,
    pub scale_factor: f64,
    pub auto_scaling: bool,
    pub auto_scale_factor: f64,
    pub min_size: Size<u32>,
    pub keep_aspect_ratio: bool,
    pub modal: Modal,
    pub top_level_widgets: Vec<WidgetId>,
    pub repaint: RepaintState,
    /// Taken out while one of its callbacks runs.
    pub handler: Option<Box<dyn WindowHandler>>,
}

impl Window {
    /// Auto-scale factor applied to painting and pointer input.
    pub(crate) fn effective_scale(&self) -> f64 {
        if self.auto_scaling {
            self.auto_scale_factor
        } else {
            1.0
        }
    }
}

/// Read access to a window.
#[derive(Clone, Copy)]
pub struct WindowRef<'a> {
    pub(crate) app: &'a Application,
    pub(crate) id: WindowId,
    pub(crate) window: &'a Window,
}

impl<'a> WindowRef<'a> {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        self.window.visible
    }

    pub fn is_closed(&self) -> bool {
        self.window.closed
    }

    pub fn is_embed(&self) -> bool {
        self.window.embed
    }

    pub fn is_resizable(&self) -> bool {
        self.window.resizable
    }

    pub fn is_ignoring_key_repeat(&self) -> bool {
        self.window.ignore_key_repeat
    }

    pub fn uses_size_request(&self) -> bool {
        self.window.uses_size_request
    }

    /// Whether the native view was created.
    pub fn is_realized(&self) -> bool {
        self.window.view.is_some()
    }

    pub fn view(&self) -> Option<ViewHandle> {
        self.window.view
    }

    pub fn title(&self) -> &'a str {
        &self.window.title
    }

    /// Native view size, zero if the view failed to realize.
    pub fn size(&self) -> Size<u32> {
        let Some(view) = self.window.view else {
            return Size::default();
        };
        self.app.platform.size(view).unwrap_or(self.window.size)
    }

    pub fn width(&self) -> u32 {
        self.size().width
    }

    pub fn height(&self) -> u32 {
        self.size().height
    }

    pub fn offset(&self) -> IVec2 {
        self.window
            .view
            .and_then(|view| self.app.platform.offset(view))
            .unwrap_or(IVec2::ZERO)
    }

    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.app.platform.native_handle(self.window.view?)
    }

    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor
    }

    pub fn is_auto_scaling(&self) -> bool {
        self.window.auto_scaling
    }

    pub fn auto_scale_factor(&self) -> f64 {
        self.window.auto_scale_factor
    }

    /// Minimum size and keep-aspect flag; zero size when unconstrained.
    pub fn geometry_constraints(&self) -> (Size<u32>, bool) {
        (self.window.min_size, self.window.keep_aspect_ratio)
    }

    pub fn top_level_widgets(&self) -> &'a [WidgetId] {
        &self.window.top_level_widgets
    }

    pub fn modal_parent(&self) -> Option<WindowId> {
        self.window.modal.parent
    }

    pub fn modal_child(&self) -> Option<WindowId> {
        self.window.modal.child
    }

    /// Whether this window is currently running as a modal.
    pub fn is_modal(&self) -> bool {
        self.window.modal.enabled
    }

    pub fn has_pending_repaint(&self) -> bool {
        self.window.repaint.is_pending()
    }
}

impl std::fmt::Debug for WindowRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRef")
            .field("id", &self.id)
            .field("view", &self.window.view)
            .field("title", &self.window.title)
            .field("visible", &self.window.visible)
            .field("closed", &self.window.closed)
            .field("embed", &self.window.embed)
            .finish()
    }
}

/// Mutable access to a window.
pub struct WindowMut<'a> {
    pub(crate) app: &'a mut Application,
    pub(crate) id: WindowId,
}

impl<'a> WindowMut<'a> {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn as_ref(&self) -> Option<WindowRef<'_>> {
        self.app.window(self.id)
    }

    pub fn app(&mut self) -> &mut Application {
        self.app
    }

    fn state(&self) -> Option<&Window> {
        self.app.windows.get(self.id.0)
    }

    fn state_mut(&mut self) -> Option<&mut Window> {
        self.app.windows.get_mut(self.id.0)
    }

    fn view(&self) -> Option<ViewHandle> {
        self.state().and_then(|window| window.view)
    }

    pub fn set_handler(&mut self, handler: impl WindowHandler + 'static) {
        if let Some(window) = self.state_mut() {
            window.handler = Some(Box::new(handler));
        }
    }

    /// Shows the window; a closed window is counted as visible again.
    pub fn show(&mut self) {
        let Some(window) = self.state_mut() else {
            return;
        };
        if window.visible {
            tracing::debug!("window show matches current visible state, ignoring request");
            return;
        }
        if window.embed {
            tracing::debug!("window show cannot be called when embedded");
            return;
        }
        let Some(view) = window.view else {
            return;
        };

        let reopened = std::mem::replace(&mut window.closed, false);
        if reopened {
            self.app.one_window_shown();
        }
        if let Err(err) = self.app.platform.show(view) {
            tracing::warn!(%err, "failed to show window");
        }
        if let Some(window) = self.state_mut() {
            window.visible = true;
        }
        tracing::debug!(window = ?self.id, "window shown");
    }

    pub fn hide(&mut self) {
        let Some(window) = self.state() else {
            return;
        };
        if window.embed {
            tracing::debug!("window hide cannot be called when embedded");
            return;
        }
        if !window.visible {
            return;
        }
        let (modal, view) = (window.modal.enabled, window.view);

        if modal {
            self.stop_modal();
        }
        if let Some(view) = view
            && let Err(err) = self.app.platform.hide(view)
        {
            tracing::warn!(%err, "failed to hide window");
        }
        if let Some(window) = self.state_mut() {
            window.visible = false;
        }
        tracing::debug!(window = ?self.id, "window hidden");
    }

    /// Hides the window and counts it out of the application's visible windows.
    pub fn close(&mut self) {
        let Some(window) = self.state_mut() else {
            return;
        };
        if window.embed || window.closed {
            return;
        }
        window.closed = true;
        self.hide();
        self.app.one_window_closed();
    }

    /// Raises the window (unless embedded) and grabs keyboard focus.
    pub fn focus(&mut self) {
        let Some((view, embed)) = self
            .state()
            .and_then(|window| window.view.map(|view| (view, window.embed)))
        else {
            return;
        };
        if !embed {
            self.app.platform.raise(view);
        }
        self.app.platform.grab_focus(view);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if let Some(view) = self.view()
            && let Err(err) = self.app.platform.set_title(view, &title)
        {
            tracing::warn!(%err, "failed to set window title");
        }
        if let Some(window) = self.state_mut() {
            window.title = title;
        }
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        let Some(window) = self.state_mut() else {
            return;
        };
        safe_assert!(!window.embed);
        if window.resizable == resizable {
            return;
        }
        window.resizable = resizable;
        if let Some(view) = window.view
            && let Err(err) = self.app.platform.set_resizable(view, resizable)
        {
            tracing::warn!(%err, "failed to change resizable hint");
        }
    }

    pub fn set_ignoring_key_repeat(&mut self, ignore: bool) {
        let Some(window) = self.state_mut() else {
            return;
        };
        window.ignore_key_repeat = ignore;
        if let Some(view) = window.view {
            self.app.platform.set_ignore_key_repeat(view, ignore);
        }
    }

    pub fn set_offset(&mut self, x: i32, y: i32) {
        if let Some(view) = self.view()
            && let Err(err) = self.app.platform.set_offset(view, IVec2::new(x, y))
        {
            tracing::warn!(%err, "failed to move window");
        }
    }

    pub fn set_width(&mut self, width: u32) {
        let height = self.as_ref().map_or(0, |window| window.height());
        self.set_size(width, height);
    }

    pub fn set_height(&mut self, height: u32) {
        let width = self.as_ref().map_or(0, |window| window.width());
        self.set_size(width, height);
    }

    /// Requests a new size, honouring the geometry constraints.
    ///
    /// The top-level widgets are resized once the platform (or the host, for windows using size
    /// requests) answers with a configure event.
    pub fn set_size(&mut self, width: u32, height: u32) {
        safe_assert!(width > 1 && height > 1);
        let Some(window) = self.state() else {
            return;
        };

        let (mut width, mut height) = (width, height);
        if window.min_size.width != 0 && window.min_size.height != 0 {
            let mut min_width = window.min_size.width as f64;
            let mut min_height = window.min_size.height as f64;

            if window.embed && window.auto_scaling && window.scale_factor != 1.0 {
                min_width *= window.scale_factor;
                min_height *= window.scale_factor;
            }

            width = width.max(round_u32(min_width));
            height = height.max(round_u32(min_height));

            if window.keep_aspect_ratio {
                let ratio = min_width / min_height;
                let requested = width as f64 / height as f64;
                if requested > ratio {
                    width = round_u32(height as f64 * ratio);
                } else {
                    height = round_u32(width as f64 / ratio);
                }
            }
        }

        let uses_size_request = window.uses_size_request;
        let first = window.top_level_widgets.first().copied();
        let view = window.view;
        tracing::debug!(window = ?self.id, width, height, "window set size");

        if uses_size_request {
            safe_assert!(first.is_some());
            if let Some(widget) = first {
                let size = Size::new(width, height);
                dispatch::notify(self.app, widget, Notification::SizeRequest(size));
            }
        } else if let Some(view) = view
            && let Err(err) = self.app.platform.set_size(view, Size::new(width, height))
        {
            tracing::warn!(%err, "failed to resize window");
        }
    }

    /// Sets the minimum size and aspect lock.
    ///
    /// With `auto_scale` the window paints at `min(width / min_width, height / min_height)` and
    /// divides pointer positions by the same factor. `resize_now` grows the current size by the
    /// scale factor when that is not `1.0`.
    pub fn set_geometry_constraints(
        &mut self,
        min_width: u32,
        min_height: u32,
        keep_aspect_ratio: bool,
        auto_scale: bool,
        resize_now: bool,
    ) {
        safe_assert!(min_width > 0 && min_height > 0);
        let Some(window) = self.state_mut() else {
            return;
        };

        window.min_size = Size::new(min_width, min_height);
        window.keep_aspect_ratio = keep_aspect_ratio;
        window.auto_scaling = auto_scale;
        let scale = window.scale_factor;
        let view = window.view;

        if let Some(view) = view {
            let scaled = Size::new(
                round_u32(min_width as f64 * scale),
                round_u32(min_height as f64 * scale),
            );
            if let Err(err) =
                self.app
                    .platform
                    .set_geometry_constraints(view, scaled, keep_aspect_ratio)
            {
                tracing::warn!(%err, "failed to set geometry constraints");
            }
        }

        if scale != 1.0 && auto_scale && resize_now {
            let size = self.as_ref().map(|window| window.size()).unwrap_or_default();
            self.set_size(
                round_u32(size.width as f64 * scale),
                round_u32(size.height as f64 * scale),
            );
        }
    }

    /// Runs the window as a modal child of its parent.
    ///
    /// With `block_wait` (standalone applications only) this keeps idling until the window is
    /// hidden or modal mode ends; otherwise it runs one non-blocking idle iteration.
    pub fn run_as_modal(&mut self, block_wait: bool) {
        self.start_modal();

        if block_wait {
            safe_assert!(self.app.is_standalone());
            while self
                .state()
                .is_some_and(|window| window.visible && window.modal.enabled)
            {
                self.app.idle(Duration::from_millis(10));
            }
            self.stop_modal();
        } else {
            self.app.idle(Duration::ZERO);
        }
    }

    fn start_modal(&mut self) {
        let parent = self
            .state()
            .and_then(|window| window.modal.parent)
            .filter(|parent| self.app.windows.contains(parent.0));
        safe_assert!(parent.is_some(), self.show());
        let Some(parent) = parent else {
            return;
        };

        let active = self
            .app
            .windows
            .get(parent.0)
            .and_then(|window| window.modal.child);
        safe_assert!(active.is_none_or(|child| child == self.id));

        if let Some(window) = self.state_mut() {
            window.modal.enabled = true;
        }
        if let Some(parent_window) = self.app.windows.get_mut(parent.0) {
            parent_window.modal.child = Some(self.id);
        }
        tracing::debug!(window = ?self.id, ?parent, "modal started");

        if let Some(mut parent_window) = self.app.window_mut(parent) {
            parent_window.show();
        }
        self.show();
    }

    pub(crate) fn stop_modal(&mut self) {
        let Some(window) = self.state_mut() else {
            return;
        };
        window.modal.enabled = false;
        let Some(parent) = window.modal.parent else {
            return;
        };
        let Some(parent_window) = self.app.windows.get_mut(parent.0) else {
            return;
        };
        if parent_window.modal.child != Some(self.id) {
            return;
        }
        parent_window.modal.child = None;
        tracing::debug!(window = ?self.id, ?parent, "modal stopped");

        if !parent_window.closed {
            self.app.handle_motion(parent, MotionEvent::default());
            if let Some(mut parent_window) = self.app.window_mut(parent) {
                parent_window.focus();
            }
        }
    }

    /// Requests a full redraw on the next idle iteration.
    pub fn repaint(&mut self) {
        if let Some(window) = self.state_mut() {
            window.repaint.request_full();
        }
    }

    pub fn repaint_area(&mut self, area: Rect<u32>) {
        if let Some(window) = self.state_mut() {
            window.repaint.request_area(area);
        }
    }

    pub fn set_clipboard(&mut self, mime_type: &str, data: &[u8]) -> bool {
        match self.view() {
            Some(view) => self.app.platform.set_clipboard(view, mime_type, data),
            None => false,
        }
    }

    pub fn clipboard(&mut self) -> Option<ClipboardData> {
        let view = self.view()?;
        self.app.platform.clipboard(view)
    }

    pub fn set_cursor(&mut self, cursor: MouseCursor) -> bool {
        match self.view() {
            Some(view) => self.app.platform.set_cursor(view, cursor),
            None => false,
        }
    }

    /// Registers a callback driven by this window.
    ///
    /// A zero interval adds it to the application's per-iteration list instead. Returns `None`
    /// when the platform cannot start a timer.
    pub fn add_idle_callback(
        &mut self,
        interval: Duration,
        callback: impl FnMut(&mut Application) + 'static,
    ) -> Option<IdleCallbackId> {
        if interval.is_zero() {
            return Some(self.app.add_idle_callback(callback));
        }
        let view = self.view()?;
        let id = self.app.idle.add(Box::new(callback), Some(self.id));
        if self.app.platform.start_timer(view, id.raw(), interval) {
            tracing::debug!(window = ?self.id, ?id, ?interval, "timer started");
            Some(id)
        } else {
            self.app.idle.remove(id);
            None
        }
    }

    pub fn remove_idle_callback(&mut self, id: IdleCallbackId) -> bool {
        self.app.remove_idle_callback(id)
    }
}
