//! The application: owner of every window and widget, and driver of the event loop.

use std::time::{Duration, Instant};

use fenestra_core::{
    alloc::{HashMap, sparse_set::SparseSet},
    geometry::Size,
    platform::{NativeHandle, Platform, ViewDescriptor, ViewHandle},
    profiling::{self, profile_function, profile_scope},
    safe_assert,
};

use crate::{
    config::{AppConfig, DEFAULT_WINDOW_SIZE, EmbedDescriptor, WindowDescriptor},
    idle::{IdleCallbackId, IdleCallbacks},
    tree::WidgetTree,
    widget::{WidgetBehavior, WidgetId, WidgetMut, WidgetRef},
    window::{Modal, RepaintState, Window, WindowId, WindowMut, WindowRef},
};

struct WindowInit {
    title: String,
    size: Size<u32>,
    resizable: bool,
    ignore_key_repeat: bool,
    uses_size_request: bool,
    embed_parent: Option<NativeHandle>,
    host_scale_factor: f64,
    modal_parent: Option<WindowId>,
}

/// Single-threaded owner of the platform, the windows and the widget tree.
///
/// ```
/// use std::time::Duration;
///
/// use fenestra_test_utils::MockPlatform;
/// use fenestra_ui::{Application, NoBehavior, WindowDescriptor};
///
/// let mut app = Application::new(MockPlatform::new());
/// let window = app.create_window(WindowDescriptor::new("demo", 320, 200));
/// let root = app.add_top_level_widget(window, NoBehavior);
/// assert!(root.is_some());
///
/// if let Some(mut window) = app.window_mut(window) {
///     window.show();
///     window.close();
/// }
/// app.idle(Duration::ZERO);
/// assert!(app.is_quitting());
/// ```
pub struct Application {
    pub(crate) platform: Box<dyn Platform>,
    pub(crate) widgets: WidgetTree,
    pub(crate) windows: SparseSet<Window>,
    /// Creation order.
    pub(crate) window_order: Vec<WindowId>,
    pub(crate) views: HashMap<ViewHandle, WindowId>,
    pub(crate) idle: IdleCallbacks,
    config: AppConfig,
    quitting: bool,
    starting: bool,
    visible_windows: u32,
    start: Instant,
}

impl Application {
    pub fn new(platform: impl Platform + 'static) -> Self {
        Self::with_config(platform, AppConfig::default())
    }

    pub fn with_config(platform: impl Platform + 'static, config: AppConfig) -> Self {
        let mut platform: Box<dyn Platform> = Box::new(platform);
        if let Some(name) = &config.class_name {
            platform.set_class_name(name);
        }
        tracing::debug!(standalone = config.standalone, "application created");
        Self {
            platform,
            widgets: WidgetTree::new(),
            windows: SparseSet::default(),
            window_order: Vec::new(),
            views: HashMap::default(),
            idle: IdleCallbacks::default(),
            config,
            quitting: false,
            starting: true,
            visible_windows: 0,
            start: Instant::now(),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.config.standalone
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// True until the first window is shown.
    pub fn is_starting(&self) -> bool {
        self.starting
    }

    pub fn visible_window_count(&self) -> u32 {
        self.visible_windows
    }

    /// Seconds since the application was created.
    pub fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn set_class_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.platform.set_class_name(&name);
        self.config.class_name = Some(name);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn widgets(&self) -> &WidgetTree {
        &self.widgets
    }

    /// Windows in creation order.
    pub fn window_ids(&self) -> &[WindowId] {
        &self.window_order
    }

    pub fn window(&self, id: WindowId) -> Option<WindowRef<'_>> {
        self.windows.get(id.0).map(|window| WindowRef {
            app: self,
            id,
            window,
        })
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<WindowMut<'_>> {
        if !self.windows.contains(id.0) {
            return None;
        }
        Some(WindowMut { app: self, id })
    }

    /// Window owning a native view.
    pub fn window_for_view(&self, view: ViewHandle) -> Option<WindowId> {
        self.views.get(&view).copied()
    }

    pub fn widget(&self, id: WidgetId) -> Option<WidgetRef<'_>> {
        self.widgets.get(id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<WidgetMut<'_>> {
        if !self.widgets.contains(id) {
            return None;
        }
        Some(WidgetMut { app: self, id })
    }

    /// Creates and realizes a standalone window. It starts hidden.
    pub fn create_window(&mut self, descriptor: WindowDescriptor) -> WindowId {
        self.insert_window(WindowInit {
            title: descriptor.title,
            size: descriptor.size,
            resizable: descriptor.resizable,
            ignore_key_repeat: descriptor.ignore_key_repeat,
            uses_size_request: descriptor.uses_size_request,
            embed_parent: None,
            host_scale_factor: 0.0,
            modal_parent: None,
        })
    }

    /// Creates a window that can run as a modal child of `parent`.
    pub fn create_modal_window(
        &mut self,
        parent: WindowId,
        descriptor: WindowDescriptor,
    ) -> WindowId {
        let modal_parent = self.windows.contains(parent.0).then_some(parent);
        if modal_parent.is_none() {
            tracing::warn!(?parent, "modal parent does not exist");
        }
        self.insert_window(WindowInit {
            title: descriptor.title,
            size: descriptor.size,
            resizable: descriptor.resizable,
            ignore_key_repeat: descriptor.ignore_key_repeat,
            uses_size_request: descriptor.uses_size_request,
            embed_parent: None,
            host_scale_factor: 0.0,
            modal_parent,
        })
    }

    /// Creates a window inside a host-provided native view. It is visible immediately.
    pub fn create_embedded_window(&mut self, descriptor: EmbedDescriptor) -> WindowId {
        self.insert_window(WindowInit {
            title: String::new(),
            size: descriptor.size,
            resizable: descriptor.resizable,
            ignore_key_repeat: false,
            uses_size_request: descriptor.uses_size_request,
            embed_parent: Some(descriptor.parent),
            host_scale_factor: descriptor.scale_factor,
            modal_parent: None,
        })
    }

    fn insert_window(&mut self, init: WindowInit) -> WindowId {
        let transient_for = init
            .modal_parent
            .and_then(|parent| self.windows.get(parent.0))
            .and_then(|parent| parent.view);
        let size = if init.size.is_valid() {
            init.size
        } else {
            DEFAULT_WINDOW_SIZE
        };
        let embed = init.embed_parent.is_some();

        let descriptor = ViewDescriptor {
            title: init.title.clone(),
            size,
            resizable: init.resizable,
            ignore_key_repeat: init.ignore_key_repeat,
            parent: init.embed_parent,
            transient_for,
        };
        let view = match self.platform.create_view(&descriptor) {
            Ok(view) => Some(view),
            Err(err) => {
                tracing::warn!(%err, "failed to realize native view, the window will not be functional");
                None
            }
        };

        let scale_factor =
            self.initial_scale_factor(view, embed, init.host_scale_factor, init.modal_parent);
        let id = WindowId(self.windows.push(Window {
            view,
            embed,
            visible: embed && view.is_some(),
            closed: !embed,
            uses_size_request: init.uses_size_request,
            size,
            title: init.title,
            resizable: init.resizable,
            ignore_key_repeat: init.ignore_key_repeat,
            scale_factor,
            auto_scaling: false,
            auto_scale_factor: 1.0,
            min_size: Size::default(),
            keep_aspect_ratio: false,
            modal: Modal {
                parent: init.modal_parent,
                ..Modal::default()
            },
            top_level_widgets: Vec::new(),
            repaint: RepaintState::default(),
            handler: None,
        }));
        self.window_order.push(id);

        if let Some(view) = view {
            self.views.insert(view, id);
            if embed {
                self.one_window_shown();
                if let Err(err) = self.platform.show(view) {
                    tracing::warn!(%err, "failed to show embedded view");
                }
            }
        }
        tracing::debug!(window = ?id, ?view, embed, scale_factor, "window created");
        id
    }

    fn initial_scale_factor(
        &self,
        view: Option<ViewHandle>,
        embed: bool,
        host_scale_factor: f64,
        modal_parent: Option<WindowId>,
    ) -> f64 {
        if embed && host_scale_factor > 0.0 {
            return host_scale_factor;
        }
        if let Some(parent) = modal_parent.and_then(|parent| self.windows.get(parent.0)) {
            return parent.scale_factor;
        }
        if !embed && let Some(factor) = self.config.scale_factor_override {
            return factor;
        }
        view.and_then(|view| self.platform.desktop_scale_factor(view))
            .filter(|factor| *factor > 0.0)
            .unwrap_or(1.0)
    }

    /// Closes the window, stops its timers, releases its native view and removes its widgets.
    pub fn destroy_window(&mut self, id: WindowId) {
        if let Some(mut window) = self.window_mut(id) {
            window.close();
        }
        let Some(window) = self.windows.remove(id.0) else {
            return;
        };

        if window.embed && window.visible {
            self.one_window_closed();
        }
        for callback in self.idle.remove_window(id) {
            if let Some(view) = window.view {
                self.platform.stop_timer(view, callback.raw());
            }
        }
        if let Some(view) = window.view {
            self.views.remove(&view);
            self.platform.destroy_view(view);
        }
        for widget in &window.top_level_widgets {
            self.widgets.remove(*widget);
        }

        self.window_order.retain(|other| *other != id);
        for other in &self.window_order {
            if let Some(other) = self.windows.get_mut(other.0) {
                if other.modal.child == Some(id) {
                    other.modal.child = None;
                }
                if other.modal.parent == Some(id) {
                    other.modal.parent = None;
                }
            }
        }
        tracing::debug!(window = ?id, "window destroyed");
    }

    /// Mounts a top-level widget on `window`.
    ///
    /// It takes the size of the window's first top-level widget, or the window size for the first.
    pub fn add_top_level_widget(
        &mut self,
        window: WindowId,
        behavior: impl WidgetBehavior,
    ) -> Option<WidgetId> {
        let first = self.windows.get(window.0)?.top_level_widgets.first().copied();
        let size = match first.and_then(|first| self.widgets.node(first)) {
            Some(node) => node.size,
            None => self.window(window)?.size(),
        };
        let id = self
            .widgets
            .insert_top_level(window, size, Box::new(behavior));
        self.windows.get_mut(window.0)?.top_level_widgets.push(id);
        tracing::debug!(widget = ?id, ?window, "top-level widget added");
        Some(id)
    }

    /// Adds a sub-widget in front of `parent`'s existing children.
    pub fn add_sub_widget(
        &mut self,
        parent: WidgetId,
        behavior: impl WidgetBehavior,
    ) -> Option<WidgetId> {
        let id = self.widgets.insert_sub(parent, Box::new(behavior))?;
        tracing::trace!(widget = ?id, ?parent, "sub-widget added");
        Some(id)
    }

    /// Removes a widget and its subtree.
    pub fn remove_widget(&mut self, id: WidgetId) -> bool {
        let Some(window) = self.widgets.node(id).map(|node| node.window) else {
            return false;
        };
        let removed = self.widgets.remove(id);
        if let Some(window) = self.windows.get_mut(window.0) {
            window
                .top_level_widgets
                .retain(|widget| !removed.contains(widget));
        }
        tracing::debug!(widget = ?id, count = removed.len(), "widget removed");
        true
    }

    /// First widget below `root` (inclusive) with numeric id `id`.
    pub fn find_widget_by_id(&self, root: WidgetId, id: u32) -> Option<WidgetId> {
        self.widgets.find_by_id(root, id)
    }

    /// Adds a callback run once per idle iteration, after event delivery.
    pub fn add_idle_callback(
        &mut self,
        callback: impl FnMut(&mut Application) + 'static,
    ) -> IdleCallbackId {
        self.idle.add(Box::new(callback), None)
    }

    /// Removes an idle callback, stopping its timer if it is timed.
    pub fn remove_idle_callback(&mut self, id: IdleCallbackId) -> bool {
        match self.idle.remove(id) {
            Some(Some(window)) => {
                if let Some(view) = self.windows.get(window.0).and_then(|window| window.view) {
                    self.platform.stop_timer(view, id.raw());
                }
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    /// Runs one loop iteration.
    ///
    /// Waits up to `timeout` for native events (never in a plugin), delivers them, runs the idle
    /// callbacks in registration order and flushes pending repaints.
    pub fn idle(&mut self, timeout: Duration) {
        profile_function!();
        let timeout = if self.config.standalone {
            timeout
        } else {
            Duration::ZERO
        };

        let events = {
            profile_scope!("platform_update");
            self.platform.update(timeout)
        };
        for (view, event) in events {
            self.dispatch_native_event(view, event);
        }

        self.run_idle_callbacks();
        self.flush_repaints();
        profiling::new_frame();
    }

    /// Idles until the application quits. Standalone applications only.
    pub fn exec(&mut self, idle_timeout: Duration) {
        safe_assert!(self.config.standalone);
        while !self.quitting {
            self.idle(idle_timeout);
        }
    }

    /// Marks the application as quitting and closes every window, newest first.
    pub fn quit(&mut self) {
        tracing::debug!("application quit requested");
        self.quitting = true;
        for id in self.window_order.clone().into_iter().rev() {
            if let Some(mut window) = self.window_mut(id) {
                window.close();
            }
        }
    }

    fn run_idle_callbacks(&mut self) {
        profile_function!();
        for id in self.idle.untimed() {
            if let Some(mut callback) = self.idle.take(id) {
                callback(self);
                self.idle.restore(id, callback);
            }
        }
    }

    fn flush_repaints(&mut self) {
        for id in &self.window_order {
            let Some(window) = self.windows.get_mut(id.0) else {
                continue;
            };
            let Some(damage) = window.repaint.take() else {
                continue;
            };
            if let Some(view) = window.view {
                tracing::trace!(window = ?id, ?damage, "post redisplay");
                self.platform.post_redisplay(view, &damage);
            }
        }
    }

    pub(crate) fn one_window_shown(&mut self) {
        self.visible_windows += 1;
        if self.visible_windows == 1 {
            self.quitting = false;
            self.starting = false;
        }
    }

    pub(crate) fn one_window_closed(&mut self) {
        safe_assert!(self.visible_windows != 0);
        self.visible_windows -= 1;
        if self.visible_windows == 0 {
            tracing::debug!("last window closed");
            self.quitting = true;
        }
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        for id in self.window_order.clone().into_iter().rev() {
            self.destroy_window(id);
        }
        safe_assert!(self.visible_windows == 0);
    }
}
