//! Native event intake, one entry point per event kind.
//!
//! Platform events arrive through [`Application::dispatch_native_event`]; hosts that receive
//! events themselves may call the per-kind functions directly. Input events on a window with an
//! active modal child focus the child and are dropped.

use fenestra_core::{
    geometry::Size,
    input::{CrossingMode, Modifiers},
    math::{DVec2, round_u32},
    platform::{NativeEvent, ViewHandle},
    profiling::profile_function,
    safe_assert,
};

use crate::{
    application::Application,
    compositor, dispatch,
    event::{
        BaseEvent, CharacterInputEvent, KeyboardEvent, MotionEvent, MouseEvent, PointerEvent,
        ScrollEvent,
    },
    idle::IdleCallbackId,
    widget::{EventCtx, WidgetBehavior, WidgetId},
    window::{WindowHandler, WindowId},
};

impl Application {
    /// Routes an event reported by the platform for `view`.
    ///
    /// Returns whether an input event was handled by a widget.
    pub fn dispatch_native_event(&mut self, view: ViewHandle, event: NativeEvent) -> bool {
        let Some(window) = self.window_for_view(view) else {
            tracing::trace!(?view, "event for unknown view");
            return false;
        };

        match event {
            NativeEvent::Configure { width, height } => {
                self.handle_configure(window, width, height);
                false
            }
            NativeEvent::Expose => {
                self.handle_expose(window);
                false
            }
            NativeEvent::Close => {
                self.handle_close(window);
                false
            }
            NativeEvent::Focus { focused, mode } => {
                self.handle_focus(window, focused, mode);
                false
            }
            NativeEvent::Key(key) => self.handle_keyboard(
                window,
                KeyboardEvent {
                    base: base(key.mods, key.time),
                    press: key.press,
                    key: key.key,
                    keycode: key.keycode,
                },
            ),
            NativeEvent::Text(text) => self.handle_character_input(
                window,
                CharacterInputEvent {
                    base: base(text.mods, text.time),
                    keycode: text.keycode,
                    character: text.character,
                    string: text.string,
                },
            ),
            NativeEvent::Button(button) => {
                let mut ev =
                    MouseEvent::new(button.button, button.press, DVec2::new(button.x, button.y));
                ev.base = base(button.mods, button.time);
                self.handle_mouse(window, ev)
            }
            NativeEvent::Motion(motion) => {
                let mut ev = MotionEvent::new(DVec2::new(motion.x, motion.y));
                ev.base = base(motion.mods, motion.time);
                self.handle_motion(window, ev)
            }
            NativeEvent::Scroll(scroll) => {
                let mut ev = ScrollEvent::new(
                    DVec2::new(scroll.x, scroll.y),
                    DVec2::new(scroll.dx, scroll.dy),
                    scroll.direction,
                );
                ev.base = base(scroll.mods, scroll.time);
                self.handle_scroll(window, ev)
            }
            NativeEvent::ScaleFactorChanged(scale_factor) => {
                self.handle_scale_factor_changed(window, scale_factor);
                false
            }
            NativeEvent::Timer { id } => {
                self.handle_timer(window, IdleCallbackId(id));
                false
            }
        }
    }

    fn window_handler(&mut self, window: WindowId) -> Option<&mut (dyn WindowHandler + 'static)> {
        self.windows.get_mut(window.0)?.handler.as_deref_mut()
    }

    /// Focuses the window's modal child, if it has one.
    fn redirect_to_modal_child(&mut self, window: WindowId) -> bool {
        let Some(child) = self.windows.get(window.0).and_then(|w| w.modal.child) else {
            return false;
        };
        tracing::trace!(?window, ?child, "input redirected to modal child");
        if let Some(mut child) = self.window_mut(child) {
            child.focus();
        }
        true
    }

    /// Top-level widgets, front-most first.
    fn input_order(&self, window: WindowId) -> Vec<WidgetId> {
        self.windows
            .get(window.0)
            .map(|w| w.top_level_widgets.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    /// The view was resized by the platform or the host.
    pub fn handle_configure(&mut self, window: WindowId, width: f64, height: f64) {
        profile_function!();
        safe_assert!(width > 1.0 && height > 1.0);
        let Some(state) = self.windows.get_mut(window.0) else {
            return;
        };

        if state.auto_scaling && state.min_size.is_valid() {
            let horizontal = width / state.min_size.width as f64;
            let vertical = height / state.min_size.height as f64;
            state.auto_scale_factor = horizontal.min(vertical);
        }
        let size = Size::new(round_u32(width), round_u32(height));
        state.size = size;
        let widgets = state.top_level_widgets.clone();
        tracing::debug!(?window, ?size, auto_scale = state.auto_scale_factor, "configure");

        if let Some(handler) = self.window_handler(window) {
            handler.on_reshape(size.width, size.height);
        }
        for widget in widgets {
            if let Some(mut widget) = self.widget_mut(widget) {
                widget.resize(size);
            }
        }
        if let Some(mut state) = self.window_mut(window) {
            state.repaint();
        }
    }

    /// Paints the visible top-level widgets in insertion order.
    pub fn handle_expose(&mut self, window: WindowId) {
        profile_function!();
        let Some(state) = self.windows.get(window.0) else {
            return;
        };
        let Some(view) = state.view else {
            return;
        };
        let scale = state.effective_scale();
        let widgets = state.top_level_widgets.clone();
        let cached = state.size;

        let surface = self.platform.size(view).unwrap_or(cached);
        let Some(graphics) = self.platform.graphics(view) else {
            tracing::trace!(?window, "no graphics context, skipping expose");
            return;
        };
        graphics.begin_frame(surface);
        for widget in widgets {
            compositor::display_top_level(graphics, &mut self.widgets, widget, surface, scale);
        }
    }

    /// The user asked to close the window.
    pub fn handle_close(&mut self, window: WindowId) {
        let Some(state) = self.windows.get(window.0) else {
            return;
        };
        let child = state.modal.child;

        if self.is_standalone() {
            if child.is_some() {
                self.redirect_to_modal_child(window);
                return;
            }
            if let Some(handler) = self.window_handler(window)
                && !handler.on_close()
            {
                tracing::debug!(?window, "close vetoed");
                return;
            }
        }

        let Some(mut state) = self.window_mut(window) else {
            return;
        };
        if state.as_ref().is_some_and(|w| w.is_modal()) {
            state.stop_modal();
        }
        let child = state.as_ref().and_then(|w| w.modal_child());
        if let Some(child) = child {
            if let Some(mut child) = state.app().window_mut(child) {
                child.close();
            }
            if let Some(parent) = state.app().windows.get_mut(window.0) {
                parent.modal.child = None;
            }
        }
        state.close();
    }

    pub fn handle_focus(&mut self, window: WindowId, focused: bool, mode: CrossingMode) {
        let Some(state) = self.windows.get(window.0) else {
            return;
        };
        if state.closed {
            return;
        }
        if self.redirect_to_modal_child(window) {
            return;
        }
        if let Some(handler) = self.window_handler(window) {
            handler.on_focus(focused, mode);
        }
    }

    /// Letters `A`-`Z` are lowercased and reported with the Shift modifier.
    pub fn handle_keyboard(&mut self, window: WindowId, mut ev: KeyboardEvent) -> bool {
        profile_function!();
        if self.redirect_to_modal_child(window) {
            return false;
        }
        let (key, uppercase) = ev.key.to_lowercase();
        ev.key = key;
        if uppercase {
            ev.base.mods |= Modifiers::SHIFT;
        }

        for widget in self.input_order(window) {
            if dispatch::top_level_keyboard(self, widget, &ev) {
                return true;
            }
        }
        false
    }

    pub fn handle_character_input(&mut self, window: WindowId, ev: CharacterInputEvent) -> bool {
        profile_function!();
        if self.redirect_to_modal_child(window) {
            return false;
        }
        for widget in self.input_order(window) {
            if dispatch::top_level_character_input(self, widget, &ev) {
                return true;
            }
        }
        false
    }

    pub fn handle_mouse(&mut self, window: WindowId, ev: MouseEvent) -> bool {
        self.pointer_intake(window, &ev, |b, ctx, ev| b.on_mouse(ctx, ev))
    }

    pub fn handle_motion(&mut self, window: WindowId, ev: MotionEvent) -> bool {
        self.pointer_intake(window, &ev, |b, ctx, ev| b.on_motion(ctx, ev))
    }

    pub fn handle_scroll(&mut self, window: WindowId, ev: ScrollEvent) -> bool {
        self.pointer_intake(window, &ev, |b, ctx, ev| b.on_scroll(ctx, ev))
    }

    fn pointer_intake<E: PointerEvent>(
        &mut self,
        window: WindowId,
        ev: &E,
        deliver: impl Fn(&mut dyn WidgetBehavior, &mut EventCtx<'_>, &E) -> bool,
    ) -> bool {
        profile_function!();
        if self.redirect_to_modal_child(window) {
            return false;
        }
        for widget in self.input_order(window) {
            if dispatch::top_level_pointer(self, widget, ev, &deliver) {
                return true;
            }
        }
        false
    }

    /// Applies a new desktop scale factor and forwards the scaled constraints.
    pub fn handle_scale_factor_changed(&mut self, window: WindowId, scale_factor: f64) {
        safe_assert!(scale_factor > 0.0);
        let Some(state) = self.windows.get_mut(window.0) else {
            return;
        };
        if state.scale_factor == scale_factor {
            return;
        }
        state.scale_factor = scale_factor;
        let (min_size, keep_aspect_ratio, view) =
            (state.min_size, state.keep_aspect_ratio, state.view);
        tracing::debug!(?window, scale_factor, "scale factor changed");

        if min_size.is_valid()
            && let Some(view) = view
        {
            let scaled = Size::new(
                round_u32(min_size.width as f64 * scale_factor),
                round_u32(min_size.height as f64 * scale_factor),
            );
            if let Err(err) =
                self.platform
                    .set_geometry_constraints(view, scaled, keep_aspect_ratio)
            {
                tracing::warn!(%err, "failed to update geometry constraints");
            }
        }
        if let Some(handler) = self.window_handler(window) {
            handler.on_scale_factor_changed(scale_factor);
        }
        if let Some(mut state) = self.window_mut(window) {
            state.repaint();
        }
    }

    /// Runs the timed idle callback registered under `id` on `window`.
    pub fn handle_timer(&mut self, window: WindowId, id: IdleCallbackId) {
        if self.idle.timer_window(id) != Some(window) {
            tracing::trace!(?window, ?id, "timer without callback");
            return;
        }
        if let Some(mut callback) = self.idle.take(id) {
            callback(self);
            self.idle.restore(id, callback);
        }
    }
}

fn base(mods: Modifiers, time: u32) -> BaseEvent {
    BaseEvent {
        mods,
        time,
        ..BaseEvent::default()
    }
}
