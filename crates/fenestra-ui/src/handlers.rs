//! Reusable interaction state machines for widget behaviors.
//!
//! The handlers own no widget; a behavior forwards its input hooks to them and reacts to the
//! returned response.
//!
//! ```
//! use fenestra_ui::{ButtonEventHandler, ButtonResponse, EventCtx, MotionEvent, MouseEvent, WidgetBehavior};
//!
//! #[derive(Default)]
//! struct Toggle {
//!     handler: ButtonEventHandler,
//!     clicks: u32,
//! }
//!
//! impl WidgetBehavior for Toggle {
//!     fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> bool {
//!         let response = self.handler.mouse_event(ctx, ev);
//!         if let ButtonResponse::Clicked(_) = response {
//!             self.clicks += 1;
//!         }
//!         response.is_handled()
//!     }
//!
//!     fn on_motion(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> bool {
//!         self.handler.motion_event(ctx, ev)
//!     }
//! }
//! ```

use fenestra_core::{
    geometry::{Rect, Size},
    math::{DVec2, IVec2},
    safe_assert,
};

use crate::{
    event::{Modifiers, MotionEvent, MouseButton, MouseEvent, ScrollEvent},
    widget::EventCtx,
};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonState: u8 {
        const HOVER = 1 << 0;
        const ACTIVE = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonResponse {
    Ignored,
    Handled,
    /// Released over the widget after being pressed on it.
    Clicked(MouseButton),
}

impl ButtonResponse {
    pub fn is_handled(self) -> bool {
        !matches!(self, ButtonResponse::Ignored)
    }
}

/// Press/release click detection with hover tracking and an optional checked toggle.
#[derive(Debug, Clone, Default)]
pub struct ButtonEventHandler {
    button: Option<MouseButton>,
    state: ButtonState,
    checkable: bool,
    checked: bool,
    last_click_pos: DVec2,
    last_motion_pos: DVec2,
}

impl ButtonEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn clear_state(&mut self) {
        self.state = ButtonState::empty();
    }

    pub fn is_active(&self) -> bool {
        self.state.contains(ButtonState::ACTIVE)
    }

    /// Returns whether the state changed.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.is_active() == active {
            return false;
        }
        self.state.set(ButtonState::ACTIVE, active);
        true
    }

    pub fn is_checkable(&self) -> bool {
        self.checkable
    }

    pub fn set_checkable(&mut self, checkable: bool) {
        self.checkable = checkable;
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Returns whether the state changed.
    pub fn set_checked(&mut self, checked: bool) -> bool {
        if self.checked == checked {
            return false;
        }
        self.checked = checked;
        true
    }

    pub fn last_click_position(&self) -> DVec2 {
        self.last_click_pos
    }

    pub fn last_motion_position(&self) -> DVec2 {
        self.last_motion_pos
    }

    pub fn mouse_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> ButtonResponse {
        self.last_click_pos = ev.pos;

        if let Some(button) = self.button
            && !ev.press
        {
            self.button = None;
            self.state.remove(ButtonState::ACTIVE);
            ctx.repaint();

            // released outside the bounds, no click
            if !ctx.contains(ev.pos) {
                return ButtonResponse::Handled;
            }
            if self.checkable {
                self.checked = !self.checked;
            }
            return ButtonResponse::Clicked(button);
        }

        if ev.press && ctx.contains(ev.pos) {
            self.button = Some(ev.button);
            self.state.insert(ButtonState::ACTIVE);
            ctx.repaint();
            return ButtonResponse::Handled;
        }

        ButtonResponse::Ignored
    }

    /// Tracks hover; returns `true` while a press is held or when hover changed from inside.
    pub fn motion_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> bool {
        if self.button.is_some() {
            self.last_motion_pos = ev.pos;
            return true;
        }

        let inside = ctx.contains(ev.pos);
        let hovering = self.state.contains(ButtonState::HOVER);
        let mut handled = false;
        if inside != hovering {
            self.state.set(ButtonState::HOVER, inside);
            handled = ctx.contains(self.last_motion_pos);
            ctx.repaint();
        }

        self.last_motion_pos = ev.pos;
        handled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KnobOrientation {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnobResponse {
    Ignored,
    Handled,
    DragStarted,
    DragFinished,
    ValueChanged(f32),
}

impl KnobResponse {
    pub fn is_handled(self) -> bool {
        !matches!(self, KnobResponse::Ignored)
    }
}

/// Maps linear pointer drags and scroll steps to a value in `[minimum, maximum]`.
///
/// A full sweep takes 200 pixels, or 2000 with Control held. Shift-click resets to the default
/// value when one is set.
#[derive(Debug, Clone)]
pub struct KnobEventHandler {
    minimum: f32,
    maximum: f32,
    step: f32,
    value: f32,
    default: Option<f32>,
    /// Unsnapped value the drag accumulates into.
    value_tmp: f32,
    using_log: bool,
    orientation: KnobOrientation,
    dragging: bool,
    last_pos: DVec2,
}

impl Default for KnobEventHandler {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 1.0,
            step: 0.0,
            value: 0.5,
            default: None,
            value_tmp: 0.5,
            using_log: false,
            orientation: KnobOrientation::default(),
            dragging: false,
            last_pos: DVec2::ZERO,
        }
    }
}

impl KnobEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Returns whether the value changed.
    pub fn set_value(&mut self, value: f32) -> bool {
        if (self.value - value).abs() < f32::EPSILON {
            return false;
        }
        self.value = value;
        self.value_tmp = value;
        true
    }

    pub fn normalized_value(&self) -> f32 {
        let value = if self.using_log {
            self.inverse_log_scale(self.value)
        } else {
            self.value
        };
        (value - self.minimum) / (self.maximum - self.minimum)
    }

    pub fn range(&self) -> (f32, f32) {
        (self.minimum, self.maximum)
    }

    /// Sets the range, clamping the current value into it. Returns whether the value changed.
    pub fn set_range(&mut self, minimum: f32, maximum: f32) -> bool {
        safe_assert!(maximum > minimum, false);
        let clamped = self.value.clamp(minimum, maximum);
        self.minimum = minimum;
        self.maximum = maximum;
        self.set_value(clamped)
    }

    pub fn set_default(&mut self, default: f32) {
        self.default = Some(default);
    }

    pub fn set_step(&mut self, step: f32) {
        self.step = step;
    }

    pub fn set_using_log_scale(&mut self, using_log: bool) {
        self.using_log = using_log;
    }

    pub fn orientation(&self) -> KnobOrientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: KnobOrientation) {
        self.orientation = orientation;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn log_scale(&self, value: f32) -> f32 {
        let b = (self.maximum / self.minimum).ln() / (self.maximum - self.minimum);
        let a = self.maximum / (self.maximum * b).exp();
        a * (b * value).exp()
    }

    fn inverse_log_scale(&self, value: f32) -> f32 {
        let b = (self.maximum / self.minimum).ln() / (self.maximum - self.minimum);
        let a = self.maximum / (self.maximum * b).exp();
        (value / a).ln() / b
    }

    fn divisor(mods: Modifiers) -> f32 {
        if mods.contains(Modifiers::CONTROL) {
            2000.0
        } else {
            200.0
        }
    }

    /// Applies a linear change to the unsnapped value and returns the response.
    fn apply_delta(&mut self, delta: f32) -> KnobResponse {
        let base = if self.using_log {
            self.inverse_log_scale(self.value_tmp)
        } else {
            self.value_tmp
        };
        let mut value = base + delta;
        if self.using_log {
            value = self.log_scale(value);
        }

        if value < self.minimum {
            value = self.minimum;
            self.value_tmp = value;
        } else if value > self.maximum {
            value = self.maximum;
            self.value_tmp = value;
        } else {
            self.value_tmp = value;
            value = snap_to_step(value, self.step);
        }

        let tmp = self.value_tmp;
        let changed = self.set_value(value);
        self.value_tmp = tmp;
        if changed {
            KnobResponse::ValueChanged(self.value)
        } else {
            KnobResponse::Handled
        }
    }

    pub fn mouse_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> KnobResponse {
        if ev.button != MouseButton::Left {
            return KnobResponse::Ignored;
        }

        if ev.press {
            if !ctx.contains(ev.pos) {
                return KnobResponse::Ignored;
            }
            if ev.base.mods.contains(Modifiers::SHIFT)
                && let Some(default) = self.default
            {
                ctx.repaint();
                return if self.set_value(default) {
                    KnobResponse::ValueChanged(default)
                } else {
                    KnobResponse::Handled
                };
            }
            self.dragging = true;
            self.last_pos = ev.pos;
            ctx.repaint();
            return KnobResponse::DragStarted;
        }

        if self.dragging {
            self.dragging = false;
            ctx.repaint();
            return KnobResponse::DragFinished;
        }

        KnobResponse::Ignored
    }

    pub fn motion_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> KnobResponse {
        if !self.dragging {
            return KnobResponse::Ignored;
        }

        let movement = match self.orientation {
            KnobOrientation::Horizontal => ev.pos.x - self.last_pos.x,
            KnobOrientation::Vertical => self.last_pos.y - ev.pos.y,
        };
        if movement == 0.0 {
            return KnobResponse::Ignored;
        }

        let span = self.maximum - self.minimum;
        let response = self.apply_delta(span / Self::divisor(ev.base.mods) * movement as f32);
        self.last_pos = ev.pos;
        if matches!(response, KnobResponse::ValueChanged(_)) {
            ctx.repaint();
        }
        response
    }

    pub fn scroll_event(&mut self, ctx: &mut EventCtx<'_>, ev: &ScrollEvent) -> KnobResponse {
        if !ctx.contains(ev.pos) {
            return KnobResponse::Ignored;
        }

        let direction = if ev.delta.y > 0.0 { 1.0 } else { -1.0 };
        let span = self.maximum - self.minimum;
        let response = self.apply_delta(span / Self::divisor(ev.base.mods) * 10.0 * direction);
        if matches!(response, KnobResponse::ValueChanged(_)) {
            ctx.repaint();
        }
        response
    }
}

/// Rounds `value` to the nearest multiple of `step`; a zero step leaves it untouched.
fn snap_to_step(value: f32, step: f32) -> f32 {
    if step == 0.0 {
        return value;
    }
    let rest = value % step;
    value - rest + if rest > step / 2.0 { step } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderResponse {
    Ignored,
    Handled,
    /// Pressed inside the track; carries the new value when the press moved the handle.
    DragStarted(Option<f32>),
    DragFinished,
    ValueChanged(f32),
}

impl SliderResponse {
    pub fn is_handled(self) -> bool {
        !matches!(self, SliderResponse::Ignored)
    }
}

/// Maps pointer positions along a straight track to a value in `[minimum, maximum]`.
///
/// The handle travels from its start to its end position. A track whose two positions share
/// the same `y` is horizontal, anything else is vertical. Pressing inside the track jumps the
/// handle under the pointer and starts a drag; dragging past either end pins the value to that
/// end. Positions are in the widget's local coordinates.
#[derive(Debug, Clone)]
pub struct SliderEventHandler {
    minimum: f32,
    maximum: f32,
    step: f32,
    value: f32,
    default: Option<f32>,
    inverted: bool,
    dragging: bool,
    start_pos: IVec2,
    end_pos: IVec2,
    handle_size: Size<u32>,
    area: Rect<f64>,
}

impl Default for SliderEventHandler {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 1.0,
            step: 0.0,
            value: 0.5,
            default: None,
            inverted: false,
            dragging: false,
            start_pos: IVec2::ZERO,
            end_pos: IVec2::ZERO,
            handle_size: Size::default(),
            area: Rect::default(),
        }
    }
}

impl SliderEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Returns whether the value changed.
    pub fn set_value(&mut self, value: f32) -> bool {
        if (self.value - value).abs() < f32::EPSILON {
            return false;
        }
        self.value = value;
        true
    }

    pub fn range(&self) -> (f32, f32) {
        (self.minimum, self.maximum)
    }

    /// Sets the range, clamping the current value into it. Returns whether the value changed.
    pub fn set_range(&mut self, minimum: f32, maximum: f32) -> bool {
        safe_assert!(maximum > minimum, false);
        let clamped = self.value.clamp(minimum, maximum);
        self.minimum = minimum;
        self.maximum = maximum;
        self.set_value(clamped)
    }

    pub fn set_default(&mut self, default: f32) {
        self.default = Some(default);
    }

    pub fn set_step(&mut self, step: f32) {
        self.step = step;
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Inverted sliders put the maximum at the start position.
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_start_pos(&mut self, x: i32, y: i32) {
        self.start_pos = IVec2::new(x, y);
        self.update_area();
    }

    pub fn set_end_pos(&mut self, x: i32, y: i32) {
        self.end_pos = IVec2::new(x, y);
        self.update_area();
    }

    /// Size of the draggable handle; the track extends past the end position by this much.
    pub fn set_handle_size(&mut self, width: u32, height: u32) {
        self.handle_size = Size::new(width, height);
        self.update_area();
    }

    /// Region that accepts presses.
    pub fn area(&self) -> Rect<f64> {
        self.area
    }

    pub fn is_horizontal(&self) -> bool {
        self.start_pos.y == self.end_pos.y
    }

    fn update_area(&mut self) {
        let (start, end) = (self.start_pos, self.end_pos);
        let handle = self.handle_size;
        self.area = if self.is_horizontal() {
            Rect::new(
                start.x as f64,
                start.y as f64,
                (end.x + handle.width as i32 - start.x) as f64,
                handle.height as f64,
            )
        } else {
            Rect::new(
                start.x as f64,
                start.y as f64,
                handle.width as f64,
                (end.y + handle.height as i32 - start.y) as f64,
            )
        };
    }

    /// Top-left corner the handle should be drawn at for the current value.
    pub fn handle_position(&self) -> IVec2 {
        let normalized = (self.value - self.minimum) / (self.maximum - self.minimum);
        let (start, end) = (self.start_pos, self.end_pos);
        let offset = |from: i32, to: i32| (normalized * (to - from) as f32) as i32;

        if self.is_horizontal() {
            let x = if self.inverted {
                end.x - offset(start.x, end.x)
            } else {
                start.x + offset(start.x, end.x)
            };
            IVec2::new(x, start.y)
        } else {
            let y = if self.inverted {
                end.y - offset(start.y, end.y)
            } else {
                start.y + offset(start.y, end.y)
            };
            IVec2::new(start.x, y)
        }
    }

    /// Value under `pos`, clamped to the range and snapped to the step.
    fn value_at(&self, pos: DVec2) -> f32 {
        let fraction = if self.is_horizontal() {
            ((pos.x - self.area.x) / self.area.width) as f32
        } else {
            ((pos.y - self.area.y) / self.area.height) as f32
        };

        let span = self.maximum - self.minimum;
        let value = if self.inverted {
            self.maximum - fraction * span
        } else {
            self.minimum + fraction * span
        };

        if value < self.minimum {
            self.minimum
        } else if value > self.maximum {
            self.maximum
        } else {
            snap_to_step(value, self.step)
        }
    }

    /// Value for a drag that left the track, pinned to the end it left through.
    fn value_beyond(&self, pos: DVec2) -> f32 {
        let before = if self.is_horizontal() {
            pos.x < self.area.x
        } else {
            pos.y < self.area.y
        };
        if before != self.inverted {
            self.minimum
        } else {
            self.maximum
        }
    }

    pub fn mouse_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> SliderResponse {
        if ev.button != MouseButton::Left {
            return SliderResponse::Ignored;
        }

        if ev.press {
            if !self.area.contains(ev.pos.x, ev.pos.y) {
                return SliderResponse::Ignored;
            }
            if ev.base.mods.contains(Modifiers::SHIFT)
                && let Some(default) = self.default
            {
                ctx.repaint();
                return if self.set_value(default) {
                    SliderResponse::ValueChanged(default)
                } else {
                    SliderResponse::Handled
                };
            }

            self.dragging = true;
            let changed = self.set_value(self.value_at(ev.pos));
            ctx.repaint();
            return SliderResponse::DragStarted(changed.then_some(self.value));
        }

        if self.dragging {
            self.dragging = false;
            return SliderResponse::DragFinished;
        }

        SliderResponse::Ignored
    }

    /// Follows the pointer while a drag is in progress.
    pub fn motion_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MotionEvent) -> SliderResponse {
        if !self.dragging {
            return SliderResponse::Ignored;
        }

        let on_track = if self.is_horizontal() {
            ev.pos.x >= self.area.x && ev.pos.x < self.area.x + self.area.width
        } else {
            ev.pos.y >= self.area.y && ev.pos.y < self.area.y + self.area.height
        };
        let value = if on_track {
            self.value_at(ev.pos)
        } else {
            self.value_beyond(ev.pos)
        };

        if !self.set_value(value) {
            return SliderResponse::Handled;
        }
        ctx.repaint();
        SliderResponse::ValueChanged(self.value)
    }
}

/// Two-state toggle flipped by any press inside the widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchEventHandler {
    down: bool,
}

impl SwitchEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Returns whether the state changed.
    pub fn set_down(&mut self, down: bool) -> bool {
        if self.down == down {
            return false;
        }
        self.down = down;
        true
    }

    /// Returns the new state when the press toggled the switch.
    pub fn mouse_event(&mut self, ctx: &mut EventCtx<'_>, ev: &MouseEvent) -> Option<bool> {
        if !ev.press || !ctx.contains(ev.pos) {
            return None;
        }
        self.down = !self.down;
        ctx.repaint();
        Some(self.down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knob_range_clamps_value() {
        let mut knob = KnobEventHandler::new();
        assert!(knob.set_value(0.9));
        assert!(knob.set_range(0.0, 0.5));
        assert_eq!(knob.value(), 0.5);
        assert!(!knob.set_range(1.0, 0.0));
        assert_eq!(knob.range(), (0.0, 0.5));
    }

    #[test]
    fn knob_delta_snaps_to_step() {
        let mut knob = KnobEventHandler::new();
        knob.set_step(0.25);
        knob.set_value(0.0);
        assert_eq!(knob.apply_delta(0.2), KnobResponse::ValueChanged(0.25));
        assert_eq!(knob.apply_delta(5.0), KnobResponse::ValueChanged(1.0));
        assert_eq!(knob.apply_delta(5.0), KnobResponse::Handled);
    }

    #[test]
    fn knob_normalized_value() {
        let mut knob = KnobEventHandler::new();
        knob.set_range(10.0, 20.0);
        knob.set_value(15.0);
        assert!((knob.normalized_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn step_snapping_rounds_to_nearest() {
        assert_eq!(snap_to_step(0.3, 0.0), 0.3);
        assert_eq!(snap_to_step(1.0, 0.5), 1.0);
        assert!((snap_to_step(1.3, 0.5) - 1.5).abs() < 1e-6);
        assert!((snap_to_step(1.2, 0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn slider_area_follows_orientation() {
        let mut slider = SliderEventHandler::new();
        slider.set_handle_size(10, 6);
        slider.set_start_pos(5, 2);
        slider.set_end_pos(85, 2);
        assert!(slider.is_horizontal());
        assert_eq!(slider.area(), Rect::new(5.0, 2.0, 90.0, 6.0));

        slider.set_end_pos(5, 60);
        assert!(!slider.is_horizontal());
        assert_eq!(slider.area(), Rect::new(5.0, 2.0, 10.0, 64.0));
    }

    #[test]
    fn slider_range_clamps_value() {
        let mut slider = SliderEventHandler::new();
        assert!(slider.set_range(0.6, 2.0));
        assert_eq!(slider.value(), 0.6);
        assert!(!slider.set_range(2.0, 2.0));
        assert_eq!(slider.range(), (0.6, 2.0));
    }

    #[test]
    fn slider_handle_position_tracks_value() {
        let mut slider = SliderEventHandler::new();
        slider.set_start_pos(0, 0);
        slider.set_end_pos(0, 90);
        slider.set_value(0.75);
        assert_eq!(slider.handle_position(), IVec2::new(0, 67));
        slider.set_inverted(true);
        assert_eq!(slider.handle_position(), IVec2::new(0, 23));
    }

    #[test]
    fn switch_set_down_reports_changes() {
        let mut switch = SwitchEventHandler::new();
        assert!(switch.set_down(true));
        assert!(!switch.set_down(true));
        assert!(switch.is_down());
    }

    #[test]
    fn button_flags() {
        let mut button = ButtonEventHandler::new();
        assert!(button.set_active(true));
        assert!(!button.set_active(true));
        assert_eq!(button.state(), ButtonState::ACTIVE);
        button.clear_state();
        assert!(!button.is_active());
        assert!(button.set_checked(true));
        assert!(button.is_checked());
    }
}
