//! Fenestra UI - widget tree, event routing and windows for plugin user interfaces
//!
//! This crate is the platform-independent core of fenestra:
//! - An [`Application`] owning every window and widget, driving the idle loop
//! - Top-level widgets mounted on windows, and sub-widgets nested arbitrarily deep
//! - Front-to-back input fan-out with local coordinates for every widget
//! - Per-widget viewport and scissor setup before each paint hook
//! - Modal windows, geometry constraints and host-driven resizing for embedded views
//!
//! Native windows and drawing are provided by a [`Platform`](fenestra_core::platform::Platform)
//! implementation such as `fenestra-winit`.
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use fenestra_test_utils::MockPlatform;
//! use fenestra_ui::{Application, DisplayCtx, WidgetBehavior, WindowDescriptor};
//!
//! struct Background;
//!
//! impl WidgetBehavior for Background {
//!     fn on_display(&mut self, ctx: &mut DisplayCtx<'_>) {
//!         let _surface = ctx.surface_size();
//!     }
//! }
//!
//! let mut app = Application::new(MockPlatform::new());
//! let window = app.create_window(WindowDescriptor::new("Gain", 400, 300));
//! let root = app.add_top_level_widget(window, Background);
//! let knob = root.and_then(|root| app.add_sub_widget(root, Background));
//! if let Some(mut knob) = knob.and_then(|knob| app.widget_mut(knob)) {
//!     knob.set_size(64, 64);
//!     knob.set_absolute_pos(20, 30);
//! }
//!
//! if let Some(mut window) = app.window_mut(window) {
//!     window.show();
//! }
//! app.idle(Duration::ZERO);
//! ```

pub mod application;
pub mod compositor;
pub mod config;
mod dispatch;
pub mod event;
pub mod handlers;
pub mod idle;
mod intake;
pub mod tree;
pub mod widget;
pub mod window;

pub use application::Application;
pub use compositor::{ScissorScope, SubWidgetPaint};
pub use config::{AppConfig, DEFAULT_WINDOW_SIZE, EmbedDescriptor, WindowDescriptor};
pub use event::*;
pub use handlers::{
    ButtonEventHandler, ButtonResponse, ButtonState, KnobEventHandler, KnobOrientation,
    KnobResponse, SliderEventHandler, SliderResponse, SwitchEventHandler,
};
pub use idle::{IdleCallback, IdleCallbackId};
pub use tree::WidgetTree;
pub use widget::{
    DisplayCtx, EventCtx, NoBehavior, SubWidgetFlags, WidgetBehavior, WidgetId, WidgetMut,
    WidgetRef,
};
pub use window::{WindowHandler, WindowId, WindowMut, WindowRef};
