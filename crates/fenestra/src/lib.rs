//! Fenestra - a widget toolkit core for audio plugin user interfaces
//!
//! Fenestra provides what sits between a plugin host and the drawing code of a plugin editor:
//!
//! - **Windows**: standalone, modal and host-embedded windows with size constraints
//! - **Widgets**: top-level widgets and arbitrarily nested sub-widgets
//! - **Events**: front-to-back fan-out of keyboard, mouse, motion and scroll events
//! - **Compositing**: per-widget viewport and scissor setup before each paint hook
//! - **Idle loop**: event polling, idle callbacks, timers and coalesced redraws
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fenestra::prelude::*;
//!
//! struct Editor;
//!
//! impl WidgetBehavior for Editor {
//!     fn on_display(&mut self, ctx: &mut DisplayCtx<'_>) {
//!         let _size = ctx.size();
//!     }
//! }
//!
//! fn main() -> Result<(), PlatformError> {
//!     let mut app = fenestra::standalone()?;
//!     let window = app.create_window(WindowDescriptor::new("Editor", 640, 480));
//!     app.add_top_level_widget(window, Editor);
//!     if let Some(mut window) = app.window_mut(window) {
//!         window.show();
//!     }
//!     app.exec(Duration::from_millis(16));
//!     Ok(())
//! }
//! ```
//!
//! Plugin wrappers create the [`Application`] with [`AppConfig::plugin`] and call
//! [`Application::idle`] from the host's idle or timer callback instead of `exec`.

pub use fenestra_core as core;
pub use fenestra_core::{geometry, input, math};
pub use fenestra_ui as ui;

#[cfg(all(feature = "winit", any(windows, all(unix, not(target_os = "ios")))))]
pub use fenestra_winit as winit;

pub use fenestra_core::platform::{Platform, PlatformError};
pub use fenestra_ui::{AppConfig, Application, WindowDescriptor};

/// Creates a standalone [`Application`] on the winit backend, with logging installed.
#[cfg(all(feature = "winit", any(windows, all(unix, not(target_os = "ios")))))]
pub fn standalone() -> Result<Application, PlatformError> {
    fenestra_core::logging::init();
    let platform = fenestra_winit::WinitPlatform::new()?;
    tracing::debug!("standalone application on winit");
    Ok(Application::new(platform))
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use fenestra_core::{
        geometry::{Rect, Size},
        graphics::GraphicsContext,
        input::{Key, Modifiers, MouseButton, MouseCursor, NamedKey},
        math::{DVec2, IVec2},
        platform::{Platform, PlatformError},
    };

    pub use fenestra_ui::{
        AppConfig, Application, ButtonEventHandler, ButtonResponse, CharacterInputEvent,
        DisplayCtx, EmbedDescriptor, EventCtx, IdleCallbackId, KeyboardEvent, KnobEventHandler,
        KnobResponse, MotionEvent, MouseEvent, ResizeEvent, ScrollEvent, SliderEventHandler,
        SliderResponse, SubWidgetFlags, SwitchEventHandler, WidgetBehavior, WidgetId,
        WindowDescriptor, WindowHandler, WindowId,
    };

    #[cfg(all(feature = "winit", any(windows, all(unix, not(target_os = "ios")))))]
    pub use fenestra_winit::WinitPlatform;
}
