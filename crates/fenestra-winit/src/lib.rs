//! winit backend for fenestra.
//!
//! [`WinitPlatform`] implements [`fenestra_core::platform::Platform`] for standalone
//! applications and for hosts that hand out Win32, AppKit or Xlib parent handles.

pub mod event;
#[cfg(any(windows, all(unix, not(target_os = "ios"))))]
pub mod platform;
pub mod window;

#[cfg(any(windows, all(unix, not(target_os = "ios"))))]
pub use platform::{GraphicsFactory, WinitPlatform};

pub use winit::window::WindowId;
