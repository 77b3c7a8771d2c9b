//! Application and window configuration.

use fenestra_core::{config::scale_factor_from_env, geometry::Size, platform::NativeHandle};

pub const DEFAULT_WINDOW_SIZE: Size<u32> = Size::new(640, 480);

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `false` for plugin UIs driven by a host; every idle then polls without blocking.
    pub standalone: bool,
    pub class_name: Option<String>,
    /// Replaces the desktop scale factor of standalone windows.
    pub scale_factor_override: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            standalone: true,
            class_name: None,
            scale_factor_override: scale_factor_from_env(),
        }
    }
}

impl AppConfig {
    /// Configuration for a UI embedded in a plugin host.
    pub fn plugin() -> Self {
        Self {
            standalone: false,
            ..Self::default()
        }
    }
}

/// Standalone or modal window.
#[derive(Debug, Clone)]
pub struct WindowDescriptor {
    pub title: String,
    pub size: Size<u32>,
    pub resizable: bool,
    pub ignore_key_repeat: bool,
    /// Size changes go to the first top-level widget's `request_size_change` instead of the
    /// native view.
    pub uses_size_request: bool,
}

impl Default for WindowDescriptor {
    fn default() -> Self {
        Self {
            title: "fenestra".to_owned(),
            size: DEFAULT_WINDOW_SIZE,
            resizable: true,
            ignore_key_repeat: false,
            uses_size_request: false,
        }
    }
}

impl WindowDescriptor {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            size: Size::new(width, height),
            ..Self::default()
        }
    }
}

/// Window embedded into a host-provided native view.
#[derive(Debug, Clone)]
pub struct EmbedDescriptor {
    pub parent: NativeHandle,
    pub size: Size<u32>,
    /// Host-provided scale factor, `0.0` to ask the platform.
    pub scale_factor: f64,
    pub resizable: bool,
    pub uses_size_request: bool,
}

impl EmbedDescriptor {
    pub fn new(parent: NativeHandle, width: u32, height: u32) -> Self {
        Self {
            parent,
            size: Size::new(width, height),
            scale_factor: 0.0,
            resizable: false,
            uses_size_request: false,
        }
    }
}
