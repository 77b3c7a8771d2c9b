//! Fenestra Core
//!
//! Shared building blocks for the fenestra plugin UI toolkit: generational arenas, geometry,
//! logging and profiling setup, configuration, and the two collaborator contracts the widget
//! core talks to, [`platform::Platform`] (native views and events) and
//! [`graphics::GraphicsContext`] (viewport/scissor setup).

pub mod alloc;
pub mod assert;
pub mod config;
pub mod geometry;
pub mod graphics;
pub mod input;
pub mod logging;
pub mod math;
pub mod platform;
pub mod profiling;
