//! Test utilities for fenestra.
//!
//! - [`MockPlatform`] - scripted native backend that records every call
//! - [`RecordingGraphics`] - graphics context that records viewport/scissor state changes
//!
//! # Example
//!
//! ```rust
//! use fenestra_core::platform::{NativeEvent, Platform, ViewDescriptor};
//! use fenestra_core::geometry::Size;
//! use fenestra_test_utils::MockPlatform;
//! use std::time::Duration;
//!
//! let mut platform = MockPlatform::new();
//! let handle = platform.handle();
//!
//! let view = platform
//!     .create_view(&ViewDescriptor {
//!         title: "test".into(),
//!         size: Size::new(640, 480),
//!         resizable: false,
//!         ignore_key_repeat: false,
//!         parent: None,
//!         transient_for: None,
//!     })
//!     .unwrap();
//!
//! handle.push_event(view, NativeEvent::Expose);
//! assert_eq!(platform.update(Duration::ZERO).len(), 1);
//! assert_eq!(handle.created_views(), vec![view]);
//! ```
//!
//! # Interior mutability
//!
//! The platform is boxed into the application under test, so inspection goes through a
//! cloneable [`MockPlatformHandle`] sharing the same `parking_lot::Mutex`-guarded state.

pub mod mock_graphics;
pub mod mock_platform;

pub use mock_graphics::*;
pub use mock_platform::*;
