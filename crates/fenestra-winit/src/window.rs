use std::sync::Arc;

use fenestra_core::{
    geometry::Size,
    platform::{NativeHandle, PlatformError, ViewDescriptor},
};
use winit::{
    dpi::PhysicalSize,
    raw_window_handle::{HasWindowHandle, RawWindowHandle},
    window::WindowAttributes,
};
pub use winit::window::Window as WinitWindow;

/// Builds the attributes of a hidden window for `descriptor`.
///
/// Embedding needs a host handle winit understands; on other systems the request fails instead
/// of opening a free-floating window.
pub fn attributes(
    descriptor: &ViewDescriptor,
    class_name: Option<&str>,
) -> Result<WindowAttributes, PlatformError> {
    let mut attributes = WinitWindow::default_attributes()
        .with_title(descriptor.title.clone())
        .with_inner_size(to_physical(descriptor.size))
        .with_resizable(descriptor.resizable)
        .with_visible(false);

    if let Some(parent) = descriptor.parent {
        let raw = parent_window_handle(parent)
            .ok_or(PlatformError::Unsupported("embedding into this host view"))?;
        // SAFETY: hosts keep their view alive for as long as a plugin UI is embedded in it.
        attributes = unsafe { attributes.with_parent_window(Some(raw)) };
    }

    #[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
    if let Some(name) = class_name {
        use winit::platform::x11::WindowAttributesExtX11;
        attributes = WindowAttributesExtX11::with_name(attributes, name, name);
    }
    #[cfg(not(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))))]
    let _ = class_name;

    Ok(attributes)
}

pub fn to_physical(size: Size<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width, size.height)
}

pub fn from_physical(size: PhysicalSize<u32>) -> Size<u32> {
    Size::new(size.width, size.height)
}

/// Integer form of the OS handle behind `window`.
pub fn native_handle(window: &Arc<WinitWindow>) -> Option<NativeHandle> {
    let handle = window.window_handle().ok()?;
    let raw = match handle.as_raw() {
        RawWindowHandle::Win32(h) => h.hwnd.get() as usize,
        RawWindowHandle::AppKit(h) => h.ns_view.as_ptr() as usize,
        RawWindowHandle::Xlib(h) => h.window as usize,
        RawWindowHandle::Xcb(h) => h.window.get() as usize,
        RawWindowHandle::Wayland(h) => h.surface.as_ptr() as usize,
        _ => return None,
    };
    Some(NativeHandle(raw))
}

#[cfg(windows)]
fn parent_window_handle(parent: NativeHandle) -> Option<RawWindowHandle> {
    use std::num::NonZeroIsize;
    use winit::raw_window_handle::Win32WindowHandle;

    let hwnd = NonZeroIsize::new(parent.0 as isize)?;
    Some(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)))
}

#[cfg(target_os = "macos")]
fn parent_window_handle(parent: NativeHandle) -> Option<RawWindowHandle> {
    use std::{ffi::c_void, ptr::NonNull};
    use winit::raw_window_handle::AppKitWindowHandle;

    let ns_view = NonNull::new(parent.0 as *mut c_void)?;
    Some(RawWindowHandle::AppKit(AppKitWindowHandle::new(ns_view)))
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
fn parent_window_handle(parent: NativeHandle) -> Option<RawWindowHandle> {
    use winit::raw_window_handle::XlibWindowHandle;

    if parent.0 == 0 {
        return None;
    }
    Some(RawWindowHandle::Xlib(XlibWindowHandle::new(parent.0 as _)))
}

#[cfg(not(any(windows, unix)))]
fn parent_window_handle(_parent: NativeHandle) -> Option<RawWindowHandle> {
    None
}

#[cfg(any(target_os = "ios", target_os = "android"))]
fn parent_window_handle(_parent: NativeHandle) -> Option<RawWindowHandle> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_conversion() {
        let size = Size::new(640, 480);
        assert_eq!(to_physical(size), PhysicalSize::new(640, 480));
        assert_eq!(from_physical(to_physical(size)), size);
    }

    #[test]
    fn test_null_parent_is_refused() {
        let descriptor = ViewDescriptor {
            title: "embedded".into(),
            size: Size::new(300, 200),
            resizable: false,
            ignore_key_repeat: false,
            parent: Some(NativeHandle(0)),
            transient_for: None,
        };
        assert!(matches!(
            attributes(&descriptor, None),
            Err(PlatformError::Unsupported(_))
        ));
    }
}
