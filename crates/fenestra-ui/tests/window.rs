//! Window visibility, constraints, modality and scale factors.

mod common;

use std::time::Duration;

use common::{Fixture, Log, Tracer};
use fenestra_core::{
    geometry::Size,
    input::{CrossingMode, MouseButton},
    math::DVec2,
    platform::{NativeEvent, NativeHandle},
};
use fenestra_test_utils::{MockPlatform, PlatformCall};
use fenestra_ui::{
    AppConfig, Application, EmbedDescriptor, MouseEvent, NoBehavior, WindowDescriptor,
    WindowHandler,
};

struct Recorder {
    log: Log,
    allow_close: bool,
}

impl WindowHandler for Recorder {
    fn on_close(&mut self) -> bool {
        self.log.push("close requested".into());
        self.allow_close
    }

    fn on_focus(&mut self, focused: bool, _mode: CrossingMode) {
        self.log.push(format!("focus {focused}"));
    }

    fn on_reshape(&mut self, width: u32, height: u32) {
        self.log.push(format!("reshape {width}x{height}"));
    }

    fn on_scale_factor_changed(&mut self, scale_factor: f64) {
        self.log.push(format!("scale {scale_factor}"));
    }
}

#[test]
fn test_min_size_and_aspect_ratio_clamp_requests() {
    let mut fx = Fixture::new();
    let view = fx.view();
    let mut window = fx.app.window_mut(fx.window).unwrap();
    window.set_geometry_constraints(200, 100, true, false, false);
    window.set_size(50, 50);
    window.set_size(900, 300);

    let calls = fx.platform.calls();
    assert!(calls.contains(&PlatformCall::SetGeometryConstraints {
        view,
        min_size: Size::new(200, 100),
        keep_aspect_ratio: true,
    }));
    let sizes: Vec<_> = calls
        .into_iter()
        .filter_map(|call| match call {
            PlatformCall::SetSize { size, .. } => Some(size),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![Size::new(200, 100), Size::new(600, 300)]);
    assert_eq!(
        fx.app.window(fx.window).unwrap().geometry_constraints(),
        (Size::new(200, 100), true)
    );
}

#[test]
fn test_visible_window_count_drives_quitting() {
    let mut fx = Fixture::new();
    assert!(!fx.app.is_starting());
    assert_eq!(fx.app.visible_window_count(), 1);

    let second = fx.app.create_window(WindowDescriptor::default());
    assert!(fx.app.window(second).unwrap().is_closed());
    fx.app.window_mut(second).unwrap().show();
    fx.app.window_mut(second).unwrap().show();
    assert_eq!(fx.app.visible_window_count(), 2);

    // hiding keeps the window counted
    fx.app.window_mut(fx.window).unwrap().hide();
    assert_eq!(fx.app.visible_window_count(), 2);

    fx.app.window_mut(fx.window).unwrap().close();
    assert_eq!(fx.app.visible_window_count(), 1);
    assert!(!fx.app.is_quitting());

    fx.app.window_mut(second).unwrap().close();
    fx.app.window_mut(second).unwrap().close();
    assert_eq!(fx.app.visible_window_count(), 0);
    assert!(fx.app.is_quitting());

    fx.app.window_mut(second).unwrap().show();
    assert!(!fx.app.is_quitting());
    assert!(fx.platform.is_visible(fx.app.window(second).unwrap().view().unwrap()));
}

#[test]
fn test_close_event_can_be_vetoed() {
    let mut fx = Fixture::new();
    let log = Log::default();
    fx.app.window_mut(fx.window).unwrap().set_handler(Recorder {
        log: log.clone(),
        allow_close: false,
    });
    let view = fx.view();

    fx.platform.push_event(view, NativeEvent::Close);
    fx.app.idle(Duration::ZERO);
    assert_eq!(log.entries(), vec!["close requested"]);
    assert!(fx.app.window(fx.window).unwrap().is_visible());
    assert!(!fx.app.is_quitting());

    fx.app.window_mut(fx.window).unwrap().set_handler(Recorder {
        log: log.clone(),
        allow_close: true,
    });
    fx.platform.push_event(view, NativeEvent::Close);
    fx.app.idle(Duration::ZERO);
    assert!(!fx.app.window(fx.window).unwrap().is_visible());
    assert!(fx.app.is_quitting());
}

#[test]
fn test_handler_sees_reshape_and_focus() {
    let mut fx = Fixture::new();
    let log = Log::default();
    fx.app.window_mut(fx.window).unwrap().set_handler(Recorder {
        log: log.clone(),
        allow_close: true,
    });
    let view = fx.view();

    fx.platform.push_event(
        view,
        NativeEvent::Configure {
            width: 320.4,
            height: 199.6,
        },
    );
    fx.platform.push_event(
        view,
        NativeEvent::Focus {
            focused: true,
            mode: CrossingMode::Normal,
        },
    );
    fx.app.idle(Duration::ZERO);

    assert_eq!(log.entries(), vec!["reshape 320x200", "focus true"]);
    assert_eq!(fx.log.entries(), vec!["root resize 320x200"]);
}

#[test]
fn test_modal_child_steals_input_until_closed() {
    let mut fx = Fixture::new();
    let parent_view = fx.view();
    let child = fx
        .app
        .create_modal_window(fx.window, WindowDescriptor::new("dialog", 200, 100));
    fx.app.add_top_level_widget(child, NoBehavior);
    let child_view = fx.app.window(child).unwrap().view().unwrap();

    assert!(fx.platform.calls().contains(&PlatformCall::CreateView {
        view: child_view,
        title: "dialog".into(),
        size: Size::new(200, 100),
        parent: None,
        transient_for: Some(parent_view),
    }));

    fx.app.window_mut(child).unwrap().run_as_modal(false);
    assert!(fx.app.window(child).unwrap().is_modal());
    assert_eq!(fx.app.window(fx.window).unwrap().modal_child(), Some(child));
    assert_eq!(fx.app.window(child).unwrap().modal_parent(), Some(fx.window));
    fx.platform.clear_calls();
    fx.log.clear();

    let ev = MouseEvent::new(MouseButton::Left, true, DVec2::new(5.0, 5.0));
    assert!(!fx.app.handle_mouse(fx.window, ev));
    assert!(fx.log.entries().is_empty());
    assert_eq!(fx.platform.count_calls(|c| *c == PlatformCall::GrabFocus(child_view)), 1);

    // closing the parent is redirected as well
    fx.app.handle_close(fx.window);
    assert!(fx.app.window(fx.window).unwrap().is_visible());

    fx.platform.clear_calls();
    fx.app.handle_close(child);
    assert!(!fx.app.window(child).unwrap().is_visible());
    assert!(!fx.app.window(child).unwrap().is_modal());
    assert_eq!(fx.app.window(fx.window).unwrap().modal_child(), None);
    assert_eq!(fx.log.entries(), vec!["root motion 0,0"]);
    assert_eq!(fx.platform.count_calls(|c| *c == PlatformCall::GrabFocus(parent_view)), 1);

    fx.log.clear();
    assert!(!fx.app.handle_mouse(fx.window, ev));
    assert_eq!(fx.log.entries(), vec!["root mouse 5,5 abs 5,5"]);
}

#[test]
fn test_unrealized_window_is_inert() {
    let mut app = Application::new(MockPlatform::new().failing_realize());
    let window = app.create_window(WindowDescriptor::new("broken", 300, 200));
    let root = app.add_top_level_widget(window, NoBehavior);

    let state = app.window(window).unwrap();
    assert!(!state.is_realized());
    assert_eq!(state.size(), Size::new(0, 0));
    assert_eq!(state.native_handle(), None);
    assert_eq!(root.and_then(|r| app.widget(r)).map(|w| w.size()), Some(Size::new(0, 0)));

    let mut state = app.window_mut(window).unwrap();
    state.show();
    state.set_size(100, 100);
    assert!(state.clipboard().is_none());
    assert!(!state.set_clipboard("text/plain", b"x"));
    assert!(state.add_idle_callback(Duration::from_millis(5), |_| {}).is_none());
    assert_eq!(app.visible_window_count(), 0);
    assert!(app.window(window).unwrap().is_closed());
}

#[test]
fn test_size_request_goes_to_first_top_level_widget() {
    let mut fx = Fixture::new();
    let descriptor = WindowDescriptor {
        uses_size_request: true,
        ..WindowDescriptor::new("hosted", 400, 300)
    };
    let window = fx.app.create_window(descriptor);
    let log = fx.log.clone();
    fx.app.add_top_level_widget(window, Tracer::passive("first", &log));
    fx.app.add_top_level_widget(window, Tracer::passive("second", &log));
    fx.platform.clear_calls();

    fx.app.window_mut(window).unwrap().set_size(500, 350);
    assert_eq!(log.entries(), vec!["first size request 500x350"]);
    assert_eq!(
        fx.platform.count_calls(|c| matches!(c, PlatformCall::SetSize { .. })),
        0
    );
    assert!(fx.app.window(window).unwrap().uses_size_request());
}

#[test]
fn test_size_request_from_widgets_own_handler_is_delivered() {
    let mut fx = Fixture::new();
    let descriptor = WindowDescriptor {
        uses_size_request: true,
        ..WindowDescriptor::new("hosted", 400, 300)
    };
    let window = fx.app.create_window(descriptor);
    let log = Log::default();
    let first = Tracer::passive("first", &log).resizing_on_press(500, 350);
    fx.app.add_top_level_widget(window, first);
    fx.platform.clear_calls();

    let ev = MouseEvent::new(MouseButton::Left, true, DVec2::new(5.0, 5.0));
    fx.app.handle_mouse(window, ev);
    assert_eq!(
        log.entries(),
        vec!["first mouse 5,5 abs 5,5", "first size request 500x350"]
    );
    assert_eq!(
        fx.platform.count_calls(|c| matches!(c, PlatformCall::SetSize { .. })),
        0
    );

    // delivered once, not again on the next event
    log.clear();
    let ev = MouseEvent::new(MouseButton::Left, false, DVec2::new(5.0, 5.0));
    fx.app.handle_mouse(window, ev);
    assert_eq!(log.count("first size request"), 0);
}

#[test]
fn test_embedded_window_uses_host_scale_factor() {
    let platform = MockPlatform::new();
    let calls = platform.handle();
    let mut app = Application::with_config(platform, AppConfig::plugin());
    let window = app.create_embedded_window(EmbedDescriptor {
        scale_factor: 2.0,
        ..EmbedDescriptor::new(NativeHandle(0xbeef), 300, 200)
    });

    let state = app.window(window).unwrap();
    assert!(state.is_embed());
    assert!(state.is_visible());
    assert_eq!(state.scale_factor(), 2.0);
    assert_eq!(app.visible_window_count(), 1);

    let mut state = app.window_mut(window).unwrap();
    state.close();
    state.hide();
    assert!(app.window(window).unwrap().is_visible());

    let mut state = app.window_mut(window).unwrap();
    state.set_geometry_constraints(200, 150, true, true, false);
    state.set_size(100, 100);
    let view = app.window(window).unwrap().view().unwrap();
    assert!(calls.calls().contains(&PlatformCall::SetGeometryConstraints {
        view,
        min_size: Size::new(400, 300),
        keep_aspect_ratio: true,
    }));
    // the minimum is premultiplied by the host scale factor
    assert!(calls.calls().contains(&PlatformCall::SetSize {
        view,
        size: Size::new(400, 300),
    }));
    assert!(calls.calls().contains(&PlatformCall::CreateView {
        view,
        title: String::new(),
        size: Size::new(300, 200),
        parent: Some(NativeHandle(0xbeef)),
        transient_for: None,
    }));

    app.destroy_window(window);
    assert_eq!(app.visible_window_count(), 0);
    assert!(app.window(window).is_none());
}

#[test]
fn test_scale_factor_sources() {
    let platform = MockPlatform::new().with_scale_factor(1.5);
    let handle = platform.handle();
    let config = AppConfig {
        scale_factor_override: None,
        ..AppConfig::default()
    };
    let mut app = Application::with_config(platform, config);

    let main = app.create_window(WindowDescriptor::default());
    assert_eq!(app.window(main).unwrap().scale_factor(), 1.5);

    handle.set_scale_factor(3.0);
    let dialog = app.create_modal_window(main, WindowDescriptor::default());
    assert_eq!(app.window(dialog).unwrap().scale_factor(), 1.5);

    let overridden = AppConfig {
        scale_factor_override: Some(2.0),
        ..AppConfig::default()
    };
    let mut app = Application::with_config(MockPlatform::new(), overridden);
    let window = app.create_window(WindowDescriptor::default());
    assert_eq!(app.window(window).unwrap().scale_factor(), 2.0);
}

#[test]
fn test_scale_factor_change_rescales_constraints() {
    let mut fx = Fixture::new();
    let log = Log::default();
    let view = fx.view();
    let mut window = fx.app.window_mut(fx.window).unwrap();
    window.set_handler(Recorder {
        log: log.clone(),
        allow_close: true,
    });
    window.set_geometry_constraints(300, 200, false, false, false);
    fx.platform.clear_calls();

    fx.platform
        .push_event(view, NativeEvent::ScaleFactorChanged(2.0));
    fx.app.idle(Duration::ZERO);

    assert_eq!(fx.app.window(fx.window).unwrap().scale_factor(), 2.0);
    assert!(fx.platform.calls().contains(&PlatformCall::SetGeometryConstraints {
        view,
        min_size: Size::new(600, 400),
        keep_aspect_ratio: false,
    }));
    assert_eq!(log.entries(), vec!["scale 2"]);
}

#[test]
fn test_destroy_window_releases_everything() {
    let mut fx = Fixture::new();
    let view = fx.view();
    let root = fx.root;
    let timer = fx
        .app
        .window_mut(fx.window)
        .unwrap()
        .add_idle_callback(Duration::from_millis(20), |_| {})
        .unwrap();

    fx.app.destroy_window(fx.window);
    assert!(fx.app.window(fx.window).is_none());
    assert!(fx.app.widget(root).is_none());
    assert!(fx.app.window_for_view(view).is_none());
    assert_eq!(fx.app.visible_window_count(), 0);
    assert!(fx.app.is_quitting());

    let calls = fx.platform.calls();
    assert!(calls.contains(&PlatformCall::StopTimer {
        view,
        id: timer.raw()
    }));
    assert!(calls.contains(&PlatformCall::DestroyView(view)));
    assert!(!fx.app.remove_idle_callback(timer));
}

#[test]
fn test_title_and_flags() {
    let mut fx = Fixture::new();
    let view = fx.view();
    let mut window = fx.app.window_mut(fx.window).unwrap();
    window.set_title("Reverb");
    window.set_resizable(false);
    window.set_resizable(false);
    window.set_ignoring_key_repeat(true);
    window.set_offset(30, 40);

    let state = fx.app.window(fx.window).unwrap();
    assert_eq!(state.title(), "Reverb");
    assert!(!state.is_resizable());
    assert!(state.is_ignoring_key_repeat());
    assert_eq!(state.offset(), fenestra_core::math::IVec2::new(30, 40));
    assert_eq!(state.native_handle(), Some(NativeHandle(0x1000 + view.raw() as usize)));
    assert_eq!(
        fx.platform
            .count_calls(|c| matches!(c, PlatformCall::SetResizable { .. })),
        1
    );
}
