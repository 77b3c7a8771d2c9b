//! Idle loop, callbacks, timers and quitting.

mod common;

use std::{cell::Cell, rc::Rc, time::Duration};

use common::{Fixture, Log};
use fenestra_core::{
    assert::violation_count,
    geometry::Rect,
    input::{Key, Modifiers},
    platform::{Damage, NativeEvent, NativeKey},
};
use fenestra_test_utils::{MockPlatform, PlatformCall};
use fenestra_ui::{AppConfig, Application, IdleCallbackId, WindowDescriptor};

#[test]
fn test_callbacks_run_after_events_in_registration_order() {
    let mut fx = Fixture::new();
    let log = fx.log.clone();
    for name in ["first", "second", "third"] {
        let log = log.clone();
        fx.app
            .add_idle_callback(move |_| log.push(format!("idle {name}")));
    }
    let view = fx.view();
    fx.platform.push_event(
        view,
        NativeEvent::Key(NativeKey {
            press: true,
            key: Key::Character('q'),
            keycode: 24,
            mods: Modifiers::empty(),
            time: 0,
        }),
    );

    fx.app.idle(Duration::ZERO);
    let entries = log.entries();
    assert_eq!(entries.len(), 4);
    assert!(entries[0].starts_with("root key"));
    assert_eq!(&entries[1..], ["idle first", "idle second", "idle third"]);
}

#[test]
fn test_callback_can_remove_itself_and_later_callbacks() {
    let mut app = Application::new(MockPlatform::new());
    let log = Log::default();
    let own: Rc<Cell<Option<IdleCallbackId>>> = Rc::default();
    let victim: Rc<Cell<Option<IdleCallbackId>>> = Rc::default();

    let id = {
        let (log, own, victim) = (log.clone(), own.clone(), victim.clone());
        app.add_idle_callback(move |app| {
            log.push("remover".into());
            if let Some(id) = own.get() {
                app.remove_idle_callback(id);
            }
            if let Some(id) = victim.get() {
                app.remove_idle_callback(id);
            }
        })
    };
    own.set(Some(id));
    let later = {
        let log = log.clone();
        app.add_idle_callback(move |_| log.push("later".into()))
    };
    victim.set(Some(later));

    app.idle(Duration::ZERO);
    app.idle(Duration::ZERO);
    assert_eq!(log.entries(), vec!["remover"]);
    assert!(!app.remove_idle_callback(id));
}

#[test]
fn test_timed_callback_runs_on_its_timer() {
    let mut fx = Fixture::new();
    let view = fx.view();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    let id = fx
        .app
        .window_mut(fx.window)
        .unwrap()
        .add_idle_callback(Duration::from_millis(30), move |_| {
            counter.set(counter.get() + 1)
        })
        .unwrap();

    assert!(fx.platform.calls().contains(&PlatformCall::StartTimer {
        view,
        id: id.raw(),
        interval: Duration::from_millis(30),
    }));

    // not part of the per-iteration list
    fx.app.idle(Duration::ZERO);
    assert_eq!(fired.get(), 0);

    fx.platform.push_event(view, NativeEvent::Timer { id: id.raw() });
    fx.platform.push_event(view, NativeEvent::Timer { id: id.raw() + 100 });
    fx.app.idle(Duration::ZERO);
    assert_eq!(fired.get(), 1);

    assert!(fx.app.window_mut(fx.window).unwrap().remove_idle_callback(id));
    assert!(fx.platform.calls().contains(&PlatformCall::StopTimer { view, id: id.raw() }));
    fx.platform.push_event(view, NativeEvent::Timer { id: id.raw() });
    fx.app.idle(Duration::ZERO);
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_zero_interval_registers_per_iteration_callback() {
    let mut fx = Fixture::new();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    let id = fx
        .app
        .window_mut(fx.window)
        .unwrap()
        .add_idle_callback(Duration::ZERO, move |_| counter.set(counter.get() + 1));

    assert!(id.is_some());
    assert_eq!(
        fx.platform
            .count_calls(|c| matches!(c, PlatformCall::StartTimer { .. })),
        0
    );
    fx.app.idle(Duration::ZERO);
    fx.app.idle(Duration::ZERO);
    assert_eq!(fired.get(), 2);
}

#[test]
fn test_quit_closes_windows_newest_first() {
    let mut fx = Fixture::new();
    let first = fx.view();
    let second = fx.app.create_window(WindowDescriptor::default());
    fx.app.window_mut(second).unwrap().show();
    let second = fx.app.window(second).unwrap().view().unwrap();
    fx.platform.clear_calls();

    fx.app.quit();
    assert!(fx.app.is_quitting());
    assert_eq!(fx.app.visible_window_count(), 0);
    assert_eq!(
        fx.platform.calls(),
        vec![PlatformCall::Hide(second), PlatformCall::Hide(first)]
    );
}

#[test]
fn test_repaints_coalesce_into_one_redisplay() {
    let mut fx = Fixture::new();
    let view = fx.view();
    fx.platform.clear_calls();

    let mut window = fx.app.window_mut(fx.window).unwrap();
    window.repaint_area(Rect::new(0, 0, 10, 10));
    window.repaint_area(Rect::new(20, 20, 10, 10));
    fx.app.idle(Duration::ZERO);
    assert_eq!(fx.platform.count_redisplays(view), 1);
    assert!(fx.platform.calls().contains(&PlatformCall::PostRedisplay {
        view,
        damage: Damage::Areas(vec![Rect::new(0, 0, 10, 10), Rect::new(20, 20, 10, 10)]),
    }));

    let mut window = fx.app.window_mut(fx.window).unwrap();
    window.repaint_area(Rect::new(0, 0, 10, 10));
    window.repaint();
    window.repaint();
    assert!(fx.app.window(fx.window).unwrap().has_pending_repaint());
    fx.app.idle(Duration::ZERO);
    assert_eq!(fx.platform.count_redisplays(view), 2);
    assert!(!fx.app.window(fx.window).unwrap().has_pending_repaint());

    // the expose that answered the redisplay does not request another one
    fx.app.idle(Duration::ZERO);
    assert_eq!(fx.platform.count_redisplays(view), 2);
    assert_eq!(fx.platform.graphics().count_frames(), 2);
}

#[test]
fn test_plugin_idle_never_blocks() {
    let platform = MockPlatform::new();
    let handle = platform.handle();
    let mut app = Application::with_config(platform, AppConfig::plugin());
    assert!(!app.is_standalone());

    app.idle(Duration::from_secs(5));
    assert_eq!(
        handle.calls(),
        vec![PlatformCall::Update {
            timeout: Duration::ZERO
        }]
    );

    let platform = MockPlatform::new();
    let handle = platform.handle();
    let mut app = Application::new(platform);
    app.idle(Duration::from_millis(16));
    assert_eq!(
        handle.calls(),
        vec![PlatformCall::Update {
            timeout: Duration::from_millis(16)
        }]
    );
}

#[test]
fn test_exec_runs_until_quit() {
    let platform = MockPlatform::new();
    let handle = platform.handle();
    let mut app = Application::new(platform);
    let iterations = Rc::new(Cell::new(0));
    let counter = iterations.clone();
    app.add_idle_callback(move |app| {
        counter.set(counter.get() + 1);
        if counter.get() == 3 {
            app.quit();
        }
    });

    app.exec(Duration::ZERO);
    assert_eq!(iterations.get(), 3);
    assert_eq!(handle.count_updates(), 3);
}

#[test]
fn test_exec_is_refused_for_plugins() {
    let mut app = Application::with_config(MockPlatform::new(), AppConfig::plugin());
    let before = violation_count();
    app.exec(Duration::ZERO);
    assert_eq!(violation_count(), before + 1);
}

#[test]
fn test_drop_destroys_every_view() {
    let platform = MockPlatform::new();
    let handle = platform.handle();
    let mut app = Application::new(platform);
    let a = app.create_window(WindowDescriptor::default());
    let b = app.create_window(WindowDescriptor::default());
    app.window_mut(a).unwrap().show();
    app.window_mut(b).unwrap().show();
    let views = handle.created_views();
    drop(app);

    let destroyed: Vec<_> = handle
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            PlatformCall::DestroyView(view) => Some(view),
            _ => None,
        })
        .collect();
    assert_eq!(destroyed, vec![views[1], views[0]]);
}

#[test]
fn test_time_is_monotonic() {
    let app = Application::new(MockPlatform::new());
    let t0 = app.time();
    let t1 = app.time();
    assert!(t0 >= 0.0);
    assert!(t1 >= t0);
}
