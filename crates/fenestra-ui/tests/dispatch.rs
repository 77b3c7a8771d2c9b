//! Event fan-out through the widget tree.

mod common;

use std::time::Duration;

use common::{Fixture, Tracer};
use fenestra_core::{
    input::{Key, Modifiers, MouseButton},
    math::DVec2,
    platform::{NativeButton, NativeEvent, NativeKey},
};
use fenestra_ui::{KeyboardEvent, MotionEvent, MouseEvent};

fn press(x: f64, y: f64) -> MouseEvent {
    MouseEvent::new(MouseButton::Left, true, DVec2::new(x, y))
}

#[test]
fn test_hidden_widget_receives_nothing() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let a = fx.add_tracer(root, Tracer::new("a", &log), (10, 10, 100, 100));
    fx.app.widget_mut(a).unwrap().hide();
    log.clear();

    assert!(!fx.app.handle_mouse(fx.window, press(50.0, 50.0)));
    assert_eq!(log.count("a "), 0);
    assert_eq!(log.entries(), vec!["root mouse 50,50 abs 50,50"]);
}

#[test]
fn test_front_most_sibling_handles_first() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let a = fx.add_tracer(root, Tracer::new("a", &log), (0, 0, 100, 100));
    let _b = fx.add_tracer(root, Tracer::new("b", &log), (50, 50, 100, 100));
    log.clear();

    assert!(fx.app.handle_mouse(fx.window, press(75.0, 75.0)));
    assert_eq!(log.entries(), vec!["b mouse 25,25 abs 75,75"]);

    fx.app.widget_mut(a).unwrap().to_front();
    log.clear();

    let view = fx.view();
    fx.platform.push_event(
        view,
        NativeEvent::Button(NativeButton {
            press: true,
            button: MouseButton::Left,
            x: 75.0,
            y: 75.0,
            mods: Modifiers::empty(),
            time: 0,
        }),
    );
    fx.app.idle(Duration::ZERO);
    assert_eq!(log.entries(), vec!["a mouse 75,75 abs 75,75"]);
}

#[test]
fn test_unhandled_event_falls_through_to_next_sibling() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let _a = fx.add_tracer(root, Tracer::new("a", &log), (0, 0, 100, 100));
    let _b = fx.add_tracer(root, Tracer::passive("b", &log), (0, 0, 100, 100));
    log.clear();

    assert!(fx.app.handle_mouse(fx.window, press(10.0, 20.0)));
    assert_eq!(
        log.entries(),
        vec!["b mouse 10,20 abs 10,20", "a mouse 10,20 abs 10,20"]
    );
}

#[test]
fn test_local_positions_are_derived_from_absolute() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let panel = fx.add_tracer(root, Tracer::passive("panel", &log), (100, 100, 200, 200));
    let _knob = fx.add_tracer(panel, Tracer::passive("knob", &log), (120, 130, 40, 40));
    log.clear();

    assert!(!fx.app.handle_motion(fx.window, MotionEvent::new(DVec2::new(125.0, 135.0))));
    assert_eq!(
        log.entries(),
        vec!["knob motion 5,5", "panel motion 25,35", "root motion 125,135"]
    );
}

#[test]
fn test_margin_offsets_local_position() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let a = fx.add_tracer(root, Tracer::new("a", &log), (20, 20, 50, 50));
    fx.app.widget_mut(a).unwrap().set_margin(3, 4);
    log.clear();

    fx.app.handle_mouse(fx.window, press(30.0, 30.0));
    assert_eq!(log.entries()[0], "a mouse 13,14 abs 30,30");
}

#[test]
fn test_viewport_scaling_rebases_descendants() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let scaled = fx.add_tracer(root, Tracer::passive("scaled", &log), (100, 100, 200, 200));
    fx.app
        .widget_mut(scaled)
        .unwrap()
        .set_needs_viewport_scaling(true, 2.0);
    let _inner = fx.add_tracer(scaled, Tracer::new("inner", &log), (10, 20, 50, 50));
    log.clear();

    assert!(fx.app.handle_mouse(fx.window, press(115.0, 125.0)));
    assert_eq!(log.entries(), vec!["inner mouse 5,5 abs 15,25"]);
}

#[test]
fn test_keyboard_goes_to_front_most_visible_child() {
    let mut fx = Fixture::new();
    let (root, log) = (fx.root, fx.log.clone());
    let _a = fx.add_tracer(root, Tracer::new("a", &log), (0, 0, 10, 10));
    let b = fx.add_tracer(root, Tracer::new("b", &log), (500, 400, 10, 10));
    log.clear();

    let ev = KeyboardEvent::new(Key::Character('x'), true);
    assert!(fx.app.handle_keyboard(fx.window, ev));
    assert_eq!(log.count("b key"), 1);
    assert_eq!(log.count("a key"), 0);

    fx.app.widget_mut(b).unwrap().hide();
    log.clear();
    assert!(fx.app.handle_keyboard(fx.window, ev));
    assert_eq!(log.count("a key"), 1);
}

#[test]
fn test_uppercase_letters_are_lowercased_with_shift() {
    let mut fx = Fixture::new();
    let view = fx.view();
    fx.platform.push_event(
        view,
        NativeEvent::Key(NativeKey {
            press: true,
            key: Key::Character('A'),
            keycode: 38,
            mods: Modifiers::empty(),
            time: 0,
        }),
    );
    fx.app.idle(Duration::ZERO);

    let entries = fx.log.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].contains("Character('a')"));
    assert!(entries[0].contains("SHIFT"));
}

#[test]
fn test_auto_scaling_divides_pointer_positions() {
    let mut fx = Fixture::new();
    fx.app
        .window_mut(fx.window)
        .unwrap()
        .set_geometry_constraints(320, 240, true, true, false);
    fx.app.handle_configure(fx.window, 640.0, 480.0);
    assert_eq!(fx.app.window(fx.window).unwrap().auto_scale_factor(), 2.0);
    fx.log.clear();

    fx.app.handle_mouse(fx.window, press(200.0, 100.0));
    assert_eq!(fx.log.entries(), vec!["root mouse 100,50 abs 100,50"]);
}

#[test]
fn test_widget_removed_during_its_own_hook_is_dropped() {
    use fenestra_ui::{EventCtx, WidgetBehavior};

    struct SelfDestruct;

    impl WidgetBehavior for SelfDestruct {
        fn on_mouse(&mut self, ctx: &mut EventCtx<'_>, _ev: &MouseEvent) -> bool {
            let id = ctx.handle();
            ctx.app().remove_widget(id)
        }
    }

    let mut fx = Fixture::new();
    let root = fx.root;
    let doomed = fx.app.add_sub_widget(root, SelfDestruct).unwrap();
    fx.app.widget_mut(doomed).unwrap().set_size(10, 10);

    assert!(fx.app.handle_mouse(fx.window, press(1.0, 1.0)));
    assert!(fx.app.widget(doomed).is_none());
    assert!(fx.app.widget(root).unwrap().children().is_empty());
}
