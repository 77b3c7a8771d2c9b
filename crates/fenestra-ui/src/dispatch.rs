//! Event fan-out through the widget tree.
//!
//! Children are tried front-most first (reverse of paint order), invisible ones are skipped,
//! and the first child reporting "handled" ends the search. Pointer positions are re-derived
//! from the absolute position at every level instead of being accumulated.

use fenestra_core::profiling::profile_function;

use crate::{
    application::Application,
    event::{CharacterInputEvent, KeyboardEvent, PointerEvent},
    widget::{EventCtx, Notification, SubWidgetFlags, WidgetBehavior, WidgetId},
};

/// Runs `f` with the widget's behavior detached from the tree.
///
/// Returns `fallback` when the widget is gone or one of its hooks is already running.
/// Notifications the widget raised against itself meanwhile are delivered before returning.
pub(crate) fn with_behavior<R>(
    app: &mut Application,
    id: WidgetId,
    fallback: R,
    f: impl FnOnce(&mut dyn WidgetBehavior, &mut EventCtx<'_>) -> R,
) -> R {
    let Some(mut behavior) = app.widgets.take_behavior(id) else {
        return fallback;
    };
    let result = {
        let mut ctx = EventCtx::new(app, id);
        f(behavior.as_mut(), &mut ctx)
    };
    app.widgets.restore_behavior(id, behavior);
    flush_deferred(app, id);
    result
}

/// Delivers a state-change hook, or queues it while the widget's own hook is running.
pub(crate) fn notify(app: &mut Application, id: WidgetId, notification: Notification) {
    let Some(node) = app.widgets.node(id) else {
        return;
    };
    if node.behavior.is_none() {
        tracing::trace!(widget = ?id, ?notification, "notification deferred");
        app.widgets.defer(id, notification);
        return;
    }
    with_behavior(app, id, (), |b, ctx| deliver_notification(b, ctx, notification));
}

fn flush_deferred(app: &mut Application, id: WidgetId) {
    // Hooks run here may raise further notifications; the loop picks them up.
    while let Some(notification) = app.widgets.pop_deferred(id) {
        let Some(mut behavior) = app.widgets.take_behavior(id) else {
            return;
        };
        {
            let mut ctx = EventCtx::new(app, id);
            deliver_notification(behavior.as_mut(), &mut ctx, notification);
        }
        app.widgets.restore_behavior(id, behavior);
    }
}

fn deliver_notification(
    behavior: &mut dyn WidgetBehavior,
    ctx: &mut EventCtx<'_>,
    notification: Notification,
) {
    match notification {
        Notification::Resize(ev) => behavior.on_resize(ctx, &ev),
        Notification::PositionChanged(ev) => behavior.on_position_changed(ctx, &ev),
        Notification::SizeRequest(size) => behavior.request_size_change(size.width, size.height),
    }
}

/// Visible children of a visible widget, front-most first.
fn dispatch_order(app: &Application, id: WidgetId) -> Option<Vec<WidgetId>> {
    let node = app.widgets.node(id)?;
    if !node.visible || node.children.is_empty() {
        return None;
    }
    Some(node.children.iter().rev().copied().collect())
}

fn is_visible(app: &Application, id: WidgetId) -> bool {
    app.widgets.node(id).is_some_and(|node| node.visible)
}

fn positionless_to_children<E>(
    app: &mut Application,
    id: WidgetId,
    ev: &E,
    deliver: impl Fn(&mut dyn WidgetBehavior, &mut EventCtx<'_>, &E) -> bool,
) -> bool {
    let Some(children) = dispatch_order(app, id) else {
        return false;
    };
    for child in children {
        if !is_visible(app, child) {
            continue;
        }
        if with_behavior(app, child, false, |b, ctx| deliver(b, ctx, ev)) {
            return true;
        }
    }
    false
}

pub(crate) fn keyboard_to_children(app: &mut Application, id: WidgetId, ev: &KeyboardEvent) -> bool {
    profile_function!();
    positionless_to_children(app, id, ev, |b, ctx, ev| b.on_keyboard(ctx, ev))
}

pub(crate) fn character_input_to_children(
    app: &mut Application,
    id: WidgetId,
    ev: &CharacterInputEvent,
) -> bool {
    profile_function!();
    positionless_to_children(app, id, ev, |b, ctx, ev| b.on_character_input(ctx, ev))
}

pub(crate) fn pointer_to_children<E: PointerEvent>(
    app: &mut Application,
    id: WidgetId,
    ev: &E,
    deliver: impl Fn(&mut dyn WidgetBehavior, &mut EventCtx<'_>, &E) -> bool,
) -> bool {
    profile_function!();
    let Some(children) = dispatch_order(app, id) else {
        return false;
    };
    let Some(node) = app.widgets.node(id) else {
        return false;
    };

    let mut ev = ev.clone();
    if node.flags().contains(SubWidgetFlags::VIEWPORT_SCALING) {
        ev.set_absolute_pos(ev.absolute_pos() - node.absolute_pos().as_dvec2());
    }

    for child in children {
        let Some(child_node) = app.widgets.node(child) else {
            continue;
        };
        if !child_node.visible {
            continue;
        }
        let margin = child_node.sub().map(|sub| sub.margin).unwrap_or_default();
        ev.set_pos(ev.absolute_pos() - child_node.absolute_pos().as_dvec2() + margin.as_dvec2());
        tracing::trace!(?child, pos = ?ev.pos(), "pointer fan-out");

        if with_behavior(app, child, false, |b, ctx| deliver(b, ctx, &ev)) {
            return true;
        }
    }
    false
}

pub(crate) fn top_level_keyboard(app: &mut Application, id: WidgetId, ev: &KeyboardEvent) -> bool {
    if !is_visible(app, id) {
        return false;
    }
    with_behavior(app, id, false, |b, ctx| b.on_keyboard(ctx, ev))
}

pub(crate) fn top_level_character_input(
    app: &mut Application,
    id: WidgetId,
    ev: &CharacterInputEvent,
) -> bool {
    if !is_visible(app, id) {
        return false;
    }
    with_behavior(app, id, false, |b, ctx| b.on_character_input(ctx, ev))
}

/// Entry point for pointer events on a top-level widget; undoes the window's auto-scaling.
pub(crate) fn top_level_pointer<E: PointerEvent>(
    app: &mut Application,
    id: WidgetId,
    ev: &E,
    deliver: impl Fn(&mut dyn WidgetBehavior, &mut EventCtx<'_>, &E) -> bool,
) -> bool {
    let Some(node) = app.widgets.node(id) else {
        return false;
    };
    if !node.visible {
        return false;
    }

    let mut ev = ev.clone();
    if let Some(window) = app.windows.get(node.window.0)
        && window.auto_scaling
        && window.auto_scale_factor > 0.0
    {
        let factor = window.auto_scale_factor;
        ev.set_pos(ev.pos() / factor);
        ev.set_absolute_pos(ev.absolute_pos() / factor);
    }

    with_behavior(app, id, false, |b, ctx| deliver(b, ctx, &ev))
}
