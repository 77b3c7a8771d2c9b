//! Idle callback registry.
//!
//! Untimed callbacks run once per [`Application::idle`] iteration in registration order. Timed
//! callbacks are bound to a window and run when its platform timer fires.

use crate::{application::Application, window::WindowId};

pub type IdleCallback = Box<dyn FnMut(&mut Application)>;

/// Handle returned by `add_idle_callback`; also the platform timer id of timed callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdleCallbackId(pub(crate) u64);

impl IdleCallbackId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

struct Entry {
    id: IdleCallbackId,
    /// Window whose timer drives the callback, `None` for the per-iteration list.
    timer: Option<WindowId>,
    /// Taken out while the callback runs.
    callback: Option<IdleCallback>,
}

#[derive(Default)]
pub(crate) struct IdleCallbacks {
    next_id: u64,
    entries: Vec<Entry>,
}

impl IdleCallbacks {
    pub fn add(&mut self, callback: IdleCallback, timer: Option<WindowId>) -> IdleCallbackId {
        self.next_id += 1;
        let id = IdleCallbackId(self.next_id);
        self.entries.push(Entry {
            id,
            timer,
            callback: Some(callback),
        });
        id
    }

    /// Removes a callback, returning the window whose timer drove it, if any.
    pub fn remove(&mut self, id: IdleCallbackId) -> Option<Option<WindowId>> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index).timer)
    }

    /// Removes every timed callback bound to `window`.
    pub fn remove_window(&mut self, window: WindowId) -> Vec<IdleCallbackId> {
        let mut removed = Vec::new();
        self.entries.retain(|entry| {
            let bound = entry.timer == Some(window);
            if bound {
                removed.push(entry.id);
            }
            !bound
        });
        removed
    }

    pub fn contains(&self, id: IdleCallbackId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Untimed callbacks in registration order.
    pub fn untimed(&self) -> Vec<IdleCallbackId> {
        self.entries
            .iter()
            .filter(|entry| entry.timer.is_none())
            .map(|entry| entry.id)
            .collect()
    }

    pub fn timer_window(&self, id: IdleCallbackId) -> Option<WindowId> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .and_then(|entry| entry.timer)
    }

    pub fn take(&mut self, id: IdleCallbackId) -> Option<IdleCallback> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)?
            .callback
            .take()
    }

    /// Puts a callback back unless it was removed while running.
    pub fn restore(&mut self, id: IdleCallbackId, callback: IdleCallback) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id)
            && entry.callback.is_none()
        {
            entry.callback = Some(callback);
        }
    }
}
