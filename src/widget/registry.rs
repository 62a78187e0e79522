//! Widget arena.
//!
//! Records live in a slot map and are addressed by [`WidgetKey`]. Anything that works on a
//! widget across a call that may destroy it (an event handler, a command) pins the record with
//! [`WidgetRegistry::preserve`] and unpins it with [`WidgetRegistry::release`]. Destroying a
//! widget marks its slot dead right away, so lookups fail from then on, but the slot itself is
//! only freed once the last pin is released. Keys are generational: a freed slot that gets reused
//! never answers to an old key.

use std::collections::HashMap;

use log::debug;
use slotmap::{new_key_type, SlotMap};

use crate::host::HostWindowId;
use crate::widget::record::WidgetRecord;

new_key_type! {
    /// Handle of a render widget
    pub struct WidgetKey;
}

struct WidgetSlot {
    record: WidgetRecord,
    pins: u32,
    dead: bool,
}

#[derive(Default)]
pub struct WidgetRegistry {
    slots: SlotMap<WidgetKey, WidgetSlot>,
    /// Host window to widget, for event routing
    windows: HashMap<HostWindowId, WidgetKey>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: WidgetRecord) -> WidgetKey {
        let window = record.host_window();
        let key = self.slots.insert(WidgetSlot { record, pins: 0, dead: false });

        if let Some(window) = window {
            self.windows.insert(window, key);
        }
        key
    }

    /// Live record for `key`. Dead or freed widgets are not returned.
    pub fn get(&self, key: WidgetKey) -> Option<&WidgetRecord> {
        self.slots
            .get(key)
            .filter(|slot| !slot.dead)
            .map(|slot| &slot.record)
    }

    pub fn get_mut(&mut self, key: WidgetKey) -> Option<&mut WidgetRecord> {
        self.slots
            .get_mut(key)
            .filter(|slot| !slot.dead)
            .map(|slot| &mut slot.record)
    }

    pub fn key_for_window(&self, window: HostWindowId) -> Option<WidgetKey> {
        self.windows.get(&window).copied()
    }

    /// Pins the slot so it survives a destroy until released. Returns `false` when the widget is
    /// already dead, in which case nothing was pinned.
    pub fn preserve(&mut self, key: WidgetKey) -> bool {
        match self.slots.get_mut(key) {
            Some(slot) if !slot.dead => {
                slot.pins += 1;
                true
            }
            _ => false,
        }
    }

    /// Drops one pin. Frees the slot if the widget was destroyed meanwhile and this was the last
    /// pin; returns `true` in that case.
    pub fn release(&mut self, key: WidgetKey) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };

        slot.pins = slot.pins.saturating_sub(1);
        if slot.dead && slot.pins == 0 {
            self.slots.remove(key);
            debug!("widget {:?} freed after last release", key);
            return true;
        }
        false
    }

    /// Marks the widget dead and drops its references. The slot is freed now if nothing pins it,
    /// otherwise on the last release. Returns the host window the widget was bound to.
    pub fn destroy(&mut self, key: WidgetKey) -> Option<HostWindowId> {
        let slot = self.slots.get_mut(key).filter(|slot| !slot.dead)?;

        let window = slot.record.host_window();
        let pins = slot.pins;
        slot.record.tear_down();
        slot.dead = true;

        if let Some(window) = window {
            self.windows.remove(&window);
        }

        if pins == 0 {
            self.slots.remove(key);
        } else {
            debug!("widget {:?} destroyed while pinned {} time(s), free deferred", key, pins);
        }
        window
    }

    /// Whether the slot is still occupied, dead or alive.
    pub fn is_occupied(&self, key: WidgetKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn pins(&self, key: WidgetKey) -> u32 {
        self.slots.get(key).map(|slot| slot.pins).unwrap_or(0)
    }

    /// Number of live widgets.
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| !slot.dead).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_one() -> (WidgetRegistry, WidgetKey) {
        let mut registry = WidgetRegistry::new();
        let key = registry.insert(WidgetRecord::new(HostWindowId(3), 400, 400));
        (registry, key)
    }

    #[test]
    fn insert_routes_host_window() {
        let (registry, key) = registry_with_one();
        assert_eq!(registry.key_for_window(HostWindowId(3)), Some(key));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn destroy_without_pins_frees_immediately() {
        let (mut registry, key) = registry_with_one();

        assert_eq!(registry.destroy(key), Some(HostWindowId(3)));
        assert!(registry.get(key).is_none());
        assert!(!registry.is_occupied(key));
        assert!(registry.key_for_window(HostWindowId(3)).is_none());

        // second destroy is a no-op
        assert_eq!(registry.destroy(key), None);
    }

    #[test]
    fn pinned_widget_is_freed_on_last_release() {
        let (mut registry, key) = registry_with_one();
        assert!(registry.preserve(key));
        assert!(registry.preserve(key));

        registry.destroy(key);
        assert!(registry.get(key).is_none());
        assert!(registry.is_occupied(key));
        assert!(registry.is_empty());

        // dead widgets cannot be pinned again
        assert!(!registry.preserve(key));

        assert!(!registry.release(key));
        assert!(registry.is_occupied(key));
        assert!(registry.release(key));
        assert!(!registry.is_occupied(key));
    }

    #[test]
    fn stale_key_does_not_resolve_after_reuse() {
        let (mut registry, old) = registry_with_one();
        registry.destroy(old);

        let new = registry.insert(WidgetRecord::new(HostWindowId(4), 1, 1));
        assert_ne!(old, new);
        assert!(registry.get(old).is_none());
        assert!(registry.get(new).is_some());
    }

    #[test]
    fn release_without_destroy_keeps_widget() {
        let (mut registry, key) = registry_with_one();
        registry.preserve(key);

        assert!(!registry.release(key));
        assert!(registry.get(key).is_some());
        assert_eq!(registry.pins(key), 0);
    }
}
