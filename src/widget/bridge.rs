//! Structural event handling.
//!
//! The bridge turns toolkit events into surface operations and keeps the record's geometry in
//! step with the host window. Every event is handled with the record pinned, so a destroy
//! delivered in the middle of handling never frees the slot underneath the handler.

use log::{debug, warn};

use crate::events::StructureEvent;
use crate::host::HostToolkit;
use crate::render::{SurfaceFactory, SurfaceSize};
use crate::widget::registry::{WidgetKey, WidgetRegistry};

/// What handling one event did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Final expose of a batch on an attached widget
    Rendered,
    /// More exposes are queued behind this one
    Suppressed,
    Resized { width: u32, height: u32 },
    TornDown,
    /// Event needs no work (unattached expose, map, unmap, ...)
    Ignored,
    /// Widget no longer exists
    Dead,
    RenderFailed,
}

pub struct EventBridge<'a> {
    host: &'a mut dyn HostToolkit,
    factory: &'a mut dyn SurfaceFactory,
}

impl<'a> EventBridge<'a> {
    pub fn new(host: &'a mut dyn HostToolkit, factory: &'a mut dyn SurfaceFactory) -> Self {
        Self { host, factory }
    }

    pub fn handle(&mut self, registry: &mut WidgetRegistry, key: WidgetKey, event: &StructureEvent) -> EventOutcome {
        if !registry.preserve(key) {
            debug!("{} for dead widget {:?} dropped", event.kind(), key);
            return EventOutcome::Dead;
        }

        let outcome = self.dispatch(registry, key, event);

        if registry.release(key) {
            debug!("widget {:?} released after {}", key, event.kind());
        }
        outcome
    }

    fn dispatch(&mut self, registry: &mut WidgetRegistry, key: WidgetKey, event: &StructureEvent) -> EventOutcome {
        match event {
            StructureEvent::Expose { count } if *count > 0 => EventOutcome::Suppressed,
            StructureEvent::Expose { .. } => self.expose(registry, key),
            StructureEvent::Configure { .. } => self.configure(registry, key),
            StructureEvent::Destroy => self.tear_down(registry, key),
            StructureEvent::Map | StructureEvent::Unmap | StructureEvent::Other(_) => EventOutcome::Ignored,
        }
    }

    /// Drops the widget. A native window adopted from the surface is only detached from the host
    /// window: it belongs to the surface and may still be shown by other widgets.
    fn tear_down(&mut self, registry: &mut WidgetRegistry, key: WidgetKey) -> EventOutcome {
        let attached = registry.get(key).and_then(|record| record.surface());

        let Some(window) = registry.destroy(key) else {
            return EventOutcome::Dead;
        };

        if attached.is_some() {
            if let Some(native) = self.host.native_window(window) {
                self.host.unregister_native(native, window);
                self.host.set_native_window(window, None);
            }
        }

        debug!("widget {:?} on {:?} torn down", key, window);
        EventOutcome::TornDown
    }

    fn expose(&mut self, registry: &WidgetRegistry, key: WidgetKey) -> EventOutcome {
        let Some(record) = registry.get(key) else {
            return EventOutcome::Dead;
        };
        let Some(id) = record.surface() else {
            return EventOutcome::Ignored;
        };
        let Some(surface) = self.factory.surface_mut(id) else {
            warn!("widget {:?}: surface {} vanished from the factory", key, id);
            return EventOutcome::RenderFailed;
        };

        match surface.render() {
            Ok(()) => EventOutcome::Rendered,
            Err(e) => {
                warn!("widget {:?}: rendering surface {} failed: {}", key, id, e);
                EventOutcome::RenderFailed
            }
        }
    }

    /// The host's geometry wins. It is copied into the record, the native window and, once
    /// attached, the surface.
    fn configure(&mut self, registry: &mut WidgetRegistry, key: WidgetKey) -> EventOutcome {
        let Some(record) = registry.get_mut(key) else {
            return EventOutcome::Dead;
        };
        let Some(window) = record.host_window() else {
            return EventOutcome::Dead;
        };

        let geometry = self.host.geometry(window);
        let size = SurfaceSize::new(geometry.width, geometry.height);
        record.set_size(size);

        if let Some(native) = self.host.native_window(window) {
            self.host.resize_native_window(native, size.width, size.height);
        }

        if let Some(id) = record.surface() {
            match self.factory.surface_mut(id) {
                Some(surface) => surface.set_size(size),
                None => warn!("widget {:?}: surface {} vanished from the factory", key, id),
            }
        }

        EventOutcome::Resized { width: size.width, height: size.height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::HeadlessToolkit;
    use crate::platform::X11Embedding;
    use crate::render::backends::null::NullSurfaceFactory;
    use crate::render::RenderSurface;
    use crate::widget::attach::AttachmentController;
    use crate::widget::record::WidgetRecord;

    struct Fixture {
        host: HeadlessToolkit,
        factory: NullSurfaceFactory,
        registry: WidgetRegistry,
        key: WidgetKey,
    }

    impl Fixture {
        fn new() -> Self {
            let mut host = HeadlessToolkit::new();
            let window = host.create_window(".view").unwrap();
            let mut registry = WidgetRegistry::new();
            let key = registry.insert(WidgetRecord::new(window, 400, 400));

            Self {
                host,
                factory: NullSurfaceFactory::new().unwrap(),
                registry,
                key,
            }
        }

        fn attach(&mut self) -> crate::render::SurfaceId {
            let record = self.registry.get_mut(self.key).unwrap();
            AttachmentController::new(&mut self.host, &mut self.factory, &X11Embedding)
                .ensure_attached(record)
                .unwrap()
        }

        fn send(&mut self, event: StructureEvent) -> EventOutcome {
            EventBridge::new(&mut self.host, &mut self.factory).handle(&mut self.registry, self.key, &event)
        }

        fn window(&self) -> crate::host::HostWindowId {
            self.registry.get(self.key).unwrap().host_window().unwrap()
        }
    }

    #[test]
    fn expose_batch_renders_once_on_last_event() {
        let mut fx = Fixture::new();
        let id = fx.attach();
        let frames = fx.factory.null_surface(id).unwrap().frames();

        let outcomes: Vec<_> = StructureEvent::expose_batch(4).into_iter().map(|e| fx.send(e)).collect();

        assert_eq!(
            outcomes,
            vec![
                EventOutcome::Suppressed,
                EventOutcome::Suppressed,
                EventOutcome::Suppressed,
                EventOutcome::Rendered
            ]
        );
        assert_eq!(fx.factory.null_surface(id).unwrap().frames(), frames + 1);
    }

    #[test]
    fn expose_before_attach_is_ignored() {
        let mut fx = Fixture::new();
        assert_eq!(fx.send(StructureEvent::Expose { count: 0 }), EventOutcome::Ignored);
        assert_eq!(fx.factory.created(), 0);
    }

    #[test]
    fn resizes_keep_record_and_surface_equal() {
        let mut fx = Fixture::new();
        let id = fx.attach();
        let window = fx.window();

        for (w, h) in [(640, 480), (1, 1), (1024, 20), (300, 300)] {
            let event = fx.host.assign_geometry(window, 0, 0, w, h);
            assert_eq!(fx.send(event), EventOutcome::Resized { width: w, height: h });

            let record = fx.registry.get(fx.key).unwrap();
            assert_eq!(record.size(), SurfaceSize::new(w, h));
            assert_eq!(fx.factory.null_surface(id).unwrap().size(), record.size());

            let native = fx.host.native_window(window).unwrap();
            assert_eq!(fx.host.native_size(native), Some((w, h)));
        }
    }

    #[test]
    fn resize_before_attach_is_applied_at_attach_time() {
        let mut fx = Fixture::new();
        let window = fx.window();

        let event = fx.host.assign_geometry(window, 0, 0, 123, 45);
        fx.send(event);
        assert_eq!(fx.factory.created(), 0);

        let id = fx.attach();
        assert_eq!(fx.factory.null_surface(id).unwrap().size(), SurfaceSize::new(123, 45));
    }

    #[test]
    fn events_after_destroy_are_no_ops() {
        let mut fx = Fixture::new();
        let id = fx.attach();
        let window = fx.window();
        let frames = fx.factory.null_surface(id).unwrap().frames();

        assert_eq!(fx.send(StructureEvent::Destroy), EventOutcome::TornDown);
        assert!(!fx.registry.is_occupied(fx.key));

        assert_eq!(fx.send(StructureEvent::Expose { count: 0 }), EventOutcome::Dead);
        let event = fx.host.assign_geometry(window, 0, 0, 10, 10);
        assert_eq!(fx.send(event), EventOutcome::Dead);
        assert_eq!(fx.send(StructureEvent::Destroy), EventOutcome::Dead);

        // the surface belongs to the factory and outlives the widget
        assert_eq!(fx.factory.null_surface(id).unwrap().frames(), frames);
    }

    #[test]
    fn destroy_detaches_adopted_native_without_destroying_it() {
        let mut fx = Fixture::new();
        let id = fx.attach();
        let window = fx.window();
        let native = fx.host.native_window(window).unwrap();

        assert_eq!(fx.send(StructureEvent::Destroy), EventOutcome::TornDown);

        assert!(fx.host.native_window(window).is_none());
        assert!(fx.host.lookup_native(native).is_none());
        assert!(!fx.host.destroyed_natives().contains(&native));
        assert_eq!(fx.factory.surface(id).unwrap().native_window(), Some(native));
    }

    #[test]
    fn destroy_while_pinned_defers_free() {
        let mut fx = Fixture::new();
        fx.registry.preserve(fx.key);

        assert_eq!(fx.send(StructureEvent::Destroy), EventOutcome::TornDown);
        assert!(fx.registry.is_occupied(fx.key));
        assert_eq!(fx.send(StructureEvent::Expose { count: 0 }), EventOutcome::Dead);

        assert!(fx.registry.release(fx.key));
        assert!(!fx.registry.is_occupied(fx.key));
    }

    #[test]
    fn render_failure_is_reported_not_returned() {
        let mut fx = Fixture::new();
        let id = fx.attach();
        fx.factory.null_surface_mut(id).unwrap().set_fail_render(true);

        assert_eq!(fx.send(StructureEvent::Expose { count: 0 }), EventOutcome::RenderFailed);
        assert!(fx.registry.get(fx.key).is_some());
    }

    #[test]
    fn other_notifications_are_ignored() {
        let mut fx = Fixture::new();
        assert_eq!(fx.send(StructureEvent::Map), EventOutcome::Ignored);
        assert_eq!(fx.send(StructureEvent::Unmap), EventOutcome::Ignored);
        assert_eq!(fx.send(StructureEvent::Other("FocusIn".into())), EventOutcome::Ignored);
        assert_eq!(fx.registry.pins(fx.key), 0);
    }
}
