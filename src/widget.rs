//! Render widgets.
//!
//! [`RenderWidgets`] is the context every widget operation goes through. It owns the defaults,
//! the widget arena, the surface factory and the platform adapter; the host toolkit is borrowed
//! per call. There is one per process by convention, created at startup and dropped at exit.

use std::collections::HashMap;

use log::debug;

use crate::config::WidgetsConfig;
use crate::errors::WidgetError;
use crate::events::StructureEvent;
use crate::host::{HostToolkit, HostWindowId, NativeWindow};
use crate::platform::PlatformEmbedding;
use crate::render::{SurfaceFactory, SurfaceId};

pub mod attach;
pub mod bridge;
pub mod command;
pub mod record;
pub mod registry;

pub use attach::AttachmentController;
pub use bridge::{EventBridge, EventOutcome};
pub use record::{WidgetRecord, WidgetState};
pub use registry::{WidgetKey, WidgetRegistry};

/// Class name render widgets register with the toolkit.
pub const WIDGET_CLASS: &str = "RenderWidget";

pub struct RenderWidgets<F: SurfaceFactory> {
    /// Defaults for new widgets
    config: WidgetsConfig,
    registry: WidgetRegistry,
    /// Creates and owns the render surfaces
    factory: F,
    platform: Box<dyn PlatformEmbedding>,
    /// Widget commands by path name
    commands: HashMap<String, WidgetKey>,
}

impl<F: SurfaceFactory> RenderWidgets<F> {
    /// Create a new widget context.
    ///
    /// If `config` is `None`, [`WidgetsConfig::default`] is used. The platform adapter follows
    /// [`WidgetsConfig::platform`].
    ///
    /// ```
    /// use gosub_render_widget::render::backends::null::NullSurfaceFactory;
    /// use gosub_render_widget::RenderWidgets;
    ///
    /// let factory = NullSurfaceFactory::new().unwrap();
    /// let widgets = RenderWidgets::new(None, factory);
    /// assert!(widgets.registry().is_empty());
    /// ```
    pub fn new(config: Option<WidgetsConfig>, factory: F) -> Self {
        let config = config.unwrap_or_default();
        let platform = config.platform.embedding();

        Self {
            config,
            registry: WidgetRegistry::new(),
            factory,
            platform,
            commands: HashMap::new(),
        }
    }

    /// Replaces the platform adapter picked from the config.
    pub fn with_platform(mut self, platform: Box<dyn PlatformEmbedding>) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &WidgetsConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn platform(&self) -> &dyn PlatformEmbedding {
        self.platform.as_ref()
    }

    /// Widget whose command is `path`.
    pub fn key_for_path(&self, path: &str) -> Option<WidgetKey> {
        self.commands.get(path).copied()
    }

    pub fn key_for_window(&self, window: HostWindowId) -> Option<WidgetKey> {
        self.registry.key_for_window(window)
    }

    fn record(&self, key: WidgetKey) -> Result<&WidgetRecord, WidgetError> {
        self.registry.get(key).ok_or(WidgetError::InvalidWidget)
    }

    /// Public handle of the widget's surface, empty while none was requested or created. Never
    /// attaches.
    pub fn surface_handle(&self, key: WidgetKey) -> Result<String, WidgetError> {
        Ok(self.record(key)?.surface_handle())
    }

    pub fn width(&self, key: WidgetKey) -> Result<u32, WidgetError> {
        Ok(self.record(key)?.width())
    }

    pub fn height(&self, key: WidgetKey) -> Result<u32, WidgetError> {
        Ok(self.record(key)?.height())
    }

    /// Attaches the widget if needed and returns its surface.
    pub fn ensure_attached(&mut self, host: &mut dyn HostToolkit, key: WidgetKey) -> Result<SurfaceId, WidgetError> {
        let record = self.registry.get_mut(key).ok_or(WidgetError::InvalidWidget)?;
        let surface = AttachmentController::new(host, &mut self.factory, self.platform.as_ref()).ensure_attached(record)?;
        Ok(surface)
    }

    /// Like [`surface_handle`](Self::surface_handle), but attaches first so the handle always
    /// names a live surface.
    pub fn get_or_create_surface_handle(&mut self, host: &mut dyn HostToolkit, key: WidgetKey) -> Result<String, WidgetError> {
        Ok(self.ensure_attached(host, key)?.to_string())
    }

    /// Pins a widget across work that may destroy it. See [`WidgetRegistry::preserve`].
    pub fn preserve(&mut self, key: WidgetKey) -> bool {
        self.registry.preserve(key)
    }

    pub fn release(&mut self, key: WidgetKey) -> bool {
        self.registry.release(key)
    }

    /// Handles a structural event the toolkit delivered for `window`.
    pub fn handle_event(&mut self, host: &mut dyn HostToolkit, window: HostWindowId, event: &StructureEvent) -> EventOutcome {
        let Some(key) = self.registry.key_for_window(window) else {
            debug!("{} for {:?}: no render widget", event.kind(), window);
            return EventOutcome::Dead;
        };

        let outcome = EventBridge::new(host, &mut self.factory).handle(&mut self.registry, key, event);
        if outcome == EventOutcome::TornDown {
            self.commands.retain(|_, k| *k != key);
        }
        outcome
    }

    /// Handles an event the platform delivered for a native window, routed through the toolkit's
    /// dispatch table.
    pub fn handle_native_event(&mut self, host: &mut dyn HostToolkit, native: NativeWindow, event: &StructureEvent) -> EventOutcome {
        match host.lookup_native(native) {
            Some(window) => self.handle_event(host, window, event),
            None => {
                debug!("{} for unknown native window {}", event.kind(), native);
                EventOutcome::Dead
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::HeadlessToolkit;
    use crate::platform::{PlatformKind, Win32Embedding};
    use crate::render::backends::null::NullSurfaceFactory;
    use crate::render::RenderSurface;

    fn widgets() -> RenderWidgets<NullSurfaceFactory> {
        RenderWidgets::new(None, NullSurfaceFactory::new().unwrap())
    }

    #[test]
    fn platform_follows_config() {
        let config = WidgetsConfig::builder().platform(PlatformKind::Win32).build().unwrap();
        let widgets = RenderWidgets::new(Some(config), NullSurfaceFactory::new().unwrap());
        assert_eq!(widgets.platform().kind(), PlatformKind::Win32);

        let widgets = widgets.with_platform(PlatformKind::X11.embedding());
        assert_eq!(widgets.platform().kind(), PlatformKind::X11);
        assert_eq!(self::widgets().platform().kind(), PlatformKind::X11);
    }

    #[test]
    fn accessors_never_attach() {
        let mut host = HeadlessToolkit::new();
        let mut widgets = widgets();
        let key = widgets.create_widget(&mut host, ".w", &[]).unwrap();
        let created = widgets.factory().created();

        assert_eq!(widgets.width(key).unwrap(), 400);
        assert_eq!(widgets.height(key).unwrap(), 400);
        widgets.surface_handle(key).unwrap();
        assert_eq!(widgets.factory().created(), created);
    }

    #[test]
    fn get_or_create_returns_live_surface_handle() {
        let mut host = HeadlessToolkit::new();
        let mut widgets = widgets();
        let key = widgets.create_widget(&mut host, ".w", &[]).unwrap();

        let handle = widgets.get_or_create_surface_handle(&mut host, key).unwrap();
        let id: SurfaceId = handle.parse().unwrap();

        assert!(widgets.factory().surface(id).is_some());
        assert_eq!(widgets.surface_handle(key).unwrap(), handle);
    }

    #[test]
    fn native_events_route_through_dispatch_table() {
        let mut host = HeadlessToolkit::new();
        let mut widgets = widgets();
        let key = widgets.create_widget(&mut host, ".w", &[]).unwrap();
        let id = widgets.ensure_attached(&mut host, key).unwrap();
        let native = widgets.factory().surface(id).unwrap().native_window().unwrap();
        let frames = widgets.factory().null_surface(id).unwrap().frames();

        let outcome = widgets.handle_native_event(&mut host, native, &StructureEvent::Expose { count: 0 });

        assert_eq!(outcome, EventOutcome::Rendered);
        assert_eq!(widgets.factory().null_surface(id).unwrap().frames(), frames + 1);
        assert_eq!(
            widgets.handle_native_event(&mut host, NativeWindow(0xdead), &StructureEvent::Expose { count: 0 }),
            EventOutcome::Dead
        );
    }

    #[test]
    fn destroy_drops_widget_command() {
        let mut host = HeadlessToolkit::new();
        let mut widgets = widgets();
        let key = widgets.create_widget(&mut host, ".w", &[]).unwrap();
        let window = widgets.registry().get(key).unwrap().host_window().unwrap();

        host.destroy_window(window);
        assert_eq!(widgets.handle_event(&mut host, window, &StructureEvent::Destroy), EventOutcome::TornDown);

        assert!(widgets.key_for_path(".w").is_none());
        assert!(matches!(widgets.width(key), Err(WidgetError::InvalidWidget)));
        assert!(widgets.registry().is_empty());
    }

    #[test]
    fn destroy_while_preserved_keeps_slot_until_release() {
        let mut host = HeadlessToolkit::new();
        let mut widgets = widgets();
        let key = widgets.create_widget(&mut host, ".w", &[]).unwrap();
        let window = widgets.registry().get(key).unwrap().host_window().unwrap();

        assert!(widgets.preserve(key));
        widgets.handle_event(&mut host, window, &StructureEvent::Destroy);

        assert!(widgets.registry().is_occupied(key));
        assert!(widgets.surface_handle(key).is_err());
        assert!(widgets.release(key));
        assert!(!widgets.registry().is_occupied(key));
    }

    #[test]
    fn win32_widgets_attach_without_parent_handle() {
        let mut host = HeadlessToolkit::new();
        let mut widgets = widgets().with_platform(Box::new(Win32Embedding));
        let key = widgets.create_widget(&mut host, ".w", &[]).unwrap();
        let id = widgets.ensure_attached(&mut host, key).unwrap();

        assert!(widgets.factory().null_surface(id).unwrap().parent.is_none());
    }
}
