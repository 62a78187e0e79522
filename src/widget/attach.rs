//! Surface attachment.
//!
//! Attaching binds a widget to a live render surface: the surface is created (or looked up by
//! handle), sized, parented, bound to the toolkit's display connection and rendered once, and its
//! native window then replaces the toolkit's own so that events for it are dispatched to the
//! widget. Attachment is all or nothing: the record is only marked attached once every step has
//! succeeded.

use log::{debug, error};

use crate::errors::AttachError;
use crate::events::StructureEvent;
use crate::host::{HostToolkit, HostWindowId, WindowFlags};
use crate::platform::PlatformEmbedding;
use crate::render::{SurfaceFactory, SurfaceId};
use crate::widget::record::WidgetRecord;

pub struct AttachmentController<'a> {
    host: &'a mut dyn HostToolkit,
    factory: &'a mut dyn SurfaceFactory,
    platform: &'a dyn PlatformEmbedding,
}

impl<'a> AttachmentController<'a> {
    pub fn new(
        host: &'a mut dyn HostToolkit,
        factory: &'a mut dyn SurfaceFactory,
        platform: &'a dyn PlatformEmbedding,
    ) -> Self {
        Self { host, factory, platform }
    }

    /// Attaches `record` to a surface unless it already is. Returns the attached surface.
    pub fn ensure_attached(&mut self, record: &mut WidgetRecord) -> Result<SurfaceId, AttachError> {
        if let Some(surface) = record.surface() {
            return Ok(surface);
        }

        let window = record.host_window().ok_or(AttachError::NoHostWindow)?;

        match self.attach(record, window) {
            Ok(surface) => {
                record.set_attached(surface);
                Ok(surface)
            }
            Err(e) => {
                error!("attaching {:?} on {} failed: {}", window, self.platform.kind(), e);
                Err(e)
            }
        }
    }

    fn attach(&mut self, record: &WidgetRecord, window: HostWindowId) -> Result<SurfaceId, AttachError> {
        // The toolkit's native window goes first, the surface brings its own. A requested handle is
        // resolved before that so an unknown handle leaves the toolkit window alone.
        let surface_id = match record.requested_surface() {
            Some(handle) => {
                if self.factory.resolve_surface(handle).is_none() {
                    return Err(AttachError::UnknownHandle(handle));
                }
                self.destroy_native(window);
                debug!("{:?} attaches to existing surface {}", window, handle);
                handle
            }
            None => {
                self.destroy_native(window);
                let id = self.factory.create_surface().map_err(AttachError::Factory)?;
                debug!("{:?} attaches to new surface {} from {}", window, id, self.factory.name());
                id
            }
        };

        let flags = self.host.flags(window);
        let parent = match self.host.parent(window) {
            Some(parent) if !flags.contains(WindowFlags::TOP_LEVEL) => {
                self.platform.materialize_parent(self.host, parent)
            }
            _ => self.platform.root_handle(self.host, window),
        };
        let display = self.host.display_handle();

        let surface = self
            .factory
            .surface_mut(surface_id)
            .ok_or(AttachError::SurfaceGone(surface_id))?;

        surface.set_size(record.size());
        match parent {
            Some(parent) => surface.set_parent(parent),
            None => debug!("{:?}: surface {} keeps its default parent", window, surface_id),
        }
        surface.set_display_connection(display);

        self.platform.set_visual_attributes(self.host, window, surface);

        surface.render().map_err(AttachError::Render)?;
        let native = surface
            .native_window()
            .ok_or(AttachError::NoNativeWindow(surface_id))?;

        // From here on the platform routes events for the surface's window to this widget.
        self.platform.adopt_native(self.host, window, native);
        self.platform.register_in_dispatch_table(self.host, native, window);
        debug!("{:?} now uses native window {}", window, native);

        self.flush_config_notify(window);

        if !flags.contains(WindowFlags::TOP_LEVEL) {
            if let Some(sibling) = self.platform.restack(self.host, window, native) {
                debug!("{:?}: {} restacked below {}", window, native, sibling);
            }

            if let Some(parent) = self.host.parent(window) {
                if self.host.colormap(window) != self.host.colormap(parent) {
                    self.host.add_to_colormap_windows(window);
                }
            }
        }

        Ok(surface_id)
    }

    fn destroy_native(&mut self, window: HostWindowId) {
        if let Some(native) = self.platform.destroy_native(self.host, window) {
            debug!("{:?}: toolkit native window {} destroyed", window, native);
        }
    }

    /// Delivers the configure notification the toolkit deferred while the window had no native
    /// resource, unless the window is being destroyed.
    fn flush_config_notify(&mut self, window: HostWindowId) {
        let flags = self.host.flags(window);
        if !flags.contains(WindowFlags::NEED_CONFIG_NOTIFY) {
            return;
        }

        self.host.clear_flags(window, WindowFlags::NEED_CONFIG_NOTIFY);
        if flags.contains(WindowFlags::ALREADY_DEAD) {
            return;
        }

        let geometry = self.host.geometry(window);
        let event = StructureEvent::Configure {
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            border_width: geometry.border_width,
            above: geometry.above,
        };
        debug!("{:?}: delivering deferred {}", window, event);
        self.host.handle_event(window, event);
    }
}
