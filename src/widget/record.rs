use crate::config::{ConfigChanges, ConfigError};
use crate::host::HostWindowId;
use crate::render::{SurfaceId, SurfaceSize};

/// Where a widget is in its life. Torn down is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WidgetState {
    Unattached,
    Attached,
    TornDown,
}

/// Per-widget state. The host window belongs to the toolkit and the surface to the surface
/// factory; the record only refers to them.
#[derive(Debug, Clone)]
pub struct WidgetRecord {
    host_window: Option<HostWindowId>,
    width: u32,
    height: u32,
    /// Handle requested through `-renderSurfaceHandle`, or the handle of the surface created for
    /// this widget once attached. `None` means "create one".
    surface_handle: Option<SurfaceId>,
    /// Set once attachment has completed
    surface: Option<SurfaceId>,
}

impl WidgetRecord {
    pub fn new(host_window: HostWindowId, width: u32, height: u32) -> Self {
        Self {
            host_window: Some(host_window),
            width,
            height,
            surface_handle: None,
            surface: None,
        }
    }

    pub fn host_window(&self) -> Option<HostWindowId> {
        self.host_window
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    /// Public handle string. Empty until a handle was requested or a surface was created.
    pub fn surface_handle(&self) -> String {
        self.surface_handle.map(|h| h.to_string()).unwrap_or_default()
    }

    pub fn requested_surface(&self) -> Option<SurfaceId> {
        self.surface_handle
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn state(&self) -> WidgetState {
        match (self.host_window, self.surface) {
            (None, _) => WidgetState::TornDown,
            (Some(_), Some(_)) => WidgetState::Attached,
            (Some(_), None) => WidgetState::Unattached,
        }
    }

    /// Applies parsed options. An attached widget keeps its surface: asking for another one is
    /// an error, restating the current handle is not.
    pub fn apply_changes(&mut self, changes: &ConfigChanges) -> Result<(), ConfigError> {
        if let (Some(current), Some(requested)) = (self.surface, changes.surface_handle) {
            if requested != Some(current) {
                return Err(ConfigError::HandleLocked { current });
            }
        }

        if let Some(width) = changes.width {
            self.width = width;
        }
        if let Some(height) = changes.height {
            self.height = height;
        }
        if let Some(handle) = changes.surface_handle {
            self.surface_handle = handle;
        }
        Ok(())
    }

    pub(crate) fn set_size(&mut self, size: SurfaceSize) {
        self.width = size.width;
        self.height = size.height;
    }

    pub(crate) fn set_attached(&mut self, surface: SurfaceId) {
        self.surface_handle = Some(surface);
        self.surface = Some(surface);
    }

    /// Drops the references to the host window and the surface. Neither is destroyed here.
    pub(crate) fn tear_down(&mut self) {
        self.host_window = None;
        self.surface = None;
    }
}
