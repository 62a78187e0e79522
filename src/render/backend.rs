use std::fmt::Display;
use std::str::FromStr;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::host::{NativeWindow, Visual};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Public handle of a render surface. The string form (a hyphenated UUID) is what the widget
/// hands out through `getRenderSurfaceHandle` and accepts through `-renderSurfaceHandle`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SurfaceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for SurfaceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A drawable owned by the rendering library. The widget never owns one of these; it only holds
/// the [`SurfaceId`] and borrows the surface from its [`SurfaceFactory`] for the duration of a call.
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;
    fn set_size(&mut self, size: SurfaceSize);

    /// Window the surface must embed itself into.
    fn set_parent(&mut self, parent: RawWindowHandle);

    /// Share the host toolkit's display connection. The surface must not open its own.
    fn set_display_connection(&mut self, display: RawDisplayHandle);

    fn render(&mut self) -> anyhow::Result<()>;

    /// Native window backing the surface. Usually only available after the first render.
    fn native_window(&self) -> Option<NativeWindow>;

    /// Visual the surface would like its window to use, if it cares.
    fn desired_visual(&self) -> Option<Visual> {
        None
    }
}

/// Creates new surfaces and resolves existing ones by handle. The factory owns every surface it
/// hands out; it lives as long as the process that embeds widgets.
pub trait SurfaceFactory {
    fn name(&self) -> &str;

    fn create_surface(&mut self) -> anyhow::Result<SurfaceId>;

    fn surface(&self, id: SurfaceId) -> Option<&dyn RenderSurface>;
    fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut dyn RenderSurface>;

    /// Looks up a surface created earlier (possibly for another widget). Returns `None` when the
    /// handle names no surface known to this factory.
    fn resolve_surface(&mut self, id: SurfaceId) -> Option<&mut dyn RenderSurface> {
        self.surface_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_id_string_form_parses_back() {
        let id = SurfaceId::new();
        let parsed: SurfaceId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn surface_id_rejects_garbage() {
        assert!("renderWindow1".parse::<SurfaceId>().is_err());
        assert!("".parse::<SurfaceId>().is_err());
    }

    #[test]
    fn surface_id_serializes_as_its_handle() {
        let id = SurfaceId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: SurfaceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
