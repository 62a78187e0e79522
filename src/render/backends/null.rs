use crate::host::{NativeWindow, Visual};
use crate::render::backend::{RenderSurface, SurfaceFactory, SurfaceId, SurfaceSize};
use anyhow::{anyhow, Result};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::collections::HashMap;

/// First native window id handed out by the null factory. Kept far away from the ids the
/// headless toolkit uses so the two never collide in a dispatch table.
const FIRST_NATIVE_WINDOW: u64 = 0x0400_0000;

/// Null surface factory that does not perform any rendering. It owns every surface it creates
/// and keeps enough bookkeeping around for hosts and tests to see what the widget asked for.
pub struct NullSurfaceFactory {
    surfaces: HashMap<SurfaceId, NullSurface>,
    next_native: u64,
    created: usize,
    desired_visual: Option<Visual>,
    fail_next_create: bool,
}

impl NullSurfaceFactory {
    /// Creates a new instance of the null factory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            surfaces: HashMap::new(),
            next_native: FIRST_NATIVE_WINDOW,
            created: 0,
            desired_visual: None,
            fail_next_create: false,
        })
    }

    /// Surfaces created from now on will ask for this visual.
    pub fn with_desired_visual(mut self, visual: Visual) -> Self {
        self.desired_visual = Some(visual);
        self
    }

    /// Makes the next `create_surface` call fail, as a rendering library out of resources would.
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    /// Number of surfaces created over the lifetime of the factory.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn null_surface(&self, id: SurfaceId) -> Option<&NullSurface> {
        self.surfaces.get(&id)
    }

    pub fn null_surface_mut(&mut self, id: SurfaceId) -> Option<&mut NullSurface> {
        self.surfaces.get_mut(&id)
    }
}

impl SurfaceFactory for NullSurfaceFactory {
    fn name(&self) -> &str {
        "NullSurfaceFactory"
    }

    fn create_surface(&mut self) -> Result<SurfaceId> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(anyhow!("NullSurfaceFactory: surface creation refused"));
        }

        let native = NativeWindow(self.next_native);
        self.next_native += 1;

        let surface = NullSurface::new(native, self.desired_visual);
        let id = surface.id;
        self.surfaces.insert(id, surface);
        self.created += 1;

        Ok(id)
    }

    fn surface(&self, id: SurfaceId) -> Option<&dyn RenderSurface> {
        self.surfaces.get(&id).map(|s| s as &dyn RenderSurface)
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut dyn RenderSurface> {
        self.surfaces.get_mut(&id).map(|s| s as &mut dyn RenderSurface)
    }
}

pub struct NullSurface {
    id: SurfaceId,
    /// Size of the surface in pixels.
    pub size: SurfaceSize,
    /// Window the surface was told to embed into
    pub parent: Option<RawWindowHandle>,
    /// Display connection shared with the host
    pub display: Option<RawDisplayHandle>,
    /// Number of frames rendered so far
    frame_id: u64,
    /// Native window; only visible to others once the surface has rendered
    native: NativeWindow,
    desired_visual: Option<Visual>,
    fail_render: bool,
}

impl NullSurface {
    fn new(native: NativeWindow, desired_visual: Option<Visual>) -> Self {
        Self {
            id: SurfaceId::new(),
            size: SurfaceSize::default(),
            parent: None,
            display: None,
            frame_id: 0,
            native,
            desired_visual,
            fail_render: false,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frame_id
    }

    /// Makes every following render fail until reset.
    pub fn set_fail_render(&mut self, fail: bool) {
        self.fail_render = fail;
    }
}

impl RenderSurface for NullSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn set_parent(&mut self, parent: RawWindowHandle) {
        self.parent = Some(parent);
    }

    fn set_display_connection(&mut self, display: RawDisplayHandle) {
        self.display = Some(display);
    }

    fn render(&mut self) -> Result<()> {
        if self.fail_render {
            return Err(anyhow!("NullSurface {}: render failed", self.id));
        }

        self.frame_id = self.frame_id.wrapping_add(1);
        Ok(())
    }

    fn native_window(&self) -> Option<NativeWindow> {
        (self.frame_id > 0).then_some(self.native)
    }

    fn desired_visual(&self) -> Option<Visual> {
        self.desired_visual
    }
}
