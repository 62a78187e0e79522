pub mod backend;

/// Surface factories for the render widget.
pub mod backends {
    /// In-memory factory that does not draw anything
    pub mod null;
}

pub use backend::{RenderSurface, SurfaceFactory, SurfaceId, SurfaceSize};
