//! Platform embedding.
//!
//! Attaching a surface to a widget is one algorithm on every platform (see
//! [`AttachmentController`](crate::widget::attach::AttachmentController)). What differs is how a
//! native window is turned into a handle the rendering library understands, what the root window
//! is, and whether visuals must be matched. Those pieces live behind [`PlatformEmbedding`], with
//! one adapter per windowing system.

use std::fmt::Display;

use raw_window_handle::RawWindowHandle;

use crate::host::{HostToolkit, HostWindowId, NativeWindow, WindowFlags};
use crate::render::RenderSurface;

pub mod win32;
pub mod x11;

pub use win32::Win32Embedding;
pub use x11::X11Embedding;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlatformKind {
    #[default]
    X11,
    Win32,
}

impl PlatformKind {
    pub fn embedding(self) -> Box<dyn PlatformEmbedding> {
        match self {
            PlatformKind::X11 => Box::new(X11Embedding),
            PlatformKind::Win32 => Box::new(Win32Embedding),
        }
    }
}

impl Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::X11 => write!(f, "x11"),
            PlatformKind::Win32 => write!(f, "win32"),
        }
    }
}

/// Platform specific parts of surface attachment.
pub trait PlatformEmbedding {
    fn kind(&self) -> PlatformKind;

    /// Handle the rendering library understands for `native`.
    fn window_handle(&self, native: NativeWindow) -> Option<RawWindowHandle>;

    /// Handle of the root/desktop window top-level surfaces are parented to. `None` when the
    /// platform does not propagate parents to the surface.
    fn root_handle(&self, host: &dyn HostToolkit, window: HostWindowId) -> Option<RawWindowHandle>;

    /// Drops the native resource the toolkit created for `window`, if any. The surface brings its
    /// own. Returns the destroyed window.
    fn destroy_native(&self, host: &mut dyn HostToolkit, window: HostWindowId) -> Option<NativeWindow> {
        let native = host.native_window(window)?;

        host.unregister_native(native, window);
        host.destroy_native_window(native);
        host.set_native_window(window, None);

        Some(native)
    }

    /// Makes sure the parent's native resource exists (children can only embed into existing
    /// windows) and returns its handle.
    fn materialize_parent(&self, host: &mut dyn HostToolkit, parent: HostWindowId) -> Option<RawWindowHandle> {
        let native = match host.native_window(parent) {
            Some(native) => native,
            None => host.make_window_exist(parent),
        };
        self.window_handle(native)
    }

    /// Makes the surface's native window the toolkit window's own.
    fn adopt_native(&self, host: &mut dyn HostToolkit, window: HostWindowId, native: NativeWindow) {
        host.set_native_window(window, Some(native));
    }

    /// Routes events for `native` back to `window` through the toolkit's dispatcher.
    fn register_in_dispatch_table(&self, host: &mut dyn HostToolkit, native: NativeWindow, window: HostWindowId) {
        host.register_native(native, window);
    }

    /// Restores the declared stacking order: `native` goes directly below the first later sibling
    /// that already has a native window. Returns that sibling.
    fn restack(&self, host: &mut dyn HostToolkit, window: HostWindowId, native: NativeWindow) -> Option<NativeWindow> {
        let sibling = host
            .later_siblings(window)
            .into_iter()
            .filter(|s| !host.flags(*s).contains(WindowFlags::TOP_LEVEL))
            .find_map(|s| host.native_window(s))?;

        host.restack_below(native, sibling);
        Some(sibling)
    }

    /// Applies the visual the surface asks for to the toolkit window.
    fn set_visual_attributes(&self, host: &mut dyn HostToolkit, window: HostWindowId, surface: &dyn RenderSurface);
}
