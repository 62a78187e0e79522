use std::num::NonZeroIsize;

use log::debug;
use raw_window_handle::{RawWindowHandle, Win32WindowHandle};

use crate::host::{HostToolkit, HostWindowId, NativeWindow};
use crate::platform::{PlatformEmbedding, PlatformKind};
use crate::render::RenderSurface;

/// Embedding on win32.
///
/// Parent propagation and visual matching are not defined for this platform yet: the parent
/// window is still materialized, but the surface is not told about it, and the surface's desired
/// visual is ignored. Native window adoption, dispatch registration and restacking work as on X11.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Embedding;

impl PlatformEmbedding for Win32Embedding {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Win32
    }

    fn window_handle(&self, native: NativeWindow) -> Option<RawWindowHandle> {
        let hwnd = NonZeroIsize::new(native.0 as isize)?;
        Some(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)))
    }

    fn root_handle(&self, _host: &dyn HostToolkit, window: HostWindowId) -> Option<RawWindowHandle> {
        debug!("win32: no parent propagation for top-level window {:?}", window);
        None
    }

    fn materialize_parent(&self, host: &mut dyn HostToolkit, parent: HostWindowId) -> Option<RawWindowHandle> {
        if host.native_window(parent).is_none() {
            host.make_window_exist(parent);
        }
        debug!("win32: parent {:?} materialized, not propagated to the surface", parent);
        None
    }

    fn set_visual_attributes(&self, _host: &mut dyn HostToolkit, _window: HostWindowId, _surface: &dyn RenderSurface) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::HeadlessToolkit;

    #[test]
    fn null_hwnd_has_no_handle() {
        assert!(Win32Embedding.window_handle(NativeWindow(0)).is_none());
        assert!(matches!(Win32Embedding.window_handle(NativeWindow(7)), Some(RawWindowHandle::Win32(_))));
    }

    #[test]
    fn parent_is_materialized_but_not_propagated() {
        let mut host = HeadlessToolkit::new();
        let frame = host.create_window(".frame").unwrap();
        assert!(host.native_window(frame).is_none());

        assert!(Win32Embedding.materialize_parent(&mut host, frame).is_none());
        assert!(host.native_window(frame).is_some());
    }
}
