use log::debug;
use raw_window_handle::{RawWindowHandle, XlibWindowHandle};

use crate::host::{HostToolkit, HostWindowId, NativeWindow};
use crate::platform::{PlatformEmbedding, PlatformKind};
use crate::render::RenderSurface;

/// Embedding on X11. Surfaces are reparented into the toolkit's windows, the toolkit listens to
/// every event of the adopted window and switches colormaps when the surface wants its own visual.
#[derive(Debug, Default, Clone, Copy)]
pub struct X11Embedding;

impl PlatformEmbedding for X11Embedding {
    fn kind(&self) -> PlatformKind {
        PlatformKind::X11
    }

    fn window_handle(&self, native: NativeWindow) -> Option<RawWindowHandle> {
        Some(RawWindowHandle::Xlib(XlibWindowHandle::new(native.0 as _)))
    }

    fn root_handle(&self, host: &dyn HostToolkit, window: HostWindowId) -> Option<RawWindowHandle> {
        self.window_handle(host.root_window(window))
    }

    fn adopt_native(&self, host: &mut dyn HostToolkit, window: HostWindowId, native: NativeWindow) {
        host.set_native_window(window, Some(native));
        host.select_input(native);
    }

    fn set_visual_attributes(&self, host: &mut dyn HostToolkit, window: HostWindowId, surface: &dyn RenderSurface) {
        if let Some(visual) = surface.desired_visual() {
            debug!("x11: window {:?} switches to visual {:#x} (depth {})", window, visual.id, visual.depth);
            host.set_window_visual(window, &visual);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::HeadlessToolkit;

    #[test]
    fn window_handle_is_xlib() {
        let handle = X11Embedding.window_handle(NativeWindow(0x2a)).unwrap();
        assert_eq!(handle, RawWindowHandle::Xlib(XlibWindowHandle::new(0x2a)));
    }

    #[test]
    fn adopt_selects_input_on_the_new_window() {
        let mut host = HeadlessToolkit::new();
        let window = host.create_window(".view").unwrap();

        X11Embedding.adopt_native(&mut host, window, NativeWindow(0x0400_0001));

        assert_eq!(host.native_window(window), Some(NativeWindow(0x0400_0001)));
        assert!(host.selects_input(NativeWindow(0x0400_0001)));
    }

    #[test]
    fn root_handle_points_at_the_root_window() {
        let mut host = HeadlessToolkit::new();
        let window = host.create_window(".view").unwrap();
        let root = host.root_window(window);

        assert_eq!(X11Embedding.root_handle(&host, window), X11Embedding.window_handle(root));
    }
}
