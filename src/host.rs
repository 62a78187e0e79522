//! Host toolkit seam.
//!
//! The host toolkit owns window creation, geometry management and event dispatch. The widget
//! only needs a narrow view of it, captured by [`HostToolkit`]. A toolkit binding implements the
//! trait on top of its own window records; [`headless::HeadlessToolkit`] is an in-memory
//! implementation that does not talk to any windowing system.

use std::fmt::Display;

use bitflags::bitflags;
use raw_window_handle::RawDisplayHandle;

use crate::errors::HostError;
use crate::events::StructureEvent;

pub mod headless;

/// Toolkit-side window. Owned by the toolkit, the widget only refers to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostWindowId(pub u64);

/// Window resource of the platform windowing system (an X11 `Window`, a win32 `HWND`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeWindow(pub u64);

impl Display for NativeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Colormap(pub u64);

/// Visual a surface wants its window to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Visual {
    pub id: u64,
    pub depth: u32,
    pub colormap: Colormap,
}

bitflags! {
    /// Toolkit window state the attachment cares about.
    pub struct WindowFlags: u8 {
        const TOP_LEVEL          = 0b0001;
        /// A configure notification was deferred because the window had no native resource yet
        const NEED_CONFIG_NOTIFY = 0b0010;
        /// The window is being destroyed
        const ALREADY_DEAD       = 0b0100;
    }
}

/// Geometry the toolkit has assigned to a window.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub border_width: u32,
    /// Sibling this window is stacked directly above, if any
    pub above: Option<NativeWindow>,
}

/// What the widget needs from the host toolkit. Every call happens on the toolkit's event thread.
pub trait HostToolkit {
    /// Creates a window from a path name like `.frame.view`. The parent must already exist.
    fn create_window(&mut self, path: &str) -> Result<HostWindowId, HostError>;
    fn destroy_window(&mut self, window: HostWindowId);
    fn path_name(&self, window: HostWindowId) -> Option<String>;
    fn set_class(&mut self, window: HostWindowId, class: &str);

    /// Asks the geometry manager for the given size. The assigned size arrives later through a
    /// configure event.
    fn geometry_request(&mut self, window: HostWindowId, width: u32, height: u32);
    fn geometry(&self, window: HostWindowId) -> WindowGeometry;

    fn parent(&self, window: HostWindowId) -> Option<HostWindowId>;
    /// Siblings that come after `window` in the parent's declared child order.
    fn later_siblings(&self, window: HostWindowId) -> Vec<HostWindowId>;
    fn flags(&self, window: HostWindowId) -> WindowFlags;
    fn clear_flags(&mut self, window: HostWindowId, flags: WindowFlags);

    fn native_window(&self, window: HostWindowId) -> Option<NativeWindow>;
    /// Makes `native` the window's native resource. The window does not own a native window set
    /// this way: destroying the window leaves it alive.
    fn set_native_window(&mut self, window: HostWindowId, native: Option<NativeWindow>);
    /// Creates the native resource of `window` (and of its ancestors) if it does not exist yet.
    /// The window owns it.
    fn make_window_exist(&mut self, window: HostWindowId) -> NativeWindow;
    fn destroy_native_window(&mut self, native: NativeWindow);
    fn resize_native_window(&mut self, native: NativeWindow, width: u32, height: u32);
    /// Restacks `native` directly below `sibling`.
    fn restack_below(&mut self, native: NativeWindow, sibling: NativeWindow);
    /// Subscribes the toolkit to every event the platform delivers for `native`.
    fn select_input(&mut self, native: NativeWindow);
    fn root_window(&self, window: HostWindowId) -> NativeWindow;
    fn display_handle(&self) -> RawDisplayHandle;

    /// Routes events for `native` to `window` in the toolkit's dispatch table. Several windows
    /// may share one native window (widgets showing the same surface).
    fn register_native(&mut self, native: NativeWindow, window: HostWindowId);
    /// Drops the route from `native` to `window`. Routes to other windows stay.
    fn unregister_native(&mut self, native: NativeWindow, window: HostWindowId);
    /// Window that receives events for `native`: the earliest registration still in place.
    fn lookup_native(&self, native: NativeWindow) -> Option<HostWindowId>;

    fn colormap(&self, window: HostWindowId) -> Option<Colormap>;
    fn set_window_visual(&mut self, window: HostWindowId, visual: &Visual);
    /// Adds `window` to its top-level's list of windows with their own colormap.
    fn add_to_colormap_windows(&mut self, window: HostWindowId);

    /// Hands a synthesized event to the toolkit's own dispatcher.
    fn handle_event(&mut self, window: HostWindowId, event: StructureEvent);
}
