use std::collections::{BTreeMap, HashMap, HashSet};

use raw_window_handle::{RawDisplayHandle, XlibDisplayHandle};

use crate::errors::HostError;
use crate::events::StructureEvent;
use crate::host::{Colormap, HostToolkit, HostWindowId, NativeWindow, Visual, WindowFlags, WindowGeometry};

const MAIN_WINDOW_PATH: &str = ".";
const ROOT_WINDOW: NativeWindow = NativeWindow(0x1);
const DEFAULT_COLORMAP: Colormap = Colormap(0x20);
const FIRST_NATIVE_WINDOW: u64 = 0x0020_0001;

struct HeadlessWindow {
    path: String,
    class: Option<String>,
    parent: Option<HostWindowId>,
    /// Children in creation order, which is also their stacking order
    children: Vec<HostWindowId>,
    flags: WindowFlags,
    geometry: WindowGeometry,
    requested: Option<(u32, u32)>,
    native: Option<NativeWindow>,
    /// Whether `native` was created by the toolkit rather than adopted
    owns_native: bool,
    colormap: Colormap,
    visual: Option<Visual>,
}

/// In-memory toolkit. It keeps a window tree addressed by path names, hands out fake native
/// window ids and records what was done to them, but never talks to a display server. The main
/// window `.` exists from the start.
pub struct HeadlessToolkit {
    windows: HashMap<HostWindowId, HeadlessWindow>,
    paths: HashMap<String, HostWindowId>,
    /// Native window to toolkit window dispatch table, registrations in order
    win_table: HashMap<NativeWindow, Vec<HostWindowId>>,
    next_window: u64,
    next_native: u64,
    selected: HashSet<NativeWindow>,
    destroyed_natives: Vec<NativeWindow>,
    /// (window, sibling it was restacked below)
    restacks: Vec<(NativeWindow, NativeWindow)>,
    colormap_windows: Vec<HostWindowId>,
    native_sizes: BTreeMap<NativeWindow, (u32, u32)>,
    delivered: Vec<(HostWindowId, StructureEvent)>,
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        let mut toolkit = Self {
            windows: HashMap::new(),
            paths: HashMap::new(),
            win_table: HashMap::new(),
            next_window: 1,
            next_native: FIRST_NATIVE_WINDOW,
            selected: HashSet::new(),
            destroyed_natives: Vec::new(),
            restacks: Vec::new(),
            colormap_windows: Vec::new(),
            native_sizes: BTreeMap::new(),
            delivered: Vec::new(),
        };

        let main = toolkit.insert_window(MAIN_WINDOW_PATH.to_string(), None);
        toolkit.set_flags(main, WindowFlags::TOP_LEVEL);
        toolkit.make_window_exist(main);
        toolkit
    }

    /// The main window `.`, until it is destroyed.
    pub fn main_window(&self) -> Option<HostWindowId> {
        self.window_by_path(MAIN_WINDOW_PATH)
    }

    pub fn window_by_path(&self, path: &str) -> Option<HostWindowId> {
        self.paths.get(path).copied()
    }

    pub fn exists(&self, window: HostWindowId) -> bool {
        self.windows.contains_key(&window)
    }

    pub fn class(&self, window: HostWindowId) -> Option<&str> {
        self.windows.get(&window)?.class.as_deref()
    }

    pub fn set_flags(&mut self, window: HostWindowId, flags: WindowFlags) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.flags.insert(flags);
        }
    }

    /// Geometry manager side: assigns a geometry and returns the configure event the toolkit
    /// would deliver for it.
    pub fn assign_geometry(&mut self, window: HostWindowId, x: i32, y: i32, width: u32, height: u32) -> StructureEvent {
        let geometry = match self.windows.get_mut(&window) {
            Some(w) => {
                w.geometry.x = x;
                w.geometry.y = y;
                w.geometry.width = width;
                w.geometry.height = height;
                w.geometry
            }
            None => WindowGeometry { x, y, width, height, ..Default::default() },
        };

        StructureEvent::Configure {
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            border_width: geometry.border_width,
            above: geometry.above,
        }
    }

    pub fn requested_size(&self, window: HostWindowId) -> Option<(u32, u32)> {
        self.windows.get(&window)?.requested
    }

    pub fn set_colormap(&mut self, window: HostWindowId, colormap: Colormap) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.colormap = colormap;
        }
    }

    pub fn visual(&self, window: HostWindowId) -> Option<Visual> {
        self.windows.get(&window)?.visual
    }

    pub fn selects_input(&self, native: NativeWindow) -> bool {
        self.selected.contains(&native)
    }

    pub fn destroyed_natives(&self) -> &[NativeWindow] {
        &self.destroyed_natives
    }

    pub fn restacks(&self) -> &[(NativeWindow, NativeWindow)] {
        &self.restacks
    }

    pub fn colormap_windows(&self) -> &[HostWindowId] {
        &self.colormap_windows
    }

    pub fn native_size(&self, native: NativeWindow) -> Option<(u32, u32)> {
        self.native_sizes.get(&native).copied()
    }

    /// Events handed to the toolkit's own dispatcher, oldest first.
    pub fn delivered_events(&self) -> &[(HostWindowId, StructureEvent)] {
        &self.delivered
    }

    fn insert_window(&mut self, path: String, parent: Option<HostWindowId>) -> HostWindowId {
        let id = HostWindowId(self.next_window);
        self.next_window += 1;

        let colormap = parent
            .and_then(|p| self.windows.get(&p))
            .map(|p| p.colormap)
            .unwrap_or(DEFAULT_COLORMAP);

        self.windows.insert(
            id,
            HeadlessWindow {
                path: path.clone(),
                class: None,
                parent,
                children: Vec::new(),
                flags: WindowFlags::empty(),
                geometry: WindowGeometry { width: 1, height: 1, ..Default::default() },
                requested: None,
                native: None,
                owns_native: false,
                colormap,
                visual: None,
            },
        );
        self.paths.insert(path, id);

        if let Some(parent) = parent.and_then(|p| self.windows.get_mut(&p)) {
            parent.children.push(id);
        }

        id
    }

    fn parent_path(path: &str) -> Result<&str, HostError> {
        if !path.starts_with('.') || path.len() < 2 || path.ends_with('.') {
            return Err(HostError::BadPath(path.to_string()));
        }

        match path.rfind('.') {
            Some(0) => Ok(MAIN_WINDOW_PATH),
            Some(idx) => Ok(&path[..idx]),
            None => Err(HostError::BadPath(path.to_string())),
        }
    }
}

impl HostToolkit for HeadlessToolkit {
    fn create_window(&mut self, path: &str) -> Result<HostWindowId, HostError> {
        if self.paths.contains_key(path) {
            return Err(HostError::PathInUse(path.to_string()));
        }

        let parent_path = Self::parent_path(path)?;
        let parent = self
            .window_by_path(parent_path)
            .ok_or_else(|| HostError::NoParent(path.to_string()))?;

        Ok(self.insert_window(path.to_string(), Some(parent)))
    }

    fn destroy_window(&mut self, window: HostWindowId) {
        let Some(w) = self.windows.remove(&window) else {
            return;
        };

        for child in w.children {
            self.destroy_window(child);
        }
        if let Some(native) = w.native {
            self.unregister_native(native, window);
            // adopted windows belong to whoever created them
            if w.owns_native {
                self.destroy_native_window(native);
            }
        }
        if let Some(parent) = w.parent.and_then(|p| self.windows.get_mut(&p)) {
            parent.children.retain(|c| *c != window);
        }
        self.paths.remove(&w.path);
    }

    fn path_name(&self, window: HostWindowId) -> Option<String> {
        self.windows.get(&window).map(|w| w.path.clone())
    }

    fn set_class(&mut self, window: HostWindowId, class: &str) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.class = Some(class.to_string());
        }
    }

    fn geometry_request(&mut self, window: HostWindowId, width: u32, height: u32) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.requested = Some((width, height));
        }
    }

    fn geometry(&self, window: HostWindowId) -> WindowGeometry {
        self.windows
            .get(&window)
            .map(|w| w.geometry)
            .unwrap_or_default()
    }

    fn parent(&self, window: HostWindowId) -> Option<HostWindowId> {
        self.windows.get(&window)?.parent
    }

    fn later_siblings(&self, window: HostWindowId) -> Vec<HostWindowId> {
        let Some(parent) = self.parent(window).and_then(|p| self.windows.get(&p)) else {
            return Vec::new();
        };

        parent
            .children
            .iter()
            .skip_while(|c| **c != window)
            .skip(1)
            .copied()
            .collect()
    }

    fn flags(&self, window: HostWindowId) -> WindowFlags {
        self.windows
            .get(&window)
            .map(|w| w.flags)
            .unwrap_or_else(WindowFlags::empty)
    }

    fn clear_flags(&mut self, window: HostWindowId, flags: WindowFlags) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.flags.remove(flags);
        }
    }

    fn native_window(&self, window: HostWindowId) -> Option<NativeWindow> {
        self.windows.get(&window)?.native
    }

    fn set_native_window(&mut self, window: HostWindowId, native: Option<NativeWindow>) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.native = native;
            w.owns_native = false;
        }
    }

    fn make_window_exist(&mut self, window: HostWindowId) -> NativeWindow {
        if let Some(native) = self.native_window(window) {
            return native;
        }

        // ancestors first, a window can only be created inside an existing parent
        if let Some(parent) = self.parent(window) {
            self.make_window_exist(parent);
        }

        let native = NativeWindow(self.next_native);
        self.next_native += 1;

        if let Some(w) = self.windows.get_mut(&window) {
            w.native = Some(native);
            w.owns_native = true;
        }
        self.register_native(native, window);
        native
    }

    fn destroy_native_window(&mut self, native: NativeWindow) {
        self.selected.remove(&native);
        self.native_sizes.remove(&native);
        self.destroyed_natives.push(native);
    }

    fn resize_native_window(&mut self, native: NativeWindow, width: u32, height: u32) {
        self.native_sizes.insert(native, (width, height));
    }

    fn restack_below(&mut self, native: NativeWindow, sibling: NativeWindow) {
        self.restacks.push((native, sibling));
    }

    fn select_input(&mut self, native: NativeWindow) {
        self.selected.insert(native);
    }

    fn root_window(&self, _window: HostWindowId) -> NativeWindow {
        ROOT_WINDOW
    }

    fn display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0))
    }

    fn register_native(&mut self, native: NativeWindow, window: HostWindowId) {
        let windows = self.win_table.entry(native).or_default();
        if !windows.contains(&window) {
            windows.push(window);
        }
    }

    fn unregister_native(&mut self, native: NativeWindow, window: HostWindowId) {
        if let Some(windows) = self.win_table.get_mut(&native) {
            windows.retain(|w| *w != window);
            if windows.is_empty() {
                self.win_table.remove(&native);
            }
        }
    }

    fn lookup_native(&self, native: NativeWindow) -> Option<HostWindowId> {
        self.win_table.get(&native)?.first().copied()
    }

    fn colormap(&self, window: HostWindowId) -> Option<Colormap> {
        self.windows.get(&window).map(|w| w.colormap)
    }

    fn set_window_visual(&mut self, window: HostWindowId, visual: &Visual) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.visual = Some(*visual);
            w.colormap = visual.colormap;
        }
    }

    fn add_to_colormap_windows(&mut self, window: HostWindowId) {
        if !self.colormap_windows.contains(&window) {
            self.colormap_windows.push(window);
        }
    }

    fn handle_event(&mut self, window: HostWindowId, event: StructureEvent) {
        self.delivered.push((window, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_window_exists_and_is_top_level() {
        let host = HeadlessToolkit::new();
        let main = host.main_window().unwrap();

        assert!(host.flags(main).contains(WindowFlags::TOP_LEVEL));
        assert!(host.native_window(main).is_some());
        assert_eq!(host.path_name(main).as_deref(), Some("."));
    }

    #[test]
    fn main_window_is_gone_after_destroy() {
        let mut host = HeadlessToolkit::new();
        let main = host.main_window().unwrap();
        let child = host.create_window(".child").unwrap();

        host.destroy_window(main);

        assert!(host.main_window().is_none());
        assert!(!host.exists(child));
    }

    #[test]
    fn create_window_checks_paths() {
        let mut host = HeadlessToolkit::new();
        let frame = host.create_window(".frame").unwrap();
        let view = host.create_window(".frame.view").unwrap();

        assert_eq!(host.parent(view), Some(frame));
        assert_eq!(host.parent(frame), host.main_window());

        assert!(matches!(host.create_window(".frame"), Err(HostError::PathInUse(_))));
        assert!(matches!(host.create_window(".missing.view"), Err(HostError::NoParent(_))));
        assert!(matches!(host.create_window("frame"), Err(HostError::BadPath(_))));
        assert!(matches!(host.create_window(".frame."), Err(HostError::BadPath(_))));
    }

    #[test]
    fn make_window_exist_materializes_ancestors() {
        let mut host = HeadlessToolkit::new();
        let frame = host.create_window(".frame").unwrap();
        let view = host.create_window(".frame.view").unwrap();

        let native = host.make_window_exist(view);
        let frame_native = host.native_window(frame).unwrap();

        assert!(frame_native < native);
        assert_eq!(host.lookup_native(native), Some(view));
        assert_eq!(host.lookup_native(frame_native), Some(frame));
    }

    #[test]
    fn later_siblings_follow_creation_order() {
        let mut host = HeadlessToolkit::new();
        let a = host.create_window(".a").unwrap();
        let b = host.create_window(".b").unwrap();
        let c = host.create_window(".c").unwrap();

        assert_eq!(host.later_siblings(a), vec![b, c]);
        assert_eq!(host.later_siblings(c), Vec::<HostWindowId>::new());
    }

    #[test]
    fn destroy_window_drops_subtree_and_dispatch_entries() {
        let mut host = HeadlessToolkit::new();
        let frame = host.create_window(".frame").unwrap();
        let view = host.create_window(".frame.view").unwrap();
        let native = host.make_window_exist(view);

        host.destroy_window(frame);

        assert!(!host.exists(frame));
        assert!(!host.exists(view));
        assert!(host.window_by_path(".frame.view").is_none());
        assert!(host.lookup_native(native).is_none());
        assert!(host.destroyed_natives().contains(&native));
    }

    #[test]
    fn shared_native_routes_to_earliest_live_registration() {
        let mut host = HeadlessToolkit::new();
        let a = host.create_window(".a").unwrap();
        let b = host.create_window(".b").unwrap();
        let shared = NativeWindow(0x0400_0000);

        for window in [a, b] {
            host.set_native_window(window, Some(shared));
            host.register_native(shared, window);
        }
        assert_eq!(host.lookup_native(shared), Some(a));

        host.unregister_native(shared, a);
        assert_eq!(host.lookup_native(shared), Some(b));
        host.unregister_native(shared, b);
        assert!(host.lookup_native(shared).is_none());
    }

    #[test]
    fn destroy_window_keeps_adopted_native() {
        let mut host = HeadlessToolkit::new();
        let a = host.create_window(".a").unwrap();
        let b = host.create_window(".b").unwrap();
        let shared = NativeWindow(0x0400_0000);
        for window in [a, b] {
            host.set_native_window(window, Some(shared));
            host.register_native(shared, window);
        }

        host.destroy_window(a);

        assert!(!host.destroyed_natives().contains(&shared));
        assert_eq!(host.lookup_native(shared), Some(b));
        assert_eq!(host.native_window(b), Some(shared));
    }
}
