use gosub_render_widget::events::StructureEvent;
use gosub_render_widget::host::headless::HeadlessToolkit;
use gosub_render_widget::host::HostToolkit;
use gosub_render_widget::platform::PlatformKind;
use gosub_render_widget::render::backends::null::NullSurfaceFactory;
use gosub_render_widget::{RenderWidgets, WidgetsConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Defaults for every widget created through this context. The platform decides how surfaces
    // are embedded into the toolkit's windows.
    let config = WidgetsConfig::builder()
        .default_width(320)
        .default_height(240)
        .platform(PlatformKind::X11)
        .build()?;

    // The null factory does not draw anything, but keeps track of what was asked of it.
    let factory = NullSurfaceFactory::new()?;
    let mut widgets = RenderWidgets::new(Some(config), factory);

    // An in-memory toolkit stands in for a real one. It already has its main window ".".
    let mut host = HeadlessToolkit::new();

    // Create a widget. Configuring it attaches a fresh render surface.
    widgets.create_widget(&mut host, ".view", &[])?;
    let handle = widgets.invoke(&mut host, ".view", &["getRenderSurfaceHandle"])?;
    println!("surface handle: {handle}");

    // A second widget can show the same surface by handle.
    widgets.create_widget(&mut host, ".mirror", &["-renderSurfaceHandle", handle.as_str()])?;
    println!("surfaces created: {}", widgets.factory().created());

    // The toolkit resizes the window; the widget follows.
    let window = host
        .window_by_path(".view")
        .ok_or_else(|| anyhow::anyhow!(".view vanished"))?;
    let resize = host.assign_geometry(window, 0, 0, 640, 480);
    println!("{:?}", widgets.handle_event(&mut host, window, &resize));
    println!("{}", widgets.invoke(&mut host, ".view", &["configure"])?);

    // Exposes are coalesced: only the last one of a batch renders.
    for event in StructureEvent::expose_batch(3) {
        println!("{event}: {:?}", widgets.handle_event(&mut host, window, &event));
    }

    // Destroy the window. Events arriving afterwards are dropped.
    host.destroy_window(window);
    println!("{:?}", widgets.handle_event(&mut host, window, &StructureEvent::Destroy));
    println!("{:?}", widgets.handle_event(&mut host, window, &StructureEvent::Expose { count: 0 }));

    Ok(())
}
