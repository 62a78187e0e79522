//! Command surface.
//!
//! A render widget is created by path name and afterwards driven through its widget command:
//!
//! - `pathName configure` lists every option,
//! - `pathName configure -option` describes one option,
//! - `pathName configure -option value ?-option value ...?` applies changes,
//! - `pathName getRenderSurfaceHandle` attaches if needed and returns the surface handle.
//!
//! Applying options always ends with an attachment attempt, so a widget that configured
//! successfully is attached.

use log::{debug, warn};

use crate::config::{ConfigChanges, OptionInfo, WidgetOption, OPTION_SPECS};
use crate::errors::WidgetError;
use crate::host::HostToolkit;
use crate::render::SurfaceFactory;
use crate::widget::attach::AttachmentController;
use crate::widget::record::WidgetRecord;
use crate::widget::registry::WidgetKey;
use crate::widget::{RenderWidgets, WIDGET_CLASS};

const CONFIGURE: &str = "configure";
const GET_RENDER_SURFACE_HANDLE: &str = "getRenderSurfaceHandle";
/// Older spelling of `getRenderSurfaceHandle`
const GET_RENDER_WINDOW: &str = "GetRenderWindow";

impl<F: SurfaceFactory> RenderWidgets<F> {
    /// Creates a render widget on a new toolkit window at `path` and applies `args` as options.
    ///
    /// When the options cannot be applied the window is destroyed again and the error returned;
    /// nothing of the widget is left behind.
    pub fn create_widget(&mut self, host: &mut dyn HostToolkit, path: &str, args: &[&str]) -> Result<WidgetKey, WidgetError> {
        let window = host.create_window(path)?;
        host.set_class(window, WIDGET_CLASS);

        let record = WidgetRecord::new(window, self.config.default_width, self.config.default_height);
        let key = self.registry.insert(record);
        self.commands.insert(path.to_string(), key);

        if let Err(e) = self.configure(host, key, args) {
            warn!("creating render widget {} failed: {}", path, e);
            self.registry.destroy(key);
            self.commands.remove(path);
            host.destroy_window(window);
            return Err(e);
        }

        debug!("render widget {} created as {:?}", path, key);
        Ok(key)
    }

    /// Runs the widget command of `path`. `args` holds everything after the path name.
    pub fn invoke(&mut self, host: &mut dyn HostToolkit, path: &str, args: &[&str]) -> Result<String, WidgetError> {
        let key = self.key_for_path(path).ok_or(WidgetError::InvalidWidget)?;
        let Some((method, rest)) = args.split_first() else {
            return Err(WidgetError::WrongArgs { usage: format!("{path} ?options?") });
        };

        if !self.registry.preserve(key) {
            return Err(WidgetError::InvalidWidget);
        }
        let result = self.run_method(host, key, method, rest);
        self.registry.release(key);

        result
    }

    fn run_method(&mut self, host: &mut dyn HostToolkit, key: WidgetKey, method: &str, args: &[&str]) -> Result<String, WidgetError> {
        if !method.is_empty() && CONFIGURE.starts_with(method) {
            return match args {
                [] => self.configure_info(key, None),
                [option] => self.configure_info(key, Some(*option)),
                _ => self.configure(host, key, args).map(|_| String::new()),
            };
        }

        if method == GET_RENDER_SURFACE_HANDLE || method == GET_RENDER_WINDOW {
            return self.get_or_create_surface_handle(host, key);
        }

        Err(WidgetError::UnsupportedMethod { method: method.to_string() })
    }

    /// Applies `-option value` pairs, requests the resulting size from the toolkit and attaches
    /// the widget. Either all of it succeeds or the widget keeps its previous options.
    pub fn configure(&mut self, host: &mut dyn HostToolkit, key: WidgetKey, args: &[&str]) -> Result<(), WidgetError> {
        let changes = ConfigChanges::parse(args, self.config.pixels_per_inch)?;

        let record = self.registry.get_mut(key).ok_or(WidgetError::InvalidWidget)?;
        let window = record.host_window().ok_or(WidgetError::InvalidWidget)?;
        let previous = record.clone();

        record.apply_changes(&changes)?;
        host.geometry_request(window, record.width(), record.height());

        let attached = AttachmentController::new(host, &mut self.factory, self.platform.as_ref()).ensure_attached(record);
        let surface = match attached {
            Ok(surface) => surface,
            Err(e) => {
                host.geometry_request(window, previous.width(), previous.height());
                *record = previous;
                return Err(e.into());
            }
        };

        if let Some(s) = self.factory.surface_mut(surface) {
            s.set_size(record.size());
        }
        Ok(())
    }

    /// Describes one option, or all of them when `option` is `None`.
    pub fn configure_info(&self, key: WidgetKey, option: Option<&str>) -> Result<String, WidgetError> {
        let record = self.registry.get(key).ok_or(WidgetError::InvalidWidget)?;

        match option {
            Some(name) => {
                let option = WidgetOption::lookup(name)?;
                Ok(self.option_info(record, option).as_list())
            }
            None => Ok(OPTION_SPECS
                .iter()
                .map(|spec| self.option_info(record, spec.option).to_string())
                .collect::<Vec<_>>()
                .join(" ")),
        }
    }

    fn option_info(&self, record: &WidgetRecord, option: WidgetOption) -> OptionInfo {
        let value = match option {
            WidgetOption::Height => record.height().to_string(),
            WidgetOption::Width => record.width().to_string(),
            WidgetOption::RenderSurfaceHandle => record.surface_handle(),
        };
        OptionInfo::new(option, option.default_value(&self.config), value)
    }
}
