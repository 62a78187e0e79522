//! Widget configuration.
//!
//! [`WidgetsConfig`] holds the process-wide defaults every new render widget starts from, with a
//! builder that validates the values (same shape as the engine's zone configuration).
//!
//! Per-widget options are described by a static option table ([`OPTION_SPECS`]). Option
//! arguments arrive as `-name value` pairs from the command surface and are parsed into a
//! [`ConfigChanges`] set before anything on the widget is touched, so a bad argument never leaves
//! a widget half configured.
//!
//! # Options
//! - `-height`: height in pixels (default: 400).
//! - `-width`: width in pixels (default: 400).
//! - `-renderSurfaceHandle` (alias `-rw`): handle of an existing render surface to attach to.
//!   Empty means "create a new one".
//!
//! Pixel values are screen distances: a number, optionally followed by `c` (centimetres),
//! `m` (millimetres), `i` (inches) or `p` (printer points).
//!
//! ```
//! use gosub_render_widget::config::WidgetsConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = WidgetsConfig::builder()
//!     .default_width(320)
//!     .pixels_per_inch(72.0)
//!     .build()?;
//! assert_eq!(cfg.default_height, 400);
//! # Ok(()) }
//! ```

use std::fmt;

use crate::platform::PlatformKind;
use crate::render::SurfaceId;

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_PIXELS_PER_INCH: f64 = 96.0;

/// Defaults shared by all render widgets of one [`RenderWidgets`](crate::RenderWidgets) context.
#[derive(Debug, Clone)]
pub struct WidgetsConfig {
    /// Width a widget gets when `-width` is not given
    pub default_width: u32,
    /// Height a widget gets when `-height` is not given
    pub default_height: u32,
    /// Screen resolution used to convert `c`, `m`, `i` and `p` distances into pixels
    pub pixels_per_inch: f64,
    /// Which platform adapter embeds the surfaces
    pub platform: PlatformKind,
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            pixels_per_inch: DEFAULT_PIXELS_PER_INCH,
            platform: PlatformKind::default(),
        }
    }
}

impl WidgetsConfig {
    pub fn builder() -> WidgetsConfigBuilder {
        WidgetsConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WidgetsConfigBuilder {
    inner: WidgetsConfig,
}

impl WidgetsConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut WidgetsConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn default_width(self, px: u32) -> Self { self.map(|c| c.default_width = px) }
    pub fn default_height(self, px: u32) -> Self { self.map(|c| c.default_height = px) }
    pub fn pixels_per_inch(self, ppi: f64) -> Self { self.map(|c| c.pixels_per_inch = ppi) }
    pub fn platform(self, platform: PlatformKind) -> Self { self.map(|c| c.platform = platform) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<WidgetsConfig, ConfigError> {
        if !self.inner.pixels_per_inch.is_finite() || self.inner.pixels_per_inch <= 0.0 {
            return Err(ConfigError::InvalidPixelsPerInch(self.inner.pixels_per_inch));
        }
        Ok(self.inner)
    }
}

// ---------- Option table ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetOption {
    Height,
    Width,
    RenderSurfaceHandle,
}

/// One row of the option table: command-line name, option database name and class.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub option: WidgetOption,
    pub name: &'static str,
    pub db_name: &'static str,
    pub db_class: &'static str,
}

pub const OPTION_SPECS: [OptionSpec; 3] = [
    OptionSpec { option: WidgetOption::Height, name: "-height", db_name: "height", db_class: "Height" },
    OptionSpec { option: WidgetOption::Width, name: "-width", db_name: "width", db_class: "Width" },
    OptionSpec {
        option: WidgetOption::RenderSurfaceHandle,
        name: "-renderSurfaceHandle",
        db_name: "renderSurfaceHandle",
        db_class: "RenderSurfaceHandle",
    },
];

/// Older spellings that are still accepted.
const OPTION_ALIASES: [(&str, WidgetOption); 1] = [("-rw", WidgetOption::RenderSurfaceHandle)];

impl WidgetOption {
    /// Resolves an option name. Exact names and aliases win, otherwise any unique prefix of a
    /// table name is accepted.
    pub fn lookup(name: &str) -> Result<WidgetOption, ConfigError> {
        if let Some(spec) = OPTION_SPECS.iter().find(|s| s.name == name) {
            return Ok(spec.option);
        }
        if let Some((_, option)) = OPTION_ALIASES.iter().find(|(alias, _)| *alias == name) {
            return Ok(*option);
        }

        // "-" alone is not a prefix of anything useful
        if name.len() < 2 || !name.starts_with('-') {
            return Err(ConfigError::UnknownOption(name.to_string()));
        }

        let mut matches = OPTION_SPECS.iter().filter(|s| s.name.starts_with(name));
        match (matches.next(), matches.next()) {
            (Some(spec), None) => Ok(spec.option),
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousOption(name.to_string())),
            _ => Err(ConfigError::UnknownOption(name.to_string())),
        }
    }

    pub fn spec(self) -> &'static OptionSpec {
        match self {
            WidgetOption::Height => &OPTION_SPECS[0],
            WidgetOption::Width => &OPTION_SPECS[1],
            WidgetOption::RenderSurfaceHandle => &OPTION_SPECS[2],
        }
    }

    pub fn default_value(self, config: &WidgetsConfig) -> String {
        match self {
            WidgetOption::Height => config.default_height.to_string(),
            WidgetOption::Width => config.default_width.to_string(),
            WidgetOption::RenderSurfaceHandle => String::new(),
        }
    }
}

/// A row of `configure` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionInfo {
    pub name: &'static str,
    pub db_name: &'static str,
    pub db_class: &'static str,
    pub default: String,
    pub value: String,
}

impl OptionInfo {
    pub fn new(option: WidgetOption, default: String, value: String) -> Self {
        let spec = option.spec();
        Self {
            name: spec.name,
            db_name: spec.db_name,
            db_class: spec.db_class,
            default,
            value,
        }
    }

    /// The fields as a flat list, which is what querying a single option returns.
    pub fn as_list(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.name,
            self.db_name,
            self.db_class,
            list_element(&self.default),
            list_element(&self.value)
        )
    }
}

/// Formats as a list element, e.g. `{-width width Width 400 320}`.
impl fmt::Display for OptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.as_list())
    }
}

fn list_element(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("{{{s}}}")
    } else {
        s.to_string()
    }
}

// ---------- Parsing ----------

/// Parsed `-option value` arguments. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigChanges {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `Some(None)` clears the handle
    pub surface_handle: Option<Option<SurfaceId>>,
}

impl ConfigChanges {
    /// Parses `-option value` pairs. Later occurrences of an option override earlier ones.
    pub fn parse(args: &[&str], pixels_per_inch: f64) -> Result<ConfigChanges, ConfigError> {
        let mut changes = ConfigChanges::default();

        for pair in args.chunks(2) {
            let option = WidgetOption::lookup(pair[0])?;
            let value = match pair.get(1) {
                Some(value) => *value,
                None => return Err(ConfigError::MissingValue(option.spec().name)),
            };

            match option {
                WidgetOption::Width => changes.width = Some(parse_pixels(value, pixels_per_inch)?),
                WidgetOption::Height => changes.height = Some(parse_pixels(value, pixels_per_inch)?),
                WidgetOption::RenderSurfaceHandle => {
                    changes.surface_handle = Some(parse_handle(value)?);
                }
            }
        }

        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.surface_handle.is_none()
    }
}

/// Converts a screen distance into pixels, rounding to the nearest pixel.
pub fn parse_pixels(value: &str, pixels_per_inch: f64) -> Result<u32, ConfigError> {
    let trimmed = value.trim();
    let (number, unit) = match trimmed.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (trimmed[..idx].trim_end(), Some(c)),
        _ => (trimmed, None),
    };

    let scale = match unit {
        None => 1.0,
        Some('c') => pixels_per_inch / 2.54,
        Some('m') => pixels_per_inch / 25.4,
        Some('i') => pixels_per_inch,
        Some('p') => pixels_per_inch / 72.0,
        Some(_) => return Err(ConfigError::BadPixels(value.to_string())),
    };

    let distance: f64 = number
        .parse()
        .map_err(|_| ConfigError::BadPixels(value.to_string()))?;
    if !distance.is_finite() {
        return Err(ConfigError::BadPixels(value.to_string()));
    }

    let pixels = (distance * scale).round();
    if pixels < 0.0 {
        return Err(ConfigError::NegativePixels(value.to_string()));
    }
    if pixels > u32::MAX as f64 {
        return Err(ConfigError::BadPixels(value.to_string()));
    }

    Ok(pixels as u32)
}

fn parse_handle(value: &str) -> Result<Option<SurfaceId>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<SurfaceId>()
        .map(Some)
        .map_err(|_| ConfigError::BadHandle(value.to_string()))
}

// ---------- Errors ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownOption(String),
    AmbiguousOption(String),
    MissingValue(&'static str),
    BadPixels(String),
    NegativePixels(String),
    BadHandle(String),
    /// The widget is attached to `current` and cannot switch surfaces
    HandleLocked { current: SurfaceId },
    InvalidPixelsPerInch(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOption(name) => write!(f, "unknown option \"{name}\""),
            ConfigError::AmbiguousOption(name) => write!(f, "ambiguous option \"{name}\""),
            ConfigError::MissingValue(name) => write!(f, "value for \"{name}\" missing"),
            ConfigError::BadPixels(value) => write!(f, "bad screen distance \"{value}\""),
            ConfigError::NegativePixels(value) => {
                write!(f, "expected non-negative screen distance but got \"{value}\"")
            }
            ConfigError::BadHandle(value) => {
                write!(f, "\"{value}\" is not a render surface handle")
            }
            ConfigError::HandleLocked { current } => {
                write!(f, "widget is already attached to render surface \"{current}\"")
            }
            ConfigError::InvalidPixelsPerInch(ppi) => {
                write!(f, "pixels_per_inch {ppi} must be a positive number")
            }
        }
    }
}
impl std::error::Error for ConfigError {}
