pub mod config;
pub mod errors;
pub mod events;
pub mod host;
pub mod platform;
pub mod render;
pub mod widget;

pub use config::WidgetsConfig;
pub use errors::{AttachError, HostError, WidgetError};
pub use widget::*;
