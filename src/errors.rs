use crate::config::ConfigError;
use crate::render::SurfaceId;

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("unknown render surface handle \"{0}\"")]
    UnknownHandle(SurfaceId),

    #[error("surface factory failed: {0}")]
    Factory(#[source] anyhow::Error),

    #[error("initial render failed: {0}")]
    Render(#[source] anyhow::Error),

    #[error("render surface {0} did not provide a native window")]
    NoNativeWindow(SurfaceId),

    #[error("render surface {0} is no longer known to the surface factory")]
    SurfaceGone(SurfaceId),

    #[error("widget has no host window left")]
    NoHostWindow,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("bad window path name \"{0}\"")]
    BadPath(String),

    #[error("window name \"{0}\" already exists")]
    PathInUse(String),

    #[error("parent window of \"{0}\" does not exist")]
    NoParent(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("{0}")]
    Configuration(#[from] ConfigError),

    /// Attachment failures are reported as a failed configuration of the widget
    #[error("configuration failed: {0}")]
    Attach(#[from] AttachError),

    #[error("unknown option \"{method}\": must be configure or getRenderSurfaceHandle")]
    UnsupportedMethod { method: String },

    #[error("wrong # args: should be \"{usage}\"")]
    WrongArgs { usage: String },

    #[error("invalid widget")]
    InvalidWidget,

    #[error(transparent)]
    Host(#[from] HostError),
}
