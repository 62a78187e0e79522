//! Structural events.
//!
//! These are the window events the host toolkit forwards to a render widget: exposure, geometry
//! changes, mapping and destruction. Input events never pass through the widget; the toolkit
//! dispatches them itself once the surface's native window is registered.

use std::fmt::{Debug, Display};

use crate::host::NativeWindow;

/// Events delivered by the host toolkit for a widget's window
#[derive(Clone, Debug, PartialEq)]
pub enum StructureEvent {
    /// Part of the window became visible
    Expose {
        /// Number of expose events still queued behind this one for the same window
        count: u32,
    },
    /// The window geometry changed
    Configure {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        border_width: u32,
        /// Sibling the window is stacked directly above
        above: Option<NativeWindow>,
    },
    /// Window became viewable
    Map,
    /// Window was hidden
    Unmap,
    /// Window is going away
    Destroy,
    /// Anything else the toolkit reports for the window
    Other(String),
}

impl StructureEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StructureEvent::Expose { .. } => "Expose",
            StructureEvent::Configure { .. } => "Configure",
            StructureEvent::Map => "Map",
            StructureEvent::Unmap => "Unmap",
            StructureEvent::Destroy => "Destroy",
            StructureEvent::Other(_) => "Other",
        }
    }

    /// Builds the expose events of one batch, in delivery order. The last one has `count == 0`.
    pub fn expose_batch(len: u32) -> Vec<StructureEvent> {
        (0..len)
            .rev()
            .map(|count| StructureEvent::Expose { count })
            .collect()
    }
}

impl Display for StructureEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureEvent::Expose { count } => write!(f, "Expose(count={count})"),
            StructureEvent::Configure { x, y, width, height, .. } => {
                write!(f, "Configure({width}x{height}+{x}+{y})")
            }
            StructureEvent::Other(name) => write!(f, "Other({name})"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expose_batch_ends_with_zero_count() {
        let batch = StructureEvent::expose_batch(3);
        assert_eq!(
            batch,
            vec![
                StructureEvent::Expose { count: 2 },
                StructureEvent::Expose { count: 1 },
                StructureEvent::Expose { count: 0 },
            ]
        );
        assert!(StructureEvent::expose_batch(0).is_empty());
    }

    #[test]
    fn display_is_compact() {
        let e = StructureEvent::Configure {
            x: 1,
            y: 2,
            width: 640,
            height: 480,
            border_width: 0,
            above: None,
        };
        assert_eq!(e.to_string(), "Configure(640x480+1+2)");
        assert_eq!(StructureEvent::Destroy.to_string(), "Destroy");
        assert_eq!(StructureEvent::Other("Gravity".into()).to_string(), "Other(Gravity)");
    }
}
