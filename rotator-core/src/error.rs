//! Error types for event parsing and registry operations

use thiserror::Error;

use crate::axis::Axis;

/// Errors that can occur when decoding a hub message
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    /// Text is not a JSON object
    #[error("Malformed event: {0}")]
    Malformed(String),

    /// Object has no string `name` field
    #[error("Event has no kind")]
    MissingKind,

    /// A field the event kind requires is absent or has the wrong type
    #[error("Event '{kind}' is missing field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// Record declares neither axis
    #[error("Rotator '{0}' supports neither azimuth nor elevation")]
    NoCapability(String),
}

impl From<serde_json::Error> for EventError {
    fn from(e: serde_json::Error) -> Self {
        EventError::Malformed(e.to_string())
    }
}

/// Errors returned by registry selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No rotator named '{0}'")]
    UnknownRotator(String),

    #[error("Rotator '{name}' has no {axis} axis")]
    Unsupported { name: String, axis: Axis },
}
