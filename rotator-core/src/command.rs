//! Outbound commands
//!
//! Commands are fire-and-forget: the hub echoes the effect back as a
//! `heading` event, which is the only thing that changes a record.

use serde::Serialize;
use serde_json::json;

use crate::axis::Axis;

/// A request for the hub to move or stop a rotator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Move one axis to an integer heading
    SetHeading {
        name: String,
        axis: Axis,
        degrees: i32,
    },
    /// Stop one axis, or the whole rotator when `axis` is `None`
    Stop { name: String, axis: Option<Axis> },
}

impl Command {
    pub fn set_heading(name: impl Into<String>, axis: Axis, degrees: i32) -> Self {
        Command::SetHeading {
            name: name.into(),
            axis,
            degrees,
        }
    }

    pub fn stop(name: impl Into<String>, axis: Option<Axis>) -> Self {
        Command::Stop {
            name: name.into(),
            axis,
        }
    }

    pub fn rotator_name(&self) -> &str {
        match self {
            Command::SetHeading { name, .. } | Command::Stop { name, .. } => name,
        }
    }

    /// Final path segment below `rotator/{name}/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            Command::SetHeading { axis, .. } => axis.as_str(),
            Command::Stop { axis: None, .. } => "stop",
            Command::Stop {
                axis: Some(Axis::Azimuth),
                ..
            } => "stop_azimuth",
            Command::Stop {
                axis: Some(Axis::Elevation),
                ..
            } => "stop_elevation",
        }
    }

    /// Request path below an API prefix such as `/api`.
    ///
    /// The name is inserted as-is; HTTP clients are expected to encode it.
    pub fn path(&self, prefix: &str) -> String {
        format!(
            "{}/rotator/{}/{}",
            prefix.trim_end_matches('/'),
            self.rotator_name(),
            self.endpoint()
        )
    }

    /// JSON body, if the endpoint takes one
    pub fn body(&self) -> Option<serde_json::Value> {
        match self {
            Command::SetHeading { axis, degrees, .. } => {
                Some(json!({ (axis.as_str()): degrees }))
            }
            Command::Stop { .. } => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::SetHeading {
                name,
                axis,
                degrees,
            } => write!(f, "set {} {} to {}°", name, axis, degrees),
            Command::Stop { name, axis: None } => write!(f, "stop {}", name),
            Command::Stop {
                name,
                axis: Some(axis),
            } => write!(f, "stop {} {}", name, axis),
        }
    }
}

/// Destination for commands produced by user interaction.
///
/// `submit` must not block on delivery.
pub trait CommandSink {
    fn submit(&mut self, command: Command);
}

impl CommandSink for Vec<Command> {
    fn submit(&mut self, command: Command) {
        self.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_heading_request() {
        let cmd = Command::set_heading("tower", Axis::Azimuth, 200);
        assert_eq!(cmd.path("/api"), "/api/rotator/tower/azimuth");
        assert_eq!(cmd.body(), Some(json!({"azimuth": 200})));

        let cmd = Command::set_heading("tower", Axis::Elevation, 45);
        assert_eq!(cmd.path("/api/v1.0/"), "/api/v1.0/rotator/tower/elevation");
        assert_eq!(cmd.body(), Some(json!({"elevation": 45})));
    }

    #[test]
    fn test_stop_requests() {
        assert_eq!(
            Command::stop("t", None).path("/api"),
            "/api/rotator/t/stop"
        );
        assert_eq!(
            Command::stop("t", Some(Axis::Azimuth)).path("/api"),
            "/api/rotator/t/stop_azimuth"
        );
        assert_eq!(
            Command::stop("t", Some(Axis::Elevation)).endpoint(),
            "stop_elevation"
        );
        assert_eq!(Command::stop("t", None).body(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Command::set_heading("t", Axis::Azimuth, 10).to_string(),
            "set t azimuth to 10°"
        );
        assert_eq!(Command::stop("t", None).to_string(), "stop t");
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<Command> = Vec::new();
        sink.submit(Command::stop("t", None));
        assert_eq!(sink.len(), 1);
    }
}
