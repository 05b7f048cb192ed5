//! # Rotator Panel
//!
//! Command-line control panel for a rotator hub.
//!
//! The panel mirrors the hub's rotators through its WebSocket event stream
//! and renders the selected azimuth and elevation compasses as SVG files.
//! One-shot subcommands list rotators and send commands over the hub's
//! REST API.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     rotator-panel                        │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐  │
//! │  │ stream       │   │ hub          │   │ svg          │  │
//! │  │ (WebSocket)  │   │ (REST)       │   │ (frames)     │  │
//! │  └──────┬───────┘   └──────┬───────┘   └──────▲───────┘  │
//! │         ▼                  ▼                  │          │
//! │  ┌────────────────────────────────────────────┴────────┐ │
//! │  │  rotator_core: EventReconciler, drag, renderer      │ │
//! │  └─────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Hub API
//!
//! | Request | Purpose |
//! |---------|---------|
//! | `GET {prefix}/rotators` | Snapshot of all rotators |
//! | `GET {prefix}/rotator/{name}` | One rotator |
//! | `PUT {prefix}/rotator/{name}/azimuth` | Set azimuth `{"azimuth": n}` |
//! | `PUT {prefix}/rotator/{name}/elevation` | Set elevation `{"elevation": n}` |
//! | `PUT {prefix}/rotator/{name}/stop` | Stop both axes |
//! | `WS /ws` | Event stream |

use clap::{Parser, Subcommand};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use rotator_core::{Axis, EventError, RegistryError};

pub mod config;
pub mod hub;
pub mod panel;
pub mod stream;
pub mod svg;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Control panel for networked antenna rotators")]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Hub base URL, e.g. http://127.0.0.1:7000
    #[arg(long, global = true)]
    pub hub: Option<String>,

    /// REST API path prefix on the hub
    #[arg(long, global = true)]
    pub api_prefix: Option<String>,

    /// Compass size in pixels
    #[arg(short, long, global = true)]
    pub size: Option<f64>,

    /// Directory for rendered compass files
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Settings file to use instead of the default panel.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Action {
    /// Follow the hub and keep the compass files up to date
    Watch {
        /// Show this rotator on the azimuth compass whenever it is present
        #[arg(long)]
        azimuth_rotator: Option<String>,
        /// Show this rotator on the elevation compass whenever it is present
        #[arg(long)]
        elevation_rotator: Option<String>,
    },

    /// Print all rotators known to the hub
    List,

    /// Move a rotator to a heading
    Set {
        name: String,
        #[arg(long, required_unless_present = "elevation")]
        azimuth: Option<i32>,
        #[arg(long)]
        elevation: Option<i32>,
    },

    /// Stop a rotator, or only one of its axes
    Stop {
        name: String,
        #[arg(long)]
        axis: Option<Axis>,
    },

    /// Click on a compass at pixel (x, y) and send the resulting heading
    Click {
        name: String,
        #[arg(short, long)]
        x: f64,
        #[arg(short, long)]
        y: f64,
        #[arg(long, default_value = "azimuth")]
        axis: Axis,
    },
}

#[derive(Error, Debug, Diagnostic)]
pub enum PanelError {
    #[error("Cannot read settings from {}: {reason}", .path.display())]
    #[diagnostic(code(panel::settings))]
    Settings { path: PathBuf, reason: String },

    #[error("Invalid option: {0}")]
    #[diagnostic(code(panel::option))]
    InvalidOption(String),

    #[error("HTTP request failed")]
    #[diagnostic(code(panel::http), help("Is the hub running and reachable?"))]
    Http(#[from] reqwest::Error),

    #[error("Hub answered {status} for {url}")]
    #[diagnostic(code(panel::hub_status))]
    HubStatus { url: String, status: u16 },

    #[error("Rotator '{0}' not found on the hub")]
    #[diagnostic(code(panel::not_found), help("Run `rotator-panel list` to see known rotators"))]
    NotFound(String),

    #[error("WebSocket error")]
    #[diagnostic(code(panel::websocket))]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    #[diagnostic(code(panel::event))]
    Event(#[from] EventError),

    #[error(transparent)]
    #[diagnostic(code(panel::registry))]
    Registry(#[from] RegistryError),

    #[error("Cannot write {}", .path.display())]
    #[diagnostic(code(panel::io))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command task failed: {0}")]
    #[diagnostic(code(panel::task))]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        let cli = Cli::parse_from(["rotator-panel", "set", "tower", "--azimuth", "200"]);
        assert_eq!(
            cli.action,
            Action::Set {
                name: "tower".into(),
                azimuth: Some(200),
                elevation: None
            }
        );
    }

    #[test]
    fn test_set_requires_a_heading() {
        assert!(Cli::try_parse_from(["rotator-panel", "set", "tower"]).is_err());
        assert!(Cli::try_parse_from(["rotator-panel", "set", "tower", "--elevation", "30"]).is_ok());
    }

    #[test]
    fn test_parse_click_and_stop() {
        let cli = Cli::parse_from([
            "rotator-panel", "click", "mast", "-x", "10", "-y", "20", "--axis", "elevation", "-s", "300",
        ]);
        assert_eq!(cli.size, Some(300.0));
        assert_eq!(
            cli.action,
            Action::Click {
                name: "mast".into(),
                x: 10.0,
                y: 20.0,
                axis: Axis::Elevation
            }
        );

        let cli = Cli::parse_from(["rotator-panel", "stop", "mast", "--axis", "az"]);
        assert_eq!(
            cli.action,
            Action::Stop {
                name: "mast".into(),
                axis: Some(Axis::Azimuth)
            }
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["rotator-panel", "watch", "--hub", "http://shack:7070", "-o", "/tmp/out"]);
        assert_eq!(cli.hub.as_deref(), Some("http://shack:7070"));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/out")));
        assert_eq!(
            cli.action,
            Action::Watch {
                azimuth_rotator: None,
                elevation_rotator: None
            }
        );
    }

    #[test]
    fn test_watch_preferred_rotators() {
        let cli = Cli::parse_from(["rotator-panel", "watch", "--elevation-rotator", "dish"]);
        assert_eq!(
            cli.action,
            Action::Watch {
                azimuth_rotator: None,
                elevation_rotator: Some("dish".into())
            }
        );
    }
}
