//! # Rotator Core
//!
//! Platform-independent model and interaction logic for antenna rotator
//! control panels.
//!
//! This crate contains no I/O, no async runtime and no logging. Every
//! operation returns a value describing what happened; the application
//! decides what to log, fetch or redraw.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  rotator-core (pure, synchronous)                            │
//! │  ├── events/     hub messages ─▶ registry mutations          │
//! │  ├── registry/   name → record, per-axis selection           │
//! │  ├── drag/       pointer input ─▶ provisional preset/command │
//! │  ├── render/     record + drag ─▶ draw list                  │
//! │  ├── angle/      compass geometry                            │
//! │  └── connection/ transport state + backoff                   │
//! └──────────────────────────────────────────────────────────────┘
//!                              ▲
//!               ┌──────────────┴──────────────┐
//!               │  rotator-panel              │
//!               │  (WebSocket, HTTP, SVG)     │
//!               └─────────────────────────────┘
//! ```
//!
//! ## Example: following a drag
//!
//! ```rust
//! use rotator_core::{Axis, Command, Point, PresetDragController, RotatorRecord};
//!
//! let record = RotatorRecord::new("tower")
//!     .with_azimuth(0.0, 360.0)
//!     .at(Axis::Azimuth, 50.0, 90.0);
//!
//! let mut drag = PresetDragController::new(Axis::Azimuth, 200.0);
//! let mut sent: Vec<Command> = Vec::new();
//!
//! drag.pointer_down(&record);
//! drag.pointer_move(&record, Point::new(100.0, 190.0), true);
//! drag.release(&record, &mut sent);
//!
//! assert_eq!(sent, vec![Command::set_heading("tower", Axis::Azimuth, 180)]);
//! ```

pub mod angle;
pub mod axis;
pub mod command;
pub mod connection;
pub mod drag;
pub mod error;
pub mod events;
pub mod registry;
pub mod render;
pub mod rotator;

pub use angle::{clamp_to_range, overlap_extent, point_on_ring, pointer_to_angle, Point};
pub use axis::Axis;
pub use command::{Command, CommandSink};
pub use connection::{ConnectionManager, ConnectionState};
pub use drag::{DragState, PresetDragController};
pub use error::{EventError, RegistryError};
pub use events::{parse_snapshot, EventReconciler, HubEvent, Ignored, Reconciled};
pub use registry::{sorted_by_name, DeviceRegistry};
pub use render::{render_selected, CompassRenderer, Frame, PanelFrames};
pub use rotator::{HeadingUpdate, RotatorRecord};
