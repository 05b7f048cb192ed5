//! One-shot panel actions and the compass file writer.

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use rotator_core::{
    render_selected, sorted_by_name, Axis, Command, CommandSink, DeviceRegistry, DragState,
    Point, PresetDragController, RegistryError, RotatorRecord,
};

use crate::config::Settings;
use crate::hub::{HttpSink, HubClient};
use crate::svg;
use crate::PanelError;

// =============================================================================
// Frame writer
// =============================================================================

/// Writes `azimuth.svg` and `elevation.svg` for the selected rotators
#[derive(Debug, Clone)]
pub struct FrameWriter {
    dir: PathBuf,
    size: f64,
}

impl FrameWriter {
    pub fn new(dir: &Path, size: f64) -> Result<Self, PanelError> {
        fs::create_dir_all(dir).map_err(|source| PanelError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        debug!("Writing compass files to {}", dir.display());
        Ok(FrameWriter {
            dir: dir.to_path_buf(),
            size,
        })
    }

    pub fn path(&self, axis: Axis) -> PathBuf {
        self.dir.join(format!("{}.svg", axis))
    }

    pub fn write(&self, registry: &DeviceRegistry) -> Result<(), PanelError> {
        let frames = render_selected(registry, &DragState::Idle, &DragState::Idle, self.size);
        for axis in Axis::ALL {
            let path = self.path(axis);
            let tmp = path.with_extension("svg.tmp");
            fs::write(&tmp, svg::to_svg(frames.get(axis)))
                .and_then(|_| fs::rename(&tmp, &path))
                .map_err(|source| PanelError::Write {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

// =============================================================================
// Listing
// =============================================================================

fn axis_summary(record: &RotatorRecord, axis: Axis) -> String {
    if !record.supports(axis) {
        return "-".to_string();
    }
    let (min, max) = record.range(axis);
    let mut s = format!(
        "{:.0}° → {:.0}° [{:.0}..{:.0}]",
        record.heading(axis),
        record.preset(axis),
        min,
        max
    );
    if axis == Axis::Azimuth && record.is_overlap_capable() {
        s.push_str(&format!(" stop {:.0}°", record.az_stop));
        if record.az_overlap {
            s.push_str(" overlap");
        }
    }
    s
}

/// Table of rotators sorted by name
pub fn format_listing(registry: &DeviceRegistry) -> String {
    if registry.is_empty() {
        return "No rotators\n".to_string();
    }
    let records = sorted_by_name(registry.all());
    let width = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!("{:width$}  {:30}  {}\n", "NAME", "AZIMUTH", "ELEVATION");
    for r in records {
        out.push_str(&format!(
            "{:width$}  {:30}  {}\n",
            r.name,
            axis_summary(r, Axis::Azimuth),
            axis_summary(r, Axis::Elevation)
        ));
    }
    out
}

pub async fn list(client: &HubClient) -> Result<String, PanelError> {
    let (records, errors) = client.rotators().await?;
    for e in errors {
        warn!("Skipping rotator: {}", e);
    }
    let mut registry = DeviceRegistry::new();
    for r in records {
        registry.add(r);
    }
    Ok(format_listing(&registry))
}

// =============================================================================
// Commands
// =============================================================================

/// Commands for `set`, one per given axis
pub fn set_commands(name: &str, azimuth: Option<i32>, elevation: Option<i32>) -> Vec<Command> {
    let mut commands = Vec::new();
    if let Some(degrees) = azimuth {
        commands.push(Command::set_heading(name, Axis::Azimuth, degrees));
    }
    if let Some(degrees) = elevation {
        commands.push(Command::set_heading(name, Axis::Elevation, degrees));
    }
    commands
}

/// Run a click at `point` on a compass of side `size` through the drag
/// controller.
pub fn click_command(
    record: &RotatorRecord,
    axis: Axis,
    size: f64,
    point: Point,
) -> Result<Command, PanelError> {
    let mut drag = PresetDragController::new(axis, size);
    let mut sink: Vec<Command> = Vec::new();
    if drag.press_at(record, point) {
        drag.release(record, &mut sink);
    }
    sink.pop().ok_or_else(|| {
        if record.supports(axis) {
            PanelError::InvalidOption(format!(
                "({}, {}) is outside the {} px compass",
                point.x, point.y, size
            ))
        } else {
            PanelError::Registry(RegistryError::Unsupported {
                name: record.name.clone(),
                axis,
            })
        }
    })
}

pub async fn send(client: &HubClient, commands: Vec<Command>) -> Result<(), PanelError> {
    let mut sink = HttpSink::new(client.clone());
    for command in commands {
        sink.submit(command);
    }
    let sent = sink.flush().await?;
    info!("{} command(s) accepted by the hub", sent);
    Ok(())
}

pub async fn click(
    client: &HubClient,
    settings: &Settings,
    name: &str,
    axis: Axis,
    point: Point,
) -> Result<(), PanelError> {
    let record = client.rotator(name).await?;
    let command = click_command(&record, axis, settings.canvas_size, point)?;
    send(client, vec![command]).await
}
