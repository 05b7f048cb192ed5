//! Preset drag interaction.
//!
//! One controller per compass widget. Pointer and touch input both map onto
//! the same four inputs: down, move, release, leave.
//!
//! ```text
//!            pointer_down / press_at
//!   ┌──────┐ ─────────────────────────▶ ┌──────────────────────┐
//!   │ Idle │                            │ Dragging{provisional}│ ◀─┐ move
//!   └──────┘ ◀───────────────────────── └──────────────────────┘ ──┘ (held)
//!             release: emit SetHeading
//!             leave:   discard
//! ```
//!
//! The record's own preset is never written here. It changes only when the
//! hub echoes the command back as a heading event.

use crate::angle::Point;
use crate::axis::Axis;
use crate::command::{Command, CommandSink};
use crate::rotator::RotatorRecord;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer held; `provisional` is the preset shown until release
    Dragging { provisional: f64 },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn provisional(&self) -> Option<f64> {
        match self {
            DragState::Dragging { provisional } => Some(*provisional),
            DragState::Idle => None,
        }
    }
}

/// Drag state machine for one square compass widget of side `size`
#[derive(Debug, Clone)]
pub struct PresetDragController {
    axis: Axis,
    size: f64,
    state: DragState,
}

impl PresetDragController {
    pub fn new(axis: Axis, size: f64) -> Self {
        PresetDragController {
            axis,
            size,
            state: DragState::Idle,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// Widget was resized; an ongoing drag continues with the new geometry
    pub fn resize(&mut self, size: f64) {
        self.size = size;
    }

    pub fn center(&self) -> Point {
        Point::new(self.size / 2.0, self.size / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.size).contains(&point.x) && (0.0..=self.size).contains(&point.y)
    }

    /// Preset to draw: the provisional value while dragging
    pub fn display_preset(&self, record: &RotatorRecord) -> f64 {
        self.state
            .provisional()
            .unwrap_or_else(|| record.preset(self.axis))
    }

    /// Start dragging from the record's current preset.
    ///
    /// Returns false, staying idle, when the record lacks this axis.
    pub fn pointer_down(&mut self, record: &RotatorRecord) -> bool {
        if !record.supports(self.axis) {
            return false;
        }
        self.state = DragState::Dragging {
            provisional: record.preset(self.axis),
        };
        true
    }

    /// Pointer down followed by a move sample at the same spot, so that a
    /// plain click targets the clicked angle.
    pub fn press_at(&mut self, record: &RotatorRecord, point: Point) -> bool {
        self.pointer_down(record) && self.pointer_move(record, point, true)
    }

    /// Track the pointer.
    ///
    /// Returns true when the provisional preset changed and a redraw is due.
    /// A move outside the widget counts as leaving it.
    pub fn pointer_move(&mut self, record: &RotatorRecord, point: Point, primary_held: bool) -> bool {
        if !self.is_dragging() || !primary_held {
            return false;
        }
        if !self.contains(point) {
            return self.pointer_leave();
        }
        let (min, max) = record.range(self.axis);
        let raw = self.axis.pointer_angle(self.center(), point);
        let provisional = self.axis.constrain(raw, min, max);
        self.state = DragState::Dragging { provisional };
        true
    }

    /// Finish the drag, sending the rounded provisional preset.
    ///
    /// Returns true when a command was emitted.
    pub fn release<S: CommandSink>(&mut self, record: &RotatorRecord, sink: &mut S) -> bool {
        let DragState::Dragging { provisional } = std::mem::take(&mut self.state) else {
            return false;
        };
        if !record.supports(self.axis) {
            return false;
        }
        sink.submit(Command::set_heading(
            record.name.clone(),
            self.axis,
            provisional.round() as i32,
        ));
        true
    }

    /// Abandon the drag without a command.
    ///
    /// Returns true if a drag was in progress, so the widget should redraw
    /// with the authoritative preset.
    pub fn pointer_leave(&mut self) -> bool {
        std::mem::take(&mut self.state).is_dragging()
    }
}
