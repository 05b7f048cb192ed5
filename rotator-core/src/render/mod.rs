//! Compass rendering.
//!
//! Rendering produces a [`Frame`]: a backend-neutral list of draw commands in
//! pixel coordinates. Backends (SVG in the panel, a canvas elsewhere) only
//! have to map each [`Shape`] onto their own primitives.
//!
//! Angles inside shapes are screen bearings: 0 up, clockwise positive.

mod compass;

pub use compass::{render_selected, CompassRenderer, Layout, PanelFrames};

use std::fmt;

use serde::{Serialize, Serializer};

use crate::angle::Point;
use crate::axis::Axis;

// =============================================================================
// Color
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::rgba(r, g, b, 255)
    }

    /// Opacity in 0..=1
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// `#rrggbb` without the alpha channel
    pub fn hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub mod palette {
    use super::Color;

    pub const RING: Color = Color::rgb(255, 255, 255);
    pub const HEADING: Color = Color::rgb(255, 0, 0);
    pub const HUB: Color = Color::rgb(255, 255, 0);
    pub const PRESET: Color = Color::rgb(255, 255, 0);
    /// rgba(92, 184, 92, 0.5)
    pub const RANGE: Color = Color::rgba(92, 184, 92, 128);
    /// rgba(66, 139, 202, 0.502)
    pub const OVERLAP: Color = Color::rgba(66, 139, 202, 128);
    /// rgba(255, 0, 0, 0.8)
    pub const OVERLAP_ACTIVE: Color = Color::rgba(255, 0, 0, 204);
    pub const STOP: Color = Color::rgba(255, 0, 0, 204);
}

// =============================================================================
// Draw commands
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Middle,
}

/// A drawing primitive in pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Stroked arc; a sweep of 360 or more is the whole circle
    Arc {
        center: Point,
        radius: f64,
        start: f64,
        sweep: f64,
        stroke: Color,
        width: f64,
    },
    Disc {
        center: Point,
        radius: f64,
        fill: Color,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Color,
        width: f64,
        /// Dash and gap lengths
        dash: Option<(f64, f64)>,
    },
    /// Open stroked path
    Polyline {
        points: Vec<Point>,
        stroke: Color,
        width: f64,
    },
    Polygon {
        points: Vec<Point>,
        fill: Color,
    },
    /// Filled ring segment between two radii, sweeping clockwise from
    /// `start` (counter-clockwise for a negative sweep)
    Band {
        center: Point,
        inner: f64,
        outer: f64,
        start: f64,
        sweep: f64,
        fill: Color,
    },
    Text {
        at: Point,
        text: String,
        size: f64,
        fill: Color,
        anchor: Anchor,
    },
}

/// Which element of the compass a command draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Range,
    Overlap,
    OverlapActive,
    StopMarker,
    Ring,
    Tick,
    Legend,
    HeadingLabel,
    HeadingNeedle,
    PresetNeedle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCommand {
    pub part: Part,
    #[serde(flatten)]
    pub shape: Shape,
}

/// Everything needed to paint one compass, back to front
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub axis: Axis,
    pub size: f64,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new(axis: Axis, size: f64) -> Self {
        Frame {
            axis,
            size,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, part: Part, shape: Shape) {
        self.commands.push(DrawCommand { part, shape });
    }

    /// Shapes belonging to one part, in draw order
    pub fn shapes(&self, part: Part) -> impl Iterator<Item = &Shape> {
        self.commands
            .iter()
            .filter(move |c| c.part == part)
            .map(|c| &c.shape)
    }

    pub fn has(&self, part: Part) -> bool {
        self.commands.iter().any(|c| c.part == part)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
