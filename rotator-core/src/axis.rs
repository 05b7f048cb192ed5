//! Axis Kinds
//!
//! A rotator moves on up to two axes. Both compass widgets share one renderer
//! and one drag controller; everything that differs between them lives here.
//!
//! ```text
//!        Azimuth (full circle)          Elevation (upper semicircle)
//!
//!               N 0                               90
//!            .-'''-.                           .-'''-.
//!     W 270 |   +   | E 90               0  --+---+---+--  180
//!            '-...-'
//!              S 180
//! ```
//!
//! Elevation values are drawn rotated by -90 so that 0 sits on the left, 90
//! at the top and 180 on the right.

use serde::{Deserialize, Serialize};

use crate::angle::{self, Point};

/// Heading/preset difference at which an azimuth rotator counts as turning
pub const AZIMUTH_TURNING_THRESHOLD: f64 = 5.0;

/// Heading/preset difference at which an elevation rotator counts as turning
pub const ELEVATION_TURNING_THRESHOLD: f64 = 3.0;

/// A legend mark, placed in reference units of a 100x100 canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendMark {
    pub text: &'static str,
    pub x: f64,
    /// Baseline position
    pub y: f64,
    /// True when `x` is the centre of the text rather than its start
    pub centered: bool,
}

const AZIMUTH_LEGEND: [LegendMark; 4] = [
    LegendMark {
        text: "N",
        x: 50.0,
        y: 25.0,
        centered: true,
    },
    LegendMark {
        text: "S",
        x: 50.0,
        y: 83.0,
        centered: true,
    },
    LegendMark {
        text: "W",
        x: 16.0,
        y: 53.3,
        centered: false,
    },
    LegendMark {
        text: "E",
        x: 78.0,
        y: 53.3,
        centered: false,
    },
];

const ELEVATION_LEGEND: [LegendMark; 3] = [
    LegendMark {
        text: "90°",
        x: 50.0,
        y: 25.0,
        centered: true,
    },
    LegendMark {
        text: "0°",
        x: 18.0,
        y: 50.0,
        centered: false,
    },
    LegendMark {
        text: "180°",
        x: 67.0,
        y: 50.0,
        centered: false,
    },
];

/// Which axis of a rotator a value, widget or command refers to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Azimuth,
    Elevation,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "azimuth" | "az" => Ok(Axis::Azimuth),
            "elevation" | "el" => Ok(Axis::Elevation),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Azimuth, Axis::Elevation];

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Azimuth => "azimuth",
            Axis::Elevation => "elevation",
        }
    }

    /// Widest travel that still counts as range-limited
    pub fn full_span(self) -> f64 {
        match self {
            Axis::Azimuth => 360.0,
            Axis::Elevation => 180.0,
        }
    }

    /// Rotation from axis value to screen bearing
    pub fn screen_offset(self) -> f64 {
        match self {
            Axis::Azimuth => 0.0,
            Axis::Elevation => -90.0,
        }
    }

    /// Screen bearing at which a value of this axis is drawn
    pub fn to_screen(self, value: f64) -> f64 {
        value + self.screen_offset()
    }

    pub fn turning_threshold(self) -> f64 {
        match self {
            Axis::Azimuth => AZIMUTH_TURNING_THRESHOLD,
            Axis::Elevation => ELEVATION_TURNING_THRESHOLD,
        }
    }

    /// Whether a rotator with this heading and preset is moving
    pub fn is_turning(self, heading: f64, preset: f64) -> bool {
        (heading - preset).abs() >= self.turning_threshold()
    }

    /// Axis value under a pointer, in [0, 360).
    ///
    /// For elevation the lower half of the dial maps to values above 180
    /// (180..270 on the right) or near 360 (270..360 on the left).
    pub fn pointer_angle(self, center: Point, point: Point) -> f64 {
        angle::normalize(angle::pointer_to_angle(center, point) - self.screen_offset())
    }

    /// Clamp a pointer-derived value into `[min, max]` for this axis.
    ///
    /// Elevation first folds the lower half of the dial onto the nearer end
    /// of the semicircle so that pointing below the horizon on the left
    /// gives 0 and on the right gives 180. Straight down counts as right.
    pub fn constrain(self, value: f64, min: f64, max: f64) -> f64 {
        match self {
            Axis::Azimuth => angle::clamp_to_range(value, min, max),
            Axis::Elevation => {
                let v = angle::normalize(value);
                let folded = if v > 270.0 {
                    0.0
                } else if v > 180.0 {
                    180.0
                } else {
                    v
                };
                angle::clamp_to_range(folded, min, max)
            }
        }
    }

    /// Forward arc used to place the heading label.
    ///
    /// Headings below the first or above the second bound put the label
    /// under the centre, the rest above it. Elevation has no forward arc.
    pub fn label_arc(self) -> Option<(f64, f64)> {
        match self {
            Axis::Azimuth => Some((130.0, 240.0)),
            Axis::Elevation => None,
        }
    }

    pub fn legend(self) -> &'static [LegendMark] {
        match self {
            Axis::Azimuth => &AZIMUTH_LEGEND,
            Axis::Elevation => &ELEVATION_LEGEND,
        }
    }

    /// Values that carry a tick, in axis units
    pub fn tick_values(self) -> std::ops::RangeInclusive<i32> {
        match self {
            Axis::Azimuth => 1..=360,
            Axis::Elevation => 0..=180,
        }
    }

    /// Ring outline as (start bearing, sweep)
    pub fn ring(self) -> (f64, f64) {
        match self {
            Axis::Azimuth => (0.0, 360.0),
            Axis::Elevation => (-90.0, 180.0),
        }
    }
}
