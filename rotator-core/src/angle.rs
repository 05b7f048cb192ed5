//! Angle Math
//!
//! Pure geometry shared by the drag controller and the compass renderer.
//!
//! All angles are in degrees. Positions are screen coordinates, so `y` grows
//! downwards: bearing 0 points straight up (north) and bearing 90 points to
//! the right (east).
//!
//! Every function here is total. Non-finite input collapses to 0 instead of
//! propagating NaN into a frame.

use serde::{Deserialize, Serialize};

/// One full turn in degrees
pub const FULL_TURN: f64 = 360.0;

/// A position on the widget, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Offset this point by `distance` along a screen bearing
    pub fn towards(self, bearing: f64, distance: f64) -> Point {
        point_on_ring(self, distance, bearing)
    }
}

/// Normalize an angle to [0, 360)
pub fn normalize(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = angle.rem_euclid(FULL_TURN);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if a >= FULL_TURN {
        0.0
    } else {
        a
    }
}

/// Absolute shortest distance between two angles, in [0, 180]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = normalize(a - b);
    d.min(FULL_TURN - d)
}

/// Convert a pointer position into a compass bearing around `center`.
///
/// 0 is straight up, 90 is to the right. The result is in [0, 360).
pub fn pointer_to_angle(center: Point, point: Point) -> f64 {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    normalize(dy.atan2(dx).to_degrees() + 90.0)
}

/// Place a bearing on a ring of `radius` around `center`.
///
/// Inverse of [`pointer_to_angle`] for any non-zero radius.
pub fn point_on_ring(center: Point, radius: f64, bearing: f64) -> Point {
    let rad = bearing.to_radians();
    Point::new(center.x + radius * rad.sin(), center.y - radius * rad.cos())
}

/// Constrain an angle to the travel range `[min, max]`.
///
/// * A span of 360 degrees or more allows every angle.
/// * A range that does not wrap past 0 clamps to the edge the angle
///   overshoots: below `min` gives `min`, above `max` gives `max`.
/// * A range that wraps past 0 (`min mod 360 > max mod 360`) forbids the arc
///   `(max, min)`; angles inside it go to whichever edge is angularly closer.
///
/// The result is always normalized, and clamping is idempotent.
pub fn clamp_to_range(angle: f64, min: f64, max: f64) -> f64 {
    let angle = normalize(angle);
    if !min.is_finite() || !max.is_finite() || max - min >= FULL_TURN {
        return angle;
    }

    let lo = normalize(min);
    let hi = normalize(max);

    if lo == hi {
        return lo;
    }

    if lo < hi {
        if angle < lo {
            lo
        } else if angle > hi {
            hi
        } else {
            angle
        }
    } else {
        // Allowed: [lo, 360) and [0, hi]
        if angle >= lo || angle <= hi {
            return angle;
        }
        if angle - hi <= lo - angle {
            hi
        } else {
            lo
        }
    }
}

/// Portion of the travel beyond one full turn.
///
/// A rotator configured for -45..405 can travel 45 degrees past north; that
/// is the arc drawn from the stop position.
pub fn overlap_extent(min: f64, max: f64) -> f64 {
    if max - min <= 0.0 {
        return 0.0;
    }
    if max > FULL_TURN {
        max - FULL_TURN
    } else {
        0.0
    }
}

/// Clockwise sweep from `min` to `max` for a travel range.
///
/// A range given with `max < min` wraps past 0 and sweeps the short way
/// round, everything else sweeps `max - min`.
pub fn range_sweep(min: f64, max: f64) -> f64 {
    if max >= min {
        max - min
    } else {
        normalize(max - min)
    }
}
