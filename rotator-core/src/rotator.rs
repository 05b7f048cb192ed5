//! Rotator data model
//!
//! [`RotatorRecord`] is the client-side mirror of one device. On the wire the
//! hub nests it as `{name, heading{..}, config{..}}`; the record flattens that
//! into one struct and converts through [`RotatorObject`].

use serde::{Deserialize, Serialize};

use crate::angle;
use crate::axis::Axis;
use crate::error::EventError;

// =============================================================================
// Record
// =============================================================================

/// One rotator as known to the client.
///
/// `name` and the capability flags never change for the life of a record;
/// everything else is overwritten by heading events from the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RotatorObject", into = "RotatorObject")]
pub struct RotatorRecord {
    pub name: String,
    pub has_azimuth: bool,
    pub has_elevation: bool,

    /// Current azimuth, may exceed 360 while in the overlap zone
    pub azimuth: f64,
    pub az_preset: f64,
    pub az_min: f64,
    pub az_max: f64,
    pub az_overlap: bool,
    /// Mechanical stop anchoring the overlap arc
    pub az_stop: f64,

    pub elevation: f64,
    pub el_preset: f64,
    pub el_min: f64,
    pub el_max: f64,
}

impl RotatorRecord {
    /// A record with no axes and default ranges.
    ///
    /// Enable at least one axis with [`with_azimuth`](Self::with_azimuth) or
    /// [`with_elevation`](Self::with_elevation) before adding it anywhere.
    pub fn new(name: impl Into<String>) -> Self {
        RotatorRecord {
            name: name.into(),
            has_azimuth: false,
            has_elevation: false,
            azimuth: 0.0,
            az_preset: 0.0,
            az_min: 0.0,
            az_max: 360.0,
            az_overlap: false,
            az_stop: 0.0,
            elevation: 0.0,
            el_preset: 0.0,
            el_min: 0.0,
            el_max: 180.0,
        }
    }

    pub fn with_azimuth(mut self, min: f64, max: f64) -> Self {
        self.has_azimuth = true;
        self.az_min = min;
        self.az_max = max;
        self
    }

    pub fn with_elevation(mut self, min: f64, max: f64) -> Self {
        self.has_elevation = true;
        self.el_min = min;
        self.el_max = max;
        self
    }

    pub fn with_stop(mut self, stop: f64) -> Self {
        self.az_stop = stop;
        self
    }

    /// Set heading and preset for an axis together
    pub fn at(mut self, axis: Axis, heading: f64, preset: f64) -> Self {
        match axis {
            Axis::Azimuth => {
                self.azimuth = heading;
                self.az_preset = preset;
            }
            Axis::Elevation => {
                self.elevation = heading;
                self.el_preset = preset;
            }
        }
        self
    }

    pub fn supports(&self, axis: Axis) -> bool {
        match axis {
            Axis::Azimuth => self.has_azimuth,
            Axis::Elevation => self.has_elevation,
        }
    }

    pub fn heading(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Azimuth => self.azimuth,
            Axis::Elevation => self.elevation,
        }
    }

    pub fn preset(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Azimuth => self.az_preset,
            Axis::Elevation => self.el_preset,
        }
    }

    /// Travel bounds as (min, max)
    pub fn range(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::Azimuth => (self.az_min, self.az_max),
            Axis::Elevation => (self.el_min, self.el_max),
        }
    }

    /// Travel span of an axis
    pub fn span(&self, axis: Axis) -> f64 {
        let (min, max) = self.range(axis);
        max - min
    }

    pub fn is_turning(&self, axis: Axis) -> bool {
        axis.is_turning(self.heading(axis), self.preset(axis))
    }

    /// Azimuth travel covers a full turn or more
    pub fn is_overlap_capable(&self) -> bool {
        self.has_azimuth && self.span(Axis::Azimuth) >= Axis::Azimuth.full_span()
    }

    pub fn overlap_extent(&self) -> f64 {
        angle::overlap_extent(self.az_min, self.az_max)
    }

    /// Merge a partial heading.
    ///
    /// Fields for an axis the rotator lacks are dropped. Returns true when
    /// any stored value changed.
    pub fn apply(&mut self, update: &HeadingUpdate) -> bool {
        let before = (
            self.azimuth,
            self.az_preset,
            self.az_overlap,
            self.elevation,
            self.el_preset,
        );

        if self.has_azimuth {
            if let Some(v) = update.azimuth {
                self.azimuth = v;
            }
            if let Some(v) = update.az_preset {
                self.az_preset = v;
            }
            if let Some(v) = update.az_overlap {
                self.az_overlap = v;
            }
        }
        if self.has_elevation {
            if let Some(v) = update.elevation {
                self.elevation = v;
            }
            if let Some(v) = update.el_preset {
                self.el_preset = v;
            }
        }

        before
            != (
                self.azimuth,
                self.az_preset,
                self.az_overlap,
                self.elevation,
                self.el_preset,
            )
    }
}

// =============================================================================
// Partial heading
// =============================================================================

/// Heading fields carried by a `heading` event; any subset may be present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_preset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_overlap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el_preset: Option<f64>,
}

impl HeadingUpdate {
    pub fn is_empty(&self) -> bool {
        self == &HeadingUpdate::default()
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// Record as the hub serializes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotatorObject {
    pub name: String,
    #[serde(default)]
    pub heading: HeadingObject,
    #[serde(default)]
    pub config: ConfigObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingObject {
    pub azimuth: f64,
    pub az_preset: f64,
    pub az_overlap: bool,
    pub elevation: f64,
    pub el_preset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigObject {
    pub has_azimuth: bool,
    pub azimuth_min: f64,
    pub azimuth_max: f64,
    pub azimuth_stop: f64,
    pub has_elevation: bool,
    pub elevation_min: f64,
    pub elevation_max: f64,
}

impl Default for ConfigObject {
    fn default() -> Self {
        ConfigObject {
            has_azimuth: false,
            azimuth_min: 0.0,
            azimuth_max: 360.0,
            azimuth_stop: 0.0,
            has_elevation: false,
            elevation_min: 0.0,
            elevation_max: 180.0,
        }
    }
}

impl TryFrom<RotatorObject> for RotatorRecord {
    type Error = EventError;

    fn try_from(o: RotatorObject) -> Result<Self, Self::Error> {
        if !o.config.has_azimuth && !o.config.has_elevation {
            return Err(EventError::NoCapability(o.name));
        }
        Ok(RotatorRecord {
            name: o.name,
            has_azimuth: o.config.has_azimuth,
            has_elevation: o.config.has_elevation,
            azimuth: o.heading.azimuth,
            az_preset: o.heading.az_preset,
            az_min: o.config.azimuth_min,
            az_max: o.config.azimuth_max,
            az_overlap: o.heading.az_overlap,
            az_stop: o.config.azimuth_stop,
            elevation: o.heading.elevation,
            el_preset: o.heading.el_preset,
            el_min: o.config.elevation_min,
            el_max: o.config.elevation_max,
        })
    }
}

impl From<RotatorRecord> for RotatorObject {
    fn from(r: RotatorRecord) -> Self {
        RotatorObject {
            name: r.name,
            heading: HeadingObject {
                azimuth: r.azimuth,
                az_preset: r.az_preset,
                az_overlap: r.az_overlap,
                elevation: r.elevation,
                el_preset: r.el_preset,
            },
            config: ConfigObject {
                has_azimuth: r.has_azimuth,
                azimuth_min: r.az_min,
                azimuth_max: r.az_max,
                azimuth_stop: r.az_stop,
                has_elevation: r.has_elevation,
                elevation_min: r.el_min,
                elevation_max: r.el_max,
            },
        }
    }
}
