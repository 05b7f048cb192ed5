//! Compass widget geometry.
//!
//! All dimensions are laid out on a 100x100 reference canvas and scaled by
//! `size / 100`. The ring has a radius of 45 reference units.
//!
//! Draw order, back to front:
//!
//! 1. travel limits (range band, or overlap band + stop marker)
//! 2. ring, ticks, legend
//! 3. heading label and needle
//! 4. preset needle, only while turning or dragging

use super::{palette, Anchor, Color, Frame, Part, Shape};
use crate::angle::{point_on_ring, range_sweep, Point};
use crate::axis::Axis;
use crate::drag::DragState;
use crate::registry::DeviceRegistry;
use crate::rotator::RotatorRecord;

const REFERENCE_SIZE: f64 = 100.0;
const RADIUS_UNITS: f64 = 45.0;
const RING_WIDTH: f64 = 3.0;
const MAJOR_TICK: f64 = 0.22;
const MINOR_TICK: f64 = 0.11;
/// Inner edge of range and overlap bands, as a fraction of the radius
const BAND_INNER: f64 = 1.0 - MAJOR_TICK;
const STOP_WIDTH: f64 = 2.0;
const STOP_DASH: (f64, f64) = (5.0, 5.0);

/// Pixel geometry for one widget size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub size: f64,
    pub scale: f64,
    pub center: Point,
    pub radius: f64,
}

impl Layout {
    pub fn new(size: f64) -> Self {
        let size = if size.is_finite() && size > 0.0 { size } else { 0.0 };
        let scale = size / REFERENCE_SIZE;
        Layout {
            size,
            scale,
            center: Point::new(size / 2.0, size / 2.0),
            radius: RADIUS_UNITS * scale,
        }
    }

    /// Reference units to pixels
    pub fn units(&self, v: f64) -> f64 {
        v * self.scale
    }

    pub fn font_size(&self) -> f64 {
        self.size / 15.0
    }

    /// Half-width of the heading needle at its base
    pub fn heading_needle_width(&self) -> f64 {
        if self.size > 100.0 {
            self.size / 30.0
        } else {
            7.0
        }
    }

    pub fn preset_needle_width(&self) -> f64 {
        if self.size > 100.0 {
            self.size / 80.0
        } else {
            3.0
        }
    }
}

/// Renders one axis of a rotator as a compass.
///
/// Stateless: every call builds a fresh frame from its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompassRenderer {
    axis: Axis,
    show_legend: bool,
}

impl CompassRenderer {
    pub fn new(axis: Axis) -> Self {
        CompassRenderer {
            axis,
            show_legend: true,
        }
    }

    pub fn with_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Full compass for a record, using the provisional preset while dragging.
    ///
    /// A record without this axis renders as idle.
    pub fn render(&self, record: &RotatorRecord, drag: &DragState, size: f64) -> Frame {
        if !record.supports(self.axis) {
            return self.render_idle(size);
        }

        let layout = Layout::new(size);
        let mut frame = Frame::new(self.axis, layout.size);

        self.draw_travel(&mut frame, &layout, record);
        self.draw_compass(&mut frame, &layout);

        let heading = record.heading(self.axis);
        self.draw_heading(&mut frame, &layout, heading);

        let preset = drag.provisional().unwrap_or_else(|| record.preset(self.axis));
        if drag.is_dragging() || self.axis.is_turning(heading, preset) {
            self.draw_preset(&mut frame, &layout, preset);
        }

        frame
    }

    /// Bare compass, shown while no rotator is selected
    pub fn render_idle(&self, size: f64) -> Frame {
        let layout = Layout::new(size);
        let mut frame = Frame::new(self.axis, layout.size);
        self.draw_compass(&mut frame, &layout);
        frame
    }

    // -------------------------------------------------------------------------
    // Travel limits
    // -------------------------------------------------------------------------

    fn draw_travel(&self, frame: &mut Frame, layout: &Layout, record: &RotatorRecord) {
        if self.axis == Axis::Azimuth && record.is_overlap_capable() {
            self.draw_overlap(frame, layout, record);
            return;
        }

        let (min, max) = record.range(self.axis);
        if max - min >= self.axis.full_span() {
            return;
        }
        let sweep = range_sweep(min, max);
        if sweep > 0.0 {
            frame.push(
                Part::Range,
                self.band(layout, self.axis.to_screen(min), sweep, palette::RANGE),
            );
        }
    }

    fn draw_overlap(&self, frame: &mut Frame, layout: &Layout, record: &RotatorRecord) {
        let stop = record.az_stop;

        let extent = record.overlap_extent();
        if extent > 0.0 {
            frame.push(Part::Overlap, self.band(layout, stop, extent, palette::OVERLAP));
        }

        if record.az_overlap {
            let travelled = record.azimuth - stop;
            if travelled != 0.0 {
                frame.push(
                    Part::OverlapActive,
                    self.band(layout, stop, travelled, palette::OVERLAP_ACTIVE),
                );
            }
        }

        frame.push(
            Part::StopMarker,
            Shape::Line {
                from: layout.center,
                to: point_on_ring(layout.center, layout.radius - layout.units(2.0), stop),
                stroke: palette::STOP,
                width: STOP_WIDTH,
                dash: Some(STOP_DASH),
            },
        );
    }

    fn band(&self, layout: &Layout, start: f64, sweep: f64, fill: Color) -> Shape {
        Shape::Band {
            center: layout.center,
            inner: layout.radius * BAND_INNER,
            outer: layout.radius,
            start,
            sweep,
            fill,
        }
    }

    // -------------------------------------------------------------------------
    // Ring, ticks, legend
    // -------------------------------------------------------------------------

    fn draw_compass(&self, frame: &mut Frame, layout: &Layout) {
        let (start, sweep) = self.axis.ring();
        frame.push(
            Part::Ring,
            Shape::Arc {
                center: layout.center,
                radius: layout.radius,
                start,
                sweep,
                stroke: palette::RING,
                width: RING_WIDTH,
            },
        );

        for value in self.axis.tick_values() {
            let (length, width) = if value % 45 == 0 {
                (MAJOR_TICK, 3.0)
            } else if value % 15 == 0 {
                (MINOR_TICK, 1.0)
            } else {
                continue;
            };
            let bearing = self.axis.to_screen(value as f64);
            let r = layout.radius;
            frame.push(
                Part::Tick,
                Shape::Line {
                    from: point_on_ring(layout.center, r - r * length, bearing),
                    to: point_on_ring(layout.center, r, bearing),
                    stroke: palette::RING,
                    width,
                    dash: None,
                },
            );
        }

        if self.show_legend {
            for mark in self.axis.legend() {
                frame.push(
                    Part::Legend,
                    Shape::Text {
                        at: Point::new(layout.units(mark.x), layout.units(mark.y)),
                        text: mark.text.to_string(),
                        size: layout.font_size(),
                        fill: palette::RING,
                        anchor: if mark.centered {
                            Anchor::Middle
                        } else {
                            Anchor::Start
                        },
                    },
                );
            }
        }
    }

    // -------------------------------------------------------------------------
    // Needles
    // -------------------------------------------------------------------------

    fn draw_heading(&self, frame: &mut Frame, layout: &Layout, heading: f64) {
        let label_y = match self.axis.label_arc() {
            Some((low, high)) if heading < low || heading > high => {
                layout.size - layout.units(30.0)
            }
            Some(_) => layout.units(40.0),
            None => layout.size - layout.units(35.0),
        };
        frame.push(
            Part::HeadingLabel,
            Shape::Text {
                at: Point::new(layout.center.x, label_y),
                text: format!("{}°", heading.round() as i64),
                size: layout.font_size(),
                fill: palette::HEADING,
                anchor: Anchor::Middle,
            },
        );

        let bearing = self.axis.to_screen(heading);
        let w = layout.heading_needle_width();
        let c = layout.center;
        frame.push(
            Part::HeadingNeedle,
            Shape::Polygon {
                points: vec![
                    point_on_ring(c, w, bearing - 90.0),
                    point_on_ring(c, layout.radius, bearing),
                    point_on_ring(c, w, bearing + 90.0),
                ],
                fill: palette::HEADING,
            },
        );
        frame.push(
            Part::HeadingNeedle,
            Shape::Disc {
                center: c,
                radius: w,
                fill: palette::HEADING,
            },
        );
        frame.push(
            Part::HeadingNeedle,
            Shape::Disc {
                center: c,
                radius: w / 2.0,
                fill: palette::HUB,
            },
        );
    }

    fn draw_preset(&self, frame: &mut Frame, layout: &Layout, preset: f64) {
        let bearing = self.axis.to_screen(preset);
        let c = layout.center;
        let width = layout.preset_needle_width();
        let tip = point_on_ring(c, layout.radius - layout.units(2.0), bearing);

        // Arrowhead barbs sit 3 units back from the tip, 1 unit either side
        let back = point_on_ring(c, layout.radius - layout.units(5.0), bearing);
        let left = point_on_ring(back, layout.units(1.0), bearing - 90.0);
        let right = point_on_ring(back, layout.units(1.0), bearing + 90.0);

        frame.push(
            Part::PresetNeedle,
            Shape::Line {
                from: c,
                to: tip,
                stroke: palette::PRESET,
                width,
                dash: None,
            },
        );
        frame.push(
            Part::PresetNeedle,
            Shape::Polyline {
                points: vec![left, tip, right],
                stroke: palette::PRESET,
                width,
            },
        );
    }
}

/// Frames for both compasses of the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelFrames {
    pub azimuth: Frame,
    pub elevation: Frame,
}

impl PanelFrames {
    pub fn get(&self, axis: Axis) -> &Frame {
        match axis {
            Axis::Azimuth => &self.azimuth,
            Axis::Elevation => &self.elevation,
        }
    }
}

/// Render the selected rotator of each axis, or an idle compass when an
/// axis has no selection.
pub fn render_selected(
    registry: &DeviceRegistry,
    azimuth_drag: &DragState,
    elevation_drag: &DragState,
    size: f64,
) -> PanelFrames {
    let frame = |axis: Axis, drag: &DragState| {
        let renderer = CompassRenderer::new(axis);
        match registry.selected_record(axis) {
            Some(record) => renderer.render(record, drag, size),
            None => renderer.render_idle(size),
        }
    };
    PanelFrames {
        azimuth: frame(Axis::Azimuth, azimuth_drag),
        elevation: frame(Axis::Elevation, elevation_drag),
    }
}
