//! SVG backend for compass frames.

use rotator_core::angle::{point_on_ring, Point};
use rotator_core::render::{Anchor, Color, Shape};
use rotator_core::Frame;

const BACKGROUND: &str = "#1e1e1e";

/// Standalone SVG document for one frame
pub fn to_svg(frame: &Frame) -> String {
    let size = frame.size;
    let mut out = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">"#,
        s = num(size)
    );
    out.push('\n');
    out.push_str(&format!(
        r#"  <rect width="{s}" height="{s}" fill="{BACKGROUND}"/>"#,
        s = num(size)
    ));
    out.push('\n');
    for command in &frame.commands {
        out.push_str("  ");
        out.push_str(&element(&command.shape));
        out.push('\n');
    }
    out.push_str("</svg>\n");
    out
}

fn element(shape: &Shape) -> String {
    match shape {
        Shape::Arc {
            center,
            radius,
            start,
            sweep,
            stroke,
            width,
        } => {
            let style = format!(r#"fill="none" {}"#, stroke_attrs(*stroke, *width));
            if sweep.abs() >= 360.0 {
                format!(
                    r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
                    num(center.x),
                    num(center.y),
                    num(*radius),
                    style
                )
            } else {
                let from = point_on_ring(*center, *radius, *start);
                let to = point_on_ring(*center, *radius, start + sweep);
                format!(
                    r#"<path d="M {} A {r} {r} 0 {} {} {}" {}/>"#,
                    xy(from),
                    large_arc(*sweep),
                    sweep_flag(*sweep),
                    xy(to),
                    style,
                    r = num(*radius)
                )
            }
        }
        Shape::Disc {
            center,
            radius,
            fill,
        } => format!(
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            num(center.x),
            num(center.y),
            num(*radius),
            fill_attrs(*fill)
        ),
        Shape::Line {
            from,
            to,
            stroke,
            width,
            dash,
        } => {
            let dash = match dash {
                Some((on, off)) => format!(r#" stroke-dasharray="{} {}""#, num(*on), num(*off)),
                None => String::new(),
            };
            format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}{}/>"#,
                num(from.x),
                num(from.y),
                num(to.x),
                num(to.y),
                stroke_attrs(*stroke, *width),
                dash
            )
        }
        Shape::Polyline {
            points,
            stroke,
            width,
        } => format!(
            r#"<polyline points="{}" fill="none" {}/>"#,
            point_list(points),
            stroke_attrs(*stroke, *width)
        ),
        Shape::Polygon { points, fill } => format!(
            r#"<polygon points="{}" {}/>"#,
            point_list(points),
            fill_attrs(*fill)
        ),
        Shape::Band {
            center,
            inner,
            outer,
            start,
            sweep,
            fill,
        } => format!(
            r#"<path d="{}" fill-rule="evenodd" {}/>"#,
            band_path(*center, *inner, *outer, *start, *sweep),
            fill_attrs(*fill)
        ),
        Shape::Text {
            at,
            text,
            size,
            fill,
            anchor,
        } => format!(
            r#"<text x="{}" y="{}" font-family="monospace" font-size="{}" text-anchor="{}" {}>{}</text>"#,
            num(at.x),
            num(at.y),
            num(*size),
            match anchor {
                Anchor::Start => "start",
                Anchor::Middle => "middle",
            },
            fill_attrs(*fill),
            escape(text)
        ),
    }
}

fn band_path(center: Point, inner: f64, outer: f64, start: f64, sweep: f64) -> String {
    if sweep.abs() >= 360.0 {
        // Two full circles; evenodd leaves the hole open
        return format!(
            "{} {}",
            circle_path(center, outer),
            circle_path(center, inner)
        );
    }
    let end = start + sweep;
    let large = large_arc(sweep);
    let forward = sweep_flag(sweep);
    let back = 1 - forward;
    format!(
        "M {} A {o} {o} 0 {large} {forward} {} L {} A {i} {i} 0 {large} {back} {} Z",
        xy(point_on_ring(center, outer, start)),
        xy(point_on_ring(center, outer, end)),
        xy(point_on_ring(center, inner, end)),
        xy(point_on_ring(center, inner, start)),
        o = num(outer),
        i = num(inner),
    )
}

fn circle_path(center: Point, r: f64) -> String {
    format!(
        "M {} A {r} {r} 0 1 1 {} A {r} {r} 0 1 1 {} Z",
        xy(point_on_ring(center, r, 0.0)),
        xy(point_on_ring(center, r, 180.0)),
        xy(point_on_ring(center, r, 0.0)),
        r = num(r)
    )
}

fn large_arc(sweep: f64) -> u8 {
    u8::from(sweep.abs() > 180.0)
}

/// SVG sweep flag 1 is clockwise on screen
fn sweep_flag(sweep: f64) -> u8 {
    u8::from(sweep >= 0.0)
}

fn stroke_attrs(color: Color, width: f64) -> String {
    format!(
        r#"stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
        color.hex_rgb(),
        num(color.alpha()),
        num(width)
    )
}

fn fill_attrs(color: Color) -> String {
    format!(
        r#"fill="{}" fill-opacity="{}""#,
        color.hex_rgb(),
        num(color.alpha())
    )
}

fn point_list(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn xy(p: Point) -> String {
    format!("{} {}", num(p.x), num(p.y))
}

/// Two decimals, without trailing zeros
fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
