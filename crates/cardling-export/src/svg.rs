//! SVG export for postcards
//!
//! Renders a snapshot at canvas size:
//! - Background as a full-canvas rect (solid color or image pattern)
//! - Each object in its own group, transformed about its center
//! - Object-specific elements for each ObjectKind

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use cardling_core::{Background, Color, ObjectKind, Point, SceneObject, Snapshot};

/// Line height relative to font size for multi-line text
const LINE_HEIGHT: f64 = 1.2;

/// Export a snapshot to an SVG string
pub fn export_svg(snapshot: &Snapshot) -> Result<String> {
    let mut output = String::new();
    let size = snapshot.size();

    writeln!(
        &mut output,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}" height="{h}"
     viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height
    )?;

    if let Some(background) = snapshot.background() {
        render_background(&mut output, background)?;
    }

    for object in snapshot.objects() {
        render_object(&mut output, object)?;
    }

    writeln!(&mut output, "</svg>")?;
    Ok(output)
}

/// Save a snapshot as an SVG file
pub fn save_svg(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let svg = export_svg(snapshot)?;
    std::fs::write(path, svg).with_context(|| format!("write svg: {}", path.display()))?;
    Ok(())
}

fn render_background(output: &mut String, background: &Background) -> std::fmt::Result {
    match background {
        Background::Color { color } => writeln!(
            output,
            r#"  <rect width="100%" height="100%" fill="{}"/>"#,
            color
        ),
        Background::Pattern { source } => {
            writeln!(
                output,
                r#"  <defs>
    <pattern id="background" patternUnits="userSpaceOnUse" width="100%" height="100%">
      <image href="{}" width="100%" height="100%" preserveAspectRatio="xMidYMid slice"/>
    </pattern>
  </defs>"#,
                escape_xml(source)
            )?;
            writeln!(
                output,
                r#"  <rect width="100%" height="100%" fill="url(#background)"/>"#
            )
        }
    }
}

/// Render a single object inside a transformed group
fn render_object(output: &mut String, object: &SceneObject) -> std::fmt::Result {
    writeln!(
        output,
        r#"  <g transform="translate({} {}) rotate({}) scale({})">"#,
        object.position.x, object.position.y, object.angle, object.scale
    )?;

    match &object.kind {
        ObjectKind::Text {
            content,
            font,
            font_size,
            fill,
            background,
        } => render_text(output, object, content, font, *font_size, *fill, *background)?,
        ObjectKind::Image {
            source,
            width,
            height,
        } => render_image(output, source, *width, *height)?,
        ObjectKind::Path {
            points,
            stroke,
            width,
        } => render_path(output, points, *stroke, *width)?,
        ObjectKind::Rect {
            width,
            height,
            fill,
            stroke,
        } => writeln!(
            output,
            r#"    <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="1"/>"#,
            -width / 2.0,
            -height / 2.0,
            width,
            height,
            fill_attr(*fill),
            stroke
        )?,
        ObjectKind::Ellipse {
            radius_x,
            radius_y,
            fill,
            stroke,
        } => writeln!(
            output,
            r#"    <ellipse cx="0" cy="0" rx="{}" ry="{}" fill="{}" stroke="{}" stroke-width="1"/>"#,
            radius_x,
            radius_y,
            fill_attr(*fill),
            stroke
        )?,
        ObjectKind::Line {
            from,
            to,
            stroke,
            width,
        } => writeln!(
            output,
            r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
            from.x, from.y, to.x, to.y, stroke, width
        )?,
    }

    writeln!(output, "  </g>")
}

fn fill_attr(fill: Option<Color>) -> String {
    fill.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Render text, one tspan per line, centered on the origin
fn render_text(
    output: &mut String,
    object: &SceneObject,
    content: &str,
    font: &str,
    font_size: f64,
    fill: Color,
    background: Option<Color>,
) -> std::fmt::Result {
    if let Some(bg) = background {
        let local = object.kind.local_bounds();
        writeln!(
            output,
            r#"    <rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            local.min.x,
            local.min.y,
            local.width(),
            local.height(),
            bg
        )?;
    }

    let lines: Vec<&str> = content.lines().collect();
    let first_offset = -((lines.len().max(1) - 1) as f64) * LINE_HEIGHT * font_size / 2.0;
    writeln!(
        output,
        r#"    <text x="0" y="{}" text-anchor="middle" dominant-baseline="middle" font-family="{}" font-size="{}" fill="{}">"#,
        first_offset,
        escape_xml(font),
        font_size,
        fill
    )?;
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 { 0.0 } else { LINE_HEIGHT * font_size };
        writeln!(
            output,
            r#"      <tspan x="0" dy="{}">{}</tspan>"#,
            dy,
            escape_xml(line)
        )?;
    }
    writeln!(output, "    </text>")
}

fn render_image(output: &mut String, source: &str, width: f64, height: f64) -> std::fmt::Result {
    writeln!(
        output,
        r#"    <image href="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
        escape_xml(source),
        -width / 2.0,
        -height / 2.0,
        width,
        height
    )
}

/// Render a freehand stroke as a polyline
fn render_path(output: &mut String, points: &[Point], stroke: Color, width: f64) -> std::fmt::Result {
    if points.is_empty() {
        return Ok(());
    }

    let coords: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
    writeln!(
        output,
        r#"    <polyline points="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
        coords.join(" "),
        stroke,
        width
    )
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
