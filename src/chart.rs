use std::io::Cursor;
use std::panic;

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use crate::aggregate::{GameTally, Marker};
use crate::classify::ShotCategory;
use crate::rink;

pub const X_BOUNDS: (f64, f64) = (0.0, rink::HALF_LENGTH);
pub const Y_BOUNDS: (f64, f64) = (-rink::HALF_WIDTH, rink::HALF_WIDTH);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerShape {
    Star,
    Circle,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub color: (u8, u8, u8),
    pub size: u32,
}

impl MarkerStyle {
    pub fn hex(&self) -> String {
        let (r, g, b) = self.color;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl ShotCategory {
    pub fn style(self) -> MarkerStyle {
        match self {
            ShotCategory::Goal => MarkerStyle {
                shape: MarkerShape::Star,
                color: (0x4b, 0xad, 0x53),
                size: 20,
            },
            ShotCategory::ShotOnGoal => MarkerStyle {
                shape: MarkerShape::Circle,
                color: (0xf0, 0xa9, 0x11),
                size: 10,
            },
            ShotCategory::MissedShot => MarkerStyle {
                shape: MarkerShape::Cross,
                color: (0x00, 0x00, 0x00),
                size: 12,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub subtitle: String,
    pub status_line: String,
    pub start_line: String,
    pub markers: Vec<Marker>,
    pub annotate_attempts: bool,
    pub x_bounds: (f64, f64),
    pub y_bounds: (f64, f64),
    pub width: u32,
    pub height: u32,
}

pub struct ChartHeader<'a> {
    pub home: &'a str,
    pub away: &'a str,
    pub period_time_remaining: Option<&'a str>,
    pub period_ordinal: Option<&'a str>,
    pub start_local: Option<&'a str>,
}

pub fn chart_title(away: &str, away_goals: u32, home: &str, home_goals: u32) -> String {
    format!("{away} {away_goals} vs. {home} {home_goals}")
}

pub fn detail_line(away: &str, tally: &GameTally, home: &str) -> String {
    format!(
        "{away} - {} SOG ({} Total Shot Attempts)     {home} - {} SOG ({} Total Shot Attempts)",
        tally.away.shots_on_goal, tally.away.shot_attempts, tally.home.shots_on_goal, tally.home.shot_attempts
    )
}

impl ChartSpec {
    pub fn build(header: &ChartHeader<'_>, tally: &GameTally, annotate_attempts: bool, size: (u32, u32)) -> Self {
        let status_line = [header.period_time_remaining, header.period_ordinal]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            title: chart_title(header.away, tally.away.goals, header.home, tally.home.goals),
            subtitle: detail_line(header.away, tally, header.home),
            status_line,
            start_line: header.start_local.unwrap_or_default().to_string(),
            markers: tally.markers.clone(),
            annotate_attempts,
            x_bounds: X_BOUNDS,
            y_bounds: Y_BOUNDS,
            width: size.0,
            height: size.1,
        }
    }
}

/// Rasterizes the chart to PNG bytes.
///
/// `x_bounds` describe one half of the rink; both halves are drawn so away
/// markers (negative x) land left of center ice.
pub fn render_png(spec: &ChartSpec) -> Result<Vec<u8>> {
    let (width, height) = (spec.width.max(200), spec.height.max(200));
    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];

    let drawn = panic::catch_unwind(panic::AssertUnwindSafe(|| draw_chart(spec, &mut buffer, (width, height))));
    match drawn {
        Ok(result) => result?,
        Err(_) => return Err(anyhow!("chart backend panicked")),
    }

    let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| anyhow!("chart buffer size mismatch"))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("encode chart png")?;
    Ok(png)
}

fn draw_chart(spec: &ChartSpec, buffer: &mut [u8], size: (u32, u32)) -> Result<()> {
    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill background: {e}"))?;

    let header_px = (size.1 / 10).max(50);
    let footer_px = (size.1 / 12).max(45);
    let (header, rest) = root.split_vertically(header_px);
    let (plot, footer) = rest.split_vertically(size.1 - header_px - footer_px);

    let x_extent = spec.x_bounds.1.abs().max(spec.x_bounds.0.abs());
    let mut chart = ChartBuilder::on(&plot)
        .margin(16)
        .build_cartesian_2d(-x_extent..x_extent, spec.y_bounds.0..spec.y_bounds.1)
        .map_err(|e| anyhow!("build chart: {e}"))?;

    draw_rink(&mut chart).map_err(|e| anyhow!("draw rink: {e}"))?;
    draw_markers(&mut chart, &spec.markers).map_err(|e| anyhow!("draw markers: {e}"))?;

    if spec.annotate_attempts {
        for marker in &spec.markers {
            let label = Text::new(
                marker.attempts_before.to_string(),
                (marker.x as f64 - 1.2, marker.y as f64 - 1.0),
                ("sans-serif", 13.0).into_font().color(&BLACK),
            );
            if let Err(err) = chart.draw_series(std::iter::once(label)) {
                tracing::warn!(error = %err, "attempt annotations not drawn");
                break;
            }
        }
    }

    draw_text_lines(&header, &[(&spec.title, 26.0), (&spec.status_line, 18.0)]);
    draw_text_lines(&footer, &[(&spec.subtitle, 16.0), (&spec.start_line, 14.0)]);

    root.present().map_err(|e| anyhow!("present chart: {e}"))?;
    Ok(())
}

type RinkChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw_rink<DB: DrawingBackend>(chart: &mut RinkChart<'_, DB>) -> DrawResult<DB> {
    let red = RGBColor(0xc8, 0x10, 0x2e);
    let blue = RGBColor(0x00, 0x33, 0xa0);
    let board = BLACK.stroke_width(2);

    chart.draw_series(std::iter::once(PathElement::new(boards_outline(), board)))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(0.0, -rink::HALF_WIDTH), (0.0, rink::HALF_WIDTH)],
        red.stroke_width(3),
    )))?;
    for sign in [-1.0, 1.0] {
        let blue_x = sign * rink::BLUE_LINE_X;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(blue_x, -rink::HALF_WIDTH), (blue_x, rink::HALF_WIDTH)],
            blue.stroke_width(3),
        )))?;
        let goal_x = sign * rink::GOAL_LINE_X;
        let goal_half = goal_line_half_width(rink::GOAL_LINE_X);
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(goal_x, -goal_half), (goal_x, goal_half)],
            red.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            crease(goal_x, -sign),
            red.stroke_width(1),
        )))?;
        for circle_y in [-rink::FACEOFF_CIRCLE_Y, rink::FACEOFF_CIRCLE_Y] {
            chart.draw_series(std::iter::once(PathElement::new(
                circle_points(sign * rink::FACEOFF_CIRCLE_X, circle_y, rink::FACEOFF_CIRCLE_RADIUS),
                red.stroke_width(1),
            )))?;
        }
    }
    chart.draw_series(std::iter::once(PathElement::new(
        circle_points(0.0, 0.0, rink::CENTER_CIRCLE_RADIUS),
        blue.stroke_width(1),
    )))?;
    Ok(())
}

fn draw_markers<DB: DrawingBackend>(chart: &mut RinkChart<'_, DB>, markers: &[Marker]) -> DrawResult<DB> {
    // Stars go last so goals sit on top of overlapping shots.
    let ordered = markers
        .iter()
        .filter(|m| m.category != ShotCategory::Goal)
        .chain(markers.iter().filter(|m| m.category == ShotCategory::Goal));
    for marker in ordered {
        let style = marker.category.style();
        let (r, g, b) = style.color;
        let color = RGBColor(r, g, b);
        let at = (marker.x as f64, marker.y as f64);
        match style.shape {
            MarkerShape::Circle => {
                chart.draw_series(std::iter::once(Circle::new(at, style.size / 2, color.filled())))?;
            }
            MarkerShape::Cross => {
                chart.draw_series(std::iter::once(Cross::new(at, style.size / 2, color.stroke_width(2))))?;
            }
            MarkerShape::Star => {
                let star = EmptyElement::at(at) + Polygon::new(star_offsets(style.size as f64 / 2.0), color.filled());
                chart.draw_series(std::iter::once(star))?;
            }
        }
    }
    Ok(())
}

fn draw_text_lines<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, lines: &[(&str, f64)]) {
    let (w, h) = area.dim_in_pixel();
    let filled: Vec<&(&str, f64)> = lines.iter().filter(|(text, _)| !text.trim().is_empty()).collect();
    if filled.is_empty() {
        return;
    }
    let step = h as i32 / (filled.len() as i32 + 1);
    for (idx, (text, size)) in filled.into_iter().enumerate() {
        let style = TextStyle::from(("sans-serif", *size).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let y = step * (idx as i32 + 1);
        if let Err(err) = area.draw_text(text, &style, (w as i32 / 2, y)) {
            // Usually a host without fonts; the page still carries the text.
            tracing::warn!(error = %err, "chart text not drawn");
            return;
        }
    }
}

fn boards_outline() -> Vec<(f64, f64)> {
    let (l, w, r) = (rink::HALF_LENGTH, rink::HALF_WIDTH, rink::CORNER_RADIUS);
    let mut points = Vec::new();
    points.extend(arc(l - r, w - r, r, 0.0, 90.0));
    points.extend(arc(-(l - r), w - r, r, 90.0, 180.0));
    points.extend(arc(-(l - r), -(w - r), r, 180.0, 270.0));
    points.extend(arc(l - r, -(w - r), r, 270.0, 360.0));
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}

// The goal line stops where it meets the rounded corner boards.
fn goal_line_half_width(x: f64) -> f64 {
    let (l, w, r) = (rink::HALF_LENGTH, rink::HALF_WIDTH, rink::CORNER_RADIUS);
    let dx = x - (l - r);
    if dx <= 0.0 {
        return w;
    }
    (w - r) + (r * r - dx * dx).max(0.0).sqrt()
}

fn crease(goal_x: f64, facing: f64) -> Vec<(f64, f64)> {
    let start = if facing > 0.0 { -90.0 } else { 90.0 };
    arc(goal_x, 0.0, rink::CREASE_RADIUS, start, start + 180.0)
}

fn circle_points(cx: f64, cy: f64, radius: f64) -> Vec<(f64, f64)> {
    arc(cx, cy, radius, 0.0, 360.0)
}

fn arc(cx: f64, cy: f64, radius: f64, from_deg: f64, to_deg: f64) -> Vec<(f64, f64)> {
    const STEPS: usize = 36;
    (0..=STEPS)
        .map(|i| {
            let deg = from_deg + (to_deg - from_deg) * (i as f64) / (STEPS as f64);
            let rad = deg.to_radians();
            (cx + radius * rad.cos(), cy + radius * rad.sin())
        })
        .collect()
}

fn star_offsets(outer: f64) -> Vec<(i32, i32)> {
    let inner = outer * 0.45;
    (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = (-90.0 + 36.0 * i as f64).to_radians();
            ((radius * angle.cos()).round() as i32, (radius * angle.sin()).round() as i32)
        })
        .collect()
}
