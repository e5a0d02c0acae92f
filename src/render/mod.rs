use std::io::{self, Write};

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::DistanceAlg;
use bracket_terminal::prelude::{ORANGE, RED, RGB};
use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use serde::Serialize;

use crate::descent::StopReason;
use crate::map::{Cell, Step, Terrain, TraversalMark};
use crate::markers::Marker;

pub const COLOR_LOW: f64 = 35.0;
pub const COLOR_HIGH: f64 = 65.0;

/// Unclamped colour for a height. Components leave `0..=255` outside the ramp range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeightColor {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl HeightColor {
    pub fn to_color(self) -> Color {
        let clamp = |v: i32| v.clamp(0, 255) as u8;
        Color::Rgb {
            r: clamp(self.r),
            g: clamp(self.g),
            b: clamp(self.b),
        }
    }
}

/// Linear blue → green → red ramp between `low` and `high`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorRamp {
    pub low: f64,
    pub high: f64,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            low: COLOR_LOW,
            high: COLOR_HIGH,
        }
    }
}

impl ColorRamp {
    pub fn map_value_to_color(&self, height: f64) -> HeightColor {
        let t = (height - self.low) / (self.high - self.low);
        HeightColor {
            r: (255.0 * t) as i32,
            g: (255.0 * (1.0 - 2.0 * (0.5 - t).abs())) as i32,
            b: (255.0 * (1.0 - t)) as i32,
        }
    }
}

fn named(color: (u8, u8, u8)) -> Color {
    let rgb = RGB::named(color);
    let channel = |v: f32| (v * 255.0).round() as u8;
    Color::Rgb {
        r: channel(rgb.r),
        g: channel(rgb.g),
        b: channel(rgb.b),
    }
}

fn band(index: i32, even: (u8, u8, u8), odd: (u8, u8, u8)) -> Color {
    if index % 2 == 0 { named(even) } else { named(odd) }
}

pub fn glyph(cell: &Cell) -> &'static str {
    if !cell.visited {
        return "  ";
    }
    match cell.mark {
        TraversalMark::Start => " S",
        TraversalMark::End => " E",
        TraversalMark::Moved(Step::Up) => " ^",
        TraversalMark::Moved(Step::Down) => " v",
        TraversalMark::Moved(Step::Left) => " <",
        TraversalMark::Moved(Step::Right) => " >",
        TraversalMark::None => "  ",
    }
}

/// Paints the grid top row first, each row led by its `rows - y` label, then the column ruler.
pub fn draw_map<W: Write>(out: &mut W, terrain: &Terrain, ramp: &ColorRamp) -> io::Result<()> {
    for y in 0..terrain.rows {
        queue!(
            out,
            SetBackgroundColor(band(y, ORANGE, RED)),
            Print(format!("{:>2}", terrain.rows - y)),
            ResetColor
        )?;
        for cell in terrain.row(y) {
            let color = ramp.map_value_to_color(cell.height as f64).to_color();
            queue!(out, SetBackgroundColor(color), Print(glyph(cell)), ResetColor)?;
        }
        queue!(out, Print("\n"))?;
    }

    for x in 0..=terrain.cols {
        queue!(
            out,
            SetBackgroundColor(band(x, RED, ORANGE)),
            Print(format!("{x:>2}")),
            ResetColor
        )?;
    }
    queue!(out, Print("\n"))?;
    out.flush()
}

fn position(terrain: &Terrain, point: Point) -> String {
    format!("{},{}", terrain.rows - point.y, point.x)
}

pub fn path_text(path: &[Step]) -> String {
    path.iter().map(|step| format!("{};", step.as_str())).collect()
}

/// One line per marker: symbol, start, finish and the `;`-joined moves.
pub fn draw_summary<W: Write>(out: &mut W, terrain: &Terrain, markers: &[Marker]) -> io::Result<()> {
    for marker in markers {
        let finish = marker
            .finish
            .map(|point| position(terrain, point))
            .unwrap_or_else(|| "unset".to_string());
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::DarkRed),
            Print(marker.symbol),
            ResetColor,
            Print(format!(
                ": initial: {}; final: {}; path: {}\n",
                position(terrain, marker.initial),
                finish,
                path_text(&marker.path)
            ))
        )?;
    }
    queue!(out, Print("\n"))?;
    out.flush()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GridPos {
    pub row: i32,
    pub col: i32,
}

impl GridPos {
    pub fn on(terrain: &Terrain, point: Point) -> Self {
        Self {
            row: terrain.rows - point.y,
            col: point.x,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MarkerReport {
    pub symbol: char,
    pub initial: GridPos,
    #[serde(rename = "final")]
    pub finish: Option<GridPos>,
    pub path: Vec<Step>,
    pub steps: usize,
    pub reason: Option<StopReason>,
    pub displacement: Option<u32>,
}

impl MarkerReport {
    pub fn new(terrain: &Terrain, marker: &Marker, reason: Option<StopReason>) -> Self {
        Self {
            symbol: marker.symbol,
            initial: GridPos::on(terrain, marker.initial),
            finish: marker.finish.map(|point| GridPos::on(terrain, point)),
            path: marker.path.clone(),
            steps: marker.path.len(),
            reason,
            displacement: marker.finish.map(|point| {
                DistanceAlg::Manhattan.distance2d(marker.initial, point).round() as u32
            }),
        }
    }
}

pub fn write_json<W: Write>(
    out: &mut W,
    terrain: &Terrain,
    markers: &[Marker],
    reasons: &[StopReason],
) -> io::Result<()> {
    let reports: Vec<MarkerReport> = markers
        .iter()
        .enumerate()
        .map(|(idx, marker)| MarkerReport::new(terrain, marker, reasons.get(idx).copied()))
        .collect();
    serde_json::to_writer_pretty(&mut *out, &reports)?;
    writeln!(out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered<F>(draw: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        draw(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn ramp_boundaries() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.map_value_to_color(35.0), HeightColor { r: 0, g: 0, b: 255 });
        assert_eq!(ramp.map_value_to_color(65.0), HeightColor { r: 255, g: 0, b: 0 });
        assert_eq!(ramp.map_value_to_color(50.0).g, 255);
    }

    #[test]
    fn out_of_range_heights_extrapolate_until_printed() {
        let ramp = ColorRamp::default();
        let below = ramp.map_value_to_color(20.0);
        assert!(below.r < 0 && below.b > 255);
        assert_eq!(below.to_color(), Color::Rgb { r: 0, g: 0, b: 255 });
    }

    #[test]
    fn glyphs_follow_marks() {
        let mut cell = Cell::default();
        assert_eq!(glyph(&cell), "  ");
        cell.touch(TraversalMark::Start);
        assert_eq!(glyph(&cell), " S");
        cell.touch(Step::Down.into());
        assert_eq!(glyph(&cell), " v");
        cell.touch(TraversalMark::End);
        assert_eq!(glyph(&cell), " E");
    }

    #[test]
    fn map_uses_truecolor_backgrounds() {
        let mut terrain = Terrain::from_heights(&[vec![35, 65]]);
        terrain.touch(Point::new(1, 0), TraversalMark::End);
        let text = rendered(|buf| draw_map(buf, &terrain, &ColorRamp::default()));

        assert!(text.contains("\u{1b}[48;2;0;0;255m  \u{1b}[0m"));
        assert!(text.contains("\u{1b}[48;2;255;0;0m E\u{1b}[0m"));
        assert!(text.contains("\u{1b}[48;2;255;165;0m 1\u{1b}[0m"));
        assert!(text.contains("\u{1b}[48;2;255;0;0m 0\u{1b}[0m"));
    }

    #[test]
    fn rows_print_top_down_with_inverted_labels() {
        let terrain = Terrain::new(1, 3);
        let text = rendered(|buf| draw_map(buf, &terrain, &ColorRamp::default()));
        let three = text.find(" 3\u{1b}[0m").unwrap();
        let one = text.find(" 1\u{1b}[0m").unwrap();
        assert!(three < one);
    }

    #[test]
    fn summary_lists_markers_in_order() {
        let terrain = Terrain::new(5, 5);
        let mut first = Marker::new('A', Point::new(1, 1));
        first.path = vec![Step::Down, Step::Right];
        first.finish = Some(Point::new(2, 2));
        let second = Marker::new('B', Point::new(4, 0));
        let text = rendered(|buf| draw_summary(buf, &terrain, &[first, second]));

        let a = text.find("A\u{1b}[0m: initial: 4,1; final: 3,2; path: down;right;\n");
        let b = text.find("B\u{1b}[0m: initial: 5,4; final: unset; path: \n");
        assert!(a.is_some() && b.is_some());
        assert!(a < b);
    }

    #[test]
    fn summary_symbol_is_bold_palette_red() {
        let terrain = Terrain::new(3, 3);
        let marker = Marker::new('Q', Point::new(1, 1));
        let text = rendered(|buf| draw_summary(buf, &terrain, &[marker]));
        assert!(text.starts_with("\u{1b}[1m\u{1b}[38;5;1mQ\u{1b}[0m: "));
    }

    #[test]
    fn json_report_uses_row_labels() {
        let terrain = Terrain::new(5, 5);
        let mut marker = Marker::new('H', Point::new(0, 4));
        marker.path = vec![Step::Up];
        marker.finish = Some(Point::new(0, 3));
        let text = rendered(|buf| write_json(buf, &terrain, &[marker], &[StopReason::Basin]));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let entry = &value[0];
        assert_eq!(entry["symbol"], "H");
        assert_eq!(entry["initial"]["row"], 1);
        assert_eq!(entry["final"]["row"], 2);
        assert_eq!(entry["path"][0], "up");
        assert_eq!(entry["reason"], "basin");
        assert_eq!(entry["displacement"], 1);
    }
}
