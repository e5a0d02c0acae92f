use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::map::{Step, Terrain, TraversalMark};

pub const CENTER_X: i32 = 36;
pub const CENTER_Y: i32 = 26;
pub const PLACEMENT_RADIUS: f64 = 15.0;

/// How the running placement angle is fed to `cos`/`sin`.
///
/// The angle is drawn in whole degrees. `Radians` hands that number straight to
/// the trigonometric functions, which is what the original program did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle.to_radians(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementSettings {
    pub center: Point,
    pub radius: f64,
    pub angle_unit: AngleUnit,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            center: Point::new(CENTER_X, CENTER_Y),
            radius: PLACEMENT_RADIUS,
            angle_unit: AngleUnit::Radians,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PlacementError {
    #[error("marker `{symbol}` would start at ({}, {}), outside the {cols}x{rows} grid", .point.x, .point.y)]
    OutOfBounds {
        symbol: char,
        point: Point,
        cols: i32,
        rows: i32,
    },
}

#[derive(Clone, Debug)]
pub struct Marker {
    pub symbol: char,
    pub initial: Point,
    pub current: Point,
    pub finish: Option<Point>,
    pub path: Vec<Step>,
}

impl Marker {
    pub fn new(symbol: char, initial: Point) -> Self {
        Self {
            symbol,
            initial,
            current: initial,
            finish: None,
            path: Vec::new(),
        }
    }
}

/// Uppercases the label; each resulting character becomes one marker.
pub fn normalize_label(label: &str) -> Vec<char> {
    label.to_uppercase().chars().collect()
}

pub fn ring_point(settings: &PlacementSettings, angle: f64) -> Point {
    let theta = settings.angle_unit.to_radians(angle);
    Point::new(
        settings.center.x + (settings.radius * theta.cos()).round() as i32,
        settings.center.y + (settings.radius * theta.sin()).round() as i32,
    )
}

/// Places one marker per label character on a ring around `settings.center`,
/// marking each start cell on `terrain`.
///
/// The angle starts at a random whole number in `[0, 360)` and grows by another
/// such draw after every marker. Every position is validated before any cell is
/// touched, so an error leaves `terrain` unchanged.
pub fn place_markers(
    terrain: &mut Terrain,
    label: &str,
    settings: &PlacementSettings,
    rng: &mut RandomNumberGenerator,
) -> Result<Vec<Marker>, PlacementError> {
    let mut angle = rng.range(0, 360) as f64;
    let mut markers = Vec::new();

    for symbol in normalize_label(label) {
        let initial = ring_point(settings, angle);
        if terrain.cell(initial).is_none() {
            return Err(PlacementError::OutOfBounds {
                symbol,
                point: initial,
                cols: terrain.cols,
                rows: terrain.rows,
            });
        }
        debug!(%symbol, x = initial.x, y = initial.y, angle, "marker placed");
        markers.push(Marker::new(symbol, initial));
        angle += rng.range(0, 360) as f64;
    }

    for marker in &markers {
        terrain.touch(marker.initial, TraversalMark::Start);
    }
    Ok(markers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_order_is_marker_order() {
        let mut terrain = Terrain::default();
        let mut rng = RandomNumberGenerator::seeded(7);
        let markers =
            place_markers(&mut terrain, "ab", &PlacementSettings::default(), &mut rng).unwrap();
        let symbols: Vec<char> = markers.iter().map(|m| m.symbol).collect();
        assert_eq!(symbols, vec!['A', 'B']);
    }

    #[test]
    fn same_seed_same_positions() {
        let settings = PlacementSettings::default();
        let mut first = Terrain::default();
        let mut second = Terrain::default();
        let a = place_markers(&mut first, "helo", &settings, &mut RandomNumberGenerator::seeded(42))
            .unwrap();
        let b = place_markers(&mut second, "helo", &settings, &mut RandomNumberGenerator::seeded(42))
            .unwrap();
        let pa: Vec<Point> = a.iter().map(|m| m.initial).collect();
        let pb: Vec<Point> = b.iter().map(|m| m.initial).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn starts_are_marked_and_unfinished() {
        let mut terrain = Terrain::default();
        let mut rng = RandomNumberGenerator::seeded(3);
        let markers =
            place_markers(&mut terrain, "xyz", &PlacementSettings::default(), &mut rng).unwrap();
        for marker in &markers {
            assert_eq!(marker.current, marker.initial);
            assert!(marker.finish.is_none());
            assert!(marker.path.is_empty());
            let cell = terrain.cell(marker.initial).copied().unwrap();
            assert!(cell.visited);
            assert_eq!(cell.mark, TraversalMark::Start);
        }
    }

    #[test]
    fn default_ring_stays_inside_the_grid() {
        let settings = PlacementSettings::default();
        for angle in 0..720 {
            let point = ring_point(&settings, angle as f64);
            assert!((21..=51).contains(&point.x), "x out of ring at {angle}");
            assert!((11..=41).contains(&point.y), "y out of ring at {angle}");
        }
    }

    #[test]
    fn ring_point_rounds_to_nearest() {
        let settings = PlacementSettings {
            angle_unit: AngleUnit::Degrees,
            ..PlacementSettings::default()
        };
        assert_eq!(ring_point(&settings, 0.0), Point::new(51, 26));
        assert_eq!(ring_point(&settings, 90.0), Point::new(36, 41));
        assert_eq!(ring_point(&settings, 45.0), Point::new(47, 37));
    }

    #[test]
    fn out_of_bounds_start_is_reported_without_side_effects() {
        let mut terrain = Terrain::new(5, 5);
        let settings = PlacementSettings {
            center: Point::new(2, 2),
            radius: 15.0,
            angle_unit: AngleUnit::Degrees,
        };
        let mut rng = RandomNumberGenerator::seeded(1);
        let err = place_markers(&mut terrain, "q", &settings, &mut rng).unwrap_err();
        assert!(matches!(err, PlacementError::OutOfBounds { symbol: 'Q', .. }));
        assert!(terrain.cells.iter().all(|cell| !cell.visited));
    }

    #[test]
    fn empty_label_places_nothing() {
        let mut terrain = Terrain::default();
        let mut rng = RandomNumberGenerator::seeded(9);
        let markers =
            place_markers(&mut terrain, "", &PlacementSettings::default(), &mut rng).unwrap();
        assert!(markers.is_empty());
    }
}
