use anyhow::{Context, Result, bail};
use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::descent::MAX_STEPS;
use crate::markers::{AngleUnit, CENTER_X, CENTER_Y, PLACEMENT_RADIUS, PlacementSettings};
use crate::render::{COLOR_HIGH, COLOR_LOW, ColorRamp};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub label: String,
    pub terrain: PathBuf,
    pub seed: Option<u64>,
    pub max_steps: usize,
    pub radius: f64,
    pub center: Center,
    pub angle_unit: AngleUnit,
    pub color_low: f64,
    pub color_high: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            label: "helo".to_string(),
            terrain: PathBuf::from("terrain.csv"),
            seed: None,
            max_steps: MAX_STEPS,
            radius: PLACEMENT_RADIUS,
            center: Center {
                x: CENTER_X,
                y: CENTER_Y,
            },
            angle_unit: AngleUnit::Radians,
            color_low: COLOR_LOW,
            color_high: COLOR_HIGH,
        }
    }
}

impl Settings {
    pub fn placement(&self) -> PlacementSettings {
        PlacementSettings {
            center: Point::new(self.center.x, self.center.y),
            radius: self.radius,
            angle_unit: self.angle_unit,
        }
    }

    pub fn ramp(&self) -> ColorRamp {
        ColorRamp {
            low: self.color_low,
            high: self.color_high,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.color_high > self.color_low) {
            bail!(
                "color_high ({}) must be greater than color_low ({})",
                self.color_high,
                self.color_low
            );
        }
        if self.max_steps > MAX_STEPS {
            bail!(
                "max_steps ({}) may not exceed {MAX_STEPS}",
                self.max_steps
            );
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            bail!("radius must be a non-negative number, got {}", self.radius);
        }
        Ok(())
    }
}

pub fn parse_settings(text: &str) -> Result<Settings> {
    let settings: Settings = serde_json::from_str(text).context("invalid settings json")?;
    settings.validate()?;
    Ok(settings)
}

/// Reads settings from `path`, or returns the defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read settings file {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("in settings file {}", path.display()))
}
