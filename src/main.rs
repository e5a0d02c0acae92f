mod config;
mod descent;
mod map;
mod markers;
mod render;

use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use bracket_random::prelude::RandomNumberGenerator;
use chrono::Utc;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Settings, load_settings};
use map::{Terrain, loader::LoadError};
use markers::AngleUnit;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Ansi,
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about = "Trace letters running downhill across a terrain grid")]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// `;`-separated height file, first line is the northern edge
    #[arg(long)]
    terrain: Option<PathBuf>,

    /// One marker per character
    #[arg(long)]
    label: Option<String>,

    /// Placement seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,

    /// Step cap per marker, at most 30
    #[arg(long)]
    max_steps: Option<usize>,

    #[arg(long, value_enum)]
    angle_unit: Option<AngleUnit>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Ansi)]
    format: OutputFormat,

    /// Exit without waiting for enter
    #[arg(long, action = ArgAction::SetTrue)]
    no_wait: bool,

    /// -v for info, -vv for debug
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(terrain) = &self.terrain {
            settings.terrain = terrain.clone();
        }
        if let Some(label) = &self.label {
            settings.label = label.clone();
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(max_steps) = self.max_steps {
            settings.max_steps = max_steps;
        }
        if let Some(angle_unit) = self.angle_unit {
            settings.angle_unit = angle_unit;
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_or_flat(terrain: &mut Terrain, settings: &Settings) -> Result<()> {
    match map::loader::load_terrain(terrain, &settings.terrain) {
        Ok(report) => {
            info!(
                path = %settings.terrain.display(),
                rows = report.rows_read,
                "terrain loaded"
            );
            if report.rows_read < terrain.rows as usize || report.short_rows > 0 {
                warn!(
                    rows = report.rows_read,
                    short_rows = report.short_rows,
                    "terrain file is smaller than the grid, missing cells stay at 0"
                );
            }
            Ok(())
        }
        Err(err @ LoadError::NotFound { .. }) => {
            eprintln!("{err}");
            warn!("continuing on a flat grid");
            Ok(())
        }
        Err(err) => Err(err)
            .with_context(|| format!("failed to load terrain {}", settings.terrain.display())),
    }
}

fn wait_for_enter() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "Press enter to exit...")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;
    if let Some(path) = &args.config {
        info!(path = %path.display(), "settings loaded");
    }

    let mut terrain = Terrain::default();
    load_or_flat(&mut terrain, &settings)?;

    let seed = settings
        .seed
        .unwrap_or_else(|| Utc::now().timestamp().max(0) as u64);
    info!(seed, "placement seed");
    let mut rng = RandomNumberGenerator::seeded(seed);

    let mut stdout = io::stdout().lock();
    if args.format == OutputFormat::Ansi {
        writeln!(stdout, "Calculating letter placements...\n")?;
    }

    let mut letters = markers::place_markers(
        &mut terrain,
        &settings.label,
        &settings.placement(),
        &mut rng,
    )
    .context("marker placement failed")?;
    let reasons = descent::descend_all(&mut terrain, &mut letters, settings.max_steps);
    for (marker, reason) in letters.iter().zip(&reasons) {
        info!(
            symbol = %marker.symbol,
            steps = marker.path.len(),
            reason = reason.as_str(),
            "descent finished"
        );
    }

    match args.format {
        OutputFormat::Ansi => {
            render::draw_summary(&mut stdout, &terrain, &letters)?;
            render::draw_map(&mut stdout, &terrain, &settings.ramp())?;
            writeln!(stdout, "\n")?;
            drop(stdout);
            if !args.no_wait && io::stdin().is_terminal() {
                wait_for_enter()?;
            }
        }
        OutputFormat::Json => {
            render::write_json(&mut stdout, &terrain, &letters, &reasons)?;
        }
    }

    Ok(())
}
