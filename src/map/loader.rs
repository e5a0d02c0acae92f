use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::Algorithm2D;
use thiserror::Error;
use tracing::debug;

use super::Terrain;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error opening file: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}, column {column}: `{token}` is not an integer height")]
    Parse {
        line: usize,
        column: usize,
        token: String,
    },
    #[error("terrain has more than {max} rows (found {found})")]
    TooManyRows { found: usize, max: usize },
    #[error("line {line} has {found} columns, at most {max} fit the grid")]
    TooManyColumns {
        line: usize,
        found: usize,
        max: usize,
    },
}

/// Summary of a successful load.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub short_rows: usize,
}

/// Reads a `;`-separated height file into `terrain`.
///
/// The first non-empty line becomes the bottom grid row (`rows - 1`), the next one
/// the row above it, and so on. Heights are only written once the whole file has
/// parsed, so a failed load leaves `terrain` untouched. Visit state is never modified.
pub fn load_terrain<P: AsRef<Path>>(terrain: &mut Terrain, path: P) -> Result<LoadReport, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io(err),
    })?;
    let report = read_terrain(terrain, BufReader::new(file))?;
    debug!(
        path = %path.display(),
        rows = report.rows_read,
        short_rows = report.short_rows,
        "terrain loaded"
    );
    Ok(report)
}

pub fn read_terrain<R: BufRead>(terrain: &mut Terrain, reader: R) -> Result<LoadReport, LoadError> {
    let max_rows = terrain.rows.max(0) as usize;
    let max_cols = terrain.cols.max(0) as usize;
    let mut heights = vec![0; terrain.cells.len()];
    let mut report = LoadReport {
        rows_read: 0,
        short_rows: 0,
    };

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_no = line_idx + 1;
        let row = parse_row(trimmed, line_no)?;

        if report.rows_read >= max_rows {
            return Err(LoadError::TooManyRows {
                found: report.rows_read + 1,
                max: max_rows,
            });
        }
        if row.len() > max_cols {
            return Err(LoadError::TooManyColumns {
                line: line_no,
                found: row.len(),
                max: max_cols,
            });
        }
        if row.len() < max_cols {
            report.short_rows += 1;
        }

        let y = terrain.rows - 1 - report.rows_read as i32;
        for (x, height) in row.into_iter().enumerate() {
            heights[terrain.point2d_to_index(Point::new(x as i32, y))] = height;
        }
        report.rows_read += 1;
    }

    terrain.overwrite_heights(&heights);
    Ok(report)
}

pub fn parse_row(line: &str, line_no: usize) -> Result<Vec<i32>, LoadError> {
    line.split(';')
        .enumerate()
        .map(|(col, token)| {
            token.trim().parse::<i32>().map_err(|_| LoadError::Parse {
                line: line_no,
                column: col + 1,
                token: token.to_string(),
            })
        })
        .collect()
}
