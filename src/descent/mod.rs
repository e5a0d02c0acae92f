use std::cmp::Ordering;

use bracket_geometry::prelude::Point;
use serde::Serialize;
use tracing::debug;

use crate::map::{Cell, Step, Terrain, TraversalMark};
use crate::markers::Marker;

pub const MAX_STEPS: usize = 30;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No neighbour is lower than the current cell.
    Basin,
    /// The lowest neighbour was already visited by some marker.
    Blocked,
    StepLimit,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Basin => "basin",
            StopReason::Blocked => "blocked",
            StopReason::StepLimit => "step_limit",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Choice {
    Move(Step, Point),
    Stop(StopReason),
}

/// Picks the lowest neighbour of `from` that is strictly below it.
///
/// Neighbours are checked up, down, left, right and only a strictly lower one
/// replaces the current pick, so the first direction to reach the minimum wins.
/// A visited winner is not replaced by the runner-up.
fn choose_step(terrain: &Terrain, from: Point) -> Choice {
    let Some(here) = terrain.cell(from) else {
        return Choice::Stop(StopReason::Basin);
    };

    let mut best: Option<(Step, Point, &Cell)> = None;
    for (step, dest) in terrain.neighbours(from) {
        let Some(cell) = terrain.cell(dest) else {
            continue;
        };
        if cell.cmp_height(here) != Ordering::Less {
            continue;
        }
        if best.is_none_or(|(_, _, lowest)| cell.cmp_height(lowest) == Ordering::Less) {
            best = Some((step, dest, cell));
        }
    }

    match best {
        None => Choice::Stop(StopReason::Basin),
        Some((_, _, cell)) if cell.visited => Choice::Stop(StopReason::Blocked),
        Some((step, dest, _)) => Choice::Move(step, dest),
    }
}

/// Walks `marker` downhill until it settles, then marks its last cell `End`.
///
/// The walk never takes more than `max_steps` steps.
pub fn descend(terrain: &mut Terrain, marker: &mut Marker, max_steps: usize) -> StopReason {
    let reason = loop {
        if marker.path.len() >= max_steps {
            break StopReason::StepLimit;
        }
        match choose_step(terrain, marker.current) {
            Choice::Move(step, dest) => {
                marker.current = dest;
                marker.path.push(step);
                terrain.touch(dest, step.into());
            }
            Choice::Stop(reason) => break reason,
        }
    };

    marker.finish = Some(marker.current);
    terrain.touch(marker.current, TraversalMark::End);
    debug!(
        symbol = %marker.symbol,
        steps = marker.path.len(),
        reason = reason.as_str(),
        "marker settled"
    );
    reason
}

/// Runs every marker to completion in order; earlier paths block later ones.
pub fn descend_all(terrain: &mut Terrain, markers: &mut [Marker], max_steps: usize) -> Vec<StopReason> {
    markers
        .iter_mut()
        .map(|marker| descend(terrain, marker, max_steps))
        .collect()
}
