//! Whole-match metrics derived from a finished run.
//!
//! Everything here is a pure function of a [`RunResult`]; rendering of charts,
//! heatmaps or documents happens elsewhere.

use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};

use crate::aggregator::{Summary, TrackSummary};
use crate::config::{AnalysisConfig, PitchDims, ReportConfig};
use crate::detection::Identity;
use crate::math;
use crate::pipeline::RunResult;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Points,
    MovementEvents,
}

/// Percentage of points with x beyond `threshold`; 0 for an empty run.
pub fn territorial_share(run: &RunResult, threshold: f32) -> f64 {
    let total = run.points().count();
    let beyond = run.points().filter(|(_, _, p)| p.x > threshold).count();

    math::ratio(beyond, total) * 100.0
}

/// Mean x over the tracked players in `group`, or over every track when
/// `group` is empty. 0 when no point qualifies.
pub fn line_height(run: &RunResult, group: &[u32]) -> f32 {
    let xs: Vec<f32> = run
        .points()
        .filter(|(_, identity, _)| match identity {
            Identity::Tracked(id) => group.is_empty() || group.contains(id),
            Identity::Unassigned => group.is_empty(),
        })
        .map(|(_, _, p)| p.x)
        .collect();

    math::mean(&xs)
}

/// Top `n` player rows, ties broken by ascending identity.
/// The unassigned bucket is never ranked.
pub fn top_tracks(summary: &Summary, n: usize, by: RankBy) -> Vec<TrackSummary> {
    let mut rows = summary.players.clone();

    rows.sort_by(|a, b| {
        let (ka, kb) = match by {
            RankBy::Points => (a.count, b.count),
            RankBy::MovementEvents => (a.high_intensity_events, b.high_intensity_events),
        };

        kb.cmp(&ka).then(a.identity.cmp(&b.identity))
    });

    rows.truncate(n);
    rows
}

/// Point counts over a `cols x rows` grid spanning the pitch.
/// Indexed as `[row, col]`, row 0 at y = 0.
pub fn density_grid(run: &RunResult, pitch: PitchDims, cols: usize, rows: usize) -> Array2<u32> {
    let mut grid = Array2::zeros((rows, cols));

    if cols == 0 || rows == 0 {
        return grid;
    }

    for (_, _, p) in run.points() {
        let col = cell(p.x, pitch.length, cols);
        let row = cell(p.y, pitch.width, rows);
        grid[[row, col]] += 1;
    }

    grid
}

#[inline]
fn cell(v: f32, extent: f32, cells: usize) -> usize {
    let idx = (v / extent * cells as f32).floor();

    if idx.is_nan() || idx < 0.0 {
        0
    } else {
        (idx as usize).min(cells - 1)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub source_id: String,
    pub truncated: bool,
    pub unique_players: usize,
    pub data_nodes: usize,
    pub unassigned_nodes: usize,
    pub territorial_pct: f64,
    pub line_height: f32,
    pub summary: Summary,
    pub top_by_points: Vec<TrackSummary>,
    pub top_by_events: Vec<TrackSummary>,
    pub density: Vec<Vec<u32>>,
}

impl MatchReport {
    pub fn compute(run: &RunResult, config: &AnalysisConfig) -> Self {
        let ReportConfig {
            territorial_threshold,
            top_n,
            grid_cols,
            grid_rows,
            ref line_group,
        } = config.report;

        let summary = run.summarize(config.movement_event_threshold);
        let density = density_grid(run, config.pitch, grid_cols, grid_rows);

        Self {
            source_id: run.source_id.clone(),
            truncated: run.truncated,
            unique_players: summary.player_count(),
            data_nodes: run.points().count(),
            unassigned_nodes: run.unassigned().map_or(0, |t| t.len()),
            territorial_pct: territorial_share(run, territorial_threshold),
            line_height: line_height(run, line_group),
            top_by_points: top_tracks(&summary, top_n, RankBy::Points),
            top_by_events: top_tracks(&summary, top_n, RankBy::MovementEvents),
            density: density.outer_iter().map(|row| row.to_vec()).collect(),
            summary,
        }
    }
}
