use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detection::Identity;
use crate::error::Error;
use crate::mapper::PitchPoint;
use crate::math;
use crate::track::Track;

/// Per-track statistics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub identity: Identity,
    pub count: usize,
    pub mean_x: f32,
    pub std_x: f32,
    pub mean_y: f32,
    pub std_y: f32,
    pub dwell_seconds: f64,
    /// One flag per consecutive point pair, set when the step is longer
    /// than the movement threshold. Empty for the unassigned bucket.
    pub movement_events: Vec<bool>,
    pub high_intensity_events: usize,
    pub distance: f32,
    /// Fastest single step, in pitch units per second.
    pub peak_speed: f32,
}

impl TrackSummary {
    fn compute(track: &Track, movement_threshold: f32) -> Self {
        let xs: Vec<f32> = track.iter().map(|p| p.point.x).collect();
        let ys: Vec<f32> = track.iter().map(|p| p.point.y).collect();

        let mut summary = Self {
            identity: track.identity,
            count: track.len(),
            mean_x: math::mean(&xs),
            std_x: math::std_dev(&xs),
            mean_y: math::mean(&ys),
            std_y: math::std_dev(&ys),
            dwell_seconds: track.dwell(),
            movement_events: Vec::new(),
            high_intensity_events: 0,
            distance: 0.0,
            peak_speed: 0.0,
        };

        // consecutive unassigned points belong to different entities
        if !track.identity.is_tracked() {
            return summary;
        }

        for (a, b, dist) in track.steps() {
            summary.distance += dist;

            let event = dist > movement_threshold;
            summary.movement_events.push(event);
            if event {
                summary.high_intensity_events += 1;
            }

            let dt = (b.timestamp - a.timestamp) as f32;
            if dt > 0.0 {
                summary.peak_speed = summary.peak_speed.max(dist / dt);
            }
        }

        summary
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Tracked identities in ascending order.
    pub players: Vec<TrackSummary>,
    pub unassigned: Option<TrackSummary>,
}

impl Summary {
    /// Player rows followed by the unassigned bucket.
    pub fn rows(&self) -> impl Iterator<Item = &TrackSummary> {
        self.players.iter().chain(self.unassigned.iter())
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Accumulates pitch points into one track per identity.
#[derive(Debug, Clone)]
pub struct TrackAggregator {
    movement_threshold: f32,
    tracks: BTreeMap<Identity, Track>,
    observations: usize,
}

impl TrackAggregator {
    pub fn new(movement_threshold: f32) -> Self {
        Self {
            movement_threshold,
            tracks: BTreeMap::new(),
            observations: 0,
        }
    }

    pub fn ingest(&mut self, timestamp: f64, point: PitchPoint, identity: Identity) -> Result<(), Error> {
        self.tracks
            .entry(identity)
            .or_insert_with(|| Track::new(identity))
            .push(timestamp, point)?;

        self.observations += 1;

        Ok(())
    }

    #[inline]
    pub fn observations(&self) -> usize {
        self.observations
    }

    #[inline]
    pub fn track(&self, identity: Identity) -> Option<&Track> {
        self.tracks.get(&identity)
    }

    /// Tracks ordered by identity, unassigned bucket last.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn summarize(&self) -> Summary {
        summarize_tracks(self.tracks.values(), self.movement_threshold)
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks.into_values().collect()
    }
}

/// Summarizes tracks in identity order, keeping the unassigned bucket apart.
pub fn summarize_tracks<'a, I>(tracks: I, movement_threshold: f32) -> Summary
where
    I: IntoIterator<Item = &'a Track>,
{
    let mut summary = Summary::default();

    for track in tracks {
        let row = TrackSummary::compute(track, movement_threshold);

        if track.identity.is_tracked() {
            summary.players.push(row);
        } else {
            summary.unassigned = Some(row);
        }
    }

    summary.players.sort_by_key(|s| s.identity);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> PitchPoint {
        PitchPoint::new(x, y)
    }

    #[test]
    fn single_point_track_has_zero_spread() {
        let mut agg = TrackAggregator::new(1.0);
        agg.ingest(0.0, pt(10.0, 20.0), Identity::Tracked(1)).unwrap();

        let s = agg.summarize();
        let row = &s.players[0];

        assert_eq!(row.count, 1);
        assert_eq!((row.mean_x, row.mean_y), (10.0, 20.0));
        assert_eq!((row.std_x, row.std_y), (0.0, 0.0));
        assert!(row.movement_events.is_empty());
        assert_eq!(row.high_intensity_events, 0);
        assert_eq!(row.dwell_seconds, 0.0);
    }

    #[test]
    fn orders_by_identity_with_unassigned_last() {
        let mut agg = TrackAggregator::new(1.0);
        agg.ingest(0.0, pt(1.0, 1.0), Identity::Tracked(3)).unwrap();
        agg.ingest(0.0, pt(1.0, 1.0), Identity::Unassigned).unwrap();
        agg.ingest(0.0, pt(1.0, 1.0), Identity::Tracked(1)).unwrap();

        let s = agg.summarize();
        let order: Vec<_> = s.rows().map(|r| r.identity).collect();

        assert_eq!(
            order,
            vec![Identity::Tracked(1), Identity::Tracked(3), Identity::Unassigned]
        );
        assert_eq!(s.player_count(), 2);
    }

    #[test]
    fn counts_high_intensity_steps() {
        let mut agg = TrackAggregator::new(5.0);
        let id = Identity::Tracked(9);
        agg.ingest(0.0, pt(0.0, 0.0), id).unwrap();
        agg.ingest(1.0, pt(3.0, 4.0), id).unwrap(); // 5.0, not above threshold
        agg.ingest(2.0, pt(3.0, 10.0), id).unwrap(); // 6.0
        agg.ingest(2.5, pt(3.0, 18.0), id).unwrap(); // 8.0 in half a second

        let row = &agg.summarize().players[0];

        assert_eq!(row.movement_events, vec![false, true, true]);
        assert_eq!(row.high_intensity_events, 2);
        assert_eq!(row.distance, 19.0);
        assert_eq!(row.peak_speed, 16.0);
        assert_eq!(row.dwell_seconds, 2.5);
    }

    #[test]
    fn unassigned_bucket_has_no_movement_events() {
        let mut agg = TrackAggregator::new(1.0);
        agg.ingest(0.0, pt(0.0, 0.0), Identity::Unassigned).unwrap();
        agg.ingest(0.0, pt(90.0, 60.0), Identity::Unassigned).unwrap();

        let s = agg.summarize();
        let bucket = s.unassigned.unwrap();

        assert!(s.players.is_empty());
        assert_eq!(bucket.count, 2);
        assert!(bucket.movement_events.is_empty());
        assert_eq!(bucket.high_intensity_events, 0);
        assert_eq!(bucket.distance, 0.0);
    }

    #[test]
    fn tracked_zero_is_a_player() {
        let mut agg = TrackAggregator::new(1.0);
        agg.ingest(0.0, pt(1.0, 1.0), Identity::Tracked(0)).unwrap();
        agg.ingest(0.0, pt(2.0, 2.0), Identity::Unassigned).unwrap();

        let s = agg.summarize();

        assert_eq!(s.player_count(), 1);
        assert_eq!(s.players[0].identity, Identity::Tracked(0));
        assert_eq!(agg.observations(), 2);
    }

    #[test]
    fn sample_std_matches_per_id_aggregation() {
        let mut agg = TrackAggregator::new(100.0);
        let id = Identity::Tracked(2);
        agg.ingest(0.0, pt(1.0, 0.0), id).unwrap();
        agg.ingest(1.0, pt(3.0, 0.0), id).unwrap();

        let row = &agg.summarize().players[0];

        assert_eq!(row.mean_x, 2.0);
        assert!((row.std_x - 2.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(row.std_y, 0.0);
    }
}
