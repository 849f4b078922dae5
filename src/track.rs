use serde_derive::{Deserialize, Serialize};

use crate::detection::Identity;
use crate::error::Error;
use crate::mapper::PitchPoint;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub timestamp: f64, // in seconds
    pub point: PitchPoint,
}

/// Positions sharing one identity within a run, in non-decreasing time order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub identity: Identity,
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            points: Vec::new(),
        }
    }

    /// Appends a point. Only the aggregator extends tracks, so a finished
    /// run's tracks stay as recorded.
    pub(crate) fn push(&mut self, timestamp: f64, point: PitchPoint) -> Result<(), Error> {
        if let Some(last) = self.points.last() {
            if timestamp < last.timestamp {
                return Err(Error::OutOfOrder {
                    identity: self.identity,
                    last: last.timestamp,
                    next: timestamp,
                });
            }
        }

        self.points.push(TrackPoint { timestamp, point });

        Ok(())
    }

    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.iter()
    }

    /// Seconds between the first and the last point.
    pub fn dwell(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }

    /// Per-step flags, true where the step is longer than `threshold`.
    pub fn movement_events(&self, threshold: f32) -> impl Iterator<Item = bool> + '_ {
        self.steps().map(move |(_, _, dist)| dist > threshold)
    }

    /// Consecutive point pairs with their step distance.
    pub fn steps(&self) -> impl Iterator<Item = (&TrackPoint, &TrackPoint, f32)> {
        self.points
            .windows(2)
            .map(|w| (&w[0], &w[1], w[0].point.distance(&w[1].point)))
    }
}
