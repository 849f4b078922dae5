use log::{debug, info, warn};
use serde_derive::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

use crate::aggregator::{summarize_tracks, Summary, TrackAggregator};
use crate::config::AnalysisConfig;
use crate::detection::Identity;
use crate::detector::{DetectionAdapter, Detector};
use crate::error::Error;
use crate::frame::{FrameGeometry, SampleTick, VideoSource};
use crate::mapper::{CoordinateMapper, PitchPoint};
use crate::sampler::{FrameSampler, StopReason};
use crate::track::Track;

/// Outcome of one analysis run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunResult {
    pub source_id: String,
    pub fps: f64,
    pub sampling_interval: f64,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub observations: usize,
    /// Ordered by identity, unassigned bucket last.
    pub tracks: Vec<Track>,
    pub truncated: bool,
    pub stop_reason: StopReason,
}

impl RunResult {
    /// No entity was observed during the run.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations == 0
    }

    pub fn players(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.identity.is_tracked())
    }

    pub fn unassigned(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| !t.identity.is_tracked())
    }

    pub fn track(&self, identity: Identity) -> Option<&Track> {
        self.tracks.iter().find(|t| t.identity == identity)
    }

    /// Every point of every track as `(timestamp, identity, point)`.
    pub fn points(&self) -> impl Iterator<Item = (f64, Identity, PitchPoint)> + '_ {
        self.tracks
            .iter()
            .flat_map(|t| t.iter().map(move |p| (p.timestamp, t.identity, p.point)))
    }

    pub fn summarize(&self, movement_threshold: f32) -> Summary {
        summarize_tracks(&self.tracks, movement_threshold)
    }
}

/// Sequential sampling → detection → mapping → aggregation pipeline.
///
/// The detector is borrowed mutably for the whole run; runs on one analyzer
/// never overlap.
pub struct Analyzer<D> {
    adapter: DetectionAdapter<D>,
    mapper: CoordinateMapper,
    config: AnalysisConfig,
}

impl<D> Analyzer<D> {
    pub fn new(detector: D, config: AnalysisConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            adapter: DetectionAdapter::new(detector, config.detector.clone()),
            mapper: CoordinateMapper::new(config.pitch),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn into_detector(self) -> D {
        self.adapter.into_inner()
    }

    pub fn run<S>(&mut self, source: S) -> Result<RunResult, Error>
    where
        S: VideoSource,
        D: Detector<S::Frame>,
    {
        let sampler = FrameSampler::new(
            source,
            self.config.sampling_interval_seconds,
            self.config.max_duration_seconds,
            self.config.fallback_fps,
        )?;

        self.drive(sampler)
    }

    /// Like `run`, stopping between ticks once `cancel` is raised. A cancelled
    /// run still yields the tracks accumulated so far, marked truncated.
    pub fn run_with_cancel<S>(&mut self, source: S, cancel: &AtomicBool) -> Result<RunResult, Error>
    where
        S: VideoSource,
        D: Detector<S::Frame>,
    {
        let sampler = FrameSampler::new(
            source,
            self.config.sampling_interval_seconds,
            self.config.max_duration_seconds,
            self.config.fallback_fps,
        )?
        .with_cancel(cancel);

        self.drive(sampler)
    }

    fn drive<S>(&mut self, mut sampler: FrameSampler<'_, S>) -> Result<RunResult, Error>
    where
        S: VideoSource,
        D: Detector<S::Frame>,
    {
        let source_id = sampler.source_id().to_string();
        let fps = sampler.fps();

        info!(
            "{}: analysis started ({} fps, {} frames, every {}s)",
            source_id,
            fps,
            sampler
                .frame_count()
                .map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            self.config.sampling_interval_seconds
        );

        self.adapter.reset::<S::Frame>();

        let mut aggregator = TrackAggregator::new(self.config.movement_event_threshold);
        let mut ticks = 0;
        let mut skipped = 0;

        for item in sampler.by_ref() {
            let tick = match item {
                Ok(tick) => tick,
                Err(err) => {
                    warn!("{}: {}, keeping partial result", source_id, err);
                    break;
                }
            };

            ticks += 1;

            match self.process(&tick, &mut aggregator) {
                Ok(count) => {
                    debug!(
                        "tick {} @ {:.3}s: {} observations",
                        tick.index, tick.timestamp, count
                    );
                }
                Err(err) if err.is_tick_scoped() => {
                    warn!("{}: skipping frame {}: {}", source_id, tick.index, err);
                    skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let stop_reason = sampler.stop_reason().unwrap_or(StopReason::Exhausted);
        drop(sampler);

        let result = RunResult {
            source_id,
            fps,
            sampling_interval: self.config.sampling_interval_seconds,
            ticks,
            skipped_ticks: skipped,
            observations: aggregator.observations(),
            tracks: aggregator.into_tracks(),
            truncated: stop_reason.is_truncation(),
            stop_reason,
        };

        info!(
            "{}: analysis finished ({:?}): {} ticks, {} skipped, {} observations, {} tracks",
            result.source_id,
            result.stop_reason,
            result.ticks,
            result.skipped_ticks,
            result.observations,
            result.tracks.len()
        );

        if result.is_empty() {
            info!("{}: no entities observed", result.source_id);
        }

        Ok(result)
    }

    fn process<F>(&mut self, tick: &SampleTick<F>, aggregator: &mut TrackAggregator) -> Result<usize, Error>
    where
        F: FrameGeometry,
        D: Detector<F>,
    {
        let (width, height) = tick.frame.dims();
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidFrameGeometry { width, height });
        }

        let observations = self.adapter.observe(&tick.frame, tick.index)?;

        let mapped = observations
            .iter()
            .map(|obs| -> Result<_, Error> {
                Ok((self.mapper.map(obs, (width, height))?, obs.identity))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        for (point, identity) in &mapped {
            aggregator.ingest(tick.timestamp, *point, *identity)?;
        }

        Ok(mapped.len())
    }
}
