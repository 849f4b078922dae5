use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Error;
use crate::frame::{SampleTick, VideoSource};

// Tolerance for comparing accumulated float timestamps against the schedule.
const SCHEDULE_EPSILON: f64 = 1e-9;

/// Why a sampler stopped producing ticks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Exhausted,
    MaxDuration,
    Cancelled,
    ReadFailure,
}

impl StopReason {
    /// Whether the run ended before the source was fully consumed.
    #[inline]
    pub fn is_truncation(&self) -> bool {
        !matches!(self, StopReason::Exhausted)
    }
}

/// Lazily selects frames of a source at a fixed interval.
///
/// The sampler owns the source for one run and closes it on every exit
/// path: exhaustion, max-duration expiry, cancellation, read failure or drop.
pub struct FrameSampler<'c, S: VideoSource> {
    source: S,
    fps: f64,
    interval: f64,
    max_duration: Option<f64>,
    cancel: Option<&'c AtomicBool>,
    index: u64,
    last_sampled: Option<f64>,
    stop: Option<StopReason>,
}

impl<'c, S: VideoSource> FrameSampler<'c, S> {
    pub fn new(
        source: S,
        interval: f64,
        max_duration: Option<f64>,
        fallback_fps: f64,
    ) -> Result<Self, Error> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sampling interval must be > 0, got {}",
                interval
            )));
        }

        let reported = source.fps();
        let fps = if reported.is_finite() && reported > 0.0 {
            reported
        } else {
            warn!(
                "{}: reported frame rate {} is unusable, assuming {} fps",
                source.id(),
                reported,
                fallback_fps
            );
            fallback_fps
        };

        Ok(Self {
            source,
            fps,
            interval,
            max_duration,
            cancel: None,
            index: 0,
            last_sampled: None,
            stop: None,
        })
    }

    /// Stops the sampler, as if max duration expired, once `flag` is raised.
    pub fn with_cancel(mut self, flag: &'c AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn source_id(&self) -> &str {
        self.source.id()
    }

    #[inline]
    pub fn frame_count(&self) -> Option<u64> {
        self.source.frame_count()
    }

    #[inline]
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    fn halt(&mut self, reason: StopReason) {
        if self.stop.is_none() {
            debug!("{}: sampler stopped ({:?})", self.source.id(), reason);
            self.stop = Some(reason);
            self.source.close();
        }
    }

    /// Stop reason once the next frame lies beyond the max duration.
    ///
    /// Without a frame count one more frame is read and discarded to tell
    /// an exhausted source from a cut-off one.
    fn past_limit(&mut self, index: u64) -> StopReason {
        if let Some(total) = self.source.frame_count() {
            return if index >= total {
                StopReason::Exhausted
            } else {
                StopReason::MaxDuration
            };
        }

        match self.source.read_frame() {
            Ok(None) => StopReason::Exhausted,
            Ok(Some(_)) => StopReason::MaxDuration,
            Err(err) => {
                debug!("{}: read past max duration failed: {}", self.source.id(), err);
                StopReason::MaxDuration
            }
        }
    }

    fn is_due(&self, timestamp: f64) -> bool {
        match self.last_sampled {
            Some(last) => timestamp + SCHEDULE_EPSILON >= last + self.interval,
            None => true,
        }
    }
}

impl<'c, S: VideoSource> Iterator for FrameSampler<'c, S> {
    type Item = Result<SampleTick<S::Frame>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.stop.is_some() {
                return None;
            }

            if self.cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                self.halt(StopReason::Cancelled);
                return None;
            }

            let index = self.index;
            let timestamp = index as f64 / self.fps;

            if let Some(max) = self.max_duration {
                if timestamp > max + SCHEDULE_EPSILON {
                    let reason = self.past_limit(index);
                    self.halt(reason);
                    return None;
                }
            }

            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.halt(StopReason::Exhausted);
                    return None;
                }
                Err(err) => {
                    self.halt(StopReason::ReadFailure);
                    return Some(Err(err));
                }
            };

            self.index += 1;

            if self.is_due(timestamp) {
                self.last_sampled = Some(timestamp);

                return Some(Ok(SampleTick {
                    index,
                    timestamp,
                    frame,
                }));
            }
        }
    }
}

impl<'c, S: VideoSource> Drop for FrameSampler<'c, S> {
    fn drop(&mut self) {
        self.source.close();
    }
}
