use log::{debug, error, warn};

use crate::config::DetectorConfig;
use crate::detection::{Identity, Observation, RawBox, RawDetections};
use crate::error::Error;

/// External detection/tracking capability.
///
/// One call per frame. Implementations that keep tracker state must drop it
/// in `reset`, which runs at the start of every analysis run.
pub trait Detector<F> {
    fn infer(&mut self, frame: &F, index: u64, config: &DetectorConfig)
        -> Result<RawDetections, Error>;

    fn reset(&mut self) {}
}

impl<F, D: Detector<F> + ?Sized> Detector<F> for Box<D> {
    #[inline]
    fn infer(
        &mut self,
        frame: &F,
        index: u64,
        config: &DetectorConfig,
    ) -> Result<RawDetections, Error> {
        (**self).infer(frame, index, config)
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Normalizes capability responses into observations.
///
/// The first capability failure is reported as `EngineUnavailable` and
/// latches: subsequent calls fail without invoking the capability again.
pub struct DetectionAdapter<D> {
    detector: D,
    config: DetectorConfig,
    failed: Option<String>,
}

impl<D> DetectionAdapter<D> {
    pub fn new(detector: D, config: DetectorConfig) -> Self {
        Self {
            detector,
            config,
            failed: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn into_inner(self) -> D {
        self.detector
    }

    pub fn observe<F>(&mut self, frame: &F, index: u64) -> Result<Vec<Observation>, Error>
    where
        D: Detector<F>,
    {
        if let Some(reason) = &self.failed {
            return Err(Error::EngineUnavailable(reason.clone()));
        }

        let raw = match self.detector.infer(frame, index, &self.config) {
            Ok(raw) => raw,
            Err(err) => {
                let reason = match err {
                    Error::EngineUnavailable(reason) => reason,
                    other => other.to_string(),
                };

                error!("detection engine failed at frame {}: {}", index, reason);
                self.failed = Some(reason.clone());

                return Err(Error::EngineUnavailable(reason));
            }
        };

        Ok(self.normalize(raw, index))
    }

    pub fn reset<F>(&mut self)
    where
        D: Detector<F>,
    {
        self.failed = None;
        self.detector.reset();
    }

    fn normalize(&self, raw: RawDetections, index: u64) -> Vec<Observation> {
        let RawDetections { boxes, ids } = raw;

        let ids = match ids {
            Some(ids) if ids.len() == boxes.len() => Some(ids),
            Some(ids) => {
                warn!(
                    "frame {}: tracker returned {} ids for {} boxes, treating as untracked",
                    index,
                    ids.len(),
                    boxes.len()
                );
                None
            }
            None => None,
        };

        let identities = (0..boxes.len()).map(|i| Identity::from(ids.as_ref().map(|ids| ids[i])));

        let observations: Vec<_> = boxes
            .iter()
            .zip(identities)
            .filter(|(b, _)| self.accepts(b))
            .map(|(b, identity)| Observation {
                x: b.x,
                y: b.y,
                w: b.w.max(0.0),
                h: b.h.max(0.0),
                confidence: b.confidence.clamp(0.0, 1.0),
                identity,
            })
            .collect();

        debug!(
            "frame {}: {} of {} boxes kept",
            index,
            observations.len(),
            boxes.len()
        );

        observations
    }

    fn accepts(&self, b: &RawBox) -> bool {
        if !(b.x.is_finite() && b.y.is_finite()) {
            warn!("dropping box with non-finite center ({}, {})", b.x, b.y);
            return false;
        }

        if b.confidence.is_nan() {
            return false;
        }

        if !(0.0..=1.0).contains(&b.confidence) {
            warn!("box confidence {} outside [0, 1], clamping", b.confidence);
        }

        b.confidence.clamp(0.0, 1.0) >= self.config.confidence_threshold
            && self.config.accepts_class(&b.class)
    }
}
