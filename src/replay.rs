//! Detection capability backed by a pre-computed detections log.
//!
//! The log holds one line per analysed frame: `<frame_index>: <json>`, where
//! `<json>` is an array of boxes `{"x","y","w","h","p","c"}` with an optional
//! `"id"` assigned by the tracker that produced the log.

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::config::{DetectorConfig, ModelConfig};
use crate::detection::{RawBox, RawDetections};
use crate::detector::Detector;
use crate::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LoggedBox {
    #[serde(flatten)]
    bbox: RawBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<u32>,
}

pub struct ReplayDetector {
    frames: HashMap<u64, RawDetections>,
}

impl ReplayDetector {
    /// Loads the log named by `model.path`. A missing or unreadable log
    /// means the engine is unavailable.
    pub fn open(model: &ModelConfig) -> Result<Self, Error> {
        let file = std::fs::File::open(&model.path).map_err(|err| {
            Error::EngineUnavailable(format!("{}: {}", model.path.display(), err))
        })?;

        let detector = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            "loaded {} logged frames from {}",
            detector.frames.len(),
            model.path.display()
        );

        Ok(detector)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut frames = HashMap::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (index, boxes) = match line.split_once(':') {
                Some(parts) => parts,
                None => {
                    warn!("line {}: wrong format, expected `:`", lineno + 1);
                    continue;
                }
            };

            let index = match index.trim().parse::<u64>() {
                Ok(index) => index,
                Err(_) => {
                    warn!("line {}: wrong format, parse frame index failed", lineno + 1);
                    continue;
                }
            };

            let boxes: Vec<LoggedBox> = match serde_json::from_str(boxes.trim()) {
                Ok(boxes) => boxes,
                Err(err) => {
                    warn!("line {}: wrong format, parse json failed: {}", lineno + 1, err);
                    continue;
                }
            };

            frames.insert(index, into_detections(boxes));
        }

        Ok(Self { frames })
    }

    /// Appends one frame to a detections log in the format `from_reader` reads.
    pub fn write_frame<W: Write>(out: &mut W, index: u64, dets: &RawDetections) -> Result<(), Error> {
        let boxes: Vec<_> = dets
            .boxes
            .iter()
            .enumerate()
            .map(|(i, bbox)| LoggedBox {
                bbox: bbox.clone(),
                id: dets.ids.as_ref().and_then(|ids| ids.get(i).copied()),
            })
            .collect();

        writeln!(out, "{}: {}", index, serde_json::to_string(&boxes)?)?;

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// A frame counts as tracked only when every box carries an id.
fn into_detections(boxes: Vec<LoggedBox>) -> RawDetections {
    let tracked = !boxes.is_empty() && boxes.iter().all(|b| b.id.is_some());

    if tracked {
        let ids = boxes.iter().filter_map(|b| b.id).collect();
        RawDetections::tracked(boxes.into_iter().map(|b| b.bbox).collect(), ids)
    } else {
        RawDetections::untracked(boxes.into_iter().map(|b| b.bbox).collect())
    }
}

impl<F> Detector<F> for ReplayDetector {
    fn infer(
        &mut self,
        _frame: &F,
        index: u64,
        _config: &DetectorConfig,
    ) -> Result<RawDetections, Error> {
        Ok(self.frames.get(&index).cloned().unwrap_or_default())
    }
}
