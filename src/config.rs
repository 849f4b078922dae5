use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Output rectangle detections are projected into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PitchDims {
    pub length: f32,
    pub width: f32,
}

impl PitchDims {
    pub const UNIT: PitchDims = PitchDims {
        length: 1.0,
        width: 1.0,
    };

    #[inline]
    pub fn new(length: f32, width: f32) -> Self {
        Self { length, width }
    }
}

impl Default for PitchDims {
    fn default() -> Self {
        Self::new(105.0, 68.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence_threshold: f32,
    pub classes: Vec<String>,
}

impl DetectorConfig {
    pub fn new(confidence_threshold: f32, classes: Vec<String>) -> Self {
        Self {
            confidence_threshold,
            classes,
        }
    }

    #[inline]
    pub fn accepts_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new(0.15, vec!["person".to_string()])
    }
}

/// Model-loading parameters handed to a detector constructor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_size: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("yolov8n.pt"),
            input_size: 1280,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Points with x beyond this line count as territorial.
    pub territorial_threshold: f32,
    pub top_n: usize,
    pub grid_cols: usize,
    pub grid_rows: usize,
    /// Tracked ids forming the defensive line; empty means every track.
    pub line_group: Vec<u32>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            territorial_threshold: 70.0,
            top_n: 5,
            grid_cols: 12,
            grid_rows: 8,
            line_group: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sampling_interval_seconds: f64,
    pub max_duration_seconds: Option<f64>,
    /// Used when the source reports a frame rate <= 0.
    pub fallback_fps: f64,
    pub movement_event_threshold: f32,
    pub pitch: PitchDims,
    pub detector: DetectorConfig,
    pub model: ModelConfig,
    pub report: ReportConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_interval_seconds: 1.0,
            max_duration_seconds: None,
            fallback_fps: 30.0,
            movement_event_threshold: 5.0,
            pitch: PitchDims::default(),
            detector: DetectorConfig::default(),
            model: ModelConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let config: AnalysisConfig = toml::from_str(raw)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;

        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let interval = self.sampling_interval_seconds;
        if !(interval.is_finite() && interval > 0.0) {
            return Err(invalid(format!(
                "sampling_interval_seconds must be > 0, got {}",
                interval
            )));
        }

        if let Some(max) = self.max_duration_seconds {
            if max.is_nan() || max <= 0.0 {
                return Err(invalid(format!("max_duration_seconds must be > 0, got {}", max)));
            }
        }

        if !(self.fallback_fps.is_finite() && self.fallback_fps > 0.0) {
            return Err(invalid(format!("fallback_fps must be > 0, got {}", self.fallback_fps)));
        }

        let threshold = self.detector.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(format!(
                "confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        if self.detector.classes.is_empty() {
            return Err(invalid("detector class filter is empty".to_string()));
        }

        let PitchDims { length, width } = self.pitch;
        if !(length.is_finite() && length > 0.0 && width.is_finite() && width > 0.0) {
            return Err(invalid(format!("pitch must be positive, got {}x{}", length, width)));
        }

        let movement = self.movement_event_threshold;
        if !(movement.is_finite() && movement >= 0.0) {
            return Err(invalid(format!(
                "movement_event_threshold must be >= 0, got {}",
                movement
            )));
        }

        let report = &self.report;
        if report.grid_cols == 0 || report.grid_rows == 0 {
            return Err(invalid("density grid needs at least one cell".to_string()));
        }

        if !(0.0..=length).contains(&report.territorial_threshold) {
            return Err(invalid(format!(
                "territorial_threshold must be within [0, {}], got {}",
                length, report.territorial_threshold
            )));
        }

        Ok(())
    }
}

#[inline]
fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}
