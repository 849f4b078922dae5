use thiserror::Error;

use crate::detection::Identity;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open video source {source_id}: {reason}")]
    SourceOpen { source_id: String, reason: String },

    #[error("frame {frame_index} read failed: {reason}")]
    SourceRead { frame_index: u64, reason: String },

    #[error("detection engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("invalid frame geometry {width}x{height}")]
    InvalidFrameGeometry { width: i32, height: i32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("track {identity}: timestamp {next} is earlier than {last}")]
    OutOfOrder {
        identity: Identity,
        last: f64,
        next: f64,
    },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl Error {
    /// Errors that only invalidate the current tick; the run carries on.
    #[inline]
    pub fn is_tick_scoped(&self) -> bool {
        matches!(self, Error::InvalidFrameGeometry { .. })
    }
}
