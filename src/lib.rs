pub mod aggregator;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod export;
pub mod frame;
pub mod mapper;
pub mod math;
pub mod pipeline;
pub mod replay;
pub mod report;
pub mod sampler;
pub mod track;

#[cfg(feature = "opencv")]
pub mod opencv_source;

pub use aggregator::{Summary, TrackAggregator, TrackSummary};
pub use config::{AnalysisConfig, DetectorConfig, ModelConfig, PitchDims, ReportConfig};
pub use detection::{Identity, Observation, RawBox, RawDetections};
pub use detector::{DetectionAdapter, Detector};
pub use error::Error;
pub use frame::{FrameGeometry, MemorySource, RawFrame, SampleTick, VideoSource};
pub use mapper::{map_to_pitch, CoordinateMapper, PitchPoint};
pub use pipeline::{Analyzer, RunResult};
pub use replay::ReplayDetector;
pub use report::{MatchReport, RankBy};
pub use sampler::{FrameSampler, StopReason};
pub use track::{Track, TrackPoint};

#[cfg(feature = "opencv")]
pub use opencv_source::OpenCvSource;

/// Runs a single analysis with a fresh analyzer.
pub fn analyze<S, D>(source: S, detector: D, config: AnalysisConfig) -> Result<RunResult, Error>
where
    S: VideoSource,
    D: Detector<S::Frame>,
{
    Analyzer::new(detector, config)?.run(source)
}
