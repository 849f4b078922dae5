use anyhow::Context;
use clap::Parser;
use pitchtrack::{export, AnalysisConfig, Analyzer, MatchReport, OpenCvSource, ReplayDetector};
use std::path::PathBuf;

/// Samples a match video, replays logged detections over it and writes
/// the SEC,ID,X,Y export plus a JSON match report.
#[derive(Parser, Debug)]
struct Args {
    /// Video file or stream URL
    video: String,

    /// Detections log (`<frame>: <json>` per line)
    #[arg(short, long)]
    detections: PathBuf,

    /// TOML analysis config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the CSV export
    #[arg(short, long, default_value = "tactical_export.csv")]
    out: PathBuf,

    /// Overrides the configured max duration, in seconds
    #[arg(long)]
    max_duration: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if args.max_duration.is_some() {
        config.max_duration_seconds = args.max_duration;
    }

    config.model.path = args.detections.clone();

    let detector = ReplayDetector::open(&config.model)?;
    let source = OpenCvSource::open(&args.video)?;

    let mut analyzer = Analyzer::new(detector, config.clone())?;
    let result = analyzer.run(source)?;

    if result.is_empty() {
        println!("no players detected in {}", result.source_id);
    }

    export::write_csv_file(&result, &args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;

    let report = MatchReport::compute(&result, &config);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
