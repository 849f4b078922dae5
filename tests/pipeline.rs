use pitchtrack::{
    analyze, export, AnalysisConfig, Analyzer, Detector, DetectorConfig, Error, Identity,
    MatchReport, MemorySource, PitchPoint, RawBox, RawDetections, RawFrame, ReplayDetector,
    StopReason,
};
use std::sync::atomic::{AtomicBool, Ordering};

struct Stub<F>(F);

impl<F> Detector<RawFrame> for Stub<F>
where
    F: FnMut(u64) -> Result<RawDetections, Error>,
{
    fn infer(
        &mut self,
        _frame: &RawFrame,
        index: u64,
        _config: &DetectorConfig,
    ) -> Result<RawDetections, Error> {
        (self.0)(index)
    }
}

fn person(x: f32, y: f32) -> RawBox {
    RawBox::xywh(x, y, 20.0, 40.0, 0.9, "person")
}

fn every_frame() -> AnalysisConfig {
    AnalysisConfig {
        sampling_interval_seconds: 1.0,
        ..AnalysisConfig::default()
    }
}

#[test]
fn clip_shorter_than_interval_yields_one_point() {
    let source = MemorySource::blank("clip.mp4", 30.0, 10, 1280, 720);
    let detector = Stub(|_| Ok(RawDetections::tracked(vec![person(640.0, 360.0)], vec![7])));

    let result = analyze(source, detector, AnalysisConfig::default()).unwrap();

    assert_eq!(result.tracks.len(), 1);
    assert_eq!(result.tracks[0].identity, Identity::Tracked(7));
    assert_eq!(result.tracks[0].len(), 1);
    assert_eq!(result.tracks[0].points()[0].timestamp, 0.0);
    assert_eq!(result.ticks, 1);
    assert!(!result.truncated);
}

#[test]
fn no_detections_give_empty_result_and_zero_metrics() {
    let source = MemorySource::blank("empty.mp4", 30.0, 90, 1280, 720);
    let detector = Stub(|_| Ok(RawDetections::default()));
    let config = AnalysisConfig::default();

    let result = analyze(source, detector, config.clone()).unwrap();

    assert!(result.tracks.is_empty());
    assert!(result.is_empty());
    assert!(!result.truncated);
    assert_eq!(result.ticks, 3);

    let report = MatchReport::compute(&result, &config);
    assert_eq!(report.territorial_pct, 0.0);
    assert_eq!(report.line_height, 0.0);
    assert_eq!(report.unique_players, 0);
}

#[test]
fn read_failure_keeps_ticks_before_it() {
    let source = MemorySource::blank("broken.mp4", 1.0, 10, 100, 100).fail_at(5);
    let closed = source.closed_flag();
    let detector = Stub(|i| Ok(RawDetections::tracked(vec![person(i as f32 * 10.0, 50.0)], vec![1])));

    let result = analyze(source, detector, every_frame()).unwrap();

    assert!(result.truncated);
    assert_eq!(result.stop_reason, StopReason::ReadFailure);
    assert_eq!(result.ticks, 5);
    assert_eq!(result.tracks.len(), 1);
    let times: Vec<_> = result.tracks[0].iter().map(|p| p.timestamp).collect();
    assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn engine_failure_aborts_without_result() {
    let source = MemorySource::blank("clip.mp4", 1.0, 10, 100, 100);
    let closed = source.closed_flag();
    let mut calls = 0;
    let detector = Stub(|i| {
        calls += 1;
        if i == 2 {
            Err(Error::EngineUnavailable("weights not found".to_string()))
        } else {
            Ok(RawDetections::tracked(vec![person(10.0, 10.0)], vec![1]))
        }
    });

    let err = analyze(source, detector, every_frame()).unwrap_err();

    assert!(matches!(err, Error::EngineUnavailable(_)));
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(calls, 3);
}

#[test]
fn max_duration_truncates_run() {
    let source = MemorySource::blank("long.mp4", 10.0, 200, 100, 100);
    let detector = Stub(|_| Ok(RawDetections::tracked(vec![person(10.0, 10.0)], vec![3])));
    let config = AnalysisConfig {
        max_duration_seconds: Some(4.0),
        ..AnalysisConfig::default()
    };

    let result = analyze(source, detector, config).unwrap();

    assert!(result.truncated);
    assert_eq!(result.stop_reason, StopReason::MaxDuration);
    assert_eq!(result.tracks[0].len(), 5);
}

#[test]
fn stream_ending_at_max_duration_is_not_truncated() {
    let source = MemorySource::blank("rtsp://cam", 1.0, 5, 100, 100).without_frame_count();
    let detector = Stub(|_| Ok(RawDetections::tracked(vec![person(10.0, 10.0)], vec![3])));
    let config = AnalysisConfig {
        max_duration_seconds: Some(4.0),
        ..every_frame()
    };

    let result = analyze(source, detector, config).unwrap();

    assert_eq!(result.ticks, 5);
    assert!(!result.truncated);
    assert_eq!(result.stop_reason, StopReason::Exhausted);
}

#[test]
fn cancellation_drains_accumulated_tracks() {
    let cancel = AtomicBool::new(false);
    let source = MemorySource::blank("clip.mp4", 1.0, 10, 100, 100);
    let detector = Stub(|i| {
        if i == 2 {
            cancel.store(true, Ordering::Relaxed);
        }
        Ok(RawDetections::tracked(vec![person(10.0, 10.0)], vec![1]))
    });

    let mut analyzer = Analyzer::new(detector, every_frame()).unwrap();
    let result = analyzer.run_with_cancel(source, &cancel).unwrap();

    assert!(result.truncated);
    assert_eq!(result.stop_reason, StopReason::Cancelled);
    assert_eq!(result.tracks[0].len(), 3);
}

#[test]
fn untracked_boxes_go_to_unassigned_bucket() {
    let source = MemorySource::blank("clip.mp4", 1.0, 3, 100, 100);
    let detector = Stub(|i| {
        if i == 1 {
            Ok(RawDetections::untracked(vec![person(10.0, 10.0), person(90.0, 90.0)]))
        } else {
            Ok(RawDetections::tracked(vec![person(10.0, 10.0)], vec![0]))
        }
    });

    let result = analyze(source, detector, every_frame()).unwrap();
    let summary = result.summarize(5.0);

    assert_eq!(result.tracks.len(), 2);
    assert_eq!(result.track(Identity::Tracked(0)).unwrap().len(), 2);
    assert_eq!(result.unassigned().unwrap().len(), 2);
    assert_eq!(summary.player_count(), 1);
    assert_eq!(summary.rows().last().unwrap().identity, Identity::Unassigned);
}

#[test]
fn tracker_state_is_reset_for_every_run() {
    struct Counting {
        resets: usize,
    }

    impl Detector<RawFrame> for Counting {
        fn infer(
            &mut self,
            _frame: &RawFrame,
            _index: u64,
            _config: &DetectorConfig,
        ) -> Result<RawDetections, Error> {
            Ok(RawDetections::default())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    let mut analyzer = Analyzer::new(Counting { resets: 0 }, every_frame()).unwrap();
    analyzer.run(MemorySource::blank("a", 1.0, 2, 10, 10)).unwrap();
    analyzer.run(MemorySource::blank("b", 1.0, 2, 10, 10)).unwrap();

    assert_eq!(analyzer.into_detector().resets, 2);
}

#[test]
fn csv_round_trip_preserves_rows() {
    let source = MemorySource::blank("clip.mp4", 2.0, 6, 1280, 720);
    let detector = Stub(|i| {
        let x = 100.0 + i as f32 * 37.3;
        Ok(RawDetections::tracked(
            vec![person(x, 200.0), person(1000.0 - x, 500.0)],
            vec![4, 11],
        ))
    });
    let config = AnalysisConfig {
        sampling_interval_seconds: 0.5,
        ..AnalysisConfig::default()
    };

    let result = analyze(source, detector, config).unwrap();

    let mut buf = Vec::new();
    export::write_csv(&result, &mut buf).unwrap();
    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.starts_with("SEC,ID,X,Y\n"));

    let parsed = export::read_csv(buf.as_slice()).unwrap();
    let expected = export::rows(&result);
    assert_eq!(parsed.len(), expected.len());
    assert_eq!(parsed.len(), 12);

    for (got, want) in parsed.iter().zip(expected.iter()) {
        assert_eq!(got.identity, want.identity);
        assert!((got.timestamp - want.timestamp).abs() <= 0.0005);
        assert!((got.x - want.x).abs() <= 0.05 + 1e-4);
        assert!((got.y - want.y).abs() <= 0.05 + 1e-4);
    }
}

#[test]
fn csv_file_export_of_empty_run_has_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");
    let source = MemorySource::blank("clip.mp4", 1.0, 2, 10, 10);
    let result = analyze(source, Stub(|_| Ok(RawDetections::default())), every_frame()).unwrap();

    export::write_csv_file(&result, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "SEC,ID,X,Y\n");
    assert!(export::read_csv_file(&path).unwrap().is_empty());
}

#[test]
fn replayed_detections_drive_a_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("match.dets");
    let mut out = std::fs::File::create(&log).unwrap();
    for i in 0..4u64 {
        let dets = RawDetections::tracked(
            vec![person(100.0 + i as f32 * 200.0, 360.0), person(1200.0, 100.0)],
            vec![5, 9],
        );
        ReplayDetector::write_frame(&mut out, i * 30, &dets).unwrap();
    }
    drop(out);

    let mut config = AnalysisConfig::default();
    config.model.path = log;
    let detector = ReplayDetector::open(&config.model).unwrap();
    let source = MemorySource::blank("match.mp4", 30.0, 120, 1280, 720);

    let result = analyze(source, detector, config.clone()).unwrap();
    let report = MatchReport::compute(&result, &config);

    assert_eq!(result.ticks, 4);
    assert_eq!(report.unique_players, 2);
    assert_eq!(report.data_nodes, 8);

    let runner = result.track(Identity::Tracked(5)).unwrap();
    assert_eq!(runner.points()[0].point, PitchPoint::new(100.0 / 1280.0 * 105.0, 34.0));

    // 200 px steps are 16.4 m on a 105 m pitch
    let row = report.summary.players.iter().find(|r| r.identity == Identity::Tracked(5)).unwrap();
    assert_eq!(row.high_intensity_events, 3);
    assert_eq!(report.top_by_events[0].identity, Identity::Tracked(5));
    assert!(report.territorial_pct > 0.0);
}
