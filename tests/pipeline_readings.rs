//! Integration tests for the detection-to-time pipeline.
//!
//! These tests verify that:
//! 1. Zero detections yield `NoWatchFound` without invoking the landmark
//!    extractor
//! 2. Too few or degenerate landmarks yield `HandsUnclear`
//! 3. The default stub capabilities read 12:15 end to end
//! 4. Detector boxes overhanging the frame are clamped before cropping
//! 5. Overlay boxes are projected into display space
//! 6. The worker delivers readings in submission order

use dialread::{
    BoundingBox, Detection, DisplaySize, Frame, HandLandmarkExtractor, Pipeline, PipelineOutcome,
    PipelineWorker, Point2D, StubHandsBackend, StubWatchBackend, WatchLocator,
};

fn frame_100() -> Frame {
    Frame::new(vec![96; 100 * 100 * 3], 100, 100).unwrap()
}

fn detection(left: f32, top: f32, right: f32, bottom: f32, score: f32) -> Detection {
    Detection {
        bbox: BoundingBox::new(left, top, right, bottom),
        score,
    }
}

/// Pipeline over scripted stubs, returning the hands-backend call counter.
fn scripted_pipeline(
    detections: Vec<Vec<Detection>>,
    landmarks: Vec<Vec<Point2D>>,
) -> (Pipeline, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    let mut watch = StubWatchBackend::new();
    for result in detections {
        watch.push_result(result);
    }
    let mut hands = StubHandsBackend::new();
    for result in landmarks {
        hands.push_result(result);
    }
    let hands_calls = hands.call_counter();
    let pipeline = Pipeline::new_local(
        WatchLocator::new(Box::new(watch)),
        HandLandmarkExtractor::new(Box::new(hands)),
    );
    (pipeline, hands_calls)
}

#[test]
fn no_watch_found_skips_landmark_extraction() {
    let (mut pipeline, hands_calls) = scripted_pipeline(vec![vec![]], vec![]);
    let reading = pipeline.read_frame(&frame_100());

    assert_eq!(reading.outcome, PipelineOutcome::NoWatchFound);
    assert!(reading.overlay_box.is_none());
    assert_eq!(hands_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn low_score_detection_reads_no_watch() {
    let (mut pipeline, hands_calls) = scripted_pipeline(
        vec![vec![detection(10.0, 10.0, 90.0, 90.0, 0.1)]],
        vec![],
    );
    let reading = pipeline.read_frame(&frame_100());

    assert_eq!(reading.outcome, PipelineOutcome::NoWatchFound);
    assert_eq!(hands_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn two_landmarks_read_as_hands_unclear() {
    let (mut pipeline, _) = scripted_pipeline(
        vec![],
        vec![vec![Point2D::new(0.5, 0.5), Point2D::new(0.5, 0.1)]],
    );
    let reading = pipeline.read_frame(&frame_100());

    assert_eq!(reading.outcome, PipelineOutcome::HandsUnclear);
}

#[test]
fn degenerate_landmarks_read_as_hands_unclear() {
    let center = Point2D::new(0.5, 0.5);
    let (mut pipeline, _) = scripted_pipeline(vec![], vec![vec![center, center, center]]);
    let reading = pipeline.read_frame(&frame_100());

    assert_eq!(reading.outcome, PipelineOutcome::HandsUnclear);
}

#[test]
fn stub_defaults_read_twelve_fifteen() {
    let (mut pipeline, _) = scripted_pipeline(vec![], vec![]);
    let reading = pipeline.read_frame(&frame_100());

    match reading.outcome {
        PipelineOutcome::TimeRead { time, source_box } => {
            assert_eq!(time.to_string(), "12:15");
            // Default stub detection: centered box covering half the frame.
            assert_eq!(source_box, BoundingBox::new(25.0, 25.0, 75.0, 75.0));
        }
        other => panic!("expected TimeRead, got {:?}", other),
    }
}

#[test]
fn oversized_detection_box_is_clamped_before_cropping() {
    let (mut pipeline, _) = scripted_pipeline(
        vec![vec![detection(50.0, 50.0, 150.0, 150.0, 0.9)]],
        vec![],
    );
    let reading = pipeline.read_frame(&frame_100());

    match reading.outcome {
        PipelineOutcome::TimeRead { source_box, .. } => {
            assert_eq!(source_box, BoundingBox::new(50.0, 50.0, 100.0, 100.0));
        }
        other => panic!("expected TimeRead, got {:?}", other),
    }
}

#[test]
fn fully_out_of_frame_detection_reads_no_watch() {
    let (mut pipeline, hands_calls) = scripted_pipeline(
        vec![vec![detection(200.0, 200.0, 300.0, 300.0, 0.9)]],
        vec![],
    );
    let reading = pipeline.read_frame(&frame_100());

    assert_eq!(reading.outcome, PipelineOutcome::NoWatchFound);
    assert_eq!(hands_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn overlay_is_projected_into_display_space() {
    let (pipeline, _) = scripted_pipeline(vec![], vec![]);
    let mut pipeline = pipeline.with_display(DisplaySize {
        width: 200,
        height: 400,
    });
    let reading = pipeline.read_frame(&frame_100());

    // Source box (25,25,75,75) scaled by (2, 4) into display space.
    assert_eq!(
        reading.overlay_box,
        Some(BoundingBox::new(50.0, 100.0, 150.0, 300.0))
    );
    // The reading itself still carries captured-frame coordinates.
    match reading.outcome {
        PipelineOutcome::TimeRead { source_box, .. } => {
            assert_eq!(source_box, BoundingBox::new(25.0, 25.0, 75.0, 75.0));
        }
        other => panic!("expected TimeRead, got {:?}", other),
    }
}

#[test]
fn worker_delivers_readings_in_submission_order() {
    // Three scripted landmark sets reading 12:15, 6:30 and 3:45.
    let quarter_past = vec![
        Point2D::new(0.5, 0.5),
        Point2D::new(0.5, 0.25),
        Point2D::new(0.75, 0.5),
    ];
    let half_past_six = vec![
        Point2D::new(0.5, 0.5),
        Point2D::new(0.5, 0.75),
        Point2D::new(0.5, 0.75),
    ];
    let quarter_to_four = vec![
        Point2D::new(0.5, 0.5),
        Point2D::new(0.75, 0.5),
        Point2D::new(0.25, 0.5),
    ];
    let (pipeline, _) =
        scripted_pipeline(vec![], vec![quarter_past, half_past_six, quarter_to_four]);

    let worker = PipelineWorker::spawn(pipeline).unwrap();
    let receivers: Vec<_> = (0..3).map(|_| worker.submit(frame_100()).unwrap()).collect();

    let mut times = Vec::new();
    for receiver in receivers {
        match receiver.recv().unwrap().outcome {
            PipelineOutcome::TimeRead { time, .. } => times.push(time.to_string()),
            other => panic!("expected TimeRead, got {:?}", other),
        }
    }
    assert_eq!(times, vec!["12:15", "06:30", "03:45"]);

    worker.shutdown();
}

#[test]
fn worker_shuts_down_cleanly_after_a_reading() {
    let (pipeline, _) = scripted_pipeline(vec![], vec![]);
    let worker = PipelineWorker::spawn(pipeline).unwrap();
    let receiver = worker.submit(frame_100()).unwrap();
    assert!(receiver.recv().unwrap().outcome.is_reading());
    worker.shutdown();
}
