// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests driving the capture pipeline through the public API.

use edgeview::backends::camera::synthetic::SyntheticBackend;
use edgeview::backends::camera::types::{CaptureFormat, FrameFormat};
use edgeview::processing::{FrameProcessor, Passthrough, ProcessedFrame, SobelEdges};
use edgeview::{CameraError, CapturePipeline, Config, PipelineState, ProcessingMode};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn test_format() -> CaptureFormat {
    CaptureFormat {
        width: 64,
        height: 32,
    }
}

fn wait_for_frames(pipeline: &CapturePipeline, count: u64) {
    let stats = pipeline.stats();
    let deadline = Instant::now() + Duration::from_secs(5);
    while stats.frames() < count && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(
        stats.frames() >= count,
        "timed out waiting for {} frames, saw {}",
        count,
        stats.frames()
    );
}

#[test]
fn test_pipeline_streams_converted_frames() {
    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());
    pipeline.start().expect("pipeline starts");
    assert_eq!(pipeline.state(), PipelineState::Streaming);

    wait_for_frames(&pipeline, 5);

    let frame = pipeline.queue().poll_latest().expect("frame pending");
    assert_eq!(frame.format, FrameFormat::Nv21);
    assert_eq!(frame.width, 64);
    assert_eq!(frame.height, 32);
    assert_eq!(frame.data.len(), 64 * 32 * 3 / 2);
    assert!(matches!(frame.rotation, 0 | 90 | 180 | 270));

    pipeline.stop();
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_queue_never_grows_past_capacity() {
    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());
    pipeline.start().expect("pipeline starts");

    // Never poll; the producer must evict oldest instead of growing
    wait_for_frames(&pipeline, 10);
    assert!(pipeline.queue().len() <= 2);

    pipeline.stop();
}

#[test]
fn test_edge_processing_end_to_end() {
    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());
    pipeline.set_processor(Some(Arc::new(SobelEdges::new())));
    pipeline.start().expect("pipeline starts");

    wait_for_frames(&pipeline, 3);
    let frame = pipeline.queue().poll_latest().expect("frame pending");
    assert_eq!(frame.format, FrameFormat::Rgba);
    assert_eq!(frame.data.len(), 64 * 32 * 4);

    // Edge output is white-on-black with opaque alpha
    for px in frame.data.chunks_exact(4) {
        assert!(px[0] == px[1] && px[1] == px[2]);
        assert_eq!(px[3], 255);
    }

    pipeline.stop();
}

#[test]
fn test_passthrough_processing_keeps_nv21() {
    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());
    pipeline.set_processor(Some(Arc::new(Passthrough)));
    pipeline.start().expect("pipeline starts");

    wait_for_frames(&pipeline, 3);
    let frame = pipeline.queue().poll_latest().expect("frame pending");
    assert_eq!(frame.format, FrameFormat::Nv21);
    assert_eq!(frame.data.len(), 64 * 32 * 3 / 2);

    pipeline.stop();
}

#[test]
fn test_stop_start_cycles() {
    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());

    for _ in 0..3 {
        pipeline.start().expect("pipeline starts");
        wait_for_frames(&pipeline, 1);
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }
}

#[test]
fn test_empty_backend_reports_no_device() {
    let mut pipeline =
        CapturePipeline::new(Box::new(SyntheticBackend::without_devices()), test_format());
    assert!(matches!(
        pipeline.start(),
        Err(CameraError::NoDeviceAvailable)
    ));
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_orientation_changes_reach_queued_frames() {
    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());
    pipeline.start().expect("pipeline starts");

    // Rear synthetic sensor sits at 90°. Device at ~180° buckets to 180,
    // so the total is (90 - 180 + 360) % 360 = 270.
    pipeline.rotation_tracker().on_orientation_changed(180);

    let seen = pipeline.stats().frames();
    wait_for_frames(&pipeline, seen + 3);

    let mut last = None;
    while let Some(f) = pipeline.queue().poll_latest() {
        last = Some(f);
    }
    assert_eq!(last.expect("frame pending").rotation, 270);

    pipeline.stop();
}

#[test]
fn test_rejecting_processor_starves_queue() {
    struct Reject;
    impl FrameProcessor for Reject {
        fn name(&self) -> &str {
            "reject"
        }
        fn process(&self, _: &[u8], _: u32, _: u32, _: u32) -> Option<ProcessedFrame> {
            None
        }
    }

    let mut pipeline = CapturePipeline::new(Box::new(SyntheticBackend::new()), test_format());
    pipeline.set_processor(Some(Arc::new(Reject)));
    pipeline.start().expect("pipeline starts");

    let stats = pipeline.stats();
    let deadline = Instant::now() + Duration::from_secs(5);
    while stats.processing_drops() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(stats.processing_drops() >= 3);
    assert!(pipeline.queue().is_empty());

    pipeline.stop();
}

#[test]
fn test_config_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");

    let config = Config {
        width: 1280,
        height: 720,
        prefer_back_camera: false,
        processing: ProcessingMode::Passthrough,
    };
    config.save_to(&path).expect("config saves");

    let loaded = Config::load_from(&path);
    assert_eq!(loaded, config);
}

#[test]
fn test_garbage_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not json").expect("write garbage");

    assert_eq!(Config::load_from(&path), Config::default());
}
