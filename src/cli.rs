// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for driving the pipeline from a synthetic source
//!
//! This module provides command-line functionality for:
//! - Streaming test pattern frames through the pipeline
//! - Processing a single frame and saving it as an image

use camera_pipeline::{
    Facing, FramePipeline, FrameSource, PipelineConfig, Rotation, SubmitResult,
    TestPatternSource, test_pattern_frame,
};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Stream test pattern frames through the pipeline for `duration` seconds
pub fn stream(
    width: u32,
    height: u32,
    output_width: u32,
    output_height: u32,
    fps: u32,
    duration: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::new(output_width, output_height);
    let pipeline = FramePipeline::start(config, |frame| {
        tracing::trace!(sequence = frame.sequence, "Frame delivered");
    })?;
    pipeline.set_orientation(Rotation::None, Facing::Back);

    let interval = Duration::from_millis(1000 / u64::from(fps.max(1)));
    let mut source = TestPatternSource::new(width, height, interval);
    source.start(pipeline.handle())?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!(
        "Streaming {}x{} -> {}x{} at {}fps... (press Ctrl+C to stop early)",
        width, height, output_width, output_height, fps
    );

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        let stats = pipeline.stats();
        print!(
            "\rStreaming: {:02}:{:02}  delivered: {}  dropped: {}",
            elapsed / 60,
            elapsed % 60,
            stats.delivered,
            stats.dropped
        );
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    source.stop();
    let stats = pipeline.stats();
    pipeline.stop();

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Process one test pattern frame and save the output as a PNG
pub fn snapshot(
    width: u32,
    height: u32,
    output_width: u32,
    output_height: u32,
    rotation: i32,
    front: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::new(output_width, output_height);
    let (tx, rx) = std::sync::mpsc::channel();
    let pipeline = FramePipeline::start(config, move |frame| {
        let _ = tx.send(frame);
    })?;

    let facing = if front { Facing::Front } else { Facing::Back };
    pipeline.set_orientation(Rotation::from_degrees_int(rotation), facing);

    // The worker arms almost immediately after start; retry until it takes
    // the frame
    let handle = pipeline.handle();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match handle.submit(test_pattern_frame(width, height, 0)) {
            SubmitResult::Accepted => break,
            SubmitResult::Stopped => return Err("pipeline stopped unexpectedly".into()),
            SubmitResult::DroppedBusy => {
                if Instant::now() > deadline {
                    return Err("timed out waiting for the worker".into());
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    let frame = rx.recv_timeout(Duration::from_secs(5))?;
    pipeline.stop();

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!("frame_{}.png", Local::now().format("%Y%m%d_%H%M%S")))
    });
    frame
        .to_rgba_image()
        .ok_or("output frame buffer size mismatch")?
        .save(&path)?;
    println!("Snapshot saved: {}", path.display());
    Ok(())
}
