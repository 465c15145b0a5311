// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction and the built-in test pattern source
//!
//! A frame source is anything that produces sensor frames and pushes them
//! into the pipeline through a [`FrameHandle`]: a platform camera binding,
//! a file decoder, or the synthetic generator below used by the demo binary
//! and the integration tests.

use crate::errors::PipelineResult;
use crate::frame::{FramePlane, SensorFrame};
use crate::pipeline::processor::{FrameHandle, SubmitResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Capability implemented by anything that can feed the pipeline
pub trait FrameSource {
    /// Begin producing frames into `handle`
    fn start(&mut self, handle: FrameHandle) -> PipelineResult<()>;

    /// Stop producing and release source resources; blocks until the
    /// producer has fully stopped
    fn stop(&mut self);
}

/// Build one planar 4:2:0 test-pattern frame
///
/// A diagonal luma gradient that scrolls with the sequence number, plus
/// slowly varying chroma, so consecutive frames and neighbouring pixels are
/// all distinguishable in tests and demo snapshots.
pub fn test_pattern_frame(width: u32, height: u32, sequence: u64) -> SensorFrame {
    let w = width as usize;
    let h = height as usize;
    let cw = w.div_ceil(2);
    let ch = h.div_ceil(2);

    let mut y = vec![0u8; w * h];
    for row in 0..h {
        for col in 0..w {
            y[row * w + col] = ((row + col + sequence as usize * 4) % 220 + 16) as u8;
        }
    }
    let mut u = vec![0u8; cw * ch];
    let mut v = vec![0u8; cw * ch];
    for row in 0..ch {
        for col in 0..cw {
            u[row * cw + col] = (96 + (col * 64 / cw.max(1))) as u8;
            v[row * cw + col] = (96 + (row * 64 / ch.max(1))) as u8;
        }
    }

    SensorFrame::new(
        width,
        height,
        [
            FramePlane::new(y, w, 1),
            FramePlane::new(u, cw, 1),
            FramePlane::new(v, cw, 1),
        ],
        sequence,
    )
}

/// Synthetic frame source pacing test-pattern frames at a fixed interval
///
/// Runs its own producer thread, mirroring how a platform capture binding
/// delivers frames from a callback context the pipeline does not control.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    interval: Duration,
    stop_signal: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, interval: Duration) -> Self {
        Self {
            width,
            height,
            interval,
            stop_signal: Arc::new(AtomicBool::new(false)),
            producer: None,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn start(&mut self, handle: FrameHandle) -> PipelineResult<()> {
        let width = self.width;
        let height = self.height;
        let interval = self.interval;
        self.stop_signal.store(false, Ordering::SeqCst);
        let stop_signal = Arc::clone(&self.stop_signal);

        info!(width, height, interval_ms = interval.as_millis() as u64, "Starting test pattern source");

        let producer = thread::spawn(move || {
            debug!("Test pattern producer started");
            let mut sequence = 0u64;
            loop {
                if stop_signal.load(Ordering::SeqCst) {
                    debug!("Stop signal received");
                    break;
                }
                let frame = test_pattern_frame(width, height, sequence);
                sequence += 1;
                if handle.submit(frame) == SubmitResult::Stopped {
                    debug!("Pipeline stopped, producer exiting");
                    break;
                }
                thread::sleep(interval);
            }
            debug!("Test pattern producer exiting");
        });

        self.producer = Some(producer);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(producer) = self.producer.take() {
            debug!("Waiting for test pattern producer to finish");
            if producer.join().is_err() {
                warn!("Test pattern producer panicked");
            }
        }
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        if self.producer.is_some() {
            debug!("TestPatternSource dropped, stopping producer");
            self.stop();
        }
    }
}
