// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor: worker thread, state machine and drop-newest admission
//!
//! All processing for a session happens on one dedicated worker thread.
//! Admission is a rendezvous hand-off: submitting succeeds only while the
//! worker is parked waiting for a frame, so at most one frame is ever in
//! flight and a frame arriving mid-processing is released immediately
//! instead of queued. This bounds both memory and delivery latency under a
//! slow consumer; the cost is temporal smoothness, not correctness.

use crate::config::PipelineConfig;
use crate::errors::{FrameError, PipelineError};
use crate::frame::{Facing, OutputFrame, Rotation, SensorFrame};
use crate::pipeline::convert::{PlaneScratch, convert_yuv420_to_argb};
use crate::pipeline::orientation::OrientationTracker;
use crate::pipeline::render::render_output;
use crate::pipeline::transform::{TransformCache, TransformParams};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

const STATE_IDLE: u8 = 0;
const STATE_ARMED: u8 = 1;
const STATE_PROCESSING: u8 = 2;

/// Where the worker currently is in its per-session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No worker running; frames are not accepted
    Idle,
    /// Worker is parked waiting for the next frame
    Armed,
    /// Worker is converting/transforming/delivering a frame
    Processing,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_ARMED => PipelineState::Armed,
            STATE_PROCESSING => PipelineState::Processing,
            _ => PipelineState::Idle,
        }
    }
}

/// Outcome of offering a frame to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    /// The worker took the frame and will deliver exactly one output for it
    Accepted,
    /// The worker was still processing the previous frame; this one was
    /// released without conversion (drop-newest backpressure)
    DroppedBusy,
    /// The pipeline has stopped; the frame was released
    Stopped,
}

/// Counters for a streaming session, readable from any thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Frames admitted to the worker
    pub accepted: u64,
    /// Frames released unprocessed because the worker was busy
    pub dropped: u64,
    /// Output frames handed to the consumer
    pub delivered: u64,
    /// Accepted frames abandoned by a per-frame processing error
    pub failed: u64,
}

struct SharedState {
    state: AtomicU8,
    accepting: AtomicBool,
    accepted: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    orientation: Mutex<OrientationTracker>,
}

impl SharedState {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_IDLE),
            accepting: AtomicBool::new(true),
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            orientation: Mutex::new(OrientationTracker::default()),
        }
    }

    fn orientation(&self) -> MutexGuard<'_, OrientationTracker> {
        self.orientation.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stats(&self) -> PipelineStats {
        PipelineStats {
            accepted: self.accepted.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
            delivered: self.delivered.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

enum WorkerMsg {
    Frame(SensorFrame),
    Stop,
}

/// Cloneable frame submitter handed to a frame source
///
/// Submission never blocks: the frame is either handed to the waiting worker
/// or released on the spot.
#[derive(Clone)]
pub struct FrameHandle {
    tx: SyncSender<WorkerMsg>,
    shared: Arc<SharedState>,
}

impl FrameHandle {
    /// Offer a frame to the pipeline
    pub fn submit(&self, frame: SensorFrame) -> SubmitResult {
        if !self.shared.accepting.load(Ordering::SeqCst) {
            return SubmitResult::Stopped;
        }
        // Rendezvous channel: this succeeds only when the worker is blocked
        // waiting, which is exactly the Armed state
        match self.tx.try_send(WorkerMsg::Frame(frame)) {
            Ok(()) => {
                self.shared.accepted.fetch_add(1, Ordering::SeqCst);
                SubmitResult::Accepted
            }
            Err(TrySendError::Full(dropped)) => {
                drop(dropped);
                self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                trace!("Worker busy, releasing frame unprocessed");
                SubmitResult::DroppedBusy
            }
            Err(TrySendError::Disconnected(dropped)) => {
                drop(dropped);
                SubmitResult::Stopped
            }
        }
    }
}

/// A running frame-processing session
///
/// Created with [`FramePipeline::start`]; the session's destination geometry
/// is fixed for its lifetime. Dropping the pipeline stops it.
pub struct FramePipeline {
    shared: Arc<SharedState>,
    tx: SyncSender<WorkerMsg>,
    config: PipelineConfig,
    worker: Option<JoinHandle<()>>,
}

impl FramePipeline {
    /// Validate the configuration and spawn the processing worker
    ///
    /// `on_frame` receives every successfully processed frame, synchronously
    /// on the worker thread; it must not block for long. Invalid output
    /// geometry fails here, before any thread is started.
    pub fn start<F>(config: PipelineConfig, on_frame: F) -> Result<Self, PipelineError>
    where
        F: FnMut(OutputFrame) + Send + 'static,
    {
        config.validate()?;

        info!(
            output_width = config.output_width,
            output_height = config.output_height,
            "Starting frame pipeline"
        );

        let (tx, rx) = sync_channel(0);
        let shared = Arc::new(SharedState::new());
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("frame-pipeline".to_string())
            .spawn(move || worker_loop(rx, worker_shared, config, on_frame))
            .map_err(|e| PipelineError::Worker(format!("failed to spawn worker: {}", e)))?;

        Ok(Self {
            shared,
            tx,
            config,
            worker: Some(worker),
        })
    }

    /// Get a submitter for a frame source
    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Notify a sensor orientation or facing change
    ///
    /// Idempotent; may be called from any thread. A processing cycle that
    /// starts after this call observes the new values.
    pub fn set_orientation(&self, sensor_orientation: Rotation, facing: Facing) {
        let changed = self
            .shared
            .orientation()
            .set_sensor(sensor_orientation, facing);
        if changed {
            debug!(%sensor_orientation, %facing, "Sensor orientation updated");
        }
    }

    /// Notify a device rotation change
    pub fn set_device_rotation(&self, rotation: Rotation) {
        let changed = self.shared.orientation().set_device_rotation(rotation);
        if changed {
            debug!(%rotation, "Device rotation updated");
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.stats()
    }

    /// Stop the session: refuse new frames, let any in-flight frame finish
    /// delivering, then join the worker and release its buffers
    ///
    /// Once this returns no further delivery happens.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.shared.accepting.store(false, Ordering::SeqCst);
        debug!("Requesting frame pipeline stop");
        // Blocking send: pairs with the worker's next recv, i.e. after any
        // in-flight frame has finished
        let _ = self.tx.send(WorkerMsg::Stop);
        if worker.join().is_err() {
            warn!("Frame worker panicked during shutdown");
        }
        info!(stats = ?self.shared.stats(), "Frame pipeline stopped");
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<F>(
    rx: Receiver<WorkerMsg>,
    shared: Arc<SharedState>,
    config: PipelineConfig,
    mut on_frame: F,
) where
    F: FnMut(OutputFrame) + Send + 'static,
{
    debug!("Frame worker started");

    // Session-scoped scratch: created lazily by the first frame, dies with
    // the worker so a new session never sees stale geometry
    let mut scratch = PlaneScratch::new();
    let mut packed: Vec<u32> = Vec::new();
    let mut transforms = TransformCache::new();

    loop {
        shared.state.store(STATE_ARMED, Ordering::SeqCst);
        let msg = match rx.recv() {
            Ok(msg) => msg,
            Err(_) => break,
        };
        let frame = match msg {
            WorkerMsg::Frame(frame) => frame,
            WorkerMsg::Stop => break,
        };
        shared.state.store(STATE_PROCESSING, Ordering::SeqCst);

        match process_frame(
            frame,
            &shared,
            &config,
            &mut scratch,
            &mut packed,
            &mut transforms,
            &mut on_frame,
        ) {
            Ok(()) => {
                shared.delivered.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                shared.failed.fetch_add(1, Ordering::SeqCst);
                warn!(error = %e, "Dropping frame after processing failure");
            }
        }
    }

    shared.state.store(STATE_IDLE, Ordering::SeqCst);
    debug!("Frame worker exiting");
}

fn process_frame<F>(
    frame: SensorFrame,
    shared: &SharedState,
    config: &PipelineConfig,
    scratch: &mut PlaneScratch,
    packed: &mut Vec<u32>,
    transforms: &mut TransformCache,
    on_frame: &mut F,
) -> Result<(), FrameError>
where
    F: FnMut(OutputFrame),
{
    let width = frame.width;
    let height = frame.height;
    let sequence = frame.sequence;
    let captured_at = frame.captured_at;

    // Copy the planes out, then release the frame to its source before any
    // further work - on the failure path too
    let filled = scratch.fill(&frame);
    drop(frame);
    filled?;

    convert_yuv420_to_argb(scratch, width, height, packed)?;

    let effective = shared.orientation().effective();
    let pair = transforms.get(TransformParams {
        src_width: width,
        src_height: height,
        dst_width: config.output_width,
        dst_height: config.output_height,
        rotation: effective.rotation,
        mirror: effective.mirror,
    })?;

    let mut pixels = vec![0u32; config.output_pixels()];
    render_output(
        packed,
        width,
        height,
        &mut pixels,
        config.output_width,
        config.output_height,
        &pair.inverse,
    );

    on_frame(OutputFrame {
        width: config.output_width,
        height: config.output_height,
        source_width: width,
        source_height: height,
        pixels,
        frame_to_output: pair.forward,
        output_to_frame: pair.inverse,
        sequence,
        captured_at,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_invalid_geometry_fails_before_spawn() {
        let result = FramePipeline::start(PipelineConfig::new(0, 480), |_| {});
        match result {
            Err(PipelineError::Config(ConfigError::InvalidGeometry { width, height })) => {
                assert_eq!((width, height), (0, 480));
            }
            other => panic!("expected configuration error, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_submit_after_stop_is_rejected() {
        let pipeline =
            FramePipeline::start(PipelineConfig::new(32, 32), |_| {}).expect("valid config");
        let handle = pipeline.handle();
        pipeline.stop();

        let frame = crate::source::test_pattern_frame(16, 16, 0);
        assert_eq!(handle.submit(frame), SubmitResult::Stopped);
    }

    #[test]
    fn test_worker_reaches_armed() {
        let pipeline =
            FramePipeline::start(PipelineConfig::new(32, 32), |_| {}).expect("valid config");
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while pipeline.state() != PipelineState::Armed {
            assert!(std::time::Instant::now() < deadline, "worker never armed");
            std::thread::yield_now();
        }
        pipeline.stop();
    }
}
