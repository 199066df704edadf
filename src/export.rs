//! Background export of trajectory snapshots.
//!
//! An export job owns a [`Trajectory`] snapshot taken from a simulation (or
//! a batch run) and streams it to a [`TrajectorySink`] on its own thread.
//! The live simulation is never shared with the worker, so the owner can
//! keep advancing it while the export runs.
//!
//! The job reports progress over a channel and checks a cancellation flag
//! between points. Dropping an unfinished job cancels it.
//!
//! ```rust
//! use lorenz_engine::prelude::*;
//! use lorenz_engine::export::{ExportJob, ExportOptions, MemorySink};
//!
//! let mut sim = Simulation::builder().seed(1).build().expect("valid config");
//! sim.advance(500).expect("k > 0");
//!
//! let job = ExportJob::spawn(sim.snapshot(), MemorySink::default(), ExportOptions::default())
//!     .expect("spawn");
//! let (summary, sink) = job.join().expect("export");
//! assert_eq!(summary.written, 501);
//! assert_eq!(sink.len(), 501);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::engine::state::TrajectoryPoint;
use crate::error::{LorenzError, LorenzResult};
use crate::trajectory::Trajectory;

/// Destination for exported points.
pub trait TrajectorySink: Send {
    /// Write one point. `index` is the position within the exported
    /// (possibly decimated) sequence.
    ///
    /// # Errors
    ///
    /// Returns error if the point cannot be written; the export stops.
    fn write_point(&mut self, index: usize, point: &TrajectoryPoint) -> LorenzResult<()>;

    /// Called once after the last point.
    ///
    /// # Errors
    ///
    /// Returns error if the sink cannot be finalized.
    fn finish(&mut self) -> LorenzResult<()> {
        Ok(())
    }
}

/// Collects exported points in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    points: Vec<TrajectoryPoint>,
}

impl MemorySink {
    /// Number of collected points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Collected points as a trajectory.
    #[must_use]
    pub fn into_trajectory(self) -> Trajectory {
        Trajectory::from_points(self.points)
    }
}

impl TrajectorySink for MemorySink {
    fn write_point(&mut self, _index: usize, point: &TrajectoryPoint) -> LorenzResult<()> {
        self.points.push(*point);
        Ok(())
    }
}

/// One JSON object per line: `{"index":0,"t":0.0,"x":0.1,"y":0.0,"z":0.0}`.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

#[derive(Serialize)]
struct JsonLine {
    index: usize,
    t: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> TrajectorySink for JsonLinesSink<W> {
    fn write_point(&mut self, index: usize, point: &TrajectoryPoint) -> LorenzResult<()> {
        let line = JsonLine {
            index,
            t: point.t,
            x: point.state.x,
            y: point.state.y,
            z: point.state.z,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> LorenzResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Export tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Export every `stride`-th point (0 is treated as 1).
    pub stride: usize,
    /// Emit a progress event every this many points (0 disables).
    pub progress_every: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            stride: 1,
            progress_every: 1000,
        }
    }
}

impl ExportOptions {
    /// Options that fit `snapshot` into `frames` output frames.
    #[must_use]
    pub fn for_frames(snapshot: &Trajectory, frames: usize) -> Self {
        Self {
            stride: snapshot.frame_stride(frames),
            ..Self::default()
        }
    }
}

/// Lifecycle of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportStatus {
    /// Worker is writing points.
    Running,
    /// All points written and the sink finished.
    Completed,
    /// Stopped by [`ExportJob::cancel`].
    Cancelled,
    /// The sink reported an error.
    Failed,
}

/// Outcome of a completed export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Points written.
    pub written: usize,
    /// Points in the snapshot.
    pub source_len: usize,
}

/// Progress notifications from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// Worker started; `total` points will be written.
    Started {
        /// Points to write after decimation.
        total: usize,
    },
    /// Periodic progress.
    Progress {
        /// Points written so far.
        written: usize,
        /// Points to write.
        total: usize,
    },
    /// Export finished.
    Completed(ExportSummary),
    /// Export was cancelled.
    Cancelled {
        /// Points written before cancellation.
        written: usize,
    },
    /// Export failed.
    Failed(String),
}

type WorkerResult<S> = LorenzResult<(ExportSummary, S)>;

/// Handle to a running export.
#[derive(Debug)]
pub struct ExportJob<S> {
    cancel: Arc<AtomicBool>,
    status: Arc<Mutex<ExportStatus>>,
    events: Receiver<ExportEvent>,
    handle: Option<JoinHandle<WorkerResult<S>>>,
}

impl<S: TrajectorySink + 'static> ExportJob<S> {
    /// Start exporting `snapshot` into `sink` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned.
    pub fn spawn(snapshot: Trajectory, sink: S, options: ExportOptions) -> LorenzResult<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let status = Arc::new(Mutex::new(ExportStatus::Running));
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = Worker {
            snapshot,
            options,
            cancel: Arc::clone(&cancel),
            status: Arc::clone(&status),
            events: tx,
        };
        let handle = std::thread::Builder::new()
            .name("lorenz-export".to_string())
            .spawn(move || worker.run(sink))?;

        Ok(Self {
            cancel,
            status,
            events: rx,
            handle: Some(handle),
        })
    }

    /// Ask the worker to stop before its next point.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ExportStatus {
        self.status
            .lock()
            .map_or(ExportStatus::Failed, |status| *status)
    }

    /// Check whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Progress events emitted by the worker.
    #[must_use]
    pub const fn events(&self) -> &Receiver<ExportEvent> {
        &self.events
    }

    /// Wait for the worker and return its summary and the sink.
    ///
    /// # Errors
    ///
    /// Returns [`LorenzError::ExportCancelled`] if the job was cancelled,
    /// the sink's error if writing failed, or [`LorenzError::ExportFailed`]
    /// if the worker panicked.
    pub fn join(mut self) -> WorkerResult<S> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| LorenzError::export("export already joined"))?;
        handle
            .join()
            .map_err(|_| LorenzError::export("export worker panicked"))?
    }
}

impl<S> Drop for ExportJob<S> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.store(true, Ordering::Release);
        }
    }
}

struct Worker {
    snapshot: Trajectory,
    options: ExportOptions,
    cancel: Arc<AtomicBool>,
    status: Arc<Mutex<ExportStatus>>,
    events: Sender<ExportEvent>,
}

impl Worker {
    fn run<S: TrajectorySink>(self, mut sink: S) -> WorkerResult<S> {
        let stride = self.options.stride.max(1);
        let source_len = self.snapshot.len();
        let total = source_len.div_ceil(stride);

        tracing::info!(total, stride, "export started");
        self.emit(ExportEvent::Started { total });

        match self.write_all(&mut sink, stride, total) {
            Ok(written) => {
                let summary = ExportSummary {
                    written,
                    source_len,
                };
                self.set_status(ExportStatus::Completed);
                tracing::info!(written, "export completed");
                self.emit(ExportEvent::Completed(summary));
                Ok((summary, sink))
            }
            Err(LorenzError::ExportCancelled { written, total }) => {
                self.set_status(ExportStatus::Cancelled);
                tracing::warn!(written, total, "export cancelled");
                self.emit(ExportEvent::Cancelled { written });
                Err(LorenzError::ExportCancelled { written, total })
            }
            Err(err) => {
                self.set_status(ExportStatus::Failed);
                tracing::warn!(error = %err, "export failed");
                self.emit(ExportEvent::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn write_all<S: TrajectorySink>(
        &self,
        sink: &mut S,
        stride: usize,
        total: usize,
    ) -> LorenzResult<usize> {
        let mut written = 0;
        for (index, point) in self.snapshot.iter().step_by(stride).enumerate() {
            if self.cancel.load(Ordering::Acquire) {
                return Err(LorenzError::ExportCancelled { written, total });
            }
            sink.write_point(index, point)?;
            written += 1;

            let every = self.options.progress_every;
            if every > 0 && written % every == 0 {
                self.emit(ExportEvent::Progress { written, total });
            }
        }
        sink.finish()?;
        Ok(written)
    }

    fn set_status(&self, status: ExportStatus) {
        if let Ok(mut current) = self.status.lock() {
            *current = status;
        }
    }

    fn emit(&self, event: ExportEvent) {
        // The owner may have dropped the receiver; progress is best-effort.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::lorenz::LorenzParameters;
    use crate::engine::state::State;
    use crate::trajectory::generate;

    fn sample(steps: usize) -> Trajectory {
        generate(State::DEFAULT_INITIAL, 0.01, steps, &LorenzParameters::STANDARD)
            .expect("generate")
    }

    #[test]
    fn test_memory_export_roundtrip() {
        let traj = sample(250);
        let job = ExportJob::spawn(traj.clone(), MemorySink::default(), ExportOptions::default())
            .expect("spawn");
        let (summary, sink) = job.join().expect("join");
        assert_eq!(summary.written, 251);
        assert_eq!(summary.source_len, 251);
        assert_eq!(sink.into_trajectory(), traj);
    }

    #[test]
    fn test_stride_export() {
        let traj = sample(99);
        let options = ExportOptions {
            stride: 10,
            progress_every: 0,
        };
        let job = ExportJob::spawn(traj.clone(), MemorySink::default(), options).expect("spawn");
        let (summary, sink) = job.join().expect("join");
        assert_eq!(summary.written, 10);
        assert_eq!(sink.into_trajectory(), traj.decimate(10));
    }

    #[test]
    fn test_for_frames() {
        let traj = sample(1199);
        let options = ExportOptions::for_frames(&traj, 600);
        assert_eq!(options.stride, 2);
    }

    #[test]
    fn test_events_and_status() {
        let options = ExportOptions {
            stride: 1,
            progress_every: 10,
        };
        let job = ExportJob::spawn(sample(49), MemorySink::default(), options).expect("spawn");
        let events = job.events().clone();
        let _ = job.join().expect("join");

        let received: Vec<ExportEvent> = events.try_iter().collect();
        assert_eq!(received.first(), Some(&ExportEvent::Started { total: 50 }));
        let progress = received
            .iter()
            .filter(|e| matches!(e, ExportEvent::Progress { .. }))
            .count();
        assert_eq!(progress, 5);
        assert!(matches!(received.last(), Some(ExportEvent::Completed(_))));
    }

    #[test]
    fn test_status_completed() {
        let job = ExportJob::spawn(sample(5), MemorySink::default(), ExportOptions::default())
            .expect("spawn");
        let events = job.events().clone();
        // Wait for the terminal event before inspecting status.
        while let Ok(event) = events.recv() {
            if matches!(event, ExportEvent::Completed(_)) {
                break;
            }
        }
        assert_eq!(job.status(), ExportStatus::Completed);
        assert!(job.join().is_ok());
    }

    #[test]
    fn test_json_lines_sink() {
        let traj = sample(2);
        let job = ExportJob::spawn(traj, JsonLinesSink::new(Vec::new()), ExportOptions::default())
            .expect("spawn");
        let (_, sink) = job.join().expect("join");
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["index"], 0);
        assert_eq!(first["x"], 0.1);
        assert_eq!(first["t"], 0.0);
    }

    /// Sink that writes one point per token received on `gate`.
    #[derive(Debug)]
    struct GatedSink {
        gate: Receiver<()>,
        written: Sender<usize>,
    }

    impl TrajectorySink for GatedSink {
        fn write_point(&mut self, index: usize, _point: &TrajectoryPoint) -> LorenzResult<()> {
            let _ = self.gate.recv();
            let _ = self.written.send(index);
            Ok(())
        }
    }

    #[test]
    fn test_cancel_stops_export() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let (ack_tx, ack_rx) = crossbeam_channel::unbounded();
        let sink = GatedSink {
            gate: gate_rx,
            written: ack_tx,
        };

        let job = ExportJob::spawn(sample(100), sink, ExportOptions::default()).expect("spawn");
        for _ in 0..3 {
            gate_tx.send(()).expect("gate");
            ack_rx.recv().expect("ack");
        }
        job.cancel();
        assert!(job.is_cancel_requested());
        drop(gate_tx);

        match job.join() {
            Err(LorenzError::ExportCancelled { written, total }) => {
                assert!((3..=4).contains(&written), "written = {written}");
                assert_eq!(total, 101);
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    /// Sink that fails on a given index.
    #[derive(Debug)]
    struct FailingSink {
        fail_at: usize,
    }

    impl TrajectorySink for FailingSink {
        fn write_point(&mut self, index: usize, _point: &TrajectoryPoint) -> LorenzResult<()> {
            if index == self.fail_at {
                return Err(LorenzError::export("disk full"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure() {
        let job = ExportJob::spawn(sample(10), FailingSink { fail_at: 4 }, ExportOptions::default())
            .expect("spawn");
        let events = job.events().clone();
        let err = job.join().unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(events
            .try_iter()
            .any(|e| matches!(e, ExportEvent::Failed(msg) if msg.contains("disk full"))));
    }

    #[test]
    fn test_snapshot_is_independent_of_live_simulation() {
        use crate::engine::simulation::Simulation;

        let mut sim = Simulation::builder().seed(5).build().expect("build");
        sim.advance(100).expect("advance");
        let job = ExportJob::spawn(sim.snapshot(), MemorySink::default(), ExportOptions::default())
            .expect("spawn");
        sim.advance(100).expect("advance");
        let (summary, _) = job.join().expect("join");
        assert_eq!(summary.written, 101);
        assert_eq!(sim.history().len(), 201);
    }
}
