//! Per-frame driver: turns tracker snapshots into accumulated points and pose lines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{DVec2, Vec3};
use image::RgbImage;
use thiserror::Error;

use crate::accumulator::PointAccumulator;
use crate::config::{LoggerConfig, PointSchema};
use crate::io::{SessionSummary, write_session_report};
use crate::output::OutputDirectory;
use crate::projection::Projector;
use crate::streamer::{RecordStreamer, StreamError};
use crate::types::{FrameSnapshot, PoseRecord, TrackingFailureReason, TrackingState};

const NANOS_PER_SECOND: f64 = 1e9;

pub type StartFailureListener = Box<dyn Fn(&SessionError) + Send + Sync>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session is already recording")]
    AlreadyRecording,
    #[error("no session is recording")]
    NotRecording,
    #[error("cannot create output directory under {root}: {source}")]
    OutputDirectory {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("colored point schema needs a camera image")]
    MissingImage,
    #[error("camera image has zero size")]
    EmptyImage,
}

/// Last known tracker values, kept whether or not a session is recording.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackingStatus {
    pub feature_count: usize,
    pub tracking_state: Option<TrackingState>,
    pub failure_reason: Option<TrackingFailureReason>,
    /// Frames per second from the last two timestamps. `None` when undefined.
    pub update_rate: Option<f64>,
    pub last_timestamp_ns: Option<i64>,
}

/// Book-keeping of one active recording.
#[derive(Debug)]
pub struct Recording {
    streamer: Option<Arc<RecordStreamer>>,
    frames_recorded: u64,
    dropped_frames: u64,
    first_timestamp_ns: Option<i64>,
    last_timestamp_ns: Option<i64>,
}

impl Recording {
    fn new(streamer: Option<Arc<RecordStreamer>>) -> Recording {
        Recording {
            streamer,
            frames_recorded: 0,
            dropped_frames: 0,
            first_timestamp_ns: None,
            last_timestamp_ns: None,
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.streamer.as_ref().map(|s| s.directory())
    }

    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}

#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording(Recording),
}

/// `1e9 / (t_now - t_prev)`, or `None` without a previous frame or a positive delta.
pub fn update_rate(previous_ns: Option<i64>, current_ns: i64) -> Option<f64> {
    let delta = current_ns.checked_sub(previous_ns?)?;
    if delta <= 0 {
        return None;
    }
    Some(NANOS_PER_SECOND / delta as f64)
}

/// RGB at a projected pixel, 0-255 per channel. Pixels on the far image edge
/// are clamped onto the last row/column.
pub fn sample_color(image: &RgbImage, pixel: DVec2) -> Vec3 {
    let x = (pixel.x.max(0.0) as u32).min(image.width().saturating_sub(1));
    let y = (pixel.y.max(0.0) as u32).min(image.height().saturating_sub(1));
    let [r, g, b] = image.get_pixel(x, y).0;
    Vec3::new(r as f32, g as f32, b as f32)
}

/// Feeds the on-screen, confident observations of `frame` into `accumulator`.
/// Returns how many observations were accepted.
pub fn accumulate_frame(
    accumulator: &mut PointAccumulator,
    frame: &FrameSnapshot,
    schema: PointSchema,
    confidence_threshold: f32,
) -> Result<usize, FrameError> {
    let image = if schema.samples_color() {
        Some(frame.image.as_ref().ok_or(FrameError::MissingImage)?)
    } else {
        None
    };
    let (width, height) = frame.image_dimensions();
    if width == 0 || height == 0 {
        return Err(FrameError::EmptyImage);
    }
    let projector = Projector::new(&frame.view_matrix, &frame.projection_matrix, width, height);

    let mut accepted = 0;
    for obs in frame
        .observations
        .iter()
        .filter(|o| o.confidence >= confidence_threshold)
    {
        let Some(pixel) = projector.project(obs.position) else {
            continue;
        };
        let color = image.map(|img| sample_color(img, pixel));
        accumulator.append_or_update(obs.id, obs.position, color);
        accepted += 1;
    }
    Ok(accepted)
}

pub struct FrameUpdateOrchestrator {
    config: LoggerConfig,
    state: SessionState,
    accumulator: PointAccumulator,
    status: TrackingStatus,
    previous_timestamp_ns: Option<i64>,
    start_failure_listener: Option<StartFailureListener>,
}

impl FrameUpdateOrchestrator {
    pub fn new(config: LoggerConfig) -> FrameUpdateOrchestrator {
        FrameUpdateOrchestrator {
            config,
            state: SessionState::Idle,
            accumulator: PointAccumulator::new(),
            status: TrackingStatus::default(),
            previous_timestamp_ns: None,
            start_failure_listener: None,
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording(_))
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn accumulator(&self) -> &PointAccumulator {
        &self.accumulator
    }

    /// Shared handle to the active streamer, for contexts that must be able to
    /// close it independently of the frame path.
    pub fn streamer(&self) -> Option<Arc<RecordStreamer>> {
        match &self.state {
            SessionState::Recording(r) => r.streamer.clone(),
            SessionState::Idle => None,
        }
    }

    /// Called with the error whenever `start` fails on I/O.
    pub fn set_start_failure_listener<F>(&mut self, listener: F)
    where
        F: Fn(&SessionError) + Send + Sync + 'static,
    {
        self.start_failure_listener = Some(Box::new(listener));
    }

    /// Idle -> Recording. With `output_root` a fresh session directory is
    /// created under it and returned; without one nothing is written to disk.
    pub fn start(&mut self, output_root: Option<&Path>) -> Result<Option<PathBuf>, SessionError> {
        if self.is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        let streamer = match output_root {
            None => None,
            Some(root) => match self.open_streamer(root) {
                Ok(streamer) => Some(Arc::new(streamer)),
                Err(e) => {
                    log::error!("cannot start recording: {}", e);
                    if let Some(listener) = &self.start_failure_listener {
                        listener(&e);
                    }
                    return Err(e);
                }
            },
        };
        let directory = streamer.as_ref().map(|s| s.directory().to_path_buf());
        self.accumulator.clear();
        self.state = SessionState::Recording(Recording::new(streamer));
        match &directory {
            Some(dir) => log::info!("recording starts in {}", dir.display()),
            None => log::info!("recording starts without output files"),
        }
        Ok(directory)
    }

    fn open_streamer(&self, root: &Path) -> Result<RecordStreamer, SessionError> {
        let directory = OutputDirectory::create(root, &self.config.output_prefix).map_err(
            |source| SessionError::OutputDirectory {
                root: root.to_path_buf(),
                source,
            },
        )?;
        match RecordStreamer::open(directory.path(), self.config.point_schema) {
            Ok(streamer) => Ok(streamer),
            Err(e) => {
                let path = directory.path().to_path_buf();
                if let Err(rm) = directory.remove() {
                    log::warn!("cannot remove {}: {}", path.display(), rm);
                }
                Err(e.into())
            }
        }
    }

    /// Recording -> Idle. Flushes every accumulated point, closes the files and
    /// writes the session report. I/O failures here are logged, not returned.
    pub fn stop(&mut self) -> Result<SessionSummary, SessionError> {
        let recording = match std::mem::take(&mut self.state) {
            SessionState::Recording(recording) => recording,
            SessionState::Idle => return Err(SessionError::NotRecording),
        };
        let schema = self.config.point_schema;
        let mut points_written = 0;
        if let Some(streamer) = &recording.streamer {
            if schema.tracks_points() {
                let records = self
                    .accumulator
                    .snapshot()
                    .filter_map(|p| p.to_record(schema));
                match streamer.write_points(records) {
                    Ok(n) => points_written = n,
                    Err(e) => log::error!("writing point snapshot failed: {}", e),
                }
            }
            if let Err(e) = streamer.close() {
                log::error!("closing record files failed: {}", e);
            }
        }

        let summary = SessionSummary {
            directory: recording.directory().map(Path::to_path_buf),
            point_schema: schema,
            frames_recorded: recording.frames_recorded,
            dropped_frames: recording.dropped_frames,
            feature_count: self.accumulator.feature_count(),
            points_written,
            first_timestamp_ns: recording.first_timestamp_ns,
            last_timestamp_ns: recording.last_timestamp_ns,
        };
        if let Some(dir) = &summary.directory {
            if let Err(e) = write_session_report(dir, &summary) {
                log::warn!("cannot write session report: {}", e);
            }
        }
        self.accumulator.clear();
        log::info!(
            "recording stops: {} frames, {} points",
            summary.frames_recorded,
            summary.feature_count
        );
        Ok(summary)
    }

    /// Handles one tracker update. Never fails: per-frame problems are logged
    /// and only drop that frame's output.
    pub fn on_frame(&mut self, frame: &FrameSnapshot) {
        let rate = update_rate(self.previous_timestamp_ns, frame.timestamp_ns);
        self.previous_timestamp_ns = Some(frame.timestamp_ns);

        let schema = self.config.point_schema;
        let threshold = self.config.confidence_threshold;
        if let SessionState::Recording(recording) = &mut self.state {
            recording.first_timestamp_ns.get_or_insert(frame.timestamp_ns);
            recording.last_timestamp_ns = Some(frame.timestamp_ns);

            if schema.tracks_points() {
                match accumulate_frame(&mut self.accumulator, frame, schema, threshold) {
                    Ok(n) => log::trace!("frame {}: {} points accepted", frame.timestamp_ns, n),
                    Err(e) => log::debug!("frame {}: points skipped: {}", frame.timestamp_ns, e),
                }
            }

            match &recording.streamer {
                Some(streamer) => {
                    let record = PoseRecord {
                        timestamp_ns: frame.timestamp_ns,
                        pose: frame.pose,
                    };
                    match streamer.write_pose(&record) {
                        Ok(()) => recording.frames_recorded += 1,
                        Err(e) => {
                            recording.dropped_frames += 1;
                            log::warn!("frame {}: pose dropped: {}", frame.timestamp_ns, e);
                        }
                    }
                }
                None => recording.frames_recorded += 1,
            }
        }

        self.status = TrackingStatus {
            feature_count: self.accumulator.feature_count(),
            tracking_state: Some(frame.tracking_state),
            failure_reason: Some(frame.failure_reason),
            update_rate: rate,
            last_timestamp_ns: Some(frame.timestamp_ns),
        };
    }
}

impl Drop for FrameUpdateOrchestrator {
    fn drop(&mut self) {
        if self.is_recording() {
            log::warn!("orchestrator dropped while recording, stopping session");
            if let Err(e) = self.stop() {
                log::error!("stopping session on drop failed: {}", e);
            }
        }
    }
}
