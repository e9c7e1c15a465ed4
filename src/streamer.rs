//! Append-only text writers for pose and point records.
//!
//! One [`RecordStreamer`] owns both channels of a session behind a single lock,
//! so a stop request racing a frame write either waits for the line to land or
//! finds the streamer closed. Each record is fully encoded before any byte is
//! handed to the writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::config::PointSchema;
use crate::types::{PointRecord, PoseRecord};

pub const POSE_FILE_NAME: &str = "sensor_pose.txt";
pub const POINT_FILE_NAME: &str = "point_cloud.txt";

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record streamer is closed")]
    Closed,
    #[error("no point channel for the {0:?} schema")]
    NoPointChannel(PointSchema),
    #[error("point record does not match the {0:?} schema")]
    SchemaMismatch(PointSchema),
}

#[derive(Debug)]
struct Channels {
    pose: BufWriter<File>,
    point: Option<BufWriter<File>>,
}

impl Channels {
    fn flush(&mut self) -> std::io::Result<()> {
        self.pose.flush()?;
        if let Some(point) = self.point.as_mut() {
            point.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordStreamer {
    directory: PathBuf,
    schema: PointSchema,
    channels: Mutex<Option<Channels>>,
}

fn create_writer(path: PathBuf) -> Result<BufWriter<File>, StreamError> {
    match File::create(&path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(source) => Err(StreamError::Open { path, source }),
    }
}

impl RecordStreamer {
    /// Creates the record files inside an existing `directory`.
    /// The point file is only created when `schema` tracks points.
    pub fn open<P: AsRef<Path>>(directory: P, schema: PointSchema) -> Result<RecordStreamer, StreamError> {
        let directory = directory.as_ref().to_path_buf();
        let pose = create_writer(directory.join(POSE_FILE_NAME))?;
        let point = if schema.tracks_points() {
            Some(create_writer(directory.join(POINT_FILE_NAME))?)
        } else {
            None
        };
        log::debug!("opened record streamer in {}", directory.display());
        Ok(RecordStreamer {
            directory,
            schema,
            channels: Mutex::new(Some(Channels { pose, point })),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn schema(&self) -> PointSchema {
        self.schema
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    pub fn write_pose(&self, record: &PoseRecord) -> Result<(), StreamError> {
        let line = format!("{record}\n");
        let mut guard = self.lock();
        let channels = guard.as_mut().ok_or(StreamError::Closed)?;
        channels.pose.write_all(line.as_bytes())?;
        Ok(())
    }

    pub fn write_point(&self, record: &PointRecord) -> Result<(), StreamError> {
        self.write_points(std::iter::once(*record)).map(|_| ())
    }

    /// Writes a batch of point records under one lock acquisition.
    /// The whole batch is rejected if any record has the wrong schema.
    /// Returns how many lines were written.
    pub fn write_points<I>(&self, records: I) -> Result<usize, StreamError>
    where
        I: IntoIterator<Item = PointRecord>,
    {
        let mut batch = String::new();
        let mut count = 0;
        for record in records {
            if !self.accepts(&record) {
                return Err(StreamError::SchemaMismatch(self.schema));
            }
            batch.push_str(&format!("{record}\n"));
            count += 1;
        }

        let mut guard = self.lock();
        let channels = guard.as_mut().ok_or(StreamError::Closed)?;
        let writer = channels
            .point
            .as_mut()
            .ok_or(StreamError::NoPointChannel(self.schema))?;
        writer.write_all(batch.as_bytes())?;
        Ok(count)
    }

    /// Flushes and releases both files. Any later write fails with `Closed`.
    pub fn close(&self) -> Result<(), StreamError> {
        let mut guard = self.lock();
        let mut channels = guard.take().ok_or(StreamError::Closed)?;
        channels.flush()?;
        log::debug!("closed record streamer in {}", self.directory.display());
        Ok(())
    }

    fn accepts(&self, record: &PointRecord) -> bool {
        matches!(
            (self.schema, record),
            (PointSchema::Colored, PointRecord::Colored { .. })
                | (PointSchema::Compact, PointRecord::Compact { .. })
        )
    }

    fn lock(&self) -> MutexGuard<'_, Option<Channels>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
