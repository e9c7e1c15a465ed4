use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::config::PointSchema;

pub const REPORT_FILE_NAME: &str = "session.json";

/// Serializes an object to a pretty JSON file.
pub fn object_to_json<T: Serialize, P: AsRef<Path>>(output_path: P, object: &T) -> std::io::Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    file.write_all(b"\n")
}

/// Deserializes an object from a JSON file. Malformed JSON is reported as `InvalidData`.
pub fn object_from_json<T: DeserializeOwned, P: AsRef<Path>>(file_path: P) -> std::io::Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct SessionSummary {
    pub directory: Option<PathBuf>,
    pub point_schema: PointSchema,
    pub frames_recorded: u64,
    pub dropped_frames: u64,
    pub feature_count: usize,
    pub points_written: usize,
    pub first_timestamp_ns: Option<i64>,
    pub last_timestamp_ns: Option<i64>,
}

/// Writes `session.json` next to the record files.
pub fn write_session_report(directory: &Path, summary: &SessionSummary) -> std::io::Result<PathBuf> {
    let path = directory.join(REPORT_FILE_NAME);
    object_to_json(&path, summary)?;
    Ok(path)
}
