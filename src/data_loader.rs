use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use glob::{Pattern, glob};
use image::ImageReader;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PointSchema;
use crate::projection::CameraIntrinsics;
use crate::types::{
    FeatureObservation, FrameSnapshot, PointRecord, Pose, PoseRecord, TrackingFailureReason,
    TrackingState,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{path}: frame has neither projection_matrix nor intrinsics")]
    MissingProjection { path: PathBuf },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

fn parse_fields<const N: usize>(fields: &[&str]) -> Result<[f32; N], String> {
    let mut out = [0.0f32; N];
    for (o, f) in out.iter_mut().zip(fields) {
        *o = f.parse().map_err(|_| format!("bad number {:?}", f))?;
    }
    Ok(out)
}

/// Parses one `<timestamp> <qx> <qy> <qz> <qw> <tx> <ty> <tz>` line.
pub fn parse_pose_line(line: &str) -> Result<PoseRecord, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 8 {
        return Err(format!("expected 8 fields, found {}", fields.len()));
    }
    let timestamp_ns = fields[0]
        .parse()
        .map_err(|_| format!("bad timestamp {:?}", fields[0]))?;
    let [qx, qy, qz, qw, tx, ty, tz] = parse_fields::<7>(&fields[1..])?;
    Ok(PoseRecord {
        timestamp_ns,
        pose: Pose::new([qx, qy, qz, qw], [tx, ty, tz]),
    })
}

/// Parses one point line of the given schema.
pub fn parse_point_line(line: &str, schema: PointSchema) -> Result<PointRecord, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match schema {
        PointSchema::Colored => {
            if fields.len() != 6 {
                return Err(format!("expected 6 fields, found {}", fields.len()));
            }
            let [x, y, z, r, g, b] = parse_fields::<6>(&fields)?;
            Ok(PointRecord::Colored {
                position: Vec3::new(x, y, z),
                color: Vec3::new(r, g, b),
            })
        }
        PointSchema::Compact => {
            if fields.len() != 4 {
                return Err(format!("expected 4 fields, found {}", fields.len()));
            }
            let id = fields[0]
                .parse()
                .map_err(|_| format!("bad id {:?}", fields[0]))?;
            let [x, y, z] = parse_fields::<3>(&fields[1..])?;
            Ok(PointRecord::Compact {
                id,
                position: Vec3::new(x, y, z),
            })
        }
        PointSchema::Disabled => Err("point schema is disabled".to_string()),
    }
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_lines<T, F>(path: &Path, parse: F) -> Result<Vec<T>, LoadError>
where
    F: Fn(&str) -> Result<T, String>,
{
    let contents = read_to_string(path)?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            parse(line).map_err(|message| LoadError::Parse {
                path: path.to_path_buf(),
                line: i + 1,
                message,
            })
        })
        .collect()
}

/// Loads a recorded pose file.
pub fn load_poses<P: AsRef<Path>>(path: P) -> Result<Vec<PoseRecord>, LoadError> {
    parse_lines(path.as_ref(), parse_pose_line)
}

/// Loads a recorded point file written with `schema`.
pub fn load_points<P: AsRef<Path>>(
    path: P,
    schema: PointSchema,
) -> Result<Vec<PointRecord>, LoadError> {
    parse_lines(path.as_ref(), |line| parse_point_line(line, schema))
}

/// On-disk form of a replay frame.
#[derive(Deserialize)]
struct FrameFile {
    timestamp_ns: i64,
    tracking_state: TrackingState,
    #[serde(default)]
    failure_reason: TrackingFailureReason,
    pose: Pose,
    #[serde(default = "identity")]
    view_matrix: Mat4,
    projection_matrix: Option<Mat4>,
    intrinsics: Option<CameraIntrinsics>,
    image_size: Option<(u32, u32)>,
    #[serde(default)]
    observations: Vec<FeatureObservation>,
    /// Image file relative to the frame directory.
    image: Option<String>,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

fn load_frame_file(
    dir: &Path,
    path: &Path,
    near: f32,
    far: f32,
) -> Result<FrameSnapshot, LoadError> {
    let contents = read_to_string(path)?;
    let frame: FrameFile = serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let projection_matrix = match (frame.projection_matrix, &frame.intrinsics) {
        (Some(m), _) => m,
        (None, Some(k)) => k.projection_matrix(near, far),
        (None, None) => {
            return Err(LoadError::MissingProjection {
                path: path.to_path_buf(),
            });
        }
    };
    let image = match &frame.image {
        Some(name) => {
            let img_path = dir.join(name);
            let img = ImageReader::open(&img_path)
                .map_err(|source| LoadError::Io {
                    path: img_path.clone(),
                    source,
                })?
                .decode()
                .map_err(|source| LoadError::Image {
                    path: img_path.clone(),
                    source,
                })?;
            Some(img.to_rgb8())
        }
        None => None,
    };
    let image_size = frame
        .image_size
        .or_else(|| image.as_ref().map(|img| img.dimensions()))
        .or_else(|| frame.intrinsics.map(|k| (k.width, k.height)))
        .unwrap_or((0, 0));
    Ok(FrameSnapshot {
        timestamp_ns: frame.timestamp_ns,
        tracking_state: frame.tracking_state,
        failure_reason: frame.failure_reason,
        pose: frame.pose,
        view_matrix: frame.view_matrix,
        projection_matrix,
        image_size,
        observations: frame.observations,
        image,
    })
}

/// Lists the `*.json` replay frames of a directory, sorted by file name.
pub fn replay_frame_paths<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, LoadError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LoadError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    let pattern = format!("{}/*.json", Pattern::escape(&dir.to_string_lossy()));
    let mut paths = glob(&pattern)?
        .map(|entry| {
            entry.map_err(|e| LoadError::Io {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })
        })
        .collect::<Result<Vec<PathBuf>, _>>()?;
    paths.sort();
    Ok(paths)
}

/// Loads every replay frame of `dir`, ordered by timestamp. Frames that only
/// carry intrinsics get a projection built with the given clip planes.
pub fn load_replay_frames<P: AsRef<Path>>(
    dir: P,
    near: f32,
    far: f32,
) -> Result<Vec<FrameSnapshot>, LoadError> {
    let dir = dir.as_ref();
    let mut frames = replay_frame_paths(dir)?
        .iter()
        .map(|path| load_frame_file(dir, path, near, far))
        .collect::<Result<Vec<_>, _>>()?;
    frames.sort_by_key(|f| f.timestamp_ns);
    log::trace!("loaded {} replay frames from {}", frames.len(), dir.display());
    Ok(frames)
}
