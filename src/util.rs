use serde::Serialize;

use crate::types::PoseRecord;

/// `HH:MM:SS` for a recording timer.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Summary numbers of a recorded trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrajectoryStats {
    pub frame_count: usize,
    pub duration_sec: f64,
    pub mean_rate_hz: Option<f64>,
    /// Sum of translation steps between consecutive poses, in meters.
    pub path_length: f64,
    /// Sum of rotation angles between consecutive poses, in radians.
    pub rotation_travelled: f64,
}

impl TrajectoryStats {
    pub fn from_poses(poses: &[PoseRecord]) -> TrajectoryStats {
        let (Some(first), Some(last)) = (poses.first(), poses.last()) else {
            return TrajectoryStats::default();
        };
        let duration_sec = (last.timestamp_ns as i128 - first.timestamp_ns as i128) as f64 * 1e-9;
        let mean_rate_hz = if duration_sec > 0.0 {
            Some((poses.len() - 1) as f64 / duration_sec)
        } else {
            None
        };

        let isometries: Vec<_> = poses.iter().map(|p| p.pose.to_na_isometry3()).collect();
        let (path_length, rotation_travelled) = isometries
            .windows(2)
            .map(|w| {
                let step = (w[1].translation.vector - w[0].translation.vector).norm();
                let turn = w[0].rotation.angle_to(&w[1].rotation);
                (step, turn)
            })
            .fold((0.0, 0.0), |(l, r), (s, t)| (l + s, r + t));

        TrajectoryStats {
            frame_count: poses.len(),
            duration_sec,
            mean_rate_hz,
            path_length,
            rotation_travelled,
        }
    }
}
