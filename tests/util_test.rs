use approx::assert_abs_diff_eq;
use ar_data_logger::output::OutputDirectory;
use ar_data_logger::types::{Pose, PoseRecord};
use ar_data_logger::util::{TrajectoryStats, format_elapsed};
use std::f32::consts::FRAC_1_SQRT_2;
use tempfile::TempDir;

#[test]
fn test_format_elapsed() {
    assert_eq!(format_elapsed(0), "00:00:00");
    assert_eq!(format_elapsed(59), "00:00:59");
    assert_eq!(format_elapsed(3725), "01:02:05");
    assert_eq!(format_elapsed(100 * 3600), "100:00:00");
}

#[test]
fn test_trajectory_stats() {
    let poses = vec![
        PoseRecord {
            timestamp_ns: 0,
            pose: Pose::IDENTITY,
        },
        PoseRecord {
            timestamp_ns: 500_000_000,
            pose: Pose::new([0.0, 0.0, 0.0, 1.0], [3.0, 4.0, 0.0]),
        },
        PoseRecord {
            timestamp_ns: 1_000_000_000,
            // 90 degrees about z
            pose: Pose::new([0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2], [3.0, 4.0, 1.0]),
        },
    ];
    let stats = TrajectoryStats::from_poses(&poses);
    assert_eq!(stats.frame_count, 3);
    assert_abs_diff_eq!(stats.duration_sec, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stats.mean_rate_hz.unwrap(), 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stats.path_length, 6.0, epsilon = 1e-6);
    assert_abs_diff_eq!(stats.rotation_travelled, std::f64::consts::FRAC_PI_2, epsilon = 1e-5);
}

#[test]
fn test_trajectory_stats_degenerate() {
    assert_eq!(TrajectoryStats::from_poses(&[]), TrajectoryStats::default());
    let single = TrajectoryStats::from_poses(&[PoseRecord {
        timestamp_ns: 5,
        pose: Pose::IDENTITY,
    }]);
    assert_eq!(single.frame_count, 1);
    assert_eq!(single.mean_rate_hz, None);
}

#[test]
fn test_output_directory_is_unique() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("sessions");
    let a = OutputDirectory::create_with_stamp(&root, "R_ARCore", "20240101120000").unwrap();
    let b = OutputDirectory::create_with_stamp(&root, "R_ARCore", "20240101120000").unwrap();
    assert_eq!(a.path(), root.join("R_ARCore_20240101120000"));
    assert_eq!(b.path(), root.join("R_ARCore_20240101120000_1"));
    assert!(b.into_path().is_dir());

    let now = OutputDirectory::create(&root, "R_ARCore").unwrap();
    let name = now.path().file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("R_ARCore_"));
    assert_eq!(name.len(), "R_ARCore_".len() + 14);
}

#[test]
fn test_remove_output_directory() {
    let temp_dir = TempDir::new().unwrap();
    let dir = OutputDirectory::create_with_stamp(temp_dir.path(), "R_ARCore", "20240101120000").unwrap();
    let path = dir.path().to_path_buf();
    std::fs::write(path.join("sensor_pose.txt"), "partial").unwrap();
    dir.remove().unwrap();
    assert!(!path.exists());
    assert!(temp_dir.path().is_dir());
}

#[test]
fn test_stats_span_full_timestamp_range() {
    let poses = vec![
        PoseRecord {
            timestamp_ns: i64::MIN,
            pose: Pose::IDENTITY,
        },
        PoseRecord {
            timestamp_ns: i64::MAX,
            pose: Pose::IDENTITY,
        },
    ];
    let stats = TrajectoryStats::from_poses(&poses);
    assert!(stats.duration_sec > 1.8e10);
    assert!(stats.mean_rate_hz.unwrap() > 0.0);
}
