use glam::{Mat4, Vec3};
use image::RgbImage;
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One tracked 3-D feature reported by the tracker in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureObservation {
    pub id: u32,
    pub position: Vec3,
    /// Stability score in [0, 1].
    pub confidence: f32,
}

impl FeatureObservation {
    pub fn new(id: u32, position: Vec3, confidence: f32) -> FeatureObservation {
        FeatureObservation {
            id,
            position,
            confidence,
        }
    }
}

/// Sensor pose relative to the world origin: unit quaternion plus translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub qx: f32,
    pub qy: f32,
    pub qz: f32,
    pub qw: f32,
    pub tx: f32,
    pub ty: f32,
    pub tz: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Pose::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        qx: 0.0,
        qy: 0.0,
        qz: 0.0,
        qw: 1.0,
        tx: 0.0,
        ty: 0.0,
        tz: 0.0,
    };

    pub fn new(rotation: [f32; 4], translation: [f32; 3]) -> Pose {
        let [qx, qy, qz, qw] = rotation;
        let [tx, ty, tz] = translation;
        Pose {
            qx,
            qy,
            qz,
            qw,
            tx,
            ty,
            tz,
        }
    }

    pub fn to_na_isometry3(&self) -> na::Isometry3<f64> {
        let q = na::Quaternion::new(
            self.qw as f64,
            self.qx as f64,
            self.qy as f64,
            self.qz as f64,
        );
        na::Isometry3::from_parts(
            na::Translation3::new(self.tx as f64, self.ty as f64, self.tz as f64),
            na::UnitQuaternion::from_quaternion(q),
        )
    }
}

/// Camera tracking state as reported by the tracker. Passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Tracking,
    Paused,
    Stopped,
}

/// Why tracking is degraded. `None` while tracking normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingFailureReason {
    #[default]
    None,
    BadState,
    InsufficientLight,
    ExcessiveMotion,
    InsufficientFeatures,
    CameraUnavailable,
}

/// Everything the tracker hands over for one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub timestamp_ns: i64,
    pub tracking_state: TrackingState,
    pub failure_reason: TrackingFailureReason,
    pub pose: Pose,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    /// Pixel size of the camera image, used when no image is attached.
    pub image_size: (u32, u32),
    pub observations: Vec<FeatureObservation>,
    pub image: Option<RgbImage>,
}

impl FrameSnapshot {
    /// Dimensions of the attached image, or the declared image size.
    pub fn image_dimensions(&self) -> (u32, u32) {
        match &self.image {
            Some(img) => img.dimensions(),
            None => self.image_size,
        }
    }
}

/// `<timestamp> <qx> <qy> <qz> <qw> <tx> <ty> <tz>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRecord {
    pub timestamp_ns: i64,
    pub pose: Pose,
}

impl fmt::Display for PoseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.pose;
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} ",
            self.timestamp_ns, p.qx, p.qy, p.qz, p.qw, p.tx, p.ty, p.tz
        )
    }
}

/// A point line in one of the two on-disk schemas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointRecord {
    /// `<x> <y> <z> <r> <g> <b>`, color in 0-255.
    Colored { position: Vec3, color: Vec3 },
    /// `<id:05> <x> <y> <z>`
    Compact { id: u32, position: Vec3 },
}

impl PointRecord {
    pub fn position(&self) -> Vec3 {
        match self {
            PointRecord::Colored { position, .. } | PointRecord::Compact { position, .. } => {
                *position
            }
        }
    }
}

impl fmt::Display for PointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRecord::Colored { position: p, color: c } => write!(
                f,
                "{:.6} {:.6} {:.6} {:.2} {:.2} {:.2} ",
                p.x, p.y, p.z, c.x, c.y, c.z
            ),
            PointRecord::Compact { id, position: p } => {
                write!(f, "{:05} {:.6} {:.6} {:.6} ", id, p.x, p.y, p.z)
            }
        }
    }
}
