pub mod accumulator;
pub mod config;
pub mod data_loader;
pub mod io;
pub mod output;
pub mod projection;
pub mod session;
pub mod streamer;
pub mod types;
pub mod util;

pub use accumulator::{AccumulatedPoint, PointAccumulator};
pub use config::{LoggerConfig, PointSchema};
pub use projection::{CameraIntrinsics, Projector, project};
pub use session::{FrameUpdateOrchestrator, SessionError, SessionState, TrackingStatus};
pub use streamer::{RecordStreamer, StreamError};
pub use types::{FeatureObservation, FrameSnapshot, PointRecord, Pose, PoseRecord};
