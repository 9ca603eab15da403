pub mod frame;
pub mod keypoint;

pub use frame::{parse_pose, PoseReader};
pub use keypoint::{Keypoint, KeypointIndex, Pose};
