pub type CalibError = cvkit_core::Error;
pub type Result<T> = cvkit_core::Result<T>;

pub mod project;
pub use project::{project_points, project_points_with_distortion};

pub mod distortion;
pub use distortion::{init_undistort_rectify_map, undistort_image, undistort_points};

pub mod homography;
pub use homography::{apply_homography, find_homography, find_homography_ransac};

pub mod calibration;
pub use calibration::{
    calibrate_camera_planar, generate_chessboard_object_points, CameraCalibrationResult,
};
