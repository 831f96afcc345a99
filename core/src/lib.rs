pub mod camera;
pub mod keypoint;
pub mod point_cloud;
pub mod robust;
pub mod runtime;

pub use camera::*;
pub use keypoint::*;
pub use point_cloud::*;
pub use robust::*;
pub use runtime::{current_cpu_threads, init_global_thread_pool};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Algorithm error: {0}")]
    AlgorithmError(String),

    #[error("Did not converge: {0}")]
    NotConverged(String),
}
