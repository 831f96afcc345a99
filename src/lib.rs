pub use cvkit_calib3d as calib3d;
pub use cvkit_cloud as cloud;
pub use cvkit_core as core;
pub use cvkit_dnn as dnn;
pub use cvkit_imgproc as imgproc;
pub use cvkit_io as io;
pub use cvkit_ml as ml;
pub use cvkit_stereo as stereo;
pub use cvkit_transform as transform;
pub use cvkit_video as video;

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup before running heavy workloads.
/// Repeated calls are idempotent and return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `CVKIT_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> Result<(), String> {
    cvkit_core::init_global_thread_pool(num_threads)
}
