mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{ActionStates, InputAction, InputSnapshot, KeyCode};
pub use loop_runner::{run_headless, AppError, InputSource, LoopConfig, RunSummary};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use scene::{lerp, smoothstep, Aabb, CameraPose, Scene, SceneCommand, Transform3, Vec3};
