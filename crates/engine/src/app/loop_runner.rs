use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::StartupError;

use super::metrics::MetricsAccumulator;
use super::{InputSnapshot, MetricsHandle, Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// Pace frames against the wall clock instead of stepping as fast as possible.
    pub realtime: bool,
    pub max_frames: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            realtime: false,
            max_frames: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("invalid loop configuration: {0}")]
    InvalidConfig(String),
}

/// Supplies one input snapshot per rendered frame. Returning `None` ends the
/// session.
pub trait InputSource {
    fn next_frame(&mut self, frame_index: u64) -> Option<InputSnapshot>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub simulated_seconds: f64,
    pub quit_requested: bool,
}

pub fn run_headless(
    config: &LoopConfig,
    scene: &mut dyn Scene,
    input: &mut dyn InputSource,
    metrics_handle: &MetricsHandle,
) -> Result<RunSummary, AppError> {
    if config.target_tps == 0 {
        return Err(AppError::InvalidConfig(
            "target_tps must be greater than zero".to_string(),
        ));
    }
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / config.target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        realtime = config.realtime,
        "loop_config"
    );

    scene.load();

    let mut summary = RunSummary::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, last_frame_instant);

    'frames: loop {
        if config
            .max_frames
            .is_some_and(|max_frames| summary.frames >= max_frames)
        {
            break;
        }
        let Some(frame_input) = input.next_frame(summary.frames) else {
            break;
        };

        let now = Instant::now();
        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
        last_frame_instant = now;
        let frame_dt = if config.realtime {
            clamp_frame_delta(raw_frame_dt, max_frame_delta)
        } else {
            fixed_dt
        };

        accumulator = accumulator.saturating_add(frame_dt);
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        accumulator = step_plan.remaining_accumulator;
        if !step_plan.dropped_backlog.is_zero() {
            metrics_accumulator.record_clamp();
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        // Edges belong to the first tick of the frame only.
        let empty = InputSnapshot::empty();
        for tick_index in 0..step_plan.ticks_to_run {
            let tick_input = if tick_index == 0 { &frame_input } else { &empty };
            let command = scene.update(fixed_dt_seconds, tick_input);
            summary.ticks = summary.ticks.saturating_add(1);
            summary.simulated_seconds += f64::from(fixed_dt_seconds);
            metrics_accumulator.record_tick(fixed_dt);
            if command == SceneCommand::Quit || tick_input.quit_requested() {
                info!(reason = "scene_quit", "shutdown_requested");
                summary.quit_requested = true;
                summary.frames = summary.frames.saturating_add(1);
                break 'frames;
            }
        }

        summary.frames = summary.frames.saturating_add(1);
        metrics_accumulator.record_frame(raw_frame_dt);
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            debug!(
                ticks = snapshot.total_ticks,
                sim_speed = snapshot.sim_speed,
                frame_time_ms = snapshot.frame_time_ms,
                sim_seconds = snapshot.simulated_seconds,
                "loop_metrics"
            );
            if let Some(title) = scene.debug_title() {
                debug!(title = %title, "scene_title");
            }
        }

        if config.realtime {
            let elapsed = last_frame_instant.elapsed();
            if elapsed < fixed_dt {
                thread::sleep(fixed_dt - elapsed);
            }
        }
    }

    scene.unload();
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        simulated_seconds = summary.simulated_seconds,
        "session_finished"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
