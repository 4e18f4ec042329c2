use std::process::ExitCode;

use engine::{run_headless, AppError, MetricsHandle, RunSummary};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let metrics = MetricsHandle::default();
    match run_session(&mut app, &metrics) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_session(app: &mut AppWiring, metrics: &MetricsHandle) -> Result<RunSummary, AppError> {
    let summary = run_headless(&app.config, &mut app.game, &mut app.input, metrics)?;
    let loop_metrics = metrics.snapshot();
    info!(
        ticks = loop_metrics.total_ticks,
        frames = loop_metrics.total_frames,
        sim_seconds = loop_metrics.simulated_seconds,
        sim_speed = loop_metrics.sim_speed,
        frame_time_ms = loop_metrics.frame_time_ms,
        clamped_frames = loop_metrics.clamped_frames,
        "loop_metrics"
    );
    info!(
        phase = %app.game.phase(),
        encounter = app.game.encounter_status().as_token(),
        quit_requested = summary.quit_requested,
        "night_over"
    );
    Ok(summary)
}
