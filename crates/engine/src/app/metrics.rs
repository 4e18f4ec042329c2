use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Loop health as of the last published interval. Totals cover the whole
/// session; `sim_speed` and `frame_time_ms` cover the interval only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub total_ticks: u64,
    pub total_frames: u64,
    pub simulated_seconds: f64,
    /// Simulated seconds per wall-clock second. Far above 1.0 when the loop is
    /// not paced.
    pub sim_speed: f32,
    pub frame_time_ms: f32,
    pub clamped_frames: u64,
}

/// Read side shared with whoever wants to watch the loop.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// Emits one snapshot per `interval` of simulated time, so paced and
/// unpaced runs report at the same points of the session.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    interval_wall_start: Instant,
    interval_simulated: Duration,
    interval_frames: u32,
    interval_frame_time: Duration,
    totals: LoopMetricsSnapshot,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            interval_wall_start: now,
            interval_simulated: Duration::ZERO,
            interval_frames: 0,
            interval_frame_time: Duration::ZERO,
            totals: LoopMetricsSnapshot::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.interval_frames = self.interval_frames.saturating_add(1);
        self.interval_frame_time = self.interval_frame_time.saturating_add(frame_dt);
        self.totals.total_frames = self.totals.total_frames.saturating_add(1);
    }

    pub(crate) fn record_tick(&mut self, fixed_dt: Duration) {
        self.interval_simulated = self.interval_simulated.saturating_add(fixed_dt);
        self.totals.total_ticks = self.totals.total_ticks.saturating_add(1);
        self.totals.simulated_seconds += fixed_dt.as_secs_f64();
    }

    pub(crate) fn record_clamp(&mut self) {
        self.totals.clamped_frames = self.totals.clamped_frames.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        if self.interval_simulated < self.interval {
            return None;
        }

        let wall_seconds = now
            .saturating_duration_since(self.interval_wall_start)
            .as_secs_f32()
            .max(f32::EPSILON);
        let frame_time_ms = if self.interval_frames == 0 {
            0.0
        } else {
            self.interval_frame_time.as_secs_f32() * 1000.0 / self.interval_frames as f32
        };
        let snapshot = LoopMetricsSnapshot {
            sim_speed: self.interval_simulated.as_secs_f32() / wall_seconds,
            frame_time_ms,
            ..self.totals
        };

        self.interval_wall_start = now;
        self.interval_simulated = Duration::ZERO;
        self.interval_frames = 0;
        self.interval_frame_time = Duration::ZERO;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn snapshot_waits_for_a_full_simulated_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        for _ in 0..3 {
            accumulator.record_tick(Duration::from_millis(250));
        }
        accumulator.record_frame(Duration::from_millis(4));
        assert!(accumulator
            .maybe_snapshot(base + Duration::from_secs(10))
            .is_none());

        accumulator.record_tick(Duration::from_millis(250));
        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_millis(500))
            .expect("interval complete");
        assert_eq!(snapshot.total_ticks, 4);
        assert_eq!(snapshot.total_frames, 1);
        assert!((snapshot.simulated_seconds - 1.0).abs() < 1e-9);
        assert!((snapshot.sim_speed - 2.0).abs() < 1e-3);
        assert!((snapshot.frame_time_ms - 4.0).abs() < 1e-3);
    }

    #[test]
    fn totals_survive_interval_resets() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_millis(500), base);
        accumulator.record_tick(Duration::from_millis(500));
        accumulator.record_clamp();
        accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("first");

        accumulator.record_tick(Duration::from_millis(500));
        let second = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second");
        assert_eq!(second.total_ticks, 2);
        assert_eq!(second.clamped_frames, 1);
        assert_eq!(second.frame_time_ms, 0.0);
    }

    #[test]
    fn handle_survives_a_poisoned_lock() {
        let handle = MetricsHandle::default();
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = handle.snapshot.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });

        handle.publish(LoopMetricsSnapshot {
            total_ticks: 60,
            ..LoopMetricsSnapshot::default()
        });
        assert_eq!(handle.snapshot().total_ticks, 60);
    }
}
