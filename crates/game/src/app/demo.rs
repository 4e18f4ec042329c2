use engine::{InputSnapshot, InputSource, KeyCode};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    NewGame,
    Press(KeyCode),
    Release(KeyCode),
    Save,
    Load,
}

/// Seconds into the session paired with what the player does then.
const OPENING: [(f32, Step); 14] = [
    (0.5, Step::NewGame),
    (2.0, Step::Press(KeyCode::Space)),
    (3.0, Step::Press(KeyCode::KeyE)),
    (4.0, Step::Press(KeyCode::KeyW)),
    (5.0, Step::Release(KeyCode::KeyW)),
    (6.0, Step::Press(KeyCode::KeyE)),
    (8.0, Step::Save),
    (9.0, Step::Press(KeyCode::KeyD)),
    (9.5, Step::Release(KeyCode::KeyD)),
    (10.0, Step::Press(KeyCode::KeyE)),
    (12.0, Step::Load),
    (13.0, Step::Press(KeyCode::KeyE)),
    (14.0, Step::Press(KeyCode::KeyS)),
    (14.5, Step::Release(KeyCode::KeyS)),
];
const LATER_INTERACT_EVERY_SECONDS: f32 = 30.0;

/// Deterministic input feed for the headless binary: a short opening script
/// followed by a periodic interact press until the session length runs out.
#[derive(Debug, Clone)]
pub(crate) struct DemoInput {
    script: Vec<(u64, Step)>,
    interact_every_frames: u64,
    total_frames: u64,
}

impl DemoInput {
    pub(crate) fn new(frames_per_second: u32, session_seconds: f32) -> Self {
        let fps = frames_per_second.max(1) as f32;
        let to_frame = |seconds: f32| (seconds * fps).round() as u64;
        Self {
            script: OPENING
                .iter()
                .map(|(seconds, step)| (to_frame(*seconds), *step))
                .collect(),
            interact_every_frames: to_frame(LATER_INTERACT_EVERY_SECONDS).max(1),
            total_frames: to_frame(session_seconds),
        }
    }

    fn steps_at(&self, frame_index: u64) -> impl Iterator<Item = Step> + '_ {
        let scripted_until = self.script.last().map(|(frame, _)| *frame).unwrap_or(0);
        let periodic = (frame_index > scripted_until
            && frame_index % self.interact_every_frames == 0)
            .then_some(Step::Press(KeyCode::KeyE));
        self.script
            .iter()
            .filter(move |(frame, _)| *frame == frame_index)
            .map(|(_, step)| *step)
            .chain(periodic)
    }
}

impl InputSource for DemoInput {
    fn next_frame(&mut self, frame_index: u64) -> Option<InputSnapshot> {
        if frame_index >= self.total_frames {
            return None;
        }
        let mut snapshot = InputSnapshot::empty();
        for step in self.steps_at(frame_index) {
            debug!(frame = frame_index, step = ?step, "demo_step");
            snapshot = match step {
                Step::NewGame => snapshot.with_new_game_pressed(true),
                Step::Press(code) => snapshot.with_key_down(code),
                Step::Release(code) => snapshot.with_key_up(code),
                Step::Save => snapshot.with_save_pressed(true),
                Step::Load => snapshot.with_load_pressed(true),
            };
        }
        Some(snapshot)
    }
}
