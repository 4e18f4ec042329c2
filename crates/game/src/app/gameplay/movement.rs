use engine::{ActionStates, CameraPose, InputAction, Vec3};

use super::types::{GameTuning, WorldFlags};
use super::world::WorldLayout;

/// Walks the camera along the floor plane. A step that lands inside a
/// collider is undone as a whole; the look target travels with the eye.
pub(crate) fn step_player(
    camera: &mut CameraPose,
    actions: &ActionStates,
    dt: f32,
    clock_seconds: f64,
    layout: &WorldLayout,
    flags: &WorldFlags,
    tuning: &GameTuning,
) {
    let speed = tuning.walk_speed * dt;
    let forward = camera.planar_forward();
    let side = Vec3::new(-forward.z, 0.0, forward.x);
    let previous = camera.position;

    let mut next = previous;
    if actions.is_down(InputAction::MoveForward) {
        next += forward * speed;
    }
    if actions.is_down(InputAction::MoveBackward) {
        next += forward * -speed;
    }
    if actions.is_down(InputAction::MoveLeft) {
        next += side * -speed;
    }
    if actions.is_down(InputAction::MoveRight) {
        next += side * speed;
    }
    if layout.collides(next, flags) {
        next = previous;
    }

    next.y = tuning.eye_height;
    if actions.any_movement() {
        next.y += (clock_seconds * 10.0).sin() as f32 * tuning.head_bob_amplitude;
    }

    let shift = next - previous;
    camera.position = next;
    camera.look_at += shift;
}
