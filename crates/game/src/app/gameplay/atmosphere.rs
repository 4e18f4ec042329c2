use engine::{CuePlayback, Vec3};
use rand::Rng;
use tracing::debug;

use super::cues;
use super::services::ScriptContext;
use super::types::GameTuning;

const HEARTBEAT_VOLUME: f32 = 0.3;
const STATIC_VOLUME: f32 = 0.2;

/// Ambient dread while the player walks around: floor creaks, a heartbeat
/// when standing still in the dark, and rare static or flicker.
#[derive(Debug, Clone)]
pub(crate) struct Atmosphere {
    last_position: Option<Vec3>,
    movement_timer: f32,
    still_timer: f32,
    random_event_timer: f32,
    tuning: GameTuning,
}

impl Atmosphere {
    pub(crate) fn new(tuning: &GameTuning) -> Self {
        Self {
            last_position: None,
            movement_timer: 0.0,
            still_timer: 0.0,
            random_event_timer: 0.0,
            tuning: tuning.clone(),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(&self.tuning);
    }

    #[cfg(test)]
    pub(crate) fn still_seconds(&self) -> f32 {
        self.still_timer
    }

    pub(crate) fn update(&mut self, dt: f32, ctx: &mut ScriptContext<'_>) {
        let position = ctx.camera_position;
        let moved = self
            .last_position
            .map(|last| last.distance(position))
            .unwrap_or(0.0);
        self.last_position = Some(position);
        let dark = !ctx.flags.lights_on;

        if moved > self.tuning.movement_epsilon {
            self.still_timer = 0.0;
            self.movement_timer += dt;
            if self.movement_timer > self.tuning.movement_sound_interval_seconds {
                if dark && ctx.rng.random_bool(self.tuning.movement_sound_probability) {
                    ctx.services.play_with_pitch_variation(
                        cues::CREAK_FLOOR,
                        self.tuning.creak_pitch_variation,
                        ctx.rng,
                    );
                }
                self.movement_timer = 0.0;
            }
        } else {
            self.still_timer += dt;
            if dark
                && self.still_timer > self.tuning.heartbeat_trigger_seconds
                && !ctx.services.is_playing(cues::HEARTBEAT)
            {
                debug!("heartbeat_started");
                ctx.services.loop_global(cues::HEARTBEAT, HEARTBEAT_VOLUME);
            }
        }

        if ctx.flags.lights_on && ctx.services.is_playing(cues::HEARTBEAT) {
            ctx.services.stop(cues::HEARTBEAT);
        }

        self.random_event_timer += dt;
        if self.random_event_timer > self.tuning.random_event_interval_seconds {
            self.random_event_timer = 0.0;
            if ctx.rng.random_bool(self.tuning.random_event_probability) {
                self.random_event(ctx);
            }
        }
    }

    fn random_event(&self, ctx: &mut ScriptContext<'_>) {
        let roll = ctx.rng.random::<f64>();
        if roll < self.tuning.static_probability && !ctx.flags.lights_on {
            debug!("random_static");
            ctx.services
                .play_global(cues::STATIC, CuePlayback::at_volume(STATIC_VOLUME));
        } else if roll < self.tuning.flicker_probability && ctx.flags.lights_on {
            debug!("random_flicker");
            ctx.services.set_bedroom_light(true, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::CueMixer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::app::gameplay::services::Services;
    use crate::app::gameplay::types::WorldFlags;
    use crate::app::gameplay::world::{SceneProps, WorldAnchors};

    struct Rig {
        atmosphere: Atmosphere,
        flags: WorldFlags,
        services: Services,
        props: SceneProps,
        rng: StdRng,
    }

    impl Rig {
        fn new(tuning: GameTuning) -> Self {
            Self {
                atmosphere: Atmosphere::new(&tuning),
                flags: WorldFlags::default(),
                services: Services::new(
                    Some(Box::new(CueMixer::preloaded(cues::catalog()))),
                    None,
                    WorldAnchors::standard(),
                ),
                props: SceneProps::default(),
                rng: StdRng::seed_from_u64(3),
            }
        }

        fn step(&mut self, position: Vec3) {
            self.services.tick(0.1);
            let mut ctx = ScriptContext {
                flags: &mut self.flags,
                services: &mut self.services,
                props: &mut self.props,
                rng: &mut self.rng,
                clock_seconds: 0.0,
                camera_position: position,
            };
            self.atmosphere.update(0.1, &mut ctx);
        }
    }

    #[test]
    fn standing_still_in_the_dark_starts_one_heartbeat() {
        let mut rig = Rig::new(GameTuning::default());
        let spot = Vec3::new(0.0, 4.0, 0.0);
        for _ in 0..120 {
            rig.step(spot);
        }
        let audio = rig.services.audio().expect("audio");
        assert_eq!(audio.active_instances(cues::HEARTBEAT), 1);
        assert_eq!(
            audio.started().iter().filter(|key| **key == cues::HEARTBEAT).count(),
            1
        );
    }

    #[test]
    fn lights_on_stops_the_heartbeat() {
        let mut rig = Rig::new(GameTuning::default());
        let spot = Vec3::new(0.0, 4.0, 0.0);
        for _ in 0..90 {
            rig.step(spot);
        }
        assert!(rig.services.is_playing(cues::HEARTBEAT));
        rig.flags.lights_on = true;
        rig.step(spot);
        assert!(!rig.services.is_playing(cues::HEARTBEAT));
    }

    #[test]
    fn walking_in_the_dark_creaks_when_the_roll_passes() {
        let tuning = GameTuning {
            movement_sound_probability: 1.0,
            ..GameTuning::default()
        };
        let mut rig = Rig::new(tuning);
        for step in 0..100 {
            rig.step(Vec3::new(0.0, 4.0, step as f32 * 0.4));
        }
        let audio = rig.services.audio().expect("audio");
        let creaks = audio
            .started()
            .iter()
            .filter(|key| **key == cues::CREAK_FLOOR)
            .count();
        assert!(creaks >= 2, "heard {creaks} creaks");
        assert_eq!(rig.atmosphere.still_seconds(), 0.0);
    }

    #[test]
    fn lit_room_never_creaks() {
        let tuning = GameTuning {
            movement_sound_probability: 1.0,
            ..GameTuning::default()
        };
        let mut rig = Rig::new(tuning);
        rig.flags.lights_on = true;
        for step in 0..100 {
            rig.step(Vec3::new(0.0, 4.0, step as f32 * 0.4));
        }
        assert!(rig.services.audio().expect("audio").started().is_empty());
    }

    #[test]
    fn random_static_only_in_the_dark() {
        let tuning = GameTuning {
            random_event_probability: 1.0,
            static_probability: 1.0,
            heartbeat_trigger_seconds: 1_000.0,
            ..GameTuning::default()
        };
        let mut rig = Rig::new(tuning);
        for _ in 0..205 {
            rig.step(Vec3::ZERO);
        }
        let audio = rig.services.audio().expect("audio");
        assert_eq!(audio.started(), &[cues::STATIC]);
    }
}
