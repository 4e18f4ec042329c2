use engine::{CuePlayback, Vec3};
use rand::Rng;
use tracing::{debug, info};

use super::cues;
use super::services::ScriptContext;
use super::types::{GameTuning, InteractableKind};
use super::world::{Anchor, BATHROOM_DOOR_OPEN_YAW, CLOSET_DOOR_OPEN_YAW, MAIN_DOOR_OPEN_YAW};

const HEARTBEAT_FADE_SECONDS: f32 = 0.5;
const PICTURE_WHISPER_VOLUME: f32 = 0.2;

/// What the root driver still has to do after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionOutcome {
    Handled,
    OpenLaptop,
    PhoneAnswered,
}

pub(crate) fn interact(
    kind: InteractableKind,
    tuning: &GameTuning,
    ctx: &mut ScriptContext<'_>,
) -> InteractionOutcome {
    debug!(target_kind = kind.as_token(), "interact");
    match kind {
        InteractableKind::Switch => toggle_switch(ctx),
        InteractableKind::Door => toggle_main_door(ctx),
        InteractableKind::BathroomDoor => toggle_bathroom_door(ctx),
        InteractableKind::ClosetDoor => toggle_closet_door(ctx),
        InteractableKind::Picture => examine_picture(tuning, ctx),
        InteractableKind::Phone => return answer_phone(ctx),
        InteractableKind::Laptop => return InteractionOutcome::OpenLaptop,
    }
    InteractionOutcome::Handled
}

fn toggle_switch(ctx: &mut ScriptContext<'_>) {
    let on = !ctx.flags.lights_on;
    ctx.flags.lights_on = on;
    ctx.services.set_bedroom_light(on, true);
    ctx.services
        .play_global(cues::SWITCH, CuePlayback::default());
    if on && ctx.services.is_playing(cues::HEARTBEAT) {
        ctx.services
            .fade_out(cues::HEARTBEAT, HEARTBEAT_FADE_SECONDS);
    }
}

fn door_cue(open: bool) -> engine::CueKey {
    if open {
        cues::DOOR_OPEN
    } else {
        cues::DOOR_CLOSE
    }
}

fn toggle_main_door(ctx: &mut ScriptContext<'_>) {
    let open = !ctx.flags.main_door_open;
    ctx.flags.main_door_open = open;
    ctx.props.main_door_yaw = if open { MAIN_DOOR_OPEN_YAW } else { 0.0 };
    ctx.services
        .play_at(door_cue(open), Anchor::Door, 1.0, CuePlayback::at_volume(2.0));
}

fn toggle_bathroom_door(ctx: &mut ScriptContext<'_>) {
    let open = !ctx.flags.bathroom_door_open;
    ctx.flags.bathroom_door_open = open;
    ctx.props.bathroom_door_yaw = if open { BATHROOM_DOOR_OPEN_YAW } else { 0.0 };
    ctx.services.play_at(
        door_cue(open),
        Anchor::BathroomDoor,
        1.0,
        CuePlayback::at_volume(2.0),
    );
}

fn toggle_closet_door(ctx: &mut ScriptContext<'_>) {
    let open = !ctx.flags.closet_door_open;
    ctx.flags.closet_door_open = open;
    let yaw = if open { CLOSET_DOOR_OPEN_YAW } else { 0.0 };
    ctx.props.closet_door.rotation = Vec3::new(0.0, yaw, 0.0);
    let key = if open { cues::DOOR_CREAK } else { cues::DOOR_CLOSE };
    ctx.services
        .play_at(key, Anchor::ClosetDoor, 1.0, CuePlayback::at_volume(1.5));
}

fn examine_picture(tuning: &GameTuning, ctx: &mut ScriptContext<'_>) {
    let whisper = !ctx.flags.lights_on && ctx.rng.random_bool(tuning.picture_whisper_probability);
    if whisper {
        ctx.services.play_global(
            cues::WHISPER,
            CuePlayback::at_volume(PICTURE_WHISPER_VOLUME),
        );
    } else {
        ctx.services.play_with_pitch_variation(
            cues::CREAK_FLOOR,
            tuning.picture_pitch_variation,
            ctx.rng,
        );
    }
}

fn answer_phone(ctx: &mut ScriptContext<'_>) -> InteractionOutcome {
    if !ctx.flags.phone_ringing {
        return InteractionOutcome::Handled;
    }
    ctx.flags.phone_ringing = false;
    ctx.flags.phone_answered = true;
    ctx.services.stop(cues::PHONE_RING);
    ctx.services.play_at(
        cues::PHONE_PICKUP,
        Anchor::Phone,
        1.0,
        CuePlayback::default(),
    );
    info!("phone_answered");
    InteractionOutcome::PhoneAnswered
}

#[cfg(test)]
mod tests {
    use engine::{CueMixer, LightRig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::app::gameplay::services::Services;
    use crate::app::gameplay::types::WorldFlags;
    use crate::app::gameplay::world::{SceneProps, WorldAnchors};

    struct Rig {
        flags: WorldFlags,
        services: Services,
        props: SceneProps,
        rng: StdRng,
        tuning: GameTuning,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                flags: WorldFlags::default(),
                services: Services::new(
                    Some(Box::new(CueMixer::preloaded(cues::catalog()))),
                    Some(Box::new(LightRig::default())),
                    WorldAnchors::standard(),
                ),
                props: SceneProps::default(),
                rng: StdRng::seed_from_u64(5),
                tuning: GameTuning::default(),
            }
        }

        fn interact(&mut self, kind: InteractableKind) -> InteractionOutcome {
            let mut ctx = ScriptContext {
                flags: &mut self.flags,
                services: &mut self.services,
                props: &mut self.props,
                rng: &mut self.rng,
                clock_seconds: 0.0,
                camera_position: Vec3::ZERO,
            };
            interact(kind, &self.tuning, &mut ctx)
        }

        fn started(&self) -> Vec<engine::CueKey> {
            self.services.audio().expect("audio").started().to_vec()
        }
    }

    #[test]
    fn switch_toggles_with_flicker_and_click() {
        let mut rig = Rig::new();
        assert_eq!(rig.interact(InteractableKind::Switch), InteractionOutcome::Handled);
        assert!(rig.flags.lights_on);
        let lighting = rig.services.lighting().expect("lighting");
        assert!(lighting.is_lit());
        assert_eq!(rig.started(), vec![cues::SWITCH]);
    }

    #[test]
    fn switch_on_fades_heartbeat() {
        let mut rig = Rig::new();
        rig.services.loop_global(cues::HEARTBEAT, 0.3);
        rig.interact(InteractableKind::Switch);
        rig.services.tick(0.3);
        assert!(rig.services.is_playing(cues::HEARTBEAT));
        rig.services.tick(0.3);
        assert!(!rig.services.is_playing(cues::HEARTBEAT));
    }

    #[test]
    fn doors_toggle_flags_pose_and_cue() {
        let mut rig = Rig::new();
        rig.interact(InteractableKind::Door);
        assert!(rig.flags.main_door_open);
        assert_eq!(rig.props.main_door_yaw, MAIN_DOOR_OPEN_YAW);
        rig.interact(InteractableKind::Door);
        assert!(!rig.flags.main_door_open);
        assert_eq!(rig.props.main_door_yaw, 0.0);

        rig.interact(InteractableKind::BathroomDoor);
        assert!(rig.flags.bathroom_door_open);
        rig.interact(InteractableKind::ClosetDoor);
        assert!(rig.flags.closet_door_open);
        assert_eq!(rig.props.closet_door.rotation.y, CLOSET_DOOR_OPEN_YAW);

        assert_eq!(
            rig.started(),
            vec![cues::DOOR_OPEN, cues::DOOR_CLOSE, cues::DOOR_OPEN, cues::DOOR_CREAK]
        );
    }

    #[test]
    fn phone_answers_only_while_ringing() {
        let mut rig = Rig::new();
        assert_eq!(rig.interact(InteractableKind::Phone), InteractionOutcome::Handled);
        assert!(!rig.flags.phone_answered);

        rig.flags.phone_ringing = true;
        rig.services.loop_at(cues::PHONE_RING, Anchor::Phone, 2.0, 1.0);
        assert_eq!(
            rig.interact(InteractableKind::Phone),
            InteractionOutcome::PhoneAnswered
        );
        assert!(rig.flags.phone_answered);
        assert!(!rig.flags.phone_ringing);
        assert!(!rig.services.is_playing(cues::PHONE_RING));
        assert!(rig.services.is_playing(cues::PHONE_PICKUP));
    }

    #[test]
    fn picture_plays_exactly_one_cue() {
        let mut rig = Rig::new();
        rig.tuning.picture_whisper_probability = 1.0;
        rig.interact(InteractableKind::Picture);
        assert_eq!(rig.started(), vec![cues::WHISPER]);

        rig.flags.lights_on = true;
        rig.interact(InteractableKind::Picture);
        assert_eq!(rig.started(), vec![cues::WHISPER, cues::CREAK_FLOOR]);
    }

    #[test]
    fn laptop_requests_transition() {
        let mut rig = Rig::new();
        assert_eq!(
            rig.interact(InteractableKind::Laptop),
            InteractionOutcome::OpenLaptop
        );
        assert!(rig.started().is_empty());
    }
}
