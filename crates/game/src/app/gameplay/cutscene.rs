//! The wake-up sequence that opens a new game.

use engine::{smoothstep, CameraPose, CuePlayback, Vec3};
use tracing::{debug, info};

use super::cues;
use super::services::ScriptContext;
use super::world::Anchor;

pub(crate) const BED_HEAD: Vec3 = Vec3::new(-6.5, 1.0, 5.0);
pub(crate) const BED_LOOK: Vec3 = Vec3::new(-6.5, 3.0, 5.0);
const SIT_UP: Vec3 = Vec3::new(-6.0, 2.0, 5.0);
const BED_SIDE_STAND: Vec3 = Vec3::new(-5.0, 4.0, 2.5);
pub(crate) const DESK_ALARM: Vec3 = Vec3::new(1.5, 4.0, 2.5);
pub(crate) const ALARM_LOOK: Vec3 = Vec3::new(5.0, 1.7, 0.5);
const SWITCH_STAND: Vec3 = Vec3::new(2.5, 4.0, -5.0);
const SWITCH_LOOK: Vec3 = Vec3::new(2.5, 3.0, -7.5);
pub(crate) const LAPTOP_VIEW: Vec3 = Vec3::new(4.2, 2.0, 2.33);
pub(crate) const LAPTOP_LOOK: Vec3 = Vec3::new(5.0, 1.5, 3.0);

const ALARM_START_SECONDS: f32 = 1.0;
const EYES_OPEN_SECONDS: f32 = 3.0;
const DAZED_UNTIL_SECONDS: f32 = 7.0;
const STARE_UNTIL_SECONDS: f32 = 13.0;
const WALK_TO_DESK_FROM_SECONDS: f32 = 16.0;
const ALARM_SILENCED_SECONDS: f32 = 19.5;
const LIGHTS_ON_SECONDS: f32 = 24.0;
const SKIPPED_TIME_SECONDS: f32 = 30.0;

/// Forward-only stages, numbered 0 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum CutsceneStage {
    Waking,
    Dazed,
    SitUp,
    StareAtAlarm,
    StandUp,
    WalkToDesk,
    SilenceAlarm,
    WalkToSwitch,
    LightsOn,
    Done,
}

impl CutsceneStage {
    pub(crate) fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Cutscene {
    stage: CutsceneStage,
    time: f32,
    alarm_requested: bool,
}

impl Default for Cutscene {
    fn default() -> Self {
        Self {
            stage: CutsceneStage::Waking,
            time: 0.0,
            alarm_requested: false,
        }
    }
}

impl Cutscene {
    pub(crate) fn opening_pose() -> CameraPose {
        CameraPose::looking_at(BED_HEAD, BED_LOOK)
    }

    /// Where the wake-up walk ends: facing the light switch.
    pub(crate) fn closing_pose() -> CameraPose {
        CameraPose::looking_at(SWITCH_STAND, SWITCH_LOOK)
    }

    #[cfg(test)]
    pub(crate) fn stage(&self) -> CutsceneStage {
        self.stage
    }

    #[cfg(test)]
    pub(crate) fn time(&self) -> f32 {
        self.time
    }

    /// Advances the sequence and poses the camera. Returns true once control
    /// passes to the player.
    pub(crate) fn update(
        &mut self,
        dt: f32,
        camera: &mut CameraPose,
        ctx: &mut ScriptContext<'_>,
    ) -> bool {
        self.time += dt;
        let t = self.time;
        let next = match self.stage {
            CutsceneStage::Waking => {
                if t > ALARM_START_SECONDS && !self.alarm_requested {
                    ctx.services
                        .loop_at(cues::ALARM, Anchor::Clock, 0.8, 5.0);
                    self.alarm_requested = true;
                }
                if t > EYES_OPEN_SECONDS {
                    ctx.services
                        .play_global(cues::INTRO_VOICE, CuePlayback::default());
                    CutsceneStage::Dazed
                } else {
                    CutsceneStage::Waking
                }
            }
            CutsceneStage::Dazed => {
                camera.look_at = BED_LOOK
                    + Vec3::new((t * 1.5).sin() * 0.5, 0.0, (t * 2.0).cos() * 0.2);
                camera.roll = t.sin() * 0.05;
                if t > DAZED_UNTIL_SECONDS {
                    CutsceneStage::SitUp
                } else {
                    CutsceneStage::Dazed
                }
            }
            CutsceneStage::SitUp => {
                camera.roll = 0.0;
                let u = ((t - DAZED_UNTIL_SECONDS) / 3.0).min(1.0);
                let eased = smoothstep(u);
                camera.position = BED_HEAD.lerp(SIT_UP, eased);
                camera.look_at = BED_LOOK.lerp(ALARM_LOOK, eased);
                if u >= 1.0 {
                    CutsceneStage::StareAtAlarm
                } else {
                    CutsceneStage::SitUp
                }
            }
            CutsceneStage::StareAtAlarm => {
                let shake = (t * 20.0).sin() * 0.02;
                camera.position = SIT_UP + Vec3::new(shake, shake * 0.5, 0.0);
                camera.look_at = ALARM_LOOK;
                if t > STARE_UNTIL_SECONDS {
                    CutsceneStage::StandUp
                } else {
                    CutsceneStage::StareAtAlarm
                }
            }
            CutsceneStage::StandUp => {
                let u = ((t - STARE_UNTIL_SECONDS) / 3.0).min(1.0);
                let mut position = SIT_UP.lerp(BED_SIDE_STAND, smoothstep(u));
                position.y += (u * std::f32::consts::PI).sin() * 0.2;
                camera.position = position;
                camera.look_at = ALARM_LOOK;
                if u >= 1.0 {
                    CutsceneStage::WalkToDesk
                } else {
                    CutsceneStage::StandUp
                }
            }
            CutsceneStage::WalkToDesk => {
                let u = ((t - WALK_TO_DESK_FROM_SECONDS) / 3.0).min(1.0);
                let mut position = BED_SIDE_STAND.lerp(DESK_ALARM, u);
                position.y = BED_SIDE_STAND.y + (t * 12.0).sin() * 0.05;
                camera.position = position;
                camera.look_at = ALARM_LOOK;
                if u >= 1.0 {
                    CutsceneStage::SilenceAlarm
                } else {
                    CutsceneStage::WalkToDesk
                }
            }
            CutsceneStage::SilenceAlarm => {
                if t > ALARM_SILENCED_SECONDS {
                    ctx.services.stop(cues::ALARM);
                    ctx.services
                        .play_global(cues::SWITCH, CuePlayback::default());
                    CutsceneStage::WalkToSwitch
                } else {
                    CutsceneStage::SilenceAlarm
                }
            }
            CutsceneStage::WalkToSwitch => {
                let u = ((t - ALARM_SILENCED_SECONDS) / 4.0).min(1.0);
                let eased = smoothstep(u);
                let mut position = DESK_ALARM.lerp(SWITCH_STAND, eased);
                position.y = DESK_ALARM.y + (t * 12.0).sin() * 0.05;
                camera.position = position;
                camera.look_at = ALARM_LOOK.lerp(SWITCH_LOOK, eased);
                if u >= 1.0 {
                    CutsceneStage::LightsOn
                } else {
                    CutsceneStage::WalkToSwitch
                }
            }
            CutsceneStage::LightsOn => {
                if t > LIGHTS_ON_SECONDS {
                    ctx.services
                        .play_global(cues::SWITCH, CuePlayback::default());
                    ctx.set_lights(true);
                    CutsceneStage::Done
                } else {
                    CutsceneStage::LightsOn
                }
            }
            CutsceneStage::Done => {
                start_phone_ring(ctx);
                info!(seconds = t, "cutscene_finished");
                return true;
            }
        };

        if next != self.stage {
            debug!(stage = next.index(), time = t, "cutscene_stage");
            self.stage = next;
        }
        false
    }

    /// Jumps to the final stage, applying its side effects once. Returns
    /// false when there was nothing left to skip.
    pub(crate) fn skip_to_end(&mut self, ctx: &mut ScriptContext<'_>) -> bool {
        if self.stage >= CutsceneStage::Done {
            return false;
        }
        info!(from_stage = self.stage.index(), "cutscene_skipped");
        self.stage = CutsceneStage::Done;
        self.time = SKIPPED_TIME_SECONDS;
        ctx.services.stop(cues::ALARM);
        ctx.set_lights(true);
        start_phone_ring(ctx);
        true
    }
}

/// Starts the ring loop unless the phone is already ringing.
pub(crate) fn start_phone_ring(ctx: &mut ScriptContext<'_>) {
    if ctx.flags.phone_ringing {
        return;
    }
    ctx.flags.phone_ringing = true;
    ctx.services
        .loop_at(cues::PHONE_RING, Anchor::Phone, 2.0, 1.0);
}
