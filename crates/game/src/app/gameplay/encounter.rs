//! Entity encounter scheduling and the per-entity beat scripts.
//!
//! A beat that waits on audio holds the ticket of the cue it issued. The
//! ticket is resolved by [`EncounterEngine::on_cue_event`], which only moves
//! the beat forward; the next [`EncounterEngine::update`] acts on it.

use engine::{lerp, CueEvent, CuePlayback, CueTicket, Transform3, Vec3};
use rand::Rng;
use tracing::{debug, error, info};

use super::cues;
use super::services::{CueRequest, ScriptContext};
use super::types::{EncounterStatus, EntityKind, GameTuning};
use super::world::{Anchor, HAND_REST_OFFSET, MAIN_DOOR_OPEN_YAW};

const CLOSET_PAUSE_SECONDS: f32 = 1.0;
const WINDOW_LINGER_SECONDS: f32 = 2.0;
const WINDOW_HUSH_SECONDS: f32 = 1.0;
const DOOR_SWING_RATE: f32 = 0.5;
const BREATH_YAW_THRESHOLD: f32 = -0.3;
const FIGURE_RUN_SPEED: f32 = 8.0;
const FIGURE_START: Vec3 = Vec3::new(9.0, 0.0, 0.0);
const FIGURE_DOORWAY_START: Vec3 = Vec3::new(0.0, 0.0, -20.0);
const SLAM_TRIGGER_Z: f32 = -12.0;
const FIGURE_STOP_Z: f32 = -8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClosetBeat {
    Start,
    AwaitNoise(CueTicket),
    Pause,
    Talk,
    AwaitTalk(CueTicket),
    Bang,
    /// Hand out, door rattling, until the bang ends.
    Banging(CueTicket),
    Retreat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowBeat {
    Start,
    AwaitVoice(CueTicket),
    Linger,
    Hello,
    AwaitHello(CueTicket),
    Hush,
    DoorOpens,
    Creeping,
    Breathing(CueTicket),
    LightsBack,
    Charge,
    Running { slam_played: bool },
    Close,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WhisperBeat {
    Start,
    AwaitWhisper(CueTicket),
    Fade,
    /// Races the player's light switch against the auto-restore timeout.
    WaitForLight,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Beat {
    Closet(ClosetBeat),
    Window(WindowBeat),
    Whisper(WhisperBeat),
}

impl Beat {
    fn entry(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Closet => Beat::Closet(ClosetBeat::Start),
            EntityKind::Window => Beat::Window(WindowBeat::Start),
            EntityKind::Whisper => Beat::Whisper(WhisperBeat::Start),
        }
    }

    pub(crate) fn entity(&self) -> EntityKind {
        match self {
            Beat::Closet(_) => EntityKind::Closet,
            Beat::Window(_) => EntityKind::Window,
            Beat::Whisper(_) => EntityKind::Whisper,
        }
    }

    pub(crate) fn awaiting(&self) -> Option<CueTicket> {
        match *self {
            Beat::Closet(
                ClosetBeat::AwaitNoise(ticket)
                | ClosetBeat::AwaitTalk(ticket)
                | ClosetBeat::Banging(ticket),
            )
            | Beat::Window(
                WindowBeat::AwaitVoice(ticket)
                | WindowBeat::AwaitHello(ticket)
                | WindowBeat::Breathing(ticket),
            )
            | Beat::Whisper(WhisperBeat::AwaitWhisper(ticket)) => Some(ticket),
            _ => None,
        }
    }

    /// The beat that follows a resolved audio wait.
    fn resolved(self) -> Self {
        match self {
            Beat::Closet(ClosetBeat::AwaitNoise(_)) => Beat::Closet(ClosetBeat::Pause),
            Beat::Closet(ClosetBeat::AwaitTalk(_)) => Beat::Closet(ClosetBeat::Bang),
            Beat::Closet(ClosetBeat::Banging(_)) => Beat::Closet(ClosetBeat::Retreat),
            Beat::Window(WindowBeat::AwaitVoice(_)) => Beat::Window(WindowBeat::Linger),
            Beat::Window(WindowBeat::AwaitHello(_)) => Beat::Window(WindowBeat::Hush),
            Beat::Window(WindowBeat::Breathing(_)) => Beat::Window(WindowBeat::LightsBack),
            Beat::Whisper(WhisperBeat::AwaitWhisper(_)) => Beat::Whisper(WhisperBeat::Fade),
            other => other,
        }
    }

    pub(crate) fn marker(&self) -> &'static str {
        match self {
            Beat::Closet(beat) => match beat {
                ClosetBeat::Start => "closet_start",
                ClosetBeat::AwaitNoise(_) => "closet_await_noise",
                ClosetBeat::Pause => "closet_pause",
                ClosetBeat::Talk => "closet_talk",
                ClosetBeat::AwaitTalk(_) => "closet_await_talk",
                ClosetBeat::Bang => "closet_bang",
                ClosetBeat::Banging(_) => "closet_banging",
                ClosetBeat::Retreat => "closet_retreat",
            },
            Beat::Window(beat) => match beat {
                WindowBeat::Start => "window_start",
                WindowBeat::AwaitVoice(_) => "window_await_voice",
                WindowBeat::Linger => "window_linger",
                WindowBeat::Hello => "window_hello",
                WindowBeat::AwaitHello(_) => "window_await_hello",
                WindowBeat::Hush => "window_hush",
                WindowBeat::DoorOpens => "window_door_opens",
                WindowBeat::Creeping => "window_creeping",
                WindowBeat::Breathing(_) => "window_breathing",
                WindowBeat::LightsBack => "window_lights_back",
                WindowBeat::Charge => "window_charge",
                WindowBeat::Running { .. } => "window_running",
                WindowBeat::Close => "window_close",
                WindowBeat::Finish => "window_finish",
            },
            Beat::Whisper(beat) => match beat {
                WhisperBeat::Start => "whisper_start",
                WhisperBeat::AwaitWhisper(_) => "whisper_await",
                WhisperBeat::Fade => "whisper_fade",
                WhisperBeat::WaitForLight => "whisper_wait_for_light",
                WhisperBeat::Finish => "whisper_finish",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct EncounterTimers {
    pub(crate) intro: f32,
    pub(crate) grace: f32,
    pub(crate) cooldown: f32,
    pub(crate) event_delay: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct EncounterEngine {
    status: EncounterStatus,
    pool: Vec<EntityKind>,
    beat: Option<Beat>,
    timers: EncounterTimers,
    intro_duration: f32,
    grace_period: f32,
    cooldown_duration: f32,
    whisper_timeout: f32,
}

impl EncounterEngine {
    pub(crate) fn new(tuning: &GameTuning) -> Self {
        Self {
            status: EncounterStatus::WaitingForPhone,
            pool: EntityKind::ALL.to_vec(),
            beat: None,
            timers: EncounterTimers::default(),
            intro_duration: tuning.intro_duration_seconds,
            grace_period: tuning.grace_period_seconds,
            cooldown_duration: tuning.cooldown_duration_seconds,
            whisper_timeout: tuning.whisper_light_timeout_seconds,
        }
    }

    /// Fresh playthrough: full pool, waiting for the phone.
    pub(crate) fn reset(&mut self) {
        self.status = EncounterStatus::WaitingForPhone;
        self.pool = EntityKind::ALL.to_vec();
        self.beat = None;
        self.timers = EncounterTimers::default();
    }

    /// Resumes a saved playthrough with `pool` remaining.
    pub(crate) fn restore(&mut self, pool: Vec<EntityKind>, status: EncounterStatus) {
        self.pool = pool;
        self.beat = None;
        self.timers = EncounterTimers::default();
        self.status = status;
        info!(
            status = status.as_token(),
            remaining = self.pool.len(),
            "encounters_restored"
        );
    }

    pub(crate) fn status(&self) -> EncounterStatus {
        self.status
    }

    pub(crate) fn pool(&self) -> &[EntityKind] {
        &self.pool
    }

    #[cfg(test)]
    pub(crate) fn beat(&self) -> Option<Beat> {
        self.beat
    }

    pub(crate) fn current_entity(&self) -> Option<EntityKind> {
        self.beat.map(|beat| beat.entity())
    }

    #[cfg(test)]
    pub(crate) fn timers(&self) -> EncounterTimers {
        self.timers
    }

    /// The phone call ended: skip whatever is left of the intro timer.
    pub(crate) fn finish_intro(&mut self) {
        if matches!(
            self.status,
            EncounterStatus::WaitingForPhone | EncounterStatus::IntroCooldown
        ) {
            info!("intro_finished_by_call");
            self.enter_grace();
        }
    }

    pub(crate) fn on_cue_event(&mut self, event: &CueEvent) {
        let Some(beat) = self.beat else {
            return;
        };
        if beat.awaiting() != Some(event.ticket()) {
            return;
        }
        let next = beat.resolved();
        debug!(
            cue = %event.key(),
            from = beat.marker(),
            to = next.marker(),
            "encounter_cue_resolved"
        );
        self.beat = Some(next);
    }

    pub(crate) fn update(&mut self, dt: f32, ctx: &mut ScriptContext<'_>) {
        if ctx.props.eyes_visible {
            ctx.props.eyes_facing = ctx.camera_position;
        }
        if !ctx.flags.phone_answered {
            return;
        }

        if self.status == EncounterStatus::WaitingForPhone {
            self.status = EncounterStatus::IntroCooldown;
            self.timers.intro = 0.0;
        }

        match self.status {
            EncounterStatus::IntroCooldown => {
                self.timers.intro += dt;
                if self.timers.intro >= self.intro_duration {
                    info!("intro_finished");
                    self.enter_grace();
                }
            }
            EncounterStatus::Grace => {
                self.timers.grace += dt;
                if self.timers.grace >= self.grace_period {
                    info!("grace_over");
                    self.draw_next(ctx);
                }
            }
            EncounterStatus::Cooldown => {
                self.timers.cooldown += dt;
                if self.timers.cooldown >= self.cooldown_duration {
                    self.timers.cooldown = 0.0;
                    info!("cooldown_over");
                    self.draw_next(ctx);
                }
            }
            EncounterStatus::Encounter => {
                debug_assert!(self.beat.is_some(), "encounter running without a beat");
                let Some(beat) = self.beat else {
                    error!("encounter_without_beat");
                    self.finish_encounter();
                    return;
                };
                let next = match beat {
                    Beat::Closet(beat) => self.closet(beat, dt, ctx).map(Beat::Closet),
                    Beat::Window(beat) => self.window(beat, dt, ctx).map(Beat::Window),
                    Beat::Whisper(beat) => self.whisper(beat, dt, ctx).map(Beat::Whisper),
                };
                match next {
                    Some(next) => {
                        if next != beat {
                            debug!(from = beat.marker(), to = next.marker(), "encounter_beat");
                        }
                        self.beat = Some(next);
                    }
                    None => self.finish_encounter(),
                }
            }
            EncounterStatus::WaitingForPhone | EncounterStatus::Survived => {}
        }
    }

    fn enter_grace(&mut self) {
        self.status = EncounterStatus::Grace;
        self.timers.grace = 0.0;
    }

    fn draw_next(&mut self, ctx: &mut ScriptContext<'_>) {
        if self.pool.is_empty() {
            info!("player_survived");
            self.status = EncounterStatus::Survived;
            return;
        }
        let index = ctx.rng.random_range(0..self.pool.len());
        let kind = self.pool.remove(index);
        self.begin(kind);
    }

    pub(crate) fn begin(&mut self, kind: EntityKind) {
        self.status = EncounterStatus::Encounter;
        self.beat = Some(Beat::entry(kind));
        self.timers.event_delay = 0.0;
        info!(entity = %kind, remaining = self.pool.len(), "encounter_started");
    }

    fn finish_encounter(&mut self) {
        if let Some(kind) = self.current_entity() {
            info!(entity = %kind, "encounter_finished");
        }
        self.status = EncounterStatus::Cooldown;
        self.timers.cooldown = 0.0;
        self.beat = None;
    }

    /// Counts the event delay up and reports whether `seconds` have passed,
    /// resetting it when they have.
    fn delay_elapsed(&mut self, dt: f32, seconds: f32) -> bool {
        self.timers.event_delay += dt;
        if self.timers.event_delay >= seconds {
            self.timers.event_delay = 0.0;
            true
        } else {
            false
        }
    }

    fn closet(
        &mut self,
        beat: ClosetBeat,
        dt: f32,
        ctx: &mut ScriptContext<'_>,
    ) -> Option<ClosetBeat> {
        let next = match beat {
            ClosetBeat::Start => {
                match ctx.services.play_at(
                    cues::CLOSET_NOISE,
                    Anchor::Closet,
                    2.0,
                    CuePlayback::at_volume(2.0),
                ) {
                    CueRequest::Started(ticket) => ClosetBeat::AwaitNoise(ticket),
                    CueRequest::Skipped => ClosetBeat::Pause,
                }
            }
            ClosetBeat::Pause => {
                if self.delay_elapsed(dt, CLOSET_PAUSE_SECONDS) {
                    ClosetBeat::Talk
                } else {
                    ClosetBeat::Pause
                }
            }
            ClosetBeat::Talk => {
                match ctx.services.play_at(
                    cues::CLOSET_TALK,
                    Anchor::Closet,
                    3.0,
                    CuePlayback::at_volume(3.0),
                ) {
                    CueRequest::Started(ticket) => ClosetBeat::AwaitTalk(ticket),
                    CueRequest::Skipped => ClosetBeat::Bang,
                }
            }
            ClosetBeat::Bang => {
                ctx.props.hand_visible = true;
                match ctx.services.play_at(
                    cues::CLOSET_BANG,
                    Anchor::Closet,
                    4.0,
                    CuePlayback::at_volume(4.0),
                ) {
                    CueRequest::Started(ticket) => ClosetBeat::Banging(ticket),
                    CueRequest::Skipped => ClosetBeat::Retreat,
                }
            }
            ClosetBeat::Banging(ticket) => {
                let phase = ctx.clock_seconds * 50.0;
                ctx.props.hand_offset = Vec3::new(
                    HAND_REST_OFFSET.x + (phase.sin() * 0.1) as f32,
                    HAND_REST_OFFSET.y,
                    HAND_REST_OFFSET.z + (phase.cos() * 0.05) as f32,
                );
                let mut jitter = |scale: f32| (ctx.rng.random::<f32>() - 0.5) * scale;
                let yaw = jitter(0.1);
                let x = jitter(0.05);
                let z = jitter(0.05);
                ctx.props.closet_door = Transform3 {
                    position: Vec3::new(x, 0.0, z),
                    rotation: Vec3::new(0.0, yaw, 0.0),
                };
                ClosetBeat::Banging(ticket)
            }
            ClosetBeat::Retreat => {
                ctx.props.hand_visible = false;
                ctx.props.hand_offset = HAND_REST_OFFSET;
                ctx.props.closet_door = Transform3::IDENTITY;
                return None;
            }
            waiting @ (ClosetBeat::AwaitNoise(_) | ClosetBeat::AwaitTalk(_)) => waiting,
        };
        Some(next)
    }

    fn window(
        &mut self,
        beat: WindowBeat,
        dt: f32,
        ctx: &mut ScriptContext<'_>,
    ) -> Option<WindowBeat> {
        let next = match beat {
            WindowBeat::Start => {
                let figure = &mut ctx.props.figure;
                figure.position = FIGURE_START;
                figure.left_arm = Vec3::ZERO;
                figure.right_arm = Vec3::ZERO;
                figure.visible = true;
                match ctx.services.play_at(
                    cues::WINDOW_VOICE,
                    Anchor::Window,
                    2.0,
                    CuePlayback::at_volume(2.0),
                ) {
                    CueRequest::Started(ticket) => WindowBeat::AwaitVoice(ticket),
                    CueRequest::Skipped => WindowBeat::Linger,
                }
            }
            WindowBeat::Linger => {
                ctx.props.figure.visible = false;
                if self.delay_elapsed(dt, WINDOW_LINGER_SECONDS) {
                    WindowBeat::Hello
                } else {
                    WindowBeat::Linger
                }
            }
            WindowBeat::Hello => {
                ctx.set_lights(false);
                match ctx
                    .services
                    .play_global(cues::HELLO_VOICE, CuePlayback::default())
                {
                    CueRequest::Started(ticket) => WindowBeat::AwaitHello(ticket),
                    CueRequest::Skipped => WindowBeat::Hush,
                }
            }
            WindowBeat::Hush => {
                if self.delay_elapsed(dt, WINDOW_HUSH_SECONDS) {
                    WindowBeat::DoorOpens
                } else {
                    WindowBeat::Hush
                }
            }
            WindowBeat::DoorOpens => {
                ctx.flags.main_door_open = true;
                ctx.services.play_at(
                    cues::DOOR_CREAK,
                    Anchor::Door,
                    2.0,
                    CuePlayback::at_volume(2.0),
                );
                ctx.props.figure.position = FIGURE_DOORWAY_START;
                ctx.props.figure.visible = true;
                WindowBeat::Creeping
            }
            WindowBeat::Creeping => {
                swing_door_open(dt, ctx);
                if ctx.props.main_door_yaw < BREATH_YAW_THRESHOLD {
                    match ctx
                        .services
                        .play_global(cues::SCARED_BREATH, CuePlayback::default())
                    {
                        CueRequest::Started(ticket) => WindowBeat::Breathing(ticket),
                        CueRequest::Skipped => WindowBeat::LightsBack,
                    }
                } else {
                    WindowBeat::Creeping
                }
            }
            WindowBeat::Breathing(ticket) => {
                swing_door_open(dt, ctx);
                WindowBeat::Breathing(ticket)
            }
            WindowBeat::LightsBack => {
                if !ctx.flags.lights_on {
                    ctx.set_lights(true);
                }
                WindowBeat::Charge
            }
            WindowBeat::Charge => {
                ctx.services
                    .play_global(cues::RUN_FOOTSTEPS, CuePlayback::default());
                WindowBeat::Running { slam_played: false }
            }
            WindowBeat::Running { mut slam_played } => {
                let phase = ctx.clock_seconds * 20.0;
                let stride = (phase * 0.8) as f32;
                let figure = &mut ctx.props.figure;
                figure.position.z += dt * FIGURE_RUN_SPEED;
                figure.position.y = stride.sin().abs() * 0.15;
                figure.left_arm = Vec3::new(stride.sin() * 1.5, 0.0, 0.2);
                figure.right_arm = Vec3::new(stride.cos() * 1.5, 0.0, -0.2);
                figure.head = Vec3::new(
                    0.0,
                    ((phase * 1.5).cos() * 0.15) as f32,
                    ((phase * 2.0).sin() * 0.15) as f32,
                );
                let z = figure.position.z;

                if !slam_played && z > SLAM_TRIGGER_Z {
                    ctx.services.play_at(
                        cues::SLAM_SCREAM,
                        Anchor::Door,
                        5.0,
                        CuePlayback::at_volume(5.0),
                    );
                    slam_played = true;
                }
                if z > FIGURE_STOP_Z {
                    WindowBeat::Close
                } else {
                    WindowBeat::Running { slam_played }
                }
            }
            WindowBeat::Close => {
                ctx.flags.main_door_open = false;
                ctx.props.main_door_yaw = 0.0;
                ctx.props.figure.visible = false;
                WindowBeat::Finish
            }
            WindowBeat::Finish => return None,
            waiting @ (WindowBeat::AwaitVoice(_) | WindowBeat::AwaitHello(_)) => waiting,
        };
        Some(next)
    }

    fn whisper(
        &mut self,
        beat: WhisperBeat,
        dt: f32,
        ctx: &mut ScriptContext<'_>,
    ) -> Option<WhisperBeat> {
        let next = match beat {
            WhisperBeat::Start => {
                ctx.set_lights(false);
                ctx.props.eyes_visible = true;
                ctx.props.eyes_facing = ctx.camera_position;
                match ctx.services.play_at(
                    cues::WHISPER,
                    Anchor::WhisperEyes,
                    5.0,
                    CuePlayback::at_volume(2.5),
                ) {
                    CueRequest::Started(ticket) => WhisperBeat::AwaitWhisper(ticket),
                    CueRequest::Skipped => WhisperBeat::Fade,
                }
            }
            WhisperBeat::Fade => {
                ctx.props.eyes_visible = false;
                self.timers.event_delay = 0.0;
                WhisperBeat::WaitForLight
            }
            WhisperBeat::WaitForLight => {
                if ctx.flags.lights_on {
                    debug!("whisper_lights_restored_by_player");
                    return Some(WhisperBeat::Finish);
                }
                self.timers.event_delay += dt;
                if self.timers.event_delay >= self.whisper_timeout {
                    info!("whisper_lights_auto_restored");
                    ctx.set_lights(true);
                    WhisperBeat::Finish
                } else {
                    WhisperBeat::WaitForLight
                }
            }
            WhisperBeat::Finish => return None,
            waiting @ WhisperBeat::AwaitWhisper(_) => waiting,
        };
        Some(next)
    }

    #[cfg(test)]
    pub(crate) fn set_timers(&mut self, timers: EncounterTimers) {
        self.timers = timers;
    }

    #[cfg(test)]
    pub(crate) fn set_status(&mut self, status: EncounterStatus) {
        self.status = status;
    }

    #[cfg(test)]
    pub(crate) fn set_beat(&mut self, beat: Option<Beat>) {
        self.beat = beat;
    }
}

fn swing_door_open(dt: f32, ctx: &mut ScriptContext<'_>) {
    ctx.props.main_door_yaw = lerp(
        ctx.props.main_door_yaw,
        MAIN_DOOR_OPEN_YAW,
        dt * DOOR_SWING_RATE,
    );
}
