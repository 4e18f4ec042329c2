use engine::{CueCatalog, CueKey, CueSpec};

pub(crate) const START_SCREEN: CueKey = CueKey("start_screen");
pub(crate) const AMBIENCE: CueKey = CueKey("ambience");
pub(crate) const RAIN: CueKey = CueKey("rain");
pub(crate) const NIGHT_AMBIENCE: CueKey = CueKey("night_ambience");
pub(crate) const ALARM: CueKey = CueKey("alarm");
pub(crate) const INTRO_VOICE: CueKey = CueKey("intro_voice");
pub(crate) const SWITCH: CueKey = CueKey("switch");
pub(crate) const DOOR_OPEN: CueKey = CueKey("door_open");
pub(crate) const DOOR_CLOSE: CueKey = CueKey("door_close");
pub(crate) const PHONE_RING: CueKey = CueKey("phone_ring");
pub(crate) const PHONE_PICKUP: CueKey = CueKey("phone_pickup");
pub(crate) const PHONE_TUTORIAL: CueKey = CueKey("phone_tutorial");
pub(crate) const PHONE_HANGUP: CueKey = CueKey("phone_hangup");
pub(crate) const CLOSET_BANG: CueKey = CueKey("closet_bang");
pub(crate) const CLOSET_TALK: CueKey = CueKey("closet_talk");
pub(crate) const CLOSET_NOISE: CueKey = CueKey("closet_noise");
pub(crate) const WINDOW_TAP: CueKey = CueKey("window_tap");
pub(crate) const BLINDS_OPEN: CueKey = CueKey("blinds_open");
pub(crate) const WINDOW_JUMPSCARE: CueKey = CueKey("window_jumpscare");
pub(crate) const WINDOW_VOICE: CueKey = CueKey("window_voice");
pub(crate) const WHISPER: CueKey = CueKey("whisper");
pub(crate) const HELLO_VOICE: CueKey = CueKey("hello_voice");
pub(crate) const DOOR_CREAK: CueKey = CueKey("door_creak");
pub(crate) const SCARED_BREATH: CueKey = CueKey("scared_breath");
pub(crate) const RUN_FOOTSTEPS: CueKey = CueKey("run_footsteps");
pub(crate) const SLAM_SCREAM: CueKey = CueKey("slam_scream");
pub(crate) const HEARTBEAT: CueKey = CueKey("heartbeat");
pub(crate) const STATIC: CueKey = CueKey("static");
pub(crate) const DISTANT_LAUGH: CueKey = CueKey("distant_laugh");
pub(crate) const CREAK_FLOOR: CueKey = CueKey("creak_floor");

/// Every cue the game knows, with its mixer category and natural length.
pub(crate) fn catalog() -> CueCatalog {
    CueCatalog::new()
        .with(START_SCREEN, CueSpec::music(94.0))
        .with(AMBIENCE, CueSpec::ambience(120.0))
        .with(RAIN, CueSpec::ambience(60.0))
        .with(NIGHT_AMBIENCE, CueSpec::ambience(90.0))
        .with(ALARM, CueSpec::sfx(4.0))
        .with(INTRO_VOICE, CueSpec::sfx(16.5))
        .with(SWITCH, CueSpec::sfx(0.4))
        .with(DOOR_OPEN, CueSpec::sfx(1.2))
        .with(DOOR_CLOSE, CueSpec::sfx(1.0))
        .with(PHONE_RING, CueSpec::sfx(3.0))
        .with(PHONE_PICKUP, CueSpec::sfx(0.8))
        .with(PHONE_TUTORIAL, CueSpec::sfx(148.0))
        .with(PHONE_HANGUP, CueSpec::sfx(1.5))
        .with(CLOSET_BANG, CueSpec::sfx(6.0))
        .with(CLOSET_TALK, CueSpec::sfx(4.5))
        .with(CLOSET_NOISE, CueSpec::sfx(3.0))
        .with(WINDOW_TAP, CueSpec::sfx(2.0))
        .with(BLINDS_OPEN, CueSpec::sfx(1.5))
        .with(WINDOW_JUMPSCARE, CueSpec::sfx(2.5))
        .with(WINDOW_VOICE, CueSpec::sfx(5.0))
        .with(WHISPER, CueSpec::sfx(4.0))
        .with(HELLO_VOICE, CueSpec::sfx(2.0))
        .with(DOOR_CREAK, CueSpec::sfx(3.5))
        .with(SCARED_BREATH, CueSpec::sfx(3.0))
        .with(RUN_FOOTSTEPS, CueSpec::sfx(2.5))
        .with(SLAM_SCREAM, CueSpec::sfx(2.0))
        .with(HEARTBEAT, CueSpec::sfx(1.0))
        .with(STATIC, CueSpec::sfx(1.2))
        .with(DISTANT_LAUGH, CueSpec::sfx(2.5))
        .with(CREAK_FLOOR, CueSpec::sfx(1.1))
}
