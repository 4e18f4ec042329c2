use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GamePhase {
    StartScreen,
    Cutscene,
    Gameplay,
    Laptop,
    TransitionToLaptop,
    TransitionFromLaptop,
    Survived,
}

impl GamePhase {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::StartScreen => "start_screen",
            Self::Cutscene => "cutscene",
            Self::Gameplay => "gameplay",
            Self::Laptop => "laptop",
            Self::TransitionToLaptop => "transition_to_laptop",
            Self::TransitionFromLaptop => "transition_from_laptop",
            Self::Survived => "survived",
        }
    }

    /// Phases in which encounters make progress.
    pub(crate) fn runs_encounters(self) -> bool {
        matches!(self, Self::Gameplay | Self::Laptop)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EncounterStatus {
    WaitingForPhone,
    IntroCooldown,
    Grace,
    Encounter,
    Cooldown,
    Survived,
}

impl EncounterStatus {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::WaitingForPhone => "waiting_for_phone",
            Self::IntroCooldown => "intro_cooldown",
            Self::Grace => "grace",
            Self::Encounter => "encounter",
            Self::Cooldown => "cooldown",
            Self::Survived => "survived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum EntityKind {
    Closet,
    Window,
    Whisper,
}

impl EntityKind {
    pub(crate) const ALL: [EntityKind; 3] = [Self::Closet, Self::Window, Self::Whisper];

    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Closet => "CLOSET",
            Self::Window => "WINDOW",
            Self::Whisper => "WHISPER",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_token() == token)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Progress of the scripted phone call that follows answering the phone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum TutorialStage {
    #[default]
    None,
    Pickup,
    StartTutorial,
    WaitTutorial,
    StartHangup,
    WaitHangup,
    /// Quiet spell after the hang-up before the encounters take over.
    Grace,
    Done,
}

/// Objects the player can act on. Each kind has exactly one handler in
/// `interaction`, selected by an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InteractableKind {
    Door,
    BathroomDoor,
    ClosetDoor,
    Switch,
    Laptop,
    Phone,
    Picture,
}

impl InteractableKind {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Door => "DOOR",
            Self::BathroomDoor => "BATHROOM_DOOR",
            Self::ClosetDoor => "CLOSET_DOOR",
            Self::Switch => "SWITCH",
            Self::Laptop => "LAPTOP",
            Self::Phone => "PHONE",
            Self::Picture => "PICTURE",
        }
    }

    /// Contextual prompt; empty means the prompt is hidden.
    pub(crate) fn prompt(self, flags: &WorldFlags) -> &'static str {
        match self {
            Self::Switch if flags.lights_on => "[E] Turn Off Lights",
            Self::Switch => "[E] Turn On Lights",
            Self::Door if flags.main_door_open => "[E] Close Door",
            Self::Door => "[E] Open Door",
            Self::BathroomDoor if flags.bathroom_door_open => "[E] Close Bathroom",
            Self::BathroomDoor => "[E] Open Bathroom",
            Self::ClosetDoor if flags.closet_door_open => "[E] Close Closet",
            Self::ClosetDoor => "[E] Open Closet",
            Self::Laptop => "[E] Use Computer",
            Self::Picture => "[E] Examine Picture",
            Self::Phone if flags.phone_ringing => "[E] Answer Phone",
            Self::Phone => "",
        }
    }
}

/// Shared world state read and written by the root driver, the interaction
/// handlers and the encounter scripts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WorldFlags {
    pub(crate) lights_on: bool,
    pub(crate) main_door_open: bool,
    pub(crate) bathroom_door_open: bool,
    pub(crate) closet_door_open: bool,
    pub(crate) phone_ringing: bool,
    pub(crate) phone_answered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameTuning {
    pub(crate) intro_duration_seconds: f32,
    pub(crate) grace_period_seconds: f32,
    pub(crate) cooldown_duration_seconds: f32,
    pub(crate) interaction_range: f32,
    pub(crate) walk_speed: f32,
    pub(crate) eye_height: f32,
    pub(crate) head_bob_amplitude: f32,
    pub(crate) laptop_transition_seconds: f32,
    pub(crate) movement_epsilon: f32,
    pub(crate) movement_sound_interval_seconds: f32,
    pub(crate) movement_sound_probability: f64,
    pub(crate) creak_pitch_variation: f32,
    pub(crate) heartbeat_trigger_seconds: f32,
    pub(crate) random_event_interval_seconds: f32,
    pub(crate) random_event_probability: f64,
    pub(crate) static_probability: f64,
    pub(crate) flicker_probability: f64,
    pub(crate) picture_whisper_probability: f64,
    pub(crate) picture_pitch_variation: f32,
    pub(crate) whisper_light_timeout_seconds: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            intro_duration_seconds: 157.0,
            grace_period_seconds: 10.0,
            cooldown_duration_seconds: 15.0,
            interaction_range: 3.5,
            walk_speed: 4.0,
            eye_height: 4.0,
            head_bob_amplitude: 0.05,
            laptop_transition_seconds: 0.5,
            movement_epsilon: 0.01,
            movement_sound_interval_seconds: 3.0,
            movement_sound_probability: 0.3,
            creak_pitch_variation: 0.2,
            heartbeat_trigger_seconds: 8.0,
            random_event_interval_seconds: 20.0,
            random_event_probability: 0.15,
            static_probability: 0.5,
            flicker_probability: 0.8,
            picture_whisper_probability: 0.3,
            picture_pitch_variation: 0.3,
            whisper_light_timeout_seconds: 5.0,
        }
    }
}
