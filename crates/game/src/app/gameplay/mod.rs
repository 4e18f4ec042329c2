//! Scripted event orchestration for one night in the house.
//!
//! `VisitorGame` is the root driver: it owns every piece of session state,
//! routes input by phase and advances the sub-systems in a fixed order each
//! tick (collaborators, cue events, phone call, encounters, phase logic).

mod atmosphere;
pub(crate) mod cues;
mod cutscene;
mod encounter;
mod interaction;
mod movement;
mod save;
mod services;
mod tutorial;
mod types;
mod world;

use engine::{
    smoothstep, ActionStates, BlobStore, CameraPose, CueKey, InputAction, InputSnapshot, KeyCode,
    Scene, SceneCommand, Vec3, VolumeCategory,
};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use atmosphere::Atmosphere;
use cutscene::{Cutscene, LAPTOP_LOOK, LAPTOP_VIEW};
use encounter::EncounterEngine;
use interaction::InteractionOutcome;
use save::{LoadOutcome, SaveError, SaveRecord, SaveSnapshot};
use services::ScriptContext;
use tutorial::PhoneTutorial;
use types::{EncounterStatus, GamePhase, WorldFlags};
use world::{Anchor, ConeTargeting, SceneProps, TargetingProvider, WorldLayout};

pub(crate) use services::Services;
pub(crate) use types::GameTuning;
pub(crate) use world::WorldAnchors;

const TARGETING_HALF_ANGLE_RADIANS: f32 = 0.15;
const START_SCREEN_VOLUME: f32 = 0.5;
/// Cues tied to the call and the dark that must not outlive a load.
const SESSION_CUES: [CueKey; 4] = [
    cues::PHONE_RING,
    cues::PHONE_TUTORIAL,
    cues::PHONE_HANGUP,
    cues::HEARTBEAT,
];

/// State the scripted components share during a tick.
struct Shared {
    flags: WorldFlags,
    services: Services,
    props: SceneProps,
    rng: StdRng,
}

impl Shared {
    fn script(&mut self, clock_seconds: f64, camera_position: Vec3) -> ScriptContext<'_> {
        ScriptContext {
            flags: &mut self.flags,
            services: &mut self.services,
            props: &mut self.props,
            rng: &mut self.rng,
            clock_seconds,
            camera_position,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CameraTransition {
    from: CameraPose,
    progress: f32,
}

pub(crate) struct VisitorGame {
    phase: GamePhase,
    shared: Shared,
    camera: CameraPose,
    stand_pose: CameraPose,
    transition: Option<CameraTransition>,
    actions: ActionStates,
    tuning: GameTuning,
    layout: WorldLayout,
    targeting: Box<dyn TargetingProvider>,
    cutscene: Cutscene,
    encounter: EncounterEngine,
    tutorial: PhoneTutorial,
    atmosphere: Atmosphere,
    store: Box<dyn BlobStore>,
    clock_seconds: f64,
    ambience_muted: Option<bool>,
    prompt: &'static str,
    notice: Option<String>,
}

impl VisitorGame {
    pub(crate) fn new(
        services: Services,
        store: Box<dyn BlobStore>,
        rng: StdRng,
        tuning: GameTuning,
    ) -> Self {
        let layout = WorldLayout::standard();
        let targeting = Box::new(ConeTargeting::new(
            layout.targets().to_vec(),
            TARGETING_HALF_ANGLE_RADIANS,
        ));
        Self {
            phase: GamePhase::StartScreen,
            shared: Shared {
                flags: WorldFlags::default(),
                services,
                props: SceneProps::default(),
                rng,
            },
            camera: Cutscene::opening_pose(),
            stand_pose: Cutscene::opening_pose(),
            transition: None,
            actions: ActionStates::default(),
            encounter: EncounterEngine::new(&tuning),
            atmosphere: Atmosphere::new(&tuning),
            tuning,
            layout,
            targeting,
            cutscene: Cutscene::default(),
            tutorial: PhoneTutorial::default(),
            store,
            clock_seconds: 0.0,
            ambience_muted: None,
            prompt: "",
            notice: None,
        }
    }

    pub(crate) fn phase(&self) -> GamePhase {
        self.phase
    }

    pub(crate) fn flags(&self) -> &WorldFlags {
        &self.shared.flags
    }

    pub(crate) fn encounter_status(&self) -> EncounterStatus {
        self.encounter.status()
    }

    /// Contextual interaction prompt; empty when hidden.
    pub(crate) fn prompt(&self) -> &'static str {
        self.prompt
    }

    /// Last user-facing save/load message.
    pub(crate) fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub(crate) fn has_save(&self) -> bool {
        save::has_save(self.store.as_ref())
    }

    pub(crate) fn set_volume(&mut self, category: VolumeCategory, value: f32) {
        let value = value.clamp(0.0, 1.0);
        debug!(category = ?category, value, "volume_changed");
        self.shared.services.set_category_volume(category, value);
    }

    pub(crate) fn start_new_game(&mut self) {
        info!("new_game");
        let services = &mut self.shared.services;
        services.stop(cues::START_SCREEN);
        services.set_bedroom_light(false, false);

        self.shared.flags = WorldFlags::default();
        self.shared.props = SceneProps::default();
        self.encounter.reset();
        self.tutorial.reset();
        self.atmosphere.reset();
        self.cutscene = Cutscene::default();
        self.camera = Cutscene::opening_pose();
        self.stand_pose = self.camera;
        self.transition = None;
        self.actions.clear();
        self.ambience_muted = None;
        self.notice = None;
        self.start_ambience_bed();
        self.enter_phase(GamePhase::Cutscene);
    }

    pub(crate) fn save_game(&mut self) -> Result<(), SaveError> {
        let stand_position = match self.phase {
            GamePhase::Gameplay => self.camera.position,
            _ => self.stand_pose.position,
        };
        let flags = self.shared.flags;
        let snapshot = SaveSnapshot {
            lights_on: flags.lights_on,
            phone_answered: flags.phone_answered,
            main_door_open: flags.main_door_open,
            bathroom_door_open: flags.bathroom_door_open,
            pool: self.encounter.pool().to_vec(),
            stand_position,
            tutorial: self.tutorial.stage(),
        };
        match save::write_save(self.store.as_mut(), &SaveRecord::capture(&snapshot)) {
            Ok(()) => {
                info!(remaining = snapshot.pool.len(), "game_saved");
                self.notice = Some("Game saved".to_string());
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "save_failed");
                self.notice = Some("Save failed".to_string());
                Err(error)
            }
        }
    }

    /// Loads the save slot. Live state is replaced only when a usable record
    /// was read; an unusable one is cleared and the running night goes on.
    pub(crate) fn load_game(&mut self) -> LoadOutcome {
        let outcome = save::read_save(self.store.as_mut());
        match &outcome {
            LoadOutcome::Loaded(snapshot) => self.apply_snapshot(snapshot),
            LoadOutcome::NotFound => {
                info!("no_save_found");
                self.notice = Some("No save data found".to_string());
            }
            LoadOutcome::Reset { reason } => {
                warn!(reason = %reason, phase = %self.phase, "save_reset");
                if self.phase == GamePhase::StartScreen {
                    self.encounter.reset();
                }
                self.notice = Some(
                    "Save data was incomplete and has been reset. Please start a new game."
                        .to_string(),
                );
            }
            LoadOutcome::Corrupted { reason } => {
                warn!(reason = %reason, "save_corrupted");
                self.notice = Some(
                    "Save data was corrupted and has been reset. Please start a new game."
                        .to_string(),
                );
            }
        }
        outcome
    }

    fn apply_snapshot(&mut self, snapshot: &SaveSnapshot) {
        self.shared.services.stop(cues::START_SCREEN);
        for key in SESSION_CUES {
            self.shared.services.stop(key);
        }
        self.shared.flags = WorldFlags {
            lights_on: snapshot.lights_on,
            phone_answered: snapshot.phone_answered,
            main_door_open: snapshot.main_door_open,
            bathroom_door_open: snapshot.bathroom_door_open,
            ..WorldFlags::default()
        };
        self.shared
            .services
            .set_bedroom_light(snapshot.lights_on, false);
        self.shared.props = SceneProps::default();
        self.shared.props.snap_doors(&self.shared.flags);

        let stand = snapshot.stand_position;
        self.stand_pose = CameraPose::looking_at(stand, stand + Vec3::new(1.0, 0.0, 0.0));
        self.camera = CameraPose::looking_at(LAPTOP_VIEW, LAPTOP_LOOK);
        self.transition = None;
        self.actions.clear();
        self.atmosphere.reset();
        self.ambience_muted = None;

        self.tutorial.restore(snapshot.tutorial);
        let status = if !snapshot.phone_answered {
            EncounterStatus::WaitingForPhone
        } else if self.tutorial.is_done() {
            EncounterStatus::Grace
        } else {
            EncounterStatus::IntroCooldown
        };
        self.encounter.restore(snapshot.pool.clone(), status);
        if !snapshot.phone_answered {
            let mut ctx = self.shared.script(self.clock_seconds, self.camera.position);
            cutscene::start_phone_ring(&mut ctx);
        }

        self.start_ambience_bed();
        self.notice = None;
        info!(remaining = snapshot.pool.len(), status = status.as_token(), "game_loaded");
        self.enter_phase(GamePhase::Laptop);
    }

    fn start_ambience_bed(&mut self) {
        let services = &mut self.shared.services;
        services.loop_global(cues::AMBIENCE, 0.05);
        services.loop_at(cues::RAIN, Anchor::Window, 0.1, 10.0);
        services.loop_at(cues::NIGHT_AMBIENCE, Anchor::AmbienceProxy, 0.3, 40.0);
    }

    fn enter_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            info!(from = %self.phase, to = %phase, "phase_changed");
            self.phase = phase;
        }
    }

    fn handle_menu_input(&mut self, input: &InputSnapshot) {
        if input.new_game_pressed() && self.phase == GamePhase::StartScreen {
            self.start_new_game();
        }
        if input.load_pressed()
            && matches!(
                self.phase,
                GamePhase::StartScreen | GamePhase::Gameplay | GamePhase::Laptop
            )
        {
            self.load_game();
        }
        if input.save_pressed() && matches!(self.phase, GamePhase::Gameplay | GamePhase::Laptop) {
            // Failure is already logged and surfaced as a notice.
            let _ = self.save_game();
        }
    }

    fn handle_key_up(&mut self, code: KeyCode) {
        let action = InputAction::from_key(code);
        if InputAction::MOVEMENT.contains(&action) {
            self.actions.set(action, false);
        }
    }

    fn handle_key_down(&mut self, code: KeyCode) {
        let action = InputAction::from_key(code);
        match self.phase {
            GamePhase::Laptop if action == InputAction::Interact => {
                self.begin_transition(GamePhase::TransitionFromLaptop);
            }
            GamePhase::Cutscene if action == InputAction::Skip => {
                let mut ctx = self.shared.script(self.clock_seconds, self.camera.position);
                if self.cutscene.skip_to_end(&mut ctx) {
                    self.camera = Cutscene::closing_pose();
                    self.enter_phase(GamePhase::Gameplay);
                }
            }
            GamePhase::Gameplay => match action {
                InputAction::Skip => {
                    if self.shared.flags.phone_answered {
                        self.tutorial.skip(&mut self.shared.services);
                    }
                }
                InputAction::Interact => self.interact(),
                InputAction::MoveForward
                | InputAction::MoveBackward
                | InputAction::MoveLeft
                | InputAction::MoveRight => self.actions.set(action, true),
                InputAction::Quit => {}
            },
            _ => {}
        }
    }

    fn interact(&mut self) {
        let Some(target) = self.targeting.target(&self.camera) else {
            return;
        };
        if target.distance >= self.tuning.interaction_range {
            return;
        }
        let mut ctx = self.shared.script(self.clock_seconds, self.camera.position);
        match interaction::interact(target.kind, &self.tuning, &mut ctx) {
            InteractionOutcome::Handled => {}
            InteractionOutcome::OpenLaptop => {
                self.stand_pose = self.camera;
                self.begin_transition(GamePhase::TransitionToLaptop);
            }
            InteractionOutcome::PhoneAnswered => self.tutorial.pick_up(),
        }
    }

    fn begin_transition(&mut self, phase: GamePhase) {
        self.transition = Some(CameraTransition {
            from: self.camera,
            progress: 0.0,
        });
        self.actions.clear();
        self.enter_phase(phase);
    }

    fn advance_transition(&mut self, dt: f32) {
        let target = match self.phase {
            GamePhase::TransitionToLaptop => CameraPose::looking_at(LAPTOP_VIEW, LAPTOP_LOOK),
            GamePhase::TransitionFromLaptop => self.stand_pose,
            _ => return,
        };
        let transition = self.transition.get_or_insert(CameraTransition {
            from: self.camera,
            progress: 0.0,
        });
        transition.progress =
            (transition.progress + dt / self.tuning.laptop_transition_seconds).min(1.0);
        if transition.progress < 1.0 {
            self.camera = transition
                .from
                .blend(&target, smoothstep(transition.progress));
        } else {
            self.camera = target;
            self.transition = None;
            let next = if self.phase == GamePhase::TransitionToLaptop {
                GamePhase::Laptop
            } else {
                GamePhase::Gameplay
            };
            self.enter_phase(next);
        }
    }

    fn advance(&mut self, dt: f32) {
        self.clock_seconds += f64::from(dt);
        for event in self.shared.services.tick(dt) {
            self.encounter.on_cue_event(&event);
        }

        match self.phase {
            GamePhase::StartScreen | GamePhase::Survived => return,
            GamePhase::Cutscene => {
                let mut ctx = self.shared.script(self.clock_seconds, self.camera.position);
                if self.cutscene.update(dt, &mut self.camera, &mut ctx) {
                    self.enter_phase(GamePhase::Gameplay);
                }
                self.prompt = "";
                return;
            }
            _ => {}
        }

        if self.shared.flags.phone_answered
            && !self.tutorial.is_done()
            && self.tutorial.update(dt, &mut self.shared.services)
        {
            self.encounter.finish_intro();
        }

        if self.phase.runs_encounters() {
            let mut ctx = self.shared.script(self.clock_seconds, self.camera.position);
            self.encounter.update(dt, &mut ctx);
            if self.encounter.status() == EncounterStatus::Survived {
                self.enter_phase(GamePhase::Survived);
                self.prompt = "";
                return;
            }

            let muted = !self.shared.flags.lights_on;
            if self.ambience_muted != Some(muted) {
                self.shared.services.set_ambience_muted(muted);
                self.ambience_muted = Some(muted);
            }
        }

        match self.phase {
            GamePhase::TransitionToLaptop | GamePhase::TransitionFromLaptop => {
                self.advance_transition(dt);
            }
            GamePhase::Gameplay => {
                movement::step_player(
                    &mut self.camera,
                    &self.actions,
                    dt,
                    self.clock_seconds,
                    &self.layout,
                    &self.shared.flags,
                    &self.tuning,
                );
                if self.shared.flags.phone_answered {
                    let mut ctx = self.shared.script(self.clock_seconds, self.camera.position);
                    self.atmosphere.update(dt, &mut ctx);
                }
            }
            _ => {}
        }

        self.refresh_prompt();
    }

    fn refresh_prompt(&mut self) {
        self.prompt = match self.phase {
            GamePhase::Gameplay => self
                .targeting
                .target(&self.camera)
                .filter(|target| target.distance < self.tuning.interaction_range)
                .map(|target| target.kind.prompt(&self.shared.flags))
                .unwrap_or(""),
            _ => "",
        };
    }
}

impl Scene for VisitorGame {
    fn load(&mut self) {
        self.shared
            .services
            .loop_global(cues::START_SCREEN, START_SCREEN_VOLUME);
        info!(has_save = self.has_save(), "start_screen");
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.handle_menu_input(input);
        for code in input.key_ups() {
            self.handle_key_up(*code);
        }
        for code in input.key_downs() {
            self.handle_key_down(*code);
        }
        self.advance(fixed_dt_seconds);
        SceneCommand::None
    }

    fn unload(&mut self) {
        let services = &mut self.shared.services;
        for key in [
            cues::START_SCREEN,
            cues::AMBIENCE,
            cues::RAIN,
            cues::NIGHT_AMBIENCE,
            cues::HEARTBEAT,
            cues::PHONE_RING,
        ] {
            services.stop(key);
        }
        info!(
            phase = %self.phase,
            encounter = self.encounter.status().as_token(),
            remaining = self.encounter.pool().len(),
            "session_closed"
        );
    }

    fn debug_title(&self) -> Option<String> {
        let entity = self
            .encounter
            .current_entity()
            .map(|kind| kind.as_token())
            .unwrap_or("-");
        let mut title = format!(
            "{} | {} | entity {} | pool {} | lights {}",
            self.phase,
            self.encounter_status().as_token(),
            entity,
            self.encounter.pool().len(),
            if self.flags().lights_on { "on" } else { "off" },
        );
        if !self.prompt().is_empty() {
            title.push_str(" | ");
            title.push_str(self.prompt());
        }
        if let Some(notice) = self.notice() {
            title.push_str(" | ");
            title.push_str(notice);
        }
        Some(title)
    }
}
