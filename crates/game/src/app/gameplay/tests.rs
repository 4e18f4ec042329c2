    use engine::{CueMixer, FileBlobStore, LightRig, MemoryBlobStore};
    use rand::SeedableRng;

    use super::save::SAVE_KEY;
    use super::types::{EntityKind, TutorialStage};
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn build_game(store: Box<dyn BlobStore>) -> VisitorGame {
        let services = Services::new(
            Some(Box::new(CueMixer::preloaded(cues::catalog()))),
            Some(Box::new(LightRig::default())),
            WorldAnchors::standard(),
        );
        let mut game = VisitorGame::new(
            services,
            store,
            StdRng::seed_from_u64(11),
            GameTuning::default(),
        );
        Scene::load(&mut game);
        game
    }

    fn tick(game: &mut VisitorGame, input: InputSnapshot) {
        game.update(DT, &input);
    }

    fn run_for(game: &mut VisitorGame, seconds: f32) {
        let ticks = (seconds / DT).round() as u32;
        for _ in 0..ticks {
            tick(game, InputSnapshot::empty());
        }
    }

    fn press(game: &mut VisitorGame, code: KeyCode) {
        tick(game, InputSnapshot::empty().with_key_down(code));
    }

    fn started(game: &VisitorGame) -> Vec<engine::CueKey> {
        game.shared
            .services
            .audio()
            .expect("audio")
            .started()
            .to_vec()
    }

    /// New game with the cutscene skipped: standing at the switch, lights on,
    /// phone ringing.
    fn skipped_to_gameplay(store: Box<dyn BlobStore>) -> VisitorGame {
        let mut game = build_game(store);
        tick(&mut game, InputSnapshot::empty().with_new_game_pressed(true));
        press(&mut game, KeyCode::Space);
        game
    }

    fn face(game: &mut VisitorGame, position: Vec3, target: Vec3) {
        game.camera = CameraPose::looking_at(position, target);
    }

    #[test]
    fn start_screen_music_stops_on_new_game() {
        let mut game = build_game(Box::new(MemoryBlobStore::new()));
        assert_eq!(game.phase(), GamePhase::StartScreen);
        assert!(game.shared.services.is_playing(cues::START_SCREEN));

        tick(&mut game, InputSnapshot::empty().with_new_game_pressed(true));
        assert_eq!(game.phase(), GamePhase::Cutscene);
        assert!(!game.shared.services.is_playing(cues::START_SCREEN));
        for key in [cues::AMBIENCE, cues::RAIN, cues::NIGHT_AMBIENCE] {
            assert!(game.shared.services.is_playing(key), "{key} not looping");
        }
        assert!(!game.flags().lights_on);
    }

    #[test]
    fn start_screen_ignores_gameplay_keys_and_save() {
        let mut game = build_game(Box::new(MemoryBlobStore::new()));
        press(&mut game, KeyCode::KeyE);
        press(&mut game, KeyCode::Space);
        tick(&mut game, InputSnapshot::empty().with_save_pressed(true));
        assert_eq!(game.phase(), GamePhase::StartScreen);
        assert!(!game.has_save());
        assert_eq!(game.prompt(), "");
    }

    #[test]
    fn skipping_the_cutscene_rings_the_phone() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        assert_eq!(game.phase(), GamePhase::Gameplay);
        assert!(game.flags().lights_on);
        assert!(game.flags().phone_ringing);
        assert!(game.shared.services.is_playing(cues::PHONE_RING));
        assert!(!game.shared.services.is_playing(cues::ALARM));
        assert_eq!(game.cutscene.stage(), cutscene::CutsceneStage::Done);

        run_for(&mut game, 0.1);
        assert_eq!(game.prompt(), "[E] Turn Off Lights");
        assert_eq!(game.encounter_status(), EncounterStatus::WaitingForPhone);
    }

    #[test]
    fn cutscene_runs_to_gameplay_without_input() {
        let mut game = build_game(Box::new(MemoryBlobStore::new()));
        tick(&mut game, InputSnapshot::empty().with_new_game_pressed(true));
        run_for(&mut game, 10.0);
        assert_eq!(game.phase(), GamePhase::Cutscene);
        assert_eq!(game.prompt(), "");
        run_for(&mut game, 15.0);
        assert_eq!(game.phase(), GamePhase::Gameplay);
        assert!(game.flags().lights_on);
        assert!(game.flags().phone_ringing);
    }

    #[test]
    fn answering_the_phone_plays_the_call_then_grace() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        face(
            &mut game,
            Vec3::new(4.5, 4.0, 3.0),
            Vec3::new(5.85, 1.6, 3.85),
        );
        run_for(&mut game, 0.05);
        assert_eq!(game.prompt(), "[E] Answer Phone");

        press(&mut game, KeyCode::KeyE);
        assert!(game.flags().phone_answered);
        assert!(!game.flags().phone_ringing);
        assert_eq!(game.tutorial.stage(), TutorialStage::Pickup);
        assert_eq!(game.encounter_status(), EncounterStatus::IntroCooldown);

        run_for(&mut game, 1.0);
        assert!(game.shared.services.is_playing(cues::PHONE_TUTORIAL));

        press(&mut game, KeyCode::Space);
        assert!(!game.shared.services.is_playing(cues::PHONE_TUTORIAL));
        run_for(&mut game, 2.5);
        assert_eq!(game.tutorial.stage(), TutorialStage::Grace);
        assert_eq!(game.encounter_status(), EncounterStatus::IntroCooldown);

        run_for(&mut game, 10.0);
        assert!(game.tutorial.is_done());
        assert_eq!(game.encounter_status(), EncounterStatus::Grace);
        assert!(game.encounter.timers().grace < 2.0);
        assert_eq!(
            started(&game)
                .iter()
                .filter(|key| **key == cues::PHONE_HANGUP)
                .count(),
            1
        );
    }

    #[test]
    fn switch_interaction_toggles_lights_and_prompt() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        press(&mut game, KeyCode::KeyE);
        assert!(!game.flags().lights_on);
        assert_eq!(game.prompt(), "[E] Turn On Lights");
        let lighting = game.shared.services.lighting().expect("lighting");
        assert!(!lighting.is_lit());
    }

    #[test]
    fn saved_game_loads_into_a_fresh_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut first = skipped_to_gameplay(Box::new(FileBlobStore::new(dir.path())));
        first
            .encounter
            .restore(vec![EntityKind::Window], EncounterStatus::WaitingForPhone);
        face(
            &mut first,
            Vec3::new(-2.0, 4.0, 0.0),
            Vec3::new(-2.0, 4.0, -5.0),
        );
        tick(&mut first, InputSnapshot::empty().with_save_pressed(true));
        assert_eq!(first.notice(), Some("Game saved"));

        let mut second = build_game(Box::new(FileBlobStore::new(dir.path())));
        assert!(second.has_save());
        tick(&mut second, InputSnapshot::empty().with_load_pressed(true));

        assert_eq!(second.phase(), GamePhase::Laptop);
        assert!(second.flags().lights_on);
        assert!(!second.flags().main_door_open);
        assert!(second.flags().phone_ringing);
        assert_eq!(second.encounter.pool(), &[EntityKind::Window]);
        assert_eq!(second.encounter_status(), EncounterStatus::WaitingForPhone);
        assert_eq!(second.stand_pose.position, Vec3::new(-2.0, 4.0, 0.0));
        assert!(second
            .shared
            .services
            .lighting()
            .expect("lighting")
            .is_lit());
        assert!(!second.shared.services.is_playing(cues::START_SCREEN));

        let cues_started = started(&second);
        for key in [cues::SWITCH, cues::DOOR_OPEN, cues::DOOR_CLOSE] {
            assert!(!cues_started.contains(&key), "{key} replayed on load");
        }
    }

    #[test]
    fn load_with_finished_call_resumes_in_grace() {
        let mut store = MemoryBlobStore::new();
        store
            .write(
                SAVE_KEY,
                r#"{"version":"1.0","lightsOn":false,"phoneAnswered":true,"isMainDoorOpen":true,"pool":["CLOSET","WHISPER"],"tutorialState":"DONE"}"#,
            )
            .expect("seed");
        let mut game = build_game(Box::new(store));
        let outcome = game.load_game();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)), "{outcome:?}");
        assert_eq!(game.encounter_status(), EncounterStatus::Grace);
        assert!(game.flags().main_door_open);
        assert_eq!(game.shared.props.main_door_yaw, world::MAIN_DOOR_OPEN_YAW);
        assert!(!game.flags().phone_ringing);
        assert!(!game.shared.services.is_playing(cues::PHONE_RING));
    }

    #[test]
    fn load_mid_call_restarts_the_line() {
        let mut store = MemoryBlobStore::new();
        store
            .write(
                SAVE_KEY,
                r#"{"phoneAnswered":true,"pool":["CLOSET"],"tutorialState":"WAIT_TUTORIAL"}"#,
            )
            .expect("seed");
        let mut game = build_game(Box::new(store));
        game.load_game();
        assert_eq!(game.encounter_status(), EncounterStatus::IntroCooldown);
        assert_eq!(game.tutorial.stage(), TutorialStage::StartTutorial);
        run_for(&mut game, 0.05);
        assert!(game.shared.services.is_playing(cues::PHONE_TUTORIAL));
    }

    #[test]
    fn incomplete_save_resets_to_a_full_pool() {
        let mut store = MemoryBlobStore::new();
        store
            .write(SAVE_KEY, r#"{"phoneAnswered":true}"#)
            .expect("seed");
        let mut game = build_game(Box::new(store));
        game.encounter.restore(vec![], EncounterStatus::Cooldown);

        tick(&mut game, InputSnapshot::empty().with_load_pressed(true));
        assert_eq!(game.phase(), GamePhase::StartScreen);
        assert_eq!(game.encounter.pool().len(), EntityKind::ALL.len());
        assert_eq!(game.encounter_status(), EncounterStatus::WaitingForPhone);
        assert!(game.notice().is_some_and(|notice| notice.contains("reset")));
        assert!(!game.has_save());
    }

    #[test]
    fn incomplete_save_mid_encounter_leaves_the_night_running() {
        let mut store = MemoryBlobStore::new();
        store
            .write(SAVE_KEY, r#"{"phoneAnswered":true}"#)
            .expect("seed");
        let mut game = skipped_to_gameplay(Box::new(store));
        game.shared.flags.phone_answered = true;
        game.encounter.restore(
            vec![EntityKind::Window, EntityKind::Whisper],
            EncounterStatus::Cooldown,
        );
        game.encounter.begin(EntityKind::Closet);
        game.encounter
            .set_beat(Some(encounter::Beat::Closet(encounter::ClosetBeat::Bang)));
        run_for(&mut game, 0.05);
        assert!(game.shared.props.hand_visible);

        let outcome = game.load_game();
        assert!(matches!(outcome, LoadOutcome::Reset { .. }), "{outcome:?}");
        assert!(!game.has_save());
        assert!(game.notice().is_some_and(|notice| notice.contains("reset")));
        assert_eq!(game.phase(), GamePhase::Gameplay);
        assert_eq!(game.encounter_status(), EncounterStatus::Encounter);
        assert_eq!(game.encounter.current_entity(), Some(EntityKind::Closet));
        assert_eq!(
            game.encounter.pool(),
            &[EntityKind::Window, EntityKind::Whisper]
        );

        run_for(&mut game, 7.0);
        assert!(!game.shared.props.hand_visible);
        assert_eq!(game.encounter_status(), EncounterStatus::Cooldown);
        assert_eq!(game.encounter.pool().len(), 2);
    }

    #[test]
    fn loading_an_answered_call_silences_the_ring() {
        let mut store = MemoryBlobStore::new();
        store
            .write(
                SAVE_KEY,
                r#"{"lightsOn":true,"phoneAnswered":true,"pool":["WINDOW"],"tutorialState":"DONE"}"#,
            )
            .expect("seed");
        let mut game = skipped_to_gameplay(Box::new(store));
        assert!(game.shared.services.is_playing(cues::PHONE_RING));

        let outcome = game.load_game();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)), "{outcome:?}");
        assert!(!game.flags().phone_ringing);
        assert!(!game.shared.services.is_playing(cues::PHONE_RING));
        run_for(&mut game, 5.0);
        assert!(!game.shared.services.is_playing(cues::PHONE_RING));
    }

    #[test]
    fn loading_an_unanswered_call_keeps_one_ring() {
        let mut store = MemoryBlobStore::new();
        store
            .write(SAVE_KEY, r#"{"phoneAnswered":false,"pool":["WINDOW"]}"#)
            .expect("seed");
        let mut game = skipped_to_gameplay(Box::new(store));

        game.load_game();
        assert!(game.flags().phone_ringing);
        let audio = game.shared.services.audio().expect("audio");
        assert_eq!(audio.active_instances(cues::PHONE_RING), 1);
    }

    #[test]
    fn quiet_spell_after_the_call_survives_a_save() {
        let mut store = MemoryBlobStore::new();
        store
            .write(
                SAVE_KEY,
                r#"{"phoneAnswered":true,"pool":["CLOSET","WINDOW"],"tutorialState":"GRACE"}"#,
            )
            .expect("seed");
        let mut game = build_game(Box::new(store));
        game.load_game();
        assert_eq!(game.tutorial.stage(), TutorialStage::Grace);
        assert_eq!(game.encounter_status(), EncounterStatus::IntroCooldown);

        game.save_game().expect("save");
        game.load_game();
        assert_eq!(game.tutorial.stage(), TutorialStage::Grace);

        run_for(&mut game, 9.5);
        assert_eq!(game.encounter_status(), EncounterStatus::IntroCooldown);
        run_for(&mut game, 1.0);
        assert!(game.tutorial.is_done());
        assert_eq!(game.encounter_status(), EncounterStatus::Grace);
    }

    #[test]
    fn corrupted_save_keeps_live_state() {
        let mut store = MemoryBlobStore::new();
        store.write(SAVE_KEY, "{not json").expect("seed");
        let mut game = skipped_to_gameplay(Box::new(store));
        let flags_before = *game.flags();

        let outcome = game.load_game();
        assert!(matches!(outcome, LoadOutcome::Corrupted { .. }));
        assert_eq!(*game.flags(), flags_before);
        assert_eq!(game.phase(), GamePhase::Gameplay);
        assert!(!game.has_save());
    }

    #[test]
    fn missing_save_is_reported() {
        let mut game = build_game(Box::new(MemoryBlobStore::new()));
        assert_eq!(game.load_game(), LoadOutcome::NotFound);
        assert_eq!(game.notice(), Some("No save data found"));
        assert_eq!(game.phase(), GamePhase::StartScreen);
    }

    #[test]
    fn laptop_transition_freezes_encounters() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        game.shared.flags.phone_answered = true;
        game.shared.flags.phone_ringing = false;
        game.encounter.restore(EntityKind::ALL.to_vec(), EncounterStatus::Grace);
        let stand = Vec3::new(5.0, 4.0, 0.6);
        face(&mut game, stand, Vec3::new(5.0, 1.55, 3.0));
        run_for(&mut game, 0.05);
        assert_eq!(game.prompt(), "[E] Use Computer");

        press(&mut game, KeyCode::KeyE);
        assert_eq!(game.phase(), GamePhase::TransitionToLaptop);
        let grace_before = game.encounter.timers().grace;
        run_for(&mut game, 0.25);
        assert_eq!(game.phase(), GamePhase::TransitionToLaptop);
        assert_eq!(game.encounter.timers().grace, grace_before);
        assert_eq!(game.prompt(), "");

        run_for(&mut game, 0.3);
        assert_eq!(game.phase(), GamePhase::Laptop);
        assert_eq!(game.camera.position, LAPTOP_VIEW);
        run_for(&mut game, 1.0);
        assert!(game.encounter.timers().grace > grace_before);

        press(&mut game, KeyCode::KeyE);
        assert_eq!(game.phase(), GamePhase::TransitionFromLaptop);
        run_for(&mut game, 0.6);
        assert_eq!(game.phase(), GamePhase::Gameplay);
        assert!((game.camera.position.x - stand.x).abs() < 1e-4);
        assert!((game.camera.position.z - stand.z).abs() < 1e-4);
    }

    #[test]
    fn laptop_transition_eases_in() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        game.shared.flags.phone_answered = true;
        game.shared.flags.phone_ringing = false;
        face(&mut game, Vec3::new(5.0, 4.0, 0.6), Vec3::new(5.0, 1.55, 3.0));
        run_for(&mut game, 0.05);
        let from = game.camera.position;

        press(&mut game, KeyCode::KeyE);
        assert_eq!(game.phase(), GamePhase::TransitionToLaptop);
        run_for(&mut game, 6.0 * DT);

        let progress = 7.0 * DT / game.tuning.laptop_transition_seconds;
        let covered = (from.y - game.camera.position.y) / (from.y - LAPTOP_VIEW.y);
        assert!(
            (covered - smoothstep(progress)).abs() < 1e-3,
            "covered {covered} at progress {progress}"
        );
        assert!(covered < progress);
    }

    #[test]
    fn movement_keys_walk_until_released() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        let start = game.camera.position;
        press(&mut game, KeyCode::KeyS);
        run_for(&mut game, 0.5);
        let moved = game.camera.position;
        assert!(moved.z > start.z + 1.0, "{moved:?}");

        tick(&mut game, InputSnapshot::empty().with_key_up(KeyCode::KeyS));
        let stopped = game.camera.position;
        run_for(&mut game, 0.5);
        assert_eq!(game.camera.position.z, stopped.z);
    }

    #[test]
    fn darkness_ducks_the_ambience_bed() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        run_for(&mut game, 0.05);
        let audio = game.shared.services.audio().expect("audio");
        assert_eq!(audio.effective_volume(cues::AMBIENCE), Some(0.05));

        press(&mut game, KeyCode::KeyE);
        run_for(&mut game, 0.05);
        let audio = game.shared.services.audio().expect("audio");
        assert_eq!(audio.effective_volume(cues::AMBIENCE), Some(0.0));
        assert_eq!(audio.effective_volume(cues::RAIN), Some(0.2));
        assert_eq!(audio.effective_volume(cues::NIGHT_AMBIENCE), Some(0.5));

        press(&mut game, KeyCode::KeyE);
        run_for(&mut game, 0.05);
        let audio = game.shared.services.audio().expect("audio");
        assert_eq!(audio.effective_volume(cues::AMBIENCE), Some(0.05));
    }

    #[test]
    fn empty_pool_after_cooldown_survives_the_night() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        game.shared.flags.phone_answered = true;
        game.encounter.restore(vec![], EncounterStatus::Cooldown);
        run_for(&mut game, 15.1);
        assert_eq!(game.phase(), GamePhase::Survived);
        assert_eq!(game.encounter_status(), EncounterStatus::Survived);

        press(&mut game, KeyCode::KeyE);
        tick(&mut game, InputSnapshot::empty().with_save_pressed(true));
        assert!(!game.has_save());
    }

    #[test]
    fn volume_setter_clamps_and_reaches_the_mixer() {
        let mut game = build_game(Box::new(MemoryBlobStore::new()));
        game.set_volume(VolumeCategory::Music, 2.0);
        game.set_volume(VolumeCategory::Master, 0.5);
        let audio = game.shared.services.audio().expect("audio");
        assert_eq!(audio.category_volume(VolumeCategory::Music), 1.0);
        assert_eq!(audio.effective_volume(cues::START_SCREEN), Some(0.25));
    }

    #[test]
    fn unload_silences_loops_and_title_reports_phase() {
        let mut game = skipped_to_gameplay(Box::new(MemoryBlobStore::new()));
        let title = game.debug_title().expect("title");
        assert!(title.starts_with("gameplay"), "{title}");
        assert!(title.contains("pool 3"), "{title}");

        game.unload();
        for key in [cues::AMBIENCE, cues::RAIN, cues::PHONE_RING] {
            assert!(!game.shared.services.is_playing(key), "{key} still playing");
        }
    }
