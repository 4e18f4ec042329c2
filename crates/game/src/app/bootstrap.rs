use std::path::Path;

use engine::{
    resolve_app_paths, AppPaths, CueMixer, FileBlobStore, LightRig, LoopConfig, StartupError,
    VolumeCategory,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::demo::DemoInput;
use super::gameplay::{self, GameTuning, Services, VisitorGame, WorldAnchors};

const SEED_ENV_VAR: &str = "VISITOR_SEED";
const REALTIME_ENV_VAR: &str = "VISITOR_REALTIME";
const DEMO_SECONDS_ENV_VAR: &str = "VISITOR_DEMO_SECONDS";
const MASTER_VOLUME_ENV_VAR: &str = "VISITOR_MASTER_VOLUME";
const DEFAULT_DEMO_SECONDS: f32 = 240.0;
const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "ogg", "wav"];

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) game: VisitorGame,
    pub(crate) input: DemoInput,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Visitor Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        saves = %paths.saves_dir.display(),
        "app_paths"
    );

    let seed = parse_env::<u64>(SEED_ENV_VAR);
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let realtime = parse_env::<u8>(REALTIME_ENV_VAR).is_some_and(|flag| flag == 1);
    let demo_seconds = parse_env::<f32>(DEMO_SECONDS_ENV_VAR)
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .unwrap_or(DEFAULT_DEMO_SECONDS);

    let config = LoopConfig {
        realtime,
        ..LoopConfig::default()
    };
    let services = Services::new(
        Some(Box::new(build_mixer(&paths))),
        Some(Box::new(LightRig::default())),
        WorldAnchors::standard(),
    );
    let store = Box::new(FileBlobStore::new(paths.saves_dir.clone()));
    let mut game = VisitorGame::new(services, store, rng, GameTuning::default());
    if let Some(volume) = parse_env::<f32>(MASTER_VOLUME_ENV_VAR) {
        game.set_volume(VolumeCategory::Master, volume);
    }
    let input = DemoInput::new(config.target_tps, demo_seconds);

    info!(seeded = seed.is_some(), realtime, demo_seconds, "session_configured");
    Ok(AppWiring {
        config,
        game,
        input,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Without an `assets/audio` directory every cue counts as decoded. With one,
/// cues whose file is absent are marked failed so their waiters resolve.
fn build_mixer(paths: &AppPaths) -> CueMixer {
    let audio_dir = paths.assets_dir.join("audio");
    if !audio_dir.is_dir() {
        return CueMixer::preloaded(gameplay::cues::catalog());
    }

    let catalog = gameplay::cues::catalog();
    let keys: Vec<_> = catalog.keys().collect();
    let mut mixer = CueMixer::new(catalog);
    for key in keys {
        if audio_file_exists(&audio_dir, key.as_str()) {
            mixer.mark_loaded(key);
        } else {
            mixer.mark_failed(key);
        }
    }
    mixer
}

fn audio_file_exists(dir: &Path, stem: &str) -> bool {
    AUDIO_EXTENSIONS
        .iter()
        .any(|ext| dir.join(format!("{stem}.{ext}")).is_file())
}

fn parse_env<T: std::str::FromStr>(var: &'static str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var, value = %raw, "env_var_ignored");
            None
        }
    }
}
