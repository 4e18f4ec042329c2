use std::time::{SystemTime, UNIX_EPOCH};

use engine::{BlobStore, StoreError, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::cutscene::DESK_ALARM;
use super::types::{EntityKind, TutorialStage};

pub(crate) const SAVE_KEY: &str = "visitorSaveData";
pub(crate) const SAVE_VERSION: &str = "1.0";

/// On-disk shape of a save slot. Every field is optional so that older or
/// hand-edited blobs still parse; [`restore`] decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveRecord {
    #[serde(default)]
    pub(crate) version: Option<String>,
    #[serde(default)]
    pub(crate) lights_on: Option<bool>,
    #[serde(default)]
    pub(crate) phone_answered: Option<bool>,
    #[serde(default)]
    pub(crate) is_main_door_open: Option<bool>,
    #[serde(default)]
    pub(crate) is_bathroom_door_open: Option<bool>,
    #[serde(default)]
    pub(crate) pool: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) player_pos: Option<Vec3>,
    #[serde(default)]
    pub(crate) tutorial_state: Option<TutorialStage>,
    #[serde(default)]
    pub(crate) timestamp: Option<u64>,
}

/// Live state captured for a save.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SaveSnapshot {
    pub(crate) lights_on: bool,
    pub(crate) phone_answered: bool,
    pub(crate) main_door_open: bool,
    pub(crate) bathroom_door_open: bool,
    pub(crate) pool: Vec<EntityKind>,
    pub(crate) stand_position: Vec3,
    pub(crate) tutorial: TutorialStage,
}

impl SaveRecord {
    pub(crate) fn capture(snapshot: &SaveSnapshot) -> Self {
        Self {
            version: Some(SAVE_VERSION.to_string()),
            lights_on: Some(snapshot.lights_on),
            phone_answered: Some(snapshot.phone_answered),
            is_main_door_open: Some(snapshot.main_door_open),
            is_bathroom_door_open: Some(snapshot.bathroom_door_open),
            pool: Some(
                snapshot
                    .pool
                    .iter()
                    .map(|kind| kind.as_token().to_string())
                    .collect(),
            ),
            player_pos: Some(snapshot.stand_position),
            tutorial_state: Some(snapshot.tutorial),
            timestamp: Some(now_millis()),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub(crate) enum SaveError {
    #[error("encode save json: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoadOutcome {
    Loaded(SaveSnapshot),
    NotFound,
    /// The record parsed but lacked fields needed to resume; the slot was
    /// cleared and a fresh pool applies.
    Reset { reason: String },
    /// The record could not be parsed or read; the slot was cleared.
    Corrupted { reason: String },
}

pub(crate) fn write_save(store: &mut dyn BlobStore, record: &SaveRecord) -> Result<(), SaveError> {
    let json = serde_json::to_string_pretty(record)?;
    store.write(SAVE_KEY, &json)?;
    Ok(())
}

pub(crate) fn has_save(store: &dyn BlobStore) -> bool {
    matches!(store.read(SAVE_KEY), Ok(Some(_)))
}

/// Reads and validates the save slot. Nothing live is touched here; a bad
/// slot is removed before reporting.
pub(crate) fn read_save(store: &mut dyn BlobStore) -> LoadOutcome {
    let raw = match store.read(SAVE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return LoadOutcome::NotFound,
        Err(error) => {
            let reason = format!("read save: {error}");
            clear_slot(store);
            return LoadOutcome::Corrupted { reason };
        }
    };

    let outcome = match parse_save_record(&raw) {
        Ok(record) => match restore(&record) {
            Ok(snapshot) => return LoadOutcome::Loaded(snapshot),
            Err(RestoreError::MissingFields(reason)) => LoadOutcome::Reset { reason },
            Err(RestoreError::Invalid(reason)) => LoadOutcome::Corrupted { reason },
        },
        Err(reason) => LoadOutcome::Corrupted { reason },
    };
    clear_slot(store);
    outcome
}

fn clear_slot(store: &mut dyn BlobStore) {
    if let Err(error) = store.remove(SAVE_KEY) {
        warn!(error = %error, "save_clear_failed");
    }
}

pub(crate) fn parse_save_record(raw: &str) -> Result<SaveRecord, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, SaveRecord>(&mut deserializer) {
        Ok(record) => Ok(record),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse save json: {source}"))
            } else {
                Err(format!("parse save json at {path}: {source}"))
            }
        }
    }
}

#[derive(Debug)]
enum RestoreError {
    MissingFields(String),
    Invalid(String),
}

fn restore(record: &SaveRecord) -> Result<SaveSnapshot, RestoreError> {
    if let Some(version) = record.version.as_deref() {
        if version != SAVE_VERSION {
            return Err(RestoreError::Invalid(format!(
                "validation failed at version: expected {SAVE_VERSION}, got {version}"
            )));
        }
    }
    let (Some(pool), Some(phone_answered)) = (record.pool.as_ref(), record.phone_answered) else {
        return Err(RestoreError::MissingFields(
            "save data missing critical fields (pool, phoneAnswered)".to_string(),
        ));
    };

    let stand_position = match record.player_pos {
        Some(pos) if pos.x.is_finite() && pos.y.is_finite() && pos.z.is_finite() => pos,
        Some(_) => {
            warn!("save_player_position_not_finite");
            DESK_ALARM
        }
        None => DESK_ALARM,
    };

    Ok(SaveSnapshot {
        lights_on: record.lights_on.unwrap_or(false),
        phone_answered,
        main_door_open: record.is_main_door_open.unwrap_or(false),
        bathroom_door_open: record.is_bathroom_door_open.unwrap_or(false),
        pool: sanitize_pool(pool),
        stand_position,
        tutorial: record.tutorial_state.unwrap_or(TutorialStage::Done),
    })
}

/// Keeps known entity tokens in their saved order, each at most once.
fn sanitize_pool(tokens: &[String]) -> Vec<EntityKind> {
    let mut pool = Vec::with_capacity(tokens.len());
    for token in tokens {
        match EntityKind::from_token(token) {
            Some(kind) if !pool.contains(&kind) => pool.push(kind),
            Some(kind) => warn!(entity = %kind, "save_pool_duplicate_dropped"),
            None => warn!(token = %token, "save_pool_unknown_entity_dropped"),
        }
    }
    pool
}
