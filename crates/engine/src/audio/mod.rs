//! Cue playback contract used by scripted sequences.
//!
//! Completion is reported through [`AudioCueService::drain_events`] rather than
//! callbacks: the owner of the service polls once per tick, so a finished cue
//! can never re-enter the code that requested it.

mod catalog;
mod mixer;

use std::fmt;

use thiserror::Error;

pub use catalog::{CueCatalog, CueSpec};
pub use mixer::CueMixer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CueKey(pub &'static str);

impl CueKey {
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Scene object a positional cue is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emitter {
    Global,
    Anchored { anchor: AnchorId, ref_distance: f32 },
}

impl Emitter {
    pub fn anchored(anchor: AnchorId, ref_distance: f32) -> Self {
        Emitter::Anchored {
            anchor,
            ref_distance,
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Emitter::Anchored { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CueTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueEvent {
    /// A one-shot reached its natural end.
    Finished { key: CueKey, ticket: CueTicket },
    /// A queued request was discarded because its asset never became
    /// available; it will not play.
    Dropped { key: CueKey, ticket: CueTicket },
}

impl CueEvent {
    pub fn key(&self) -> CueKey {
        match self {
            CueEvent::Finished { key, .. } | CueEvent::Dropped { key, .. } => *key,
        }
    }

    pub fn ticket(&self) -> CueTicket {
        match self {
            CueEvent::Finished { ticket, .. } | CueEvent::Dropped { ticket, .. } => *ticket,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuePlayback {
    pub base_volume: f32,
    pub pitch: f32,
}

impl Default for CuePlayback {
    fn default() -> Self {
        Self {
            base_volume: 1.0,
            pitch: 1.0,
        }
    }
}

impl CuePlayback {
    pub fn at_volume(base_volume: f32) -> Self {
        Self {
            base_volume,
            ..Self::default()
        }
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VolumeCategory {
    Master,
    Music,
    Ambience,
    Sfx,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CueError {
    #[error("unknown cue key '{0}'")]
    UnknownCue(CueKey),
    #[error("cue '{0}' failed to load")]
    AssetFailed(CueKey),
}

pub trait AudioCueService {
    /// Starts a non-looping cue. The returned ticket is reported exactly once
    /// through [`CueEvent::Finished`] when playback ends naturally. A request
    /// made before the asset is loaded is queued and replayed with the same
    /// ticket.
    fn play_one_shot(
        &mut self,
        key: CueKey,
        emitter: Emitter,
        playback: CuePlayback,
    ) -> Result<CueTicket, CueError>;

    /// Starts a looping cue unless one is already playing for `key`, in which
    /// case the existing ticket is returned.
    fn play_loop(
        &mut self,
        key: CueKey,
        emitter: Emitter,
        playback: CuePlayback,
    ) -> Result<CueTicket, CueError>;

    /// Stops every voice of `key`. Stopped one-shots never report completion.
    fn stop(&mut self, key: CueKey);

    fn fade_out(&mut self, key: CueKey, seconds: f32);

    fn is_playing(&self, key: CueKey) -> bool;

    fn active_instances(&self, key: CueKey) -> usize;

    fn set_category_volume(&mut self, category: VolumeCategory, value: f32);

    fn category_volume(&self, category: VolumeCategory) -> f32;

    /// Volume currently applied to the newest voice of `key`.
    fn effective_volume(&self, key: CueKey) -> Option<f32>;

    /// Pins the applied volume of `key` regardless of category scaling;
    /// `None` restores the computed volume.
    fn set_volume_override(&mut self, key: CueKey, level: Option<f32>);

    fn advance(&mut self, dt_seconds: f32);

    fn drain_events(&mut self) -> Vec<CueEvent>;

    /// Every cue that actually started, in order.
    fn started(&self) -> &[CueKey];
}
