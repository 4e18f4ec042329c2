use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::{
    AudioCueService, CueCatalog, CueError, CueEvent, CueKey, CuePlayback, CueSpec, CueTicket,
    Emitter, VolumeCategory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetState {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    ticket: CueTicket,
    emitter: Emitter,
    playback: CuePlayback,
    looped: bool,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from_volume: f32,
    seconds: f32,
    elapsed: f32,
}

#[derive(Debug, Clone)]
struct Voice {
    ticket: CueTicket,
    key: CueKey,
    emitter: Emitter,
    spec: CueSpec,
    looped: bool,
    base_volume: f32,
    pitch: f32,
    elapsed: f32,
    applied_volume: f32,
    fade: Option<Fade>,
}

impl Voice {
    fn finished(&self) -> bool {
        !self.looped && self.elapsed >= self.spec.duration_seconds
    }
}

/// Headless mixer: tracks voices, playback position and volume without
/// producing sound. Playback time advances only through [`advance`].
///
/// [`advance`]: AudioCueService::advance
#[derive(Debug)]
pub struct CueMixer {
    catalog: CueCatalog,
    assets: HashMap<CueKey, AssetState>,
    pending: BTreeMap<CueKey, PendingRequest>,
    voices: Vec<Voice>,
    volumes: BTreeMap<VolumeCategory, f32>,
    overrides: HashMap<CueKey, f32>,
    events: Vec<CueEvent>,
    started: Vec<CueKey>,
    next_ticket: u64,
}

impl CueMixer {
    /// Every catalog entry starts in the loading state.
    pub fn new(catalog: CueCatalog) -> Self {
        let assets = catalog
            .keys()
            .map(|key| (key, AssetState::Loading))
            .collect();
        let volumes = [
            VolumeCategory::Master,
            VolumeCategory::Music,
            VolumeCategory::Ambience,
            VolumeCategory::Sfx,
        ]
        .into_iter()
        .map(|category| (category, 1.0))
        .collect();
        Self {
            catalog,
            assets,
            pending: BTreeMap::new(),
            voices: Vec::new(),
            volumes,
            overrides: HashMap::new(),
            events: Vec::new(),
            started: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn preloaded(catalog: CueCatalog) -> Self {
        let mut mixer = Self::new(catalog);
        let keys: Vec<CueKey> = mixer.catalog.keys().collect();
        for key in keys {
            mixer.mark_loaded(key);
        }
        mixer
    }

    /// Marks the asset for `key` as decoded and replays a queued request.
    pub fn mark_loaded(&mut self, key: CueKey) {
        if self.catalog.spec(key).is_none() {
            return;
        }
        self.assets.insert(key, AssetState::Loaded);
        if let Some(request) = self.pending.remove(&key) {
            debug!(cue = %key, ticket = request.ticket.0, "cue_replayed_after_load");
            self.start_voice(key, request);
        }
    }

    pub fn mark_failed(&mut self, key: CueKey) {
        warn!(cue = %key, "cue_asset_failed");
        self.assets.insert(key, AssetState::Failed);
        if let Some(request) = self.pending.remove(&key) {
            if !request.looped {
                self.events.push(CueEvent::Dropped {
                    key,
                    ticket: request.ticket,
                });
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Seconds until the newest voice of `key` ends naturally.
    pub fn remaining_seconds(&self, key: CueKey) -> Option<f32> {
        self.newest_voice(key).and_then(|voice| {
            if voice.looped {
                None
            } else {
                Some(((voice.spec.duration_seconds - voice.elapsed) / voice.pitch).max(0.0))
            }
        })
    }

    pub fn pitch_of(&self, key: CueKey) -> Option<f32> {
        self.newest_voice(key).map(|voice| voice.pitch)
    }

    pub fn emitter_of(&self, key: CueKey) -> Option<Emitter> {
        self.newest_voice(key).map(|voice| voice.emitter)
    }

    fn newest_voice(&self, key: CueKey) -> Option<&Voice> {
        self.voices.iter().rev().find(|voice| voice.key == key)
    }

    fn alloc_ticket(&mut self) -> CueTicket {
        let ticket = CueTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.saturating_add(1);
        ticket
    }

    fn computed_volume(&self, key: CueKey, category: VolumeCategory, base_volume: f32) -> f32 {
        if let Some(level) = self.overrides.get(&key) {
            return *level;
        }
        let category_volume = self.volumes.get(&category).copied().unwrap_or(1.0);
        let master = self
            .volumes
            .get(&VolumeCategory::Master)
            .copied()
            .unwrap_or(1.0);
        base_volume * category_volume * master
    }

    fn reapply_volumes(&mut self) {
        let updates: Vec<f32> = self
            .voices
            .iter()
            .map(|voice| self.computed_volume(voice.key, voice.spec.category, voice.base_volume))
            .collect();
        for (voice, volume) in self.voices.iter_mut().zip(updates) {
            voice.applied_volume = volume;
        }
    }

    fn request(
        &mut self,
        key: CueKey,
        emitter: Emitter,
        playback: CuePlayback,
        looped: bool,
    ) -> Result<CueTicket, CueError> {
        if self.catalog.spec(key).is_none() {
            return Err(CueError::UnknownCue(key));
        }
        match self.assets.get(&key).copied().unwrap_or(AssetState::Loading) {
            AssetState::Failed => Err(CueError::AssetFailed(key)),
            AssetState::Loading => {
                let ticket = self.alloc_ticket();
                let request = PendingRequest {
                    ticket,
                    emitter,
                    playback,
                    looped,
                };
                if let Some(replaced) = self.pending.insert(key, request) {
                    if !replaced.looped {
                        self.events.push(CueEvent::Dropped {
                            key,
                            ticket: replaced.ticket,
                        });
                    }
                }
                debug!(cue = %key, ticket = ticket.0, "cue_queued_until_loaded");
                Ok(ticket)
            }
            AssetState::Loaded => {
                let ticket = self.alloc_ticket();
                self.start_voice(
                    key,
                    PendingRequest {
                        ticket,
                        emitter,
                        playback,
                        looped,
                    },
                );
                Ok(ticket)
            }
        }
    }

    fn start_voice(&mut self, key: CueKey, request: PendingRequest) {
        let Some(spec) = self.catalog.spec(key) else {
            return;
        };
        if request.emitter.is_positional() && !request.looped {
            self.voices.retain(|voice| voice.key != key);
        }
        let pitch = if request.playback.pitch > 0.0 {
            request.playback.pitch
        } else {
            1.0
        };
        let applied_volume = self.computed_volume(key, spec.category, request.playback.base_volume);
        self.voices.push(Voice {
            ticket: request.ticket,
            key,
            emitter: request.emitter,
            spec,
            looped: request.looped,
            base_volume: request.playback.base_volume,
            pitch,
            elapsed: 0.0,
            applied_volume,
            fade: None,
        });
        self.started.push(key);
    }
}

impl AudioCueService for CueMixer {
    fn play_one_shot(
        &mut self,
        key: CueKey,
        emitter: Emitter,
        playback: CuePlayback,
    ) -> Result<CueTicket, CueError> {
        self.request(key, emitter, playback, false)
    }

    fn play_loop(
        &mut self,
        key: CueKey,
        emitter: Emitter,
        playback: CuePlayback,
    ) -> Result<CueTicket, CueError> {
        if let Some(existing) = self.newest_voice(key) {
            return Ok(existing.ticket);
        }
        self.request(key, emitter, playback, true)
    }

    fn stop(&mut self, key: CueKey) {
        self.voices.retain(|voice| voice.key != key);
        self.pending.remove(&key);
    }

    fn fade_out(&mut self, key: CueKey, seconds: f32) {
        if seconds <= 0.0 {
            self.stop(key);
            return;
        }
        for voice in self.voices.iter_mut().filter(|voice| voice.key == key) {
            if voice.fade.is_none() {
                voice.fade = Some(Fade {
                    from_volume: voice.base_volume,
                    seconds,
                    elapsed: 0.0,
                });
            }
        }
    }

    fn is_playing(&self, key: CueKey) -> bool {
        self.voices.iter().any(|voice| voice.key == key)
    }

    fn active_instances(&self, key: CueKey) -> usize {
        self.voices.iter().filter(|voice| voice.key == key).count()
    }

    fn set_category_volume(&mut self, category: VolumeCategory, value: f32) {
        self.volumes.insert(category, value.clamp(0.0, 1.0));
        self.reapply_volumes();
    }

    fn category_volume(&self, category: VolumeCategory) -> f32 {
        self.volumes.get(&category).copied().unwrap_or(1.0)
    }

    fn effective_volume(&self, key: CueKey) -> Option<f32> {
        self.newest_voice(key).map(|voice| voice.applied_volume)
    }

    fn set_volume_override(&mut self, key: CueKey, level: Option<f32>) {
        match level {
            Some(level) => {
                self.overrides.insert(key, level);
            }
            None => {
                self.overrides.remove(&key);
            }
        }
        self.reapply_volumes();
    }

    fn advance(&mut self, dt_seconds: f32) {
        if dt_seconds <= 0.0 {
            return;
        }
        let mut faded_out = Vec::new();
        for voice in &mut self.voices {
            voice.elapsed += dt_seconds * voice.pitch;
            if let Some(fade) = voice.fade.as_mut() {
                fade.elapsed += dt_seconds;
                let progress = (fade.elapsed / fade.seconds).min(1.0);
                voice.base_volume = fade.from_volume * (1.0 - progress);
                if progress >= 1.0 {
                    faded_out.push(voice.ticket);
                }
            }
        }

        let mut finished = Vec::new();
        self.voices.retain(|voice| {
            if faded_out.contains(&voice.ticket) {
                return false;
            }
            if voice.finished() {
                finished.push(CueEvent::Finished {
                    key: voice.key,
                    ticket: voice.ticket,
                });
                return false;
            }
            true
        });
        self.events.extend(finished);
        self.reapply_volumes();
    }

    fn drain_events(&mut self) -> Vec<CueEvent> {
        std::mem::take(&mut self.events)
    }

    fn started(&self) -> &[CueKey] {
        &self.started
    }
}
