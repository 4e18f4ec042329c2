use engine::{
    AudioCueService, CueEvent, CueKey, CuePlayback, CueTicket, Emitter, LightingService,
    VolumeCategory,
};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, warn};

use super::cues;
use super::types::WorldFlags;
use super::world::{Anchor, SceneProps, WorldAnchors};

/// Result of asking for a one-shot cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CueRequest {
    /// Completion will be reported through this ticket.
    Started(CueTicket),
    /// Nothing will play and nothing will be reported; callers treat the cue
    /// as already finished.
    Skipped,
}

/// Front for the audio and lighting collaborators. Either may be absent, in
/// which case every call is a logged no-op.
pub(crate) struct Services {
    audio: Option<Box<dyn AudioCueService>>,
    lighting: Option<Box<dyn LightingService>>,
    anchors: WorldAnchors,
}

impl Services {
    pub(crate) fn new(
        audio: Option<Box<dyn AudioCueService>>,
        lighting: Option<Box<dyn LightingService>>,
        anchors: WorldAnchors,
    ) -> Self {
        Self {
            audio,
            lighting,
            anchors,
        }
    }

    #[cfg(test)]
    pub(crate) fn audio(&self) -> Option<&dyn AudioCueService> {
        self.audio.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn lighting(&self) -> Option<&dyn LightingService> {
        self.lighting.as_deref()
    }

    /// Advances collaborator clocks and collects completion events.
    pub(crate) fn tick(&mut self, dt_seconds: f32) -> Vec<CueEvent> {
        if let Some(lighting) = self.lighting.as_mut() {
            lighting.advance(dt_seconds);
        }
        match self.audio.as_mut() {
            Some(audio) => {
                audio.advance(dt_seconds);
                audio.drain_events()
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn play_global(&mut self, key: CueKey, playback: CuePlayback) -> CueRequest {
        self.one_shot(key, Emitter::Global, playback)
    }

    pub(crate) fn play_at(
        &mut self,
        key: CueKey,
        anchor: Anchor,
        ref_distance: f32,
        playback: CuePlayback,
    ) -> CueRequest {
        let Some(id) = self.anchors.get(anchor) else {
            debug!(cue = %key, anchor = ?anchor, "cue_skipped_missing_anchor");
            return CueRequest::Skipped;
        };
        self.one_shot(key, Emitter::anchored(id, ref_distance), playback)
    }

    /// Pitch is drawn from `1 ± variation / 2`.
    pub(crate) fn play_with_pitch_variation(
        &mut self,
        key: CueKey,
        variation: f32,
        rng: &mut StdRng,
    ) -> CueRequest {
        let pitch = 1.0 + (rng.random::<f32>() - 0.5) * variation;
        self.play_global(key, CuePlayback::default().with_pitch(pitch))
    }

    pub(crate) fn loop_global(&mut self, key: CueKey, base_volume: f32) {
        self.looped(key, Emitter::Global, CuePlayback::at_volume(base_volume));
    }

    pub(crate) fn loop_at(&mut self, key: CueKey, anchor: Anchor, base_volume: f32, ref_distance: f32) {
        let Some(id) = self.anchors.get(anchor) else {
            debug!(cue = %key, anchor = ?anchor, "loop_skipped_missing_anchor");
            return;
        };
        self.looped(
            key,
            Emitter::anchored(id, ref_distance),
            CuePlayback::at_volume(base_volume),
        );
    }

    pub(crate) fn stop(&mut self, key: CueKey) {
        if let Some(audio) = self.audio.as_mut() {
            audio.stop(key);
        }
    }

    pub(crate) fn fade_out(&mut self, key: CueKey, seconds: f32) {
        if let Some(audio) = self.audio.as_mut() {
            audio.fade_out(key, seconds);
        }
    }

    pub(crate) fn is_playing(&self, key: CueKey) -> bool {
        self.audio.as_ref().is_some_and(|audio| audio.is_playing(key))
    }

    pub(crate) fn set_category_volume(&mut self, category: VolumeCategory, value: f32) {
        if let Some(audio) = self.audio.as_mut() {
            audio.set_category_volume(category, value);
        }
    }

    /// Pins the ambience bed to its dark levels, or releases it back to the
    /// mixer's computed volume.
    pub(crate) fn set_ambience_muted(&mut self, muted: bool) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        let levels = [
            (cues::AMBIENCE, 0.0),
            (cues::RAIN, 0.2),
            (cues::NIGHT_AMBIENCE, 0.5),
        ];
        for (key, dark_level) in levels {
            audio.set_volume_override(key, muted.then_some(dark_level));
        }
    }

    pub(crate) fn set_bedroom_light(&mut self, on: bool, flicker: bool) {
        if let Some(lighting) = self.lighting.as_mut() {
            lighting.set_bedroom_light(on, flicker);
        }
    }

    fn one_shot(&mut self, key: CueKey, emitter: Emitter, playback: CuePlayback) -> CueRequest {
        let Some(audio) = self.audio.as_mut() else {
            debug!(cue = %key, "cue_skipped_no_audio");
            return CueRequest::Skipped;
        };
        match audio.play_one_shot(key, emitter, playback) {
            Ok(ticket) => CueRequest::Started(ticket),
            Err(error) => {
                warn!(cue = %key, error = %error, "cue_unavailable");
                CueRequest::Skipped
            }
        }
    }

    fn looped(&mut self, key: CueKey, emitter: Emitter, playback: CuePlayback) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        if let Err(error) = audio.play_loop(key, emitter, playback) {
            warn!(cue = %key, error = %error, "loop_unavailable");
        }
    }
}

/// Everything a scripted component may touch during one tick.
pub(crate) struct ScriptContext<'a> {
    pub(crate) flags: &'a mut WorldFlags,
    pub(crate) services: &'a mut Services,
    pub(crate) props: &'a mut SceneProps,
    pub(crate) rng: &'a mut StdRng,
    /// Seconds since the session started; drives cosmetic oscillation.
    pub(crate) clock_seconds: f64,
    pub(crate) camera_position: engine::Vec3,
}

impl ScriptContext<'_> {
    /// Sets the bedroom light and the shared flag together.
    pub(crate) fn set_lights(&mut self, on: bool) {
        self.flags.lights_on = on;
        self.services.set_bedroom_light(on, false);
    }
}
