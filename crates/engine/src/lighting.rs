//! Bedroom illumination contract and the headless rig behind it.
//!
//! Timed effects (flicker, flash) are keyframes evaluated inside
//! [`LightingService::advance`], so they interleave deterministically with
//! the rest of a tick.

use tracing::debug;

const FLICKER_STEP_SECONDS: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightLevels {
    pub hemisphere: f32,
    pub bulb: f32,
    pub laptop: f32,
    pub switch_glow: f32,
}

impl LightLevels {
    pub const LIT: LightLevels = LightLevels {
        hemisphere: 1.2,
        bulb: 1.0,
        laptop: 0.5,
        switch_glow: 0.0,
    };

    pub const DARK: LightLevels = LightLevels {
        hemisphere: 0.05,
        bulb: 0.0,
        laptop: 4.0,
        switch_glow: 0.03,
    };

    pub fn for_state(lit: bool) -> Self {
        if lit {
            Self::LIT
        } else {
            Self::DARK
        }
    }
}

pub trait LightingService {
    /// Idempotent: re-applying the current state without flicker changes
    /// nothing.
    fn set_bedroom_light(&mut self, on: bool, flicker: bool);

    /// Overrides the hemisphere intensity for `duration_ms`, then restores it.
    fn flash(&mut self, intensity: f32, duration_ms: u32);

    /// Final state most recently requested, even while a flicker is running.
    fn is_lit(&self) -> bool;

    fn levels(&self) -> LightLevels;

    fn advance(&mut self, dt_seconds: f32);
}

#[derive(Debug, Clone)]
struct Flicker {
    frames: [bool; 6],
    next_frame: usize,
    elapsed: f32,
}

#[derive(Debug, Clone, Copy)]
struct Flash {
    restore_to: f32,
    remaining: f32,
}

#[derive(Debug, Clone)]
pub struct LightRig {
    lit: bool,
    applied: LightLevels,
    flicker: Option<Flicker>,
    flash: Option<Flash>,
    transitions: u32,
}

impl Default for LightRig {
    fn default() -> Self {
        Self::new(false)
    }
}

impl LightRig {
    pub fn new(lit: bool) -> Self {
        Self {
            lit,
            applied: LightLevels::for_state(lit),
            flicker: None,
            flash: None,
            transitions: 0,
        }
    }

    /// Number of state changes actually applied, flicker frames included.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn is_flickering(&self) -> bool {
        self.flicker.is_some()
    }

    fn apply(&mut self, lit: bool) {
        let mut levels = LightLevels::for_state(lit);
        if let Some(flash) = self.flash.as_mut() {
            // Keep the flash visible; restore to the new base afterwards.
            flash.restore_to = levels.hemisphere;
            levels.hemisphere = self.applied.hemisphere;
        }
        self.applied = levels;
        self.transitions = self.transitions.saturating_add(1);
    }
}

impl LightingService for LightRig {
    fn set_bedroom_light(&mut self, on: bool, flicker: bool) {
        if !flicker {
            if self.flicker.is_none() && self.lit == on {
                return;
            }
            self.flicker = None;
            self.lit = on;
            self.apply(on);
            return;
        }

        debug!(target_lit = on, "light_flicker_started");
        self.lit = on;
        let frames = [false, true, false, true, false, on];
        self.apply(frames[0]);
        self.flicker = Some(Flicker {
            frames,
            next_frame: 1,
            elapsed: 0.0,
        });
    }

    fn flash(&mut self, intensity: f32, duration_ms: u32) {
        let restore_to = match self.flash {
            Some(active) => active.restore_to,
            None => self.applied.hemisphere,
        };
        self.applied.hemisphere = intensity;
        self.flash = Some(Flash {
            restore_to,
            remaining: duration_ms as f32 / 1000.0,
        });
    }

    fn is_lit(&self) -> bool {
        self.lit
    }

    fn levels(&self) -> LightLevels {
        self.applied
    }

    fn advance(&mut self, dt_seconds: f32) {
        if dt_seconds <= 0.0 {
            return;
        }

        if let Some(mut flicker) = self.flicker.take() {
            flicker.elapsed += dt_seconds;
            while flicker.next_frame < flicker.frames.len()
                && flicker.elapsed >= FLICKER_STEP_SECONDS * flicker.next_frame as f32
            {
                let frame = flicker.frames[flicker.next_frame];
                self.apply(frame);
                flicker.next_frame += 1;
            }
            if flicker.next_frame < flicker.frames.len() {
                self.flicker = Some(flicker);
            }
        }

        if let Some(mut flash) = self.flash.take() {
            flash.remaining -= dt_seconds;
            if flash.remaining <= 0.0 {
                self.applied.hemisphere = flash.restore_to;
            } else {
                self.flash = Some(flash);
            }
        }
    }
}
