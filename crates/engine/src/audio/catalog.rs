use std::collections::BTreeMap;

use super::{CueKey, VolumeCategory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueSpec {
    pub category: VolumeCategory,
    pub duration_seconds: f32,
}

impl CueSpec {
    pub fn sfx(duration_seconds: f32) -> Self {
        Self {
            category: VolumeCategory::Sfx,
            duration_seconds,
        }
    }

    pub fn ambience(duration_seconds: f32) -> Self {
        Self {
            category: VolumeCategory::Ambience,
            duration_seconds,
        }
    }

    pub fn music(duration_seconds: f32) -> Self {
        Self {
            category: VolumeCategory::Music,
            duration_seconds,
        }
    }
}

/// Known cues with their mixer category and natural playback length.
#[derive(Debug, Clone, Default)]
pub struct CueCatalog {
    specs: BTreeMap<CueKey, CueSpec>,
}

impl CueCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: CueKey, spec: CueSpec) -> Self {
        self.register(key, spec);
        self
    }

    pub fn register(&mut self, key: CueKey, spec: CueSpec) {
        self.specs.insert(key, spec);
    }

    pub fn spec(&self, key: CueKey) -> Option<CueSpec> {
        self.specs.get(&key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = CueKey> + '_ {
        self.specs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
