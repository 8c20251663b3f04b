use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kanjiset_core::defaults::{DATASETS_DIR, FONTS_DIR, FONT_SIZE, IMAGE_SIZE};

/// Partial settings as read from `kanjiset.json` or collected from CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    pub datasets_dir: Option<PathBuf>,
    pub fonts_dir: Option<PathBuf>,
    pub font_size: Option<u32>,
    pub image_size: Option<u32>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSettings {
    pub datasets_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub font_size: u32,
    pub image_size: u32,
    pub jobs: usize,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            datasets_dir: PathBuf::from(DATASETS_DIR),
            fonts_dir: PathBuf::from(FONTS_DIR),
            font_size: FONT_SIZE,
            image_size: IMAGE_SIZE,
            jobs: 1,
        }
    }
}

impl ResolvedSettings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = &patch.datasets_dir {
            self.datasets_dir = v.clone();
        }
        if let Some(v) = &patch.fonts_dir {
            self.fonts_dir = v.clone();
        }
        if let Some(v) = patch.font_size {
            self.font_size = v;
        }
        if let Some(v) = patch.image_size {
            self.image_size = v;
        }
        if let Some(v) = patch.jobs {
            self.jobs = v.max(1);
        }
    }

    /// Defaults, then each patch from lowest to highest precedence.
    pub fn roll_up(patches_low_to_high: &[Option<&SettingsPatch>]) -> Self {
        let mut out = Self::default();
        for patch in patches_low_to_high.iter().flatten() {
            out.apply(patch);
        }
        out
    }
}

/// Read a settings file; a missing file is not an error.
pub fn load_settings_patch(path: &Path) -> anyhow::Result<Option<SettingsPatch>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let patch = serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(patch))
}
