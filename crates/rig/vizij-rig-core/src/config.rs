//! Configuration for vizij-rig-core.

use serde::{Deserialize, Serialize};

use crate::biomech::BiomechanicalTable;
use crate::classify::Classifier;
use crate::error::{Result, RigError};

/// Per-build switches. Mirrors the options object JS hosts pass around.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    pub enable_legs: bool,
    pub enable_arms: bool,
    /// Reserved for spine chains; currently ignored.
    pub enable_spine: bool,
    /// Emit advisory diagnostics (platform, bone counts, per-joint axes).
    /// Warnings about skipped limbs are emitted regardless.
    pub log_detection: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            enable_legs: true,
            enable_arms: true,
            enable_spine: false,
            log_detection: true,
        }
    }
}

/// Partial override applied by `ChainAssembler::set_options`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptionsPatch {
    pub enable_legs: Option<bool>,
    pub enable_arms: Option<bool>,
    pub enable_spine: Option<bool>,
    pub log_detection: Option<bool>,
}

impl BuildOptions {
    pub fn apply(&mut self, patch: &BuildOptionsPatch) {
        if let Some(v) = patch.enable_legs {
            self.enable_legs = v;
        }
        if let Some(v) = patch.enable_arms {
            self.enable_arms = v;
        }
        if let Some(v) = patch.enable_spine {
            self.enable_spine = v;
        }
        if let Some(v) = patch.log_detection {
            self.log_detection = v;
        }
    }
}

/// Solver step parameters written into every chain. These bound the per-iteration
/// rotation step of the consuming CCD solver; they are not joint limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainSettings {
    pub iteration_limit: u32,
    pub min_angle: f32,
    pub max_angle: f32,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            iteration_limit: 10,
            min_angle: 0.0,
            max_angle: 0.3,
        }
    }
}

/// Reference data the pipeline is composed from. Immutable once built; owned by the
/// assembler and lent to the classifier and synthesizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigProfile {
    #[serde(default = "BiomechanicalTable::standard")]
    pub biomechanics: BiomechanicalTable,
    #[serde(default)]
    pub classifier: Classifier,
    #[serde(default)]
    pub chain: ChainSettings,
}

impl Default for RigProfile {
    fn default() -> Self {
        Self::standard()
    }
}

impl RigProfile {
    pub fn standard() -> Self {
        Self {
            biomechanics: BiomechanicalTable::standard(),
            classifier: Classifier::standard(),
            chain: ChainSettings::default(),
        }
    }

    /// Parse and validate a profile. Omitted sections fall back to the standard data.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut profile: RigProfile =
            serde_json::from_str(json).map_err(|e| RigError::Profile(e.to_string()))?;
        profile.biomechanics.validate()?;
        profile.classifier.normalize();
        Ok(profile)
    }
}
