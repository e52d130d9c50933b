//! Primary rotation-axis detection contract.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::constraint::normalize;
use crate::error::{Result, RigError};
use crate::skeleton::BoneRef;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisLabel {
    X,
    Y,
    Z,
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisLabel::X => "X",
            AxisLabel::Y => "Y",
            AxisLabel::Z => "Z",
        })
    }
}

/// The axis a joint hinges around, in the bone's local frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisResult {
    pub axis: AxisLabel,
    pub direction: [f32; 3],
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

impl AxisResult {
    pub fn new(axis: AxisLabel, direction: [f32; 3], confidence: f32) -> Self {
        Self {
            axis,
            direction,
            confidence,
        }
    }

    /// Confidence rounded to a whole percentage.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    /// Reject responses the pipeline cannot use.
    pub fn validate(&self, bone: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RigError::MalformedAxis {
                bone: bone.to_string(),
                reason: format!("confidence {} outside [0, 1]", self.confidence),
            });
        }
        if normalize(self.direction).is_none() {
            return Err(RigError::MalformedAxis {
                bone: bone.to_string(),
                reason: format!("direction {:?} has no length", self.direction),
            });
        }
        Ok(())
    }
}

/// Infers which local axis a bone hinges around.
pub trait AxisDetector<B: BoneRef> {
    fn detect_primary_axis(&self, bone: &B) -> Result<AxisResult>;
}

/// Replays recorded axis results keyed by bone uid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticAxisDetector {
    axes: HashMap<String, AxisResult>,
}

impl StaticAxisDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uid: impl Into<String>, result: AxisResult) -> Self {
        self.axes.insert(uid.into(), result);
        self
    }

    pub fn insert(&mut self, uid: impl Into<String>, result: AxisResult) {
        self.axes.insert(uid.into(), result);
    }
}

impl<B: BoneRef> AxisDetector<B> for StaticAxisDetector {
    fn detect_primary_axis(&self, bone: &B) -> Result<AxisResult> {
        self.axes
            .get(bone.uid())
            .cloned()
            .ok_or_else(|| RigError::Detector {
                bone: bone.name().to_string(),
                reason: "no recorded axis".into(),
            })
    }
}
