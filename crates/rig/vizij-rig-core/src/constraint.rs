//! Swing-twist constraint synthesis.
//!
//! A swing-twist constraint splits a joint rotation into a twist about `twist_axis`
//! (bounded by `[twist_min, twist_max]`) and a swing away from it (bounded by a cone of
//! `swing_radius`). All output angles are radians.

use serde::{Deserialize, Serialize};

use crate::biomech::{BiomechanicalTable, JointKind, Motion};
use crate::error::{Result, RigError};

/// Normalize a 3D direction. Returns `None` for zero-length or non-finite input.
pub fn normalize(v: [f32; 3]) -> Option<[f32; 3]> {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if !len.is_finite() || len <= f32::EPSILON {
        return None;
    }
    Some([v[0] / len, v[1] / len, v[2] / len])
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    Hinge,
    Ball,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDescriptor {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    /// Unit axis in the bone's local frame.
    pub twist_axis: [f32; 3],
    pub twist_min: f32,
    pub twist_max: f32,
    pub swing_radius: f32,
}

impl ConstraintDescriptor {
    /// Report ranges that exclude the rest pose. Synthesis never clamps; callers
    /// decide whether a malformed descriptor is usable.
    pub fn validate(&self) -> Result<()> {
        if self.twist_min > 0.0 || self.twist_max < 0.0 {
            return Err(RigError::InvertedTwistRange {
                min: self.twist_min,
                max: self.twist_max,
            });
        }
        if self.swing_radius < 0.0 {
            return Err(RigError::NegativeSwing(self.swing_radius));
        }
        Ok(())
    }
}

fn flag_defects(desc: ConstraintDescriptor) -> ConstraintDescriptor {
    if let Err(err) = desc.validate() {
        log::warn!("synthesized {:?} constraint is malformed: {err}", desc.kind);
    }
    desc
}

/// Hinge constraint: flexion is the positive twist sense, extension the negative
/// one, and `wiggle` bounds off-axis rotation.
pub fn synthesize_hinge(
    twist_axis: [f32; 3],
    flexion_deg: f32,
    extension_deg: f32,
    wiggle_deg: f32,
) -> Result<ConstraintDescriptor> {
    let axis = normalize(twist_axis).ok_or(RigError::DegenerateAxis { axis: twist_axis })?;
    Ok(flag_defects(ConstraintDescriptor {
        kind: ConstraintKind::Hinge,
        twist_axis: axis,
        twist_min: (-extension_deg).to_radians(),
        twist_max: flexion_deg.to_radians(),
        swing_radius: wiggle_deg.to_radians(),
    }))
}

/// Ball constraint with a symmetric twist range and a swing cone.
pub fn synthesize_ball(
    twist_axis: [f32; 3],
    twist_range_deg: f32,
    swing_range_deg: f32,
) -> Result<ConstraintDescriptor> {
    let axis = normalize(twist_axis).ok_or(RigError::DegenerateAxis { axis: twist_axis })?;
    Ok(flag_defects(ConstraintDescriptor {
        kind: ConstraintKind::Ball,
        twist_axis: axis,
        twist_min: (-twist_range_deg).to_radians(),
        twist_max: twist_range_deg.to_radians(),
        swing_radius: swing_range_deg.to_radians(),
    }))
}

/// Builds constraints from a borrowed ROM table.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintSynthesizer<'a> {
    table: &'a BiomechanicalTable,
}

impl<'a> ConstraintSynthesizer<'a> {
    pub fn new(table: &'a BiomechanicalTable) -> Self {
        Self { table }
    }

    /// Look up `joint` and synthesize its constraint around `detected_axis`.
    ///
    /// Ball joints map axial `rotation` onto the twist range and the largest planar
    /// motion (`flexion`) onto the swing cone. Returns `Ok(None)` for unknown joint
    /// names (with a warning) and for universal joints, which have no swing-twist form.
    pub fn synthesize_from_biomechanics(
        &self,
        joint: &str,
        detected_axis: [f32; 3],
    ) -> Result<Option<ConstraintDescriptor>> {
        let Some(entry) = self.table.lookup(joint) else {
            log::warn!("no biomechanical data for joint '{joint}'");
            return Ok(None);
        };

        let require = |motion: Motion| {
            entry.limit(motion).ok_or_else(|| RigError::MissingLimit {
                joint: joint.to_string(),
                kind: entry.kind.to_string(),
                motion: motion.to_string(),
            })
        };

        match entry.kind {
            JointKind::Hinge => synthesize_hinge(
                detected_axis,
                require(Motion::Flexion)?,
                require(Motion::Extension)?,
                require(Motion::Wiggle)?,
            )
            .map(Some),
            JointKind::Ball => synthesize_ball(
                detected_axis,
                require(Motion::Rotation)?,
                require(Motion::Flexion)?,
            )
            .map(Some),
            JointKind::Universal => Ok(None),
        }
    }
}
