//! Biomechanical range-of-motion reference data.
//!
//! Values come from anatomical ROM studies and are kept as literal data. Hinge limits
//! use the "safe" maximum rather than the medical maximum (`anatomicalMax`).

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};

/// Coarse joint kind shared by the classifier and the constraint table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// One rotational degree of freedom plus a small tolerance (knee, elbow).
    Hinge,
    /// Cone-bounded multi-axis rotation (hip, shoulder).
    Ball,
    /// Two coupled rotational freedoms (ankle, wrist).
    Universal,
}

impl JointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JointKind::Hinge => "hinge",
            JointKind::Ball => "ball",
            JointKind::Universal => "universal",
        }
    }

    /// Limits an entry of this kind must carry to be usable by the synthesizer.
    pub fn required_motions(&self) -> &'static [Motion] {
        match self {
            JointKind::Hinge => &[Motion::Flexion, Motion::Extension, Motion::Wiggle],
            JointKind::Ball => &[Motion::Rotation, Motion::Flexion],
            JointKind::Universal => &[],
        }
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named motion types a limit can be expressed for. All values are degrees.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Motion {
    Flexion,
    Extension,
    /// Off-axis tolerance for hinge joints.
    Wiggle,
    AnatomicalMax,
    Abduction,
    Adduction,
    Rotation,
    Dorsiflexion,
    Plantarflexion,
    Inversion,
    Eversion,
    RadialDeviation,
    UlnarDeviation,
}

impl Motion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Motion::Flexion => "flexion",
            Motion::Extension => "extension",
            Motion::Wiggle => "wiggle",
            Motion::AnatomicalMax => "anatomicalMax",
            Motion::Abduction => "abduction",
            Motion::Adduction => "adduction",
            Motion::Rotation => "rotation",
            Motion::Dorsiflexion => "dorsiflexion",
            Motion::Plantarflexion => "plantarflexion",
            Motion::Inversion => "inversion",
            Motion::Eversion => "eversion",
            Motion::RadialDeviation => "radialDeviation",
            Motion::UlnarDeviation => "ulnarDeviation",
        }
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Range-of-motion record for one joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomechanicalEntry {
    #[serde(rename = "type")]
    pub kind: JointKind,
    pub limits: HashMap<Motion, f32>,
}

impl BiomechanicalEntry {
    pub fn new(kind: JointKind, limits: &[(Motion, f32)]) -> Self {
        Self {
            kind,
            limits: limits.iter().copied().collect(),
        }
    }

    #[inline]
    pub fn limit(&self, motion: Motion) -> Option<f32> {
        self.limits.get(&motion).copied()
    }

    /// Check every limit is a finite, non-negative degree value and that the
    /// limits required by `kind` are present.
    pub fn validate(&self, joint: &str) -> Result<()> {
        for (motion, value) in &self.limits {
            if !value.is_finite() || *value < 0.0 {
                return Err(RigError::InvalidLimit {
                    joint: joint.to_string(),
                    motion: motion.to_string(),
                    value: *value,
                });
            }
        }
        for motion in self.kind.required_motions() {
            if !self.limits.contains_key(motion) {
                return Err(RigError::MissingLimit {
                    joint: joint.to_string(),
                    kind: self.kind.to_string(),
                    motion: motion.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Lookup table from joint name (`knee`, `elbow`, ...) to its ROM entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomechanicalTable {
    entries: HashMap<String, BiomechanicalEntry>,
}

impl BiomechanicalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in human ROM table.
    pub fn standard() -> Self {
        use Motion::*;

        let mut entries = HashMap::with_capacity(6);
        entries.insert(
            "knee".to_string(),
            BiomechanicalEntry::new(
                JointKind::Hinge,
                &[
                    (Flexion, 130.0),
                    (Extension, 0.0),
                    (Wiggle, 5.0),
                    (AnatomicalMax, 150.0),
                ],
            ),
        );
        entries.insert(
            "elbow".to_string(),
            BiomechanicalEntry::new(
                JointKind::Hinge,
                &[
                    (Flexion, 140.0),
                    (Extension, 0.0),
                    (Wiggle, 3.0),
                    (AnatomicalMax, 150.0),
                ],
            ),
        );
        entries.insert(
            "hip".to_string(),
            BiomechanicalEntry::new(
                JointKind::Ball,
                &[
                    (Flexion, 100.0),
                    (Extension, 15.0),
                    (Abduction, 40.0),
                    (Adduction, 25.0),
                    (Rotation, 45.0),
                ],
            ),
        );
        entries.insert(
            "shoulder".to_string(),
            BiomechanicalEntry::new(
                JointKind::Ball,
                &[
                    (Flexion, 170.0),
                    (Extension, 50.0),
                    (Abduction, 160.0),
                    (Adduction, 40.0),
                    (Rotation, 80.0),
                ],
            ),
        );
        entries.insert(
            "ankle".to_string(),
            BiomechanicalEntry::new(
                JointKind::Universal,
                &[
                    (Dorsiflexion, 20.0),
                    (Plantarflexion, 45.0),
                    (Inversion, 25.0),
                    (Eversion, 15.0),
                ],
            ),
        );
        entries.insert(
            "wrist".to_string(),
            BiomechanicalEntry::new(
                JointKind::Universal,
                &[
                    (Flexion, 80.0),
                    (Extension, 70.0),
                    (RadialDeviation, 20.0),
                    (UlnarDeviation, 35.0),
                ],
            ),
        );
        Self { entries }
    }

    #[inline]
    pub fn lookup(&self, joint: &str) -> Option<&BiomechanicalEntry> {
        self.entries.get(joint)
    }

    /// Insert or replace an entry after validating it.
    pub fn insert(&mut self, joint: impl Into<String>, entry: BiomechanicalEntry) -> Result<()> {
        let joint = joint.into();
        entry.validate(&joint)?;
        self.entries.insert(joint, entry);
        Ok(())
    }

    /// Validate every entry (used after deserializing a table).
    pub fn validate(&self) -> Result<()> {
        for (joint, entry) in &self.entries {
            entry.validate(joint)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn joints(&self) -> impl Iterator<Item = (&str, &BiomechanicalEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid_and_complete() {
        let table = BiomechanicalTable::standard();
        assert!(table.validate().is_ok());
        for joint in ["knee", "elbow", "hip", "shoulder", "ankle", "wrist"] {
            assert!(table.lookup(joint).is_some(), "missing {joint}");
        }
        assert_eq!(table.len(), 6);
        assert!(table.lookup("spine").is_none());
    }

    #[test]
    fn knee_and_shoulder_values_are_literal() {
        let table = BiomechanicalTable::standard();
        let knee = table.lookup("knee").unwrap();
        assert_eq!(knee.kind, JointKind::Hinge);
        assert_eq!(knee.limit(Motion::Flexion), Some(130.0));
        assert_eq!(knee.limit(Motion::Extension), Some(0.0));
        assert_eq!(knee.limit(Motion::Wiggle), Some(5.0));

        let shoulder = table.lookup("shoulder").unwrap();
        assert_eq!(shoulder.kind, JointKind::Ball);
        assert_eq!(shoulder.limit(Motion::Rotation), Some(80.0));
        assert_eq!(shoulder.limit(Motion::Abduction), Some(160.0));
    }

    #[test]
    fn insert_rejects_negative_and_incomplete_entries() {
        let mut table = BiomechanicalTable::new();
        let negative = BiomechanicalEntry::new(
            JointKind::Hinge,
            &[
                (Motion::Flexion, 90.0),
                (Motion::Extension, -10.0),
                (Motion::Wiggle, 2.0),
            ],
        );
        assert!(matches!(
            table.insert("finger", negative),
            Err(RigError::InvalidLimit { .. })
        ));

        let incomplete = BiomechanicalEntry::new(JointKind::Ball, &[(Motion::Flexion, 60.0)]);
        match table.insert("neck", incomplete) {
            Err(RigError::MissingLimit { motion, .. }) => assert_eq!(motion, "rotation"),
            other => panic!("expected missing limit, got {other:?}"),
        }
        assert!(table.is_empty());
    }

    #[test]
    fn new_joints_are_addable() {
        let mut table = BiomechanicalTable::standard();
        table
            .insert(
                "neck",
                BiomechanicalEntry::new(
                    JointKind::Ball,
                    &[(Motion::Flexion, 50.0), (Motion::Rotation, 70.0)],
                ),
            )
            .unwrap();
        assert_eq!(table.lookup("neck").unwrap().limit(Motion::Rotation), Some(70.0));
    }

    #[test]
    fn entry_json_uses_type_tag_and_camel_case_motions() {
        let json = r#"{ "type": "universal", "limits": { "radialDeviation": 20, "ulnarDeviation": 35 } }"#;
        let entry: BiomechanicalEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, JointKind::Universal);
        assert_eq!(entry.limit(Motion::UlnarDeviation), Some(35.0));
    }
}
