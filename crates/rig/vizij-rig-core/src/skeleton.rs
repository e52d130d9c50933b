//! Bone references and a minimal in-memory skeleton.
//!
//! Host adapters implement [`BoneRef`] for their own bone type. [`Skeleton`] is the
//! engine-agnostic snapshot used by fixtures, the WASM binding, and tests.

use serde::{Deserialize, Serialize};

use crate::assembler::TargetSlot;

/// What the pipeline needs from a host bone.
pub trait BoneRef {
    /// Stable identity used to resolve a bone's index in the flat sequence.
    fn uid(&self) -> &str;
    /// Human-readable name used for classification.
    fn name(&self) -> &str;
    /// Local offset from the parent. Not read by the pipeline; carried for
    /// presentation layers.
    fn offset(&self) -> [f32; 3];
}

/// Receives the synthetic IK target bones reserved by a build.
pub trait TargetSink {
    /// Index the next appended target will be stored at.
    fn next_index(&self) -> usize;
    /// Append a target and return the index it was stored at.
    fn append_target(&mut self, target: &TargetSlot) -> usize;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bone {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub offset: [f32; 3],
}

impl Bone {
    pub fn new(uid: impl Into<String>, name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            parent,
            offset: [0.0; 3],
        }
    }

    pub fn with_offset(mut self, offset: [f32; 3]) -> Self {
        self.offset = offset;
        self
    }
}

impl BoneRef for Bone {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn offset(&self) -> [f32; 3] {
        self.offset
    }
}

/// Flat bone sequence in skeleton order. Parents precede children.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }
}

impl TargetSink for Skeleton {
    fn next_index(&self) -> usize {
        self.bones.len()
    }

    /// Targets are appended as parentless bones; the host positions them.
    fn append_target(&mut self, target: &TargetSlot) -> usize {
        self.bones
            .push(Bone::new(target.name.clone(), target.name.clone(), None));
        self.bones.len() - 1
    }
}
