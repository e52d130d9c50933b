//! Error type shared by the rig pipeline.
//!
//! Expected absence of data (incomplete mapping, missing limb bones, unknown joint
//! names) is never an error; those degrade the result instead. `RigError` covers
//! malformed collaborator responses and invalid configuration.

use thiserror::Error;

use crate::mapping::Role;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error("role mapper failed: {0}")]
    Mapper(String),

    #[error("axis detector failed for bone '{bone}': {reason}")]
    Detector { bone: String, reason: String },

    #[error("role '{role}' maps to bone '{uid}' which is not part of the skeleton")]
    UnknownBone { role: Role, uid: String },

    #[error("axis result for bone '{bone}' is malformed: {reason}")]
    MalformedAxis { bone: String, reason: String },

    #[error("twist axis [{}, {}, {}] has no direction", .axis[0], .axis[1], .axis[2])]
    DegenerateAxis { axis: [f32; 3] },

    #[error("joint '{joint}': limit '{motion}' must be finite and non-negative, got {value}")]
    InvalidLimit {
        joint: String,
        motion: String,
        value: f32,
    },

    #[error("joint '{joint}' ({kind}) is missing required limit '{motion}'")]
    MissingLimit {
        joint: String,
        kind: String,
        motion: String,
    },

    #[error("twist range [{min}, {max}] does not contain the rest pose")]
    InvertedTwistRange { min: f32, max: f32 },

    #[error("swing radius must be non-negative, got {0}")]
    NegativeSwing(f32),

    #[error("target '{name}' expected at index {expected}, sink assigned {actual}")]
    TargetIndexMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("rig profile parse error: {0}")]
    Profile(String),
}

pub type Result<T> = std::result::Result<T, RigError>;
