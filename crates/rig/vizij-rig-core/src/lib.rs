//! Vizij Rig Core (engine-agnostic)
//!
//! Turns an unlabeled humanoid bone sequence into an IK configuration: anatomical
//! joint classification, biomechanical range-of-motion data, swing-twist constraint
//! synthesis, and per-limb CCD chain assembly. Role mapping and axis detection are
//! supplied by the host through [`RoleMapper`] and [`AxisDetector`].

pub mod assembler;
pub mod axis;
pub mod biomech;
pub mod classify;
pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod skeleton;
pub mod snapshot;

// Re-exports for consumers (adapters)
pub use assembler::{ChainAssembler, ChainDescriptor, ChainLink, IkConfig, TargetSlot};
pub use axis::{AxisDetector, AxisLabel, AxisResult, StaticAxisDetector};
pub use biomech::{BiomechanicalEntry, BiomechanicalTable, JointKind, Motion};
pub use classify::{BoneClassification, Classifier, JointClassification, Pattern, RuleTable};
pub use config::{BuildOptions, BuildOptionsPatch, ChainSettings, RigProfile};
pub use constraint::{
    synthesize_ball, synthesize_hinge, ConstraintDescriptor, ConstraintKind, ConstraintSynthesizer,
};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, LogSink, NullSink, Severity};
pub use error::{Result, RigError};
pub use mapping::{BoneMapping, Limb, Role, RoleMapper, Side, StaticRoleMapper};
pub use skeleton::{Bone, BoneRef, Skeleton, TargetSink};
pub use snapshot::RigSnapshot;

/// Build an IK configuration with the standard profile and default options.
pub fn build_ik_config<B, M, D>(bones: &[B], mapper: &M, detector: &D) -> Result<IkConfig>
where
    B: BoneRef,
    M: RoleMapper<B> + ?Sized,
    D: AxisDetector<B> + ?Sized,
{
    ChainAssembler::default().build(bones, mapper, detector)
}
