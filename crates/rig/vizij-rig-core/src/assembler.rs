//! Chain assembly: from an unlabeled bone sequence to an IK-ready configuration.
//!
//! Pipeline (single pass, no retries):
//! 1. role mapping, gated on `complete`
//! 2. bone uid → index resolution
//! 3. axis detection + hinge constraint synthesis for knees and elbows of limbs
//!    that have every required bone
//! 4. target slot reservation at `bones.len() + 0..4`
//! 5. one chain per limb, skipping limbs with missing bones
//!
//! Hip and shoulder links are emitted without constraints.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::axis::AxisDetector;
use crate::config::{BuildOptions, BuildOptionsPatch, RigProfile};
use crate::constraint::{ConstraintDescriptor, ConstraintSynthesizer};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, LogSink};
use crate::error::{Result, RigError};
use crate::mapping::{Limb, Role, RoleMapper};
use crate::skeleton::{BoneRef, TargetSink};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLink {
    /// Index into the skeleton's bone sequence.
    pub index: usize,
    #[serde(
        rename = "swingTwistConstraint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub constraint: Option<ConstraintDescriptor>,
}

/// One IK chain. `links` run from the effector's parent toward the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub limb: Limb,
    /// Target slot index (see [`TargetSlot`]).
    pub target: usize,
    pub effector: usize,
    #[serde(rename = "iteration")]
    pub iteration_limit: u32,
    pub min_angle: f32,
    pub max_angle: f32,
    pub links: Vec<ChainLink>,
}

/// A reserved IK goal bone. Indices continue the skeleton's bone sequence, so the
/// slots only become valid once installed via [`IkConfig::install_targets`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSlot {
    /// Foot or hand role the target stands in for.
    pub role: Role,
    pub index: usize,
    pub name: String,
    /// Effector bone the target should start on, if the limb's end bone is mapped.
    pub anchor: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IkConfig {
    pub platform_name: Option<String>,
    /// Chains in `Limb::ALL` order, absent limbs omitted.
    pub chains: Vec<ChainDescriptor>,
    /// Four slots (left foot, right foot, left hand, right hand) unless the
    /// mapping was incomplete, in which case everything is empty.
    pub targets: Vec<TargetSlot>,
}

impl IkConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn chain(&self, limb: Limb) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|c| c.limb == limb)
    }

    /// Append the reserved target bones to `sink`. The sink must be the skeleton
    /// the configuration was built from, unchanged since; otherwise the chains
    /// would point at the wrong bones and this fails.
    /// Nothing is appended when the sink's next index is not the first reserved one.
    pub fn install_targets<S: TargetSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        if let Some(first) = self.targets.first() {
            let next = sink.next_index();
            if next != first.index {
                return Err(RigError::TargetIndexMismatch {
                    name: first.name.clone(),
                    expected: first.index,
                    actual: next,
                });
            }
        }
        for slot in &self.targets {
            let actual = sink.append_target(slot);
            if actual != slot.index {
                return Err(RigError::TargetIndexMismatch {
                    name: slot.name.clone(),
                    expected: slot.index,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Drops advisory events when `log_detection` is off.
struct Gate<'s, S: ?Sized> {
    sink: &'s mut S,
    verbose: bool,
}

impl<S: DiagnosticSink + ?Sized> Gate<'_, S> {
    fn emit(&mut self, event: DiagnosticEvent) {
        if self.verbose || !event.is_advisory() {
            self.sink.emit(event);
        }
    }
}

/// Builds IK configurations from rigs using a [`RigProfile`].
#[derive(Clone, Debug, Default)]
pub struct ChainAssembler {
    profile: RigProfile,
    options: BuildOptions,
}

impl ChainAssembler {
    pub fn new(profile: RigProfile) -> Self {
        Self {
            profile,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn profile(&self) -> &RigProfile {
        &self.profile
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Override a subset of the build options.
    pub fn set_options(&mut self, patch: &BuildOptionsPatch) {
        self.options.apply(patch);
    }

    fn limb_enabled(&self, limb: Limb) -> bool {
        if limb.is_leg() {
            self.options.enable_legs
        } else {
            self.options.enable_arms
        }
    }

    /// Build with diagnostics forwarded to the `log` facade.
    pub fn build<B, M, D>(&self, bones: &[B], mapper: &M, detector: &D) -> Result<IkConfig>
    where
        B: BoneRef,
        M: RoleMapper<B> + ?Sized,
        D: AxisDetector<B> + ?Sized,
    {
        self.build_with_sink(bones, mapper, detector, &mut LogSink)
    }

    pub fn build_with_sink<B, M, D, S>(
        &self,
        bones: &[B],
        mapper: &M,
        detector: &D,
        sink: &mut S,
    ) -> Result<IkConfig>
    where
        B: BoneRef,
        M: RoleMapper<B> + ?Sized,
        D: AxisDetector<B> + ?Sized,
        S: DiagnosticSink + ?Sized,
    {
        let mut out = Gate {
            sink,
            verbose: self.options.log_detection,
        };
        log::debug!("building IK config for {} bones", bones.len());

        // 1. role mapping
        let mapping = mapper.map(bones)?;
        if !mapping.complete {
            out.emit(DiagnosticEvent::MappingIncomplete {
                bones_mapped: mapping.bones.len(),
            });
            return Ok(IkConfig::empty());
        }
        out.emit(DiagnosticEvent::PlatformDetected {
            platform_name: mapping.platform_name.clone(),
        });
        out.emit(DiagnosticEvent::BonesMapped {
            count: mapping.bones.len(),
        });

        // 2. index resolution
        let index_of: HashMap<&str, usize> = bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.uid(), i))
            .collect();
        let mut mapped: Vec<(Role, &B)> = mapping.bones.iter().map(|(r, b)| (*r, *b)).collect();
        mapped.sort_by_key(|(role, _)| *role);
        let mut resolved: HashMap<Role, usize> = HashMap::with_capacity(mapped.len());
        for (role, bone) in mapped {
            let index = index_of
                .get(bone.uid())
                .copied()
                .ok_or_else(|| RigError::UnknownBone {
                    role,
                    uid: bone.uid().to_string(),
                })?;
            resolved.insert(role, index);
        }

        let missing_of = |limb: Limb| -> Vec<Role> {
            limb.required()
                .iter()
                .copied()
                .filter(|r| !resolved.contains_key(r))
                .collect()
        };

        // 3. hinge constraints; limbs that will be skipped are never queried
        let synth = ConstraintSynthesizer::new(&self.profile.biomechanics);
        let mut constraints: HashMap<Limb, ConstraintDescriptor> = HashMap::new();
        for limb in Limb::ALL {
            if !self.limb_enabled(limb) || !missing_of(limb).is_empty() {
                continue;
            }
            let Some(bone) = mapping.get(limb.lower()) else {
                continue;
            };
            let axis = detector.detect_primary_axis(bone)?;
            axis.validate(bone.name())?;

            let joint = limb.hinge_joint();
            out.emit(DiagnosticEvent::JointAxisDetected {
                limb,
                joint: joint.to_string(),
                bone: bone.name().to_string(),
                axis: axis.axis,
                confidence_percent: axis.confidence_percent(),
                classified_as: self
                    .profile
                    .classifier
                    .classify_biomechanical(bone.name())
                    .map(str::to_string),
            });

            if self.profile.biomechanics.lookup(joint).is_none() {
                out.emit(DiagnosticEvent::UnknownJoint {
                    limb,
                    joint: joint.to_string(),
                });
                continue;
            }
            if let Some(c) = synth.synthesize_from_biomechanics(joint, axis.direction)? {
                constraints.insert(limb, c);
            }
        }
        out.emit(DiagnosticEvent::ConstraintsCreated {
            count: constraints.len(),
        });

        // 4. target slots, one per limb in output order
        let base = bones.len();
        let effector_of = |limb: Limb| {
            limb.tip()
                .and_then(|r| resolved.get(&r))
                .or_else(|| resolved.get(&limb.end()))
                .copied()
        };
        let targets: Vec<TargetSlot> = Limb::ALL
            .iter()
            .enumerate()
            .map(|(i, limb)| TargetSlot {
                role: limb.end(),
                index: base + i,
                name: format!("IK_Target_{}", limb.end()),
                anchor: effector_of(*limb),
            })
            .collect();

        // 5. chains
        let chain_cfg = self.profile.chain;
        let mut chains = Vec::with_capacity(4);
        for (limb, slot) in Limb::ALL.into_iter().zip(&targets) {
            if !self.limb_enabled(limb) {
                continue;
            }
            let missing = missing_of(limb);
            if !missing.is_empty() {
                out.emit(DiagnosticEvent::LimbSkipped { limb, missing });
                continue;
            }
            let (Some(lower), Some(effector)) =
                (resolved.get(&limb.lower()).copied(), effector_of(limb))
            else {
                continue;
            };

            let mut links = vec![ChainLink {
                index: lower,
                constraint: constraints.get(&limb).cloned(),
            }];
            if let Some(&upper) = resolved.get(&limb.upper()) {
                links.push(ChainLink {
                    index: upper,
                    constraint: None,
                });
            }

            chains.push(ChainDescriptor {
                limb,
                target: slot.index,
                effector,
                iteration_limit: chain_cfg.iteration_limit,
                min_angle: chain_cfg.min_angle,
                max_angle: chain_cfg.max_angle,
                links,
            });
        }

        out.emit(DiagnosticEvent::ChainsBuilt {
            count: chains.len(),
        });

        Ok(IkConfig {
            platform_name: mapping.platform_name,
            chains,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{AxisLabel, AxisResult, StaticAxisDetector};
    use crate::diagnostics::NullSink;
    use crate::mapping::StaticRoleMapper;
    use crate::skeleton::{Bone, Skeleton};

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    /// Hips, two legs with toes, two arms with shoulders.
    fn humanoid() -> (Skeleton, StaticRoleMapper, StaticAxisDetector) {
        let names = [
            (Role::Hips, "Hips", None),
            (Role::LeftUpperLeg, "LeftUpperLeg", Some(0)),
            (Role::LeftLowerLeg, "LeftLowerLeg", Some(1)),
            (Role::LeftFoot, "LeftFoot", Some(2)),
            (Role::LeftToeBase, "LeftToeBase", Some(3)),
            (Role::RightUpperLeg, "RightUpperLeg", Some(0)),
            (Role::RightLowerLeg, "RightLowerLeg", Some(5)),
            (Role::RightFoot, "RightFoot", Some(6)),
            (Role::RightToeBase, "RightToeBase", Some(7)),
            (Role::Spine, "Spine", Some(0)),
            (Role::LeftUpperArm, "LeftUpperArm", Some(9)),
            (Role::LeftLowerArm, "LeftLowerArm", Some(10)),
            (Role::LeftHand, "LeftHand", Some(11)),
            (Role::RightUpperArm, "RightUpperArm", Some(9)),
            (Role::RightLowerArm, "RightLowerArm", Some(13)),
            (Role::RightHand, "RightHand", Some(14)),
        ];
        let mut bones = Vec::new();
        let mut mapper = StaticRoleMapper::new(true, Some("Test".into()));
        for (i, (role, name, parent)) in names.iter().enumerate() {
            let uid = format!("uid-{i}");
            bones.push(Bone::new(uid.clone(), *name, *parent));
            mapper = mapper.with(*role, uid);
        }
        let detector = StaticAxisDetector::new()
            .with("uid-2", AxisResult::new(AxisLabel::X, [1.0, 0.0, 0.0], 0.9))
            .with("uid-6", AxisResult::new(AxisLabel::X, [1.0, 0.0, 0.0], 0.85))
            .with("uid-11", AxisResult::new(AxisLabel::Y, [0.0, 1.0, 0.0], 0.7))
            .with("uid-14", AxisResult::new(AxisLabel::Y, [0.0, -1.0, 0.0], 0.7));
        (Skeleton::new(bones), mapper, detector)
    }

    #[test]
    fn builds_four_chains_in_fixed_order() {
        let (sk, mapper, det) = humanoid();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap();
        let limbs: Vec<Limb> = cfg.chains.iter().map(|c| c.limb).collect();
        assert_eq!(limbs, Limb::ALL.to_vec());
        assert_eq!(cfg.platform_name.as_deref(), Some("Test"));

        let left_leg = cfg.chain(Limb::LeftLeg).unwrap();
        assert_eq!(left_leg.target, 16);
        assert_eq!(left_leg.effector, 4, "toe preferred over foot");
        assert_eq!(left_leg.iteration_limit, 10);
        assert_eq!(left_leg.links.len(), 2);
        assert_eq!(left_leg.links[0].index, 2);
        assert_eq!(left_leg.links[1].index, 1);
        assert!(left_leg.links[1].constraint.is_none());

        let knee = left_leg.links[0].constraint.as_ref().unwrap();
        assert_eq!(knee.twist_axis, [1.0, 0.0, 0.0]);
        approx(knee.twist_max, 130f32.to_radians(), 1e-6);

        let right_arm = cfg.chain(Limb::RightArm).unwrap();
        assert_eq!(right_arm.target, 19);
        assert_eq!(right_arm.effector, 15);
        let elbow = right_arm.links[0].constraint.as_ref().unwrap();
        approx(elbow.twist_max, 140f32.to_radians(), 1e-6);
        approx(elbow.swing_radius, 3f32.to_radians(), 1e-6);
    }

    #[test]
    fn targets_follow_bone_count_and_anchor_effectors() {
        let (sk, mapper, det) = humanoid();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap();
        let roles: Vec<Role> = cfg.targets.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::LeftFoot, Role::RightFoot, Role::LeftHand, Role::RightHand]
        );
        let idx: Vec<usize> = cfg.targets.iter().map(|t| t.index).collect();
        assert_eq!(idx, vec![16, 17, 18, 19]);
        assert_eq!(cfg.targets[0].anchor, Some(4));
        assert_eq!(cfg.targets[3].anchor, Some(15));
        assert_eq!(cfg.targets[2].name, "IK_Target_leftHand");
    }

    #[test]
    fn install_targets_appends_and_detects_drift() {
        let (mut sk, mapper, det) = humanoid();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap();
        cfg.install_targets(&mut sk).unwrap();
        assert_eq!(sk.len(), 20);
        assert_eq!(sk.bones[17].name, "IK_Target_rightFoot");

        // Installing again lands past the reserved indices.
        let err = cfg.install_targets(&mut sk).unwrap_err();
        assert!(matches!(
            err,
            RigError::TargetIndexMismatch {
                expected: 16,
                actual: 20,
                ..
            }
        ));
        assert_eq!(sk.len(), 20);
    }

    #[test]
    fn failed_install_leaves_skeleton_untouched() {
        let (mut sk, mapper, det) = humanoid();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap();
        sk.bones.push(Bone::new("extra", "Prop", Some(0)));
        assert_eq!(sk.len(), 17);

        let err = cfg.install_targets(&mut sk).unwrap_err();
        assert!(matches!(
            err,
            RigError::TargetIndexMismatch {
                expected: 16,
                actual: 17,
                ..
            }
        ));
        assert_eq!(sk.len(), 17);
        assert_eq!(sk.find("IK_Target_leftFoot"), None);
    }

    #[test]
    fn skipped_limb_is_never_sent_to_the_detector() {
        let (sk, mut mapper, _) = humanoid();
        mapper.remove(Role::RightFoot);
        // No axis for the right lower leg (uid-6): querying it would fail the build.
        let det = StaticAxisDetector::new()
            .with("uid-2", AxisResult::new(AxisLabel::X, [1.0, 0.0, 0.0], 0.9))
            .with("uid-11", AxisResult::new(AxisLabel::Y, [0.0, 1.0, 0.0], 0.7))
            .with("uid-14", AxisResult::new(AxisLabel::Y, [0.0, -1.0, 0.0], 0.7));
        let mut events = Vec::new();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut events)
            .unwrap();
        let limbs: Vec<Limb> = cfg.chains.iter().map(|c| c.limb).collect();
        assert_eq!(limbs, vec![Limb::LeftLeg, Limb::LeftArm, Limb::RightArm]);
        assert!(cfg.chain(Limb::LeftLeg).unwrap().links[0].constraint.is_some());
        assert!(!events.iter().any(|e| matches!(
            e,
            DiagnosticEvent::JointAxisDetected {
                limb: Limb::RightLeg,
                ..
            }
        )));
        assert!(events.contains(&DiagnosticEvent::ConstraintsCreated { count: 3 }));
    }

    #[test]
    fn incomplete_mapping_is_empty_and_skips_axis_queries() {
        let (sk, mut mapper, _) = humanoid();
        mapper.complete = false;
        // An empty detector would fail on any query.
        let det = StaticAxisDetector::new();
        let mut events = Vec::new();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut events)
            .unwrap();
        assert!(cfg.is_empty());
        assert!(cfg.targets.is_empty());
        assert_eq!(
            events,
            vec![DiagnosticEvent::MappingIncomplete { bones_mapped: 16 }]
        );
    }

    #[test]
    fn missing_right_foot_drops_only_the_right_leg() {
        let (sk, mut mapper, det) = humanoid();
        mapper.remove(Role::RightFoot);
        let mut events = Vec::new();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut events)
            .unwrap();
        let limbs: Vec<Limb> = cfg.chains.iter().map(|c| c.limb).collect();
        assert_eq!(limbs, vec![Limb::LeftLeg, Limb::LeftArm, Limb::RightArm]);
        assert!(events.contains(&DiagnosticEvent::LimbSkipped {
            limb: Limb::RightLeg,
            missing: vec![Role::RightFoot],
        }));
        // Target slots are still reserved for every limb.
        assert_eq!(cfg.targets.len(), 4);
        assert_eq!(cfg.chain(Limb::LeftArm).unwrap().target, 18);
    }

    #[test]
    fn arm_without_upper_arm_keeps_single_link() {
        let (sk, mut mapper, det) = humanoid();
        mapper.remove(Role::LeftUpperArm);
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap();
        let arm = cfg.chain(Limb::LeftArm).unwrap();
        assert_eq!(arm.links.len(), 1);
        assert_eq!(arm.links[0].index, 11);
    }

    #[test]
    fn disabled_limbs_are_not_built_or_queried() {
        let (sk, mapper, _) = humanoid();
        let legs_only = StaticAxisDetector::new()
            .with("uid-2", AxisResult::new(AxisLabel::X, [1.0, 0.0, 0.0], 0.9))
            .with("uid-6", AxisResult::new(AxisLabel::X, [1.0, 0.0, 0.0], 0.9));
        let mut asm = ChainAssembler::default();
        asm.set_options(&BuildOptionsPatch {
            enable_arms: Some(false),
            ..Default::default()
        });
        let cfg = asm
            .build_with_sink(sk.bones(), &mapper, &legs_only, &mut NullSink)
            .unwrap();
        assert_eq!(cfg.chains.len(), 2);
        assert!(cfg.chains.iter().all(|c| c.limb.is_leg()));
    }

    #[test]
    fn log_detection_off_keeps_only_warnings_and_summary() {
        let (sk, mut mapper, det) = humanoid();
        mapper.remove(Role::LeftHand);
        let mut asm = ChainAssembler::default();
        asm.set_options(&BuildOptionsPatch {
            log_detection: Some(false),
            ..Default::default()
        });
        let mut events = Vec::new();
        asm.build_with_sink(sk.bones(), &mapper, &det, &mut events)
            .unwrap();
        assert!(events.iter().all(|e| !e.is_advisory()));
        assert!(matches!(
            events.as_slice(),
            [
                DiagnosticEvent::LimbSkipped {
                    limb: Limb::LeftArm,
                    ..
                },
                DiagnosticEvent::ChainsBuilt { count: 3 }
            ]
        ));
    }

    #[test]
    fn unknown_hinge_joint_leaves_link_unconstrained() {
        let (sk, mapper, det) = humanoid();
        let profile = RigProfile::from_json(
            r#"{ "biomechanics": {
                "knee": { "type": "hinge", "limits": { "flexion": 130, "extension": 0, "wiggle": 5 } }
            } }"#,
        )
        .unwrap();
        let mut events = Vec::new();
        let cfg = ChainAssembler::new(profile)
            .build_with_sink(sk.bones(), &mapper, &det, &mut events)
            .unwrap();
        assert_eq!(cfg.chains.len(), 4);
        assert!(cfg.chain(Limb::LeftArm).unwrap().links[0].constraint.is_none());
        assert!(cfg.chain(Limb::LeftLeg).unwrap().links[0].constraint.is_some());
        assert!(events.contains(&DiagnosticEvent::UnknownJoint {
            limb: Limb::LeftArm,
            joint: "elbow".into(),
        }));
        assert!(events.contains(&DiagnosticEvent::ConstraintsCreated { count: 2 }));
        let unknown = events
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::UnknownJoint { .. }))
            .count();
        assert_eq!(unknown, 2, "one report per elbow");
    }

    #[test]
    fn malformed_axis_is_a_hard_error() {
        let (sk, mapper, _) = humanoid();
        let det = StaticAxisDetector::new()
            .with("uid-2", AxisResult::new(AxisLabel::X, [0.0, 0.0, 0.0], 0.9));
        let err = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, RigError::MalformedAxis { .. }));
    }

    #[test]
    fn chain_json_matches_solver_format() {
        let (sk, mapper, det) = humanoid();
        let cfg = ChainAssembler::default()
            .build_with_sink(sk.bones(), &mapper, &det, &mut NullSink)
            .unwrap();
        let json = serde_json::to_value(&cfg.chains[0]).unwrap();
        assert_eq!(json["iteration"], 10);
        assert_eq!(json["effector"], 4);
        assert_eq!(json["links"][0]["swingTwistConstraint"]["type"], "hinge");
        assert!(json["links"][1].get("swingTwistConstraint").is_none());
    }
}
