//! Canonical humanoid roles and the role-mapping collaborator contract.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::skeleton::BoneRef;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Hips,
    Spine,
    Chest,
    Neck,
    Head,
    LeftShoulder,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    LeftToeBase,
    RightShoulder,
    RightUpperArm,
    RightLowerArm,
    RightHand,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
    RightToeBase,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Hips => "hips",
            Role::Spine => "spine",
            Role::Chest => "chest",
            Role::Neck => "neck",
            Role::Head => "head",
            Role::LeftShoulder => "leftShoulder",
            Role::LeftUpperArm => "leftUpperArm",
            Role::LeftLowerArm => "leftLowerArm",
            Role::LeftHand => "leftHand",
            Role::LeftUpperLeg => "leftUpperLeg",
            Role::LeftLowerLeg => "leftLowerLeg",
            Role::LeftFoot => "leftFoot",
            Role::LeftToeBase => "leftToeBase",
            Role::RightShoulder => "rightShoulder",
            Role::RightUpperArm => "rightUpperArm",
            Role::RightLowerArm => "rightLowerArm",
            Role::RightHand => "rightHand",
            Role::RightUpperLeg => "rightUpperLeg",
            Role::RightLowerLeg => "rightLowerLeg",
            Role::RightFoot => "rightFoot",
            Role::RightToeBase => "rightToeBase",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// The four limbs that receive IK chains.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Limb {
    LeftLeg,
    RightLeg,
    LeftArm,
    RightArm,
}

impl Limb {
    /// Output order of chains.
    pub const ALL: [Limb; 4] = [Limb::LeftLeg, Limb::RightLeg, Limb::LeftArm, Limb::RightArm];

    pub fn side(&self) -> Side {
        match self {
            Limb::LeftLeg | Limb::LeftArm => Side::Left,
            Limb::RightLeg | Limb::RightArm => Side::Right,
        }
    }

    pub fn is_leg(&self) -> bool {
        matches!(self, Limb::LeftLeg | Limb::RightLeg)
    }

    /// Root-side joint of the chain (hip or shoulder end).
    pub fn upper(&self) -> Role {
        match self {
            Limb::LeftLeg => Role::LeftUpperLeg,
            Limb::RightLeg => Role::RightUpperLeg,
            Limb::LeftArm => Role::LeftUpperArm,
            Limb::RightArm => Role::RightUpperArm,
        }
    }

    /// Hinge joint of the chain (knee or elbow).
    pub fn lower(&self) -> Role {
        match self {
            Limb::LeftLeg => Role::LeftLowerLeg,
            Limb::RightLeg => Role::RightLowerLeg,
            Limb::LeftArm => Role::LeftLowerArm,
            Limb::RightArm => Role::RightLowerArm,
        }
    }

    /// Foot or hand.
    pub fn end(&self) -> Role {
        match self {
            Limb::LeftLeg => Role::LeftFoot,
            Limb::RightLeg => Role::RightFoot,
            Limb::LeftArm => Role::LeftHand,
            Limb::RightArm => Role::RightHand,
        }
    }

    /// Optional bone beyond `end` preferred as effector.
    pub fn tip(&self) -> Option<Role> {
        match self {
            Limb::LeftLeg => Some(Role::LeftToeBase),
            Limb::RightLeg => Some(Role::RightToeBase),
            Limb::LeftArm | Limb::RightArm => None,
        }
    }

    /// Roles that must be mapped for a chain to be built.
    pub fn required(&self) -> &'static [Role] {
        match self {
            Limb::LeftLeg => &[Role::LeftUpperLeg, Role::LeftLowerLeg, Role::LeftFoot],
            Limb::RightLeg => &[Role::RightUpperLeg, Role::RightLowerLeg, Role::RightFoot],
            Limb::LeftArm => &[Role::LeftLowerArm, Role::LeftHand],
            Limb::RightArm => &[Role::RightLowerArm, Role::RightHand],
        }
    }

    /// Biomechanical table key of the lower joint.
    pub fn hinge_joint(&self) -> &'static str {
        if self.is_leg() {
            "knee"
        } else {
            "elbow"
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Limb::LeftLeg => "leftLeg",
            Limb::RightLeg => "rightLeg",
            Limb::LeftArm => "leftArm",
            Limb::RightArm => "rightArm",
        }
    }
}

impl fmt::Display for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of role mapping: which bone plays which canonical role.
#[derive(Debug)]
pub struct BoneMapping<'a, B> {
    /// Hard gate: an incomplete mapping yields an empty build.
    pub complete: bool,
    pub platform_name: Option<String>,
    pub bones: HashMap<Role, &'a B>,
}

impl<'a, B> BoneMapping<'a, B> {
    pub fn incomplete() -> Self {
        Self {
            complete: false,
            platform_name: None,
            bones: HashMap::new(),
        }
    }

    #[inline]
    pub fn get(&self, role: Role) -> Option<&'a B> {
        self.bones.get(&role).copied()
    }

    #[inline]
    pub fn contains(&self, role: Role) -> bool {
        self.bones.contains_key(&role)
    }
}

/// Maps an unlabeled bone sequence onto canonical roles.
pub trait RoleMapper<B: BoneRef> {
    fn map<'a>(&self, bones: &'a [B]) -> Result<BoneMapping<'a, B>>;
}

/// Replays a recorded role → bone uid table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRoleMapper {
    pub complete: bool,
    #[serde(default)]
    pub platform_name: Option<String>,
    /// Role → bone uid.
    pub bones: HashMap<Role, String>,
}

impl StaticRoleMapper {
    pub fn new(complete: bool, platform_name: Option<String>) -> Self {
        Self {
            complete,
            platform_name,
            bones: HashMap::new(),
        }
    }

    pub fn with(mut self, role: Role, uid: impl Into<String>) -> Self {
        self.bones.insert(role, uid.into());
        self
    }

    pub fn remove(&mut self, role: Role) -> Option<String> {
        self.bones.remove(&role)
    }
}

impl<B: BoneRef> RoleMapper<B> for StaticRoleMapper {
    fn map<'a>(&self, bones: &'a [B]) -> Result<BoneMapping<'a, B>> {
        let mut mapped = HashMap::with_capacity(self.bones.len());
        for (role, uid) in &self.bones {
            let bone = bones
                .iter()
                .find(|b| b.uid() == uid.as_str())
                .ok_or_else(|| RigError::UnknownBone {
                    role: *role,
                    uid: uid.clone(),
                })?;
            mapped.insert(*role, bone);
        }
        Ok(BoneMapping {
            complete: self.complete,
            platform_name: self.platform_name.clone(),
            bones: mapped,
        })
    }
}
