//! Bone-name classification via ordered rule tables.
//!
//! Two independent tables exist:
//! - the kind table answers "hinge, ball, universal or unknown" and drives
//!   constraint-type selection;
//! - the biomechanical table answers "which ROM entry" (`knee`, `hip`, ...).
//!
//! They are not required to agree. For example `LeftLeg` (Mixamo's lower leg) is a
//! hinge by kind but has no biomechanical entry, and `LeftUpLeg` is a ball by kind
//! while the biomechanical table only knows `upperleg`/`thigh`.
//!
//! Rule order is part of the contract. Rules are evaluated top to bottom and the
//! first match wins. The standard kind table checks hinge patterns first (most
//! specific), then universal, then ball (most general), because identifiers overlap:
//! `upperleg` contains `leg`.

use serde::{Deserialize, Serialize};

use crate::biomech::JointKind;
use crate::skeleton::BoneRef;

/// Case-insensitive substring predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Matches when the identifier contains at least one of these.
    pub any_of: Vec<String>,
    /// ...and none of these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub none_of: Vec<String>,
}

impl Pattern {
    pub fn any_of(needles: &[&str]) -> Self {
        Self {
            any_of: needles.iter().map(|s| s.to_ascii_lowercase()).collect(),
            none_of: Vec::new(),
        }
    }

    pub fn unless(mut self, needles: &[&str]) -> Self {
        self.none_of = needles.iter().map(|s| s.to_ascii_lowercase()).collect();
        self
    }

    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.any_of.iter().any(|n| lowered.contains(n.as_str()))
            && !self.none_of.iter().any(|n| lowered.contains(n.as_str()))
    }

    fn normalize(&mut self) {
        for n in self.any_of.iter_mut().chain(self.none_of.iter_mut()) {
            *n = n.to_ascii_lowercase();
        }
    }
}

/// One `(predicate, result)` pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule<T> {
    pub when: Pattern,
    pub then: T,
}

/// Ordered rule list, first match wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for RuleTable<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> RuleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule at the lowest priority.
    pub fn push(&mut self, when: Pattern, then: T) -> &mut Self {
        self.rules.push(Rule { when, then });
        self
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn evaluate(&self, identifier: &str) -> Option<&T> {
        let lowered = identifier.to_ascii_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.when.matches(&lowered))
            .map(|rule| &rule.then)
    }

    fn normalize(&mut self) {
        for rule in &mut self.rules {
            rule.when.normalize();
        }
    }
}

/// Both classifications of one identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointClassification {
    /// `None` is the `unknown` class.
    pub kind: Option<JointKind>,
    /// Key into the biomechanical table, if any rule matched.
    pub biomechanical: Option<String>,
}

/// Classification of a bone in a skeleton.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneClassification {
    pub index: usize,
    pub name: String,
    #[serde(flatten)]
    pub classification: JointClassification,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classifier {
    #[serde(default = "Classifier::standard_kind_rules")]
    pub kind_rules: RuleTable<JointKind>,
    #[serde(default = "Classifier::standard_biomechanical_rules")]
    pub biomechanical_rules: RuleTable<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl Classifier {
    pub fn standard() -> Self {
        Self {
            kind_rules: Self::standard_kind_rules(),
            biomechanical_rules: Self::standard_biomechanical_rules(),
        }
    }

    /// Hinge, then universal, then ball.
    pub fn standard_kind_rules() -> RuleTable<JointKind> {
        let mut kind_rules = RuleTable::new();
        kind_rules
            .push(
                Pattern::any_of(&["knee", "shin", "calf", "elbow", "forearm", "lowerarm"]),
                JointKind::Hinge,
            )
            // Mixamo-style "LeftLeg" is the lower leg; exclude "UpLeg"/"UpperLeg"/"Thigh".
            .push(
                Pattern::any_of(&["leg"]).unless(&["up", "upper", "thigh"]),
                JointKind::Hinge,
            )
            .push(
                Pattern::any_of(&["ankle", "foot", "toe", "wrist", "hand", "finger", "thumb"]),
                JointKind::Universal,
            )
            .push(
                Pattern::any_of(&[
                    "hip", "thigh", "upperleg", "upleg", "shoulder", "upperarm", "clavicle",
                    "neck", "head", "spine", "chest",
                ]),
                JointKind::Ball,
            );
        kind_rules
    }

    pub fn standard_biomechanical_rules() -> RuleTable<String> {
        let mut biomechanical_rules = RuleTable::new();
        biomechanical_rules
            .push(
                Pattern::any_of(&["knee", "shin", "lowerleg", "calf"]),
                "knee".to_string(),
            )
            .push(
                Pattern::any_of(&["elbow", "lowerarm", "forearm"]),
                "elbow".to_string(),
            )
            .push(Pattern::any_of(&["hip", "thigh", "upperleg"]), "hip".to_string())
            .push(
                Pattern::any_of(&["shoulder", "upperarm", "clavicle"]),
                "shoulder".to_string(),
            )
            .push(Pattern::any_of(&["ankle", "foot"]), "ankle".to_string())
            .push(Pattern::any_of(&["wrist", "hand"]), "wrist".to_string());
        biomechanical_rules
    }

    /// Lowercase all patterns (deserialized tables may carry mixed case).
    pub fn normalize(&mut self) {
        self.kind_rules.normalize();
        self.biomechanical_rules.normalize();
    }

    /// Coarse kind of a bone identifier. Total: `None` is `unknown`.
    pub fn classify_kind(&self, identifier: &str) -> Option<JointKind> {
        self.kind_rules.evaluate(identifier).copied()
    }

    /// Biomechanical table key for a bone identifier.
    pub fn classify_biomechanical(&self, identifier: &str) -> Option<&str> {
        self.biomechanical_rules
            .evaluate(identifier)
            .map(String::as_str)
    }

    pub fn classify(&self, identifier: &str) -> JointClassification {
        JointClassification {
            kind: self.classify_kind(identifier),
            biomechanical: self.classify_biomechanical(identifier).map(str::to_string),
        }
    }

    pub fn classify_bones<B: BoneRef>(&self, bones: &[B]) -> Vec<BoneClassification> {
        bones
            .iter()
            .enumerate()
            .map(|(index, bone)| BoneClassification {
                index,
                name: bone.name().to_string(),
                classification: self.classify(bone.name()),
            })
            .collect()
    }
}
