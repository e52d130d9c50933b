//! Structured diagnostics emitted while building an IK configuration.
//!
//! Events are advisory: the build result never depends on whether anything listens.
//! Hosts either collect them (`Vec<DiagnosticEvent>`) or forward them to the `log`
//! facade (`LogSink`).

use serde::{Deserialize, Serialize};

use crate::axis::AxisLabel;
use crate::mapping::{Limb, Role};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum DiagnosticEvent {
    /// Role mapping reported an incomplete rig; the build is empty.
    MappingIncomplete { bones_mapped: usize },
    PlatformDetected { platform_name: Option<String> },
    BonesMapped { count: usize },
    /// Axis detection result for a hinge joint.
    JointAxisDetected {
        limb: Limb,
        joint: String,
        bone: String,
        axis: AxisLabel,
        confidence_percent: u32,
        /// What the name-based ROM classifier makes of the bone, for comparison
        /// with the role-derived `joint`.
        classified_as: Option<String>,
    },
    /// The joint has no biomechanical entry; the link stays unconstrained.
    UnknownJoint { limb: Limb, joint: String },
    ConstraintsCreated { count: usize },
    LimbSkipped { limb: Limb, missing: Vec<Role> },
    ChainsBuilt { count: usize },
}

impl DiagnosticEvent {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticEvent::MappingIncomplete { .. } => Severity::Error,
            DiagnosticEvent::UnknownJoint { .. } | DiagnosticEvent::LimbSkipped { .. } => {
                Severity::Warn
            }
            _ => Severity::Info,
        }
    }

    /// Advisory events are suppressed when `log_detection` is off.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            DiagnosticEvent::PlatformDetected { .. }
                | DiagnosticEvent::BonesMapped { .. }
                | DiagnosticEvent::JointAxisDetected { .. }
                | DiagnosticEvent::ConstraintsCreated { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            DiagnosticEvent::MappingIncomplete { bones_mapped } => {
                format!("bone mapping incomplete ({bones_mapped} bones mapped), no IK chains built")
            }
            DiagnosticEvent::PlatformDetected { platform_name } => format!(
                "platform detected: {}",
                platform_name.as_deref().unwrap_or("unknown (fuzzy matching)")
            ),
            DiagnosticEvent::BonesMapped { count } => format!("bones mapped: {count}"),
            DiagnosticEvent::JointAxisDetected {
                limb,
                joint,
                axis,
                confidence_percent,
                ..
            } => format!("{limb} {joint}: {axis}-axis ({confidence_percent}% confidence)"),
            DiagnosticEvent::UnknownJoint { limb, joint } => {
                format!("{limb}: no biomechanical data for '{joint}', link left unconstrained")
            }
            DiagnosticEvent::ConstraintsCreated { count } => format!("constraints created: {count}"),
            DiagnosticEvent::LimbSkipped { limb, missing } => {
                let names: Vec<&str> = missing.iter().map(Role::as_str).collect();
                format!("incomplete {limb}, skipping IK chain (missing {})", names.join(", "))
            }
            DiagnosticEvent::ChainsBuilt { count } => format!("built {count} IK chains"),
        }
    }
}

/// Observer seam for build diagnostics.
pub trait DiagnosticSink {
    fn emit(&mut self, event: DiagnosticEvent);
}

impl DiagnosticSink for Vec<DiagnosticEvent> {
    fn emit(&mut self, event: DiagnosticEvent) {
        self.push(event);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _event: DiagnosticEvent) {}
}

/// Forwards events to the `log` facade at their severity.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, event: DiagnosticEvent) {
        let msg = event.message();
        match event.severity() {
            Severity::Info => log::info!(target: "vizij_rig", "{msg}"),
            Severity::Warn => log::warn!(target: "vizij_rig", "{msg}"),
            Severity::Error => log::error!(target: "vizij_rig", "{msg}"),
        }
    }
}
