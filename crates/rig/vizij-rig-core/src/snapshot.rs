//! Self-contained rig snapshot: skeleton plus recorded collaborator answers.
//!
//! Lets a build be replayed without the host engine (fixtures, WASM, benches).

use serde::{Deserialize, Serialize};

use crate::assembler::{ChainAssembler, IkConfig};
use crate::axis::StaticAxisDetector;
use crate::diagnostics::DiagnosticSink;
use crate::error::{Result, RigError};
use crate::mapping::StaticRoleMapper;
use crate::skeleton::Skeleton;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigSnapshot {
    pub skeleton: Skeleton,
    pub mapping: StaticRoleMapper,
    #[serde(default)]
    pub axes: StaticAxisDetector,
}

impl RigSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RigError::Profile(format!("snapshot: {e}")))
    }

    pub fn build(&self, assembler: &ChainAssembler) -> Result<IkConfig> {
        assembler.build(self.skeleton.bones(), &self.mapping, &self.axes)
    }

    pub fn build_with_sink<S: DiagnosticSink + ?Sized>(
        &self,
        assembler: &ChainAssembler,
        sink: &mut S,
    ) -> Result<IkConfig> {
        assembler.build_with_sink(self.skeleton.bones(), &self.mapping, &self.axes, sink)
    }

    /// Build, then append the reserved targets to the snapshot's own skeleton.
    pub fn build_and_install<S: DiagnosticSink + ?Sized>(
        &mut self,
        assembler: &ChainAssembler,
        sink: &mut S,
    ) -> Result<IkConfig> {
        let config = self.build_with_sink(assembler, sink)?;
        config.install_targets(&mut self.skeleton)?;
        Ok(config)
    }
}
