use js_sys::JSON;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use vizij_rig_core::{
    BuildOptionsPatch, ChainAssembler, DiagnosticEvent, IkConfig, RigProfile, RigSnapshot,
};

#[wasm_bindgen]
pub struct VizijRig {
    core: ChainAssembler,
}

#[derive(Serialize)]
struct BuildReport {
    config: IkConfig,
    diagnostics: Vec<DiagnosticEvent>,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Accept either a JSON string or a plain JS object and return JSON text.
fn json_text(v: &JsValue, what: &str) -> Result<String, JsError> {
    if let Some(s) = v.as_string() {
        return Ok(s);
    }
    JSON::stringify(v)
        .map_err(|e| JsError::new(&format!("{what} stringify error: {:?}", e)))?
        .as_string()
        .ok_or_else(|| JsError::new(&format!("{what}: stringify produced non-string")))
}

fn to_js<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

#[wasm_bindgen]
impl VizijRig {
    /// Create a rig builder. Pass a profile (JSON string or object) or undefined/null for
    /// the standard biomechanical table and classifier.
    /// Example:
    ///   new VizijRig({ chain: { iterationLimit: 20 } })
    #[wasm_bindgen(constructor)]
    pub fn new(profile: JsValue) -> Result<VizijRig, JsError> {
        console_error_panic_hook::set_once();

        let profile = if jsvalue_is_undefined_or_null(&profile) {
            RigProfile::standard()
        } else {
            let text = json_text(&profile, "profile")?;
            RigProfile::from_json(&text).map_err(|e| JsError::new(&format!("profile error: {e}")))?
        };

        Ok(VizijRig {
            core: ChainAssembler::new(profile),
        })
    }

    /// Override build options, e.g. `{ enableArms: false, logDetection: false }`.
    /// Omitted fields keep their current value.
    #[wasm_bindgen(js_name = set_options)]
    pub fn set_options(&mut self, patch: JsValue) -> Result<(), JsError> {
        if jsvalue_is_undefined_or_null(&patch) {
            return Ok(());
        }
        let patch: BuildOptionsPatch = swb::from_value(patch)
            .map_err(|e| JsError::new(&format!("options error: {e}")))?;
        self.core.set_options(&patch);
        Ok(())
    }

    /// Current build options.
    #[wasm_bindgen]
    pub fn options(&self) -> Result<JsValue, JsError> {
        to_js(self.core.options(), "options")
    }

    /// Build an IK config from a rig snapshot `{ skeleton, mapping, axes }`.
    /// Returns `{ config, diagnostics }`.
    #[wasm_bindgen]
    pub fn build(&self, snapshot: JsValue) -> Result<JsValue, JsError> {
        if jsvalue_is_undefined_or_null(&snapshot) {
            return Err(JsError::new("build: snapshot is null/undefined"));
        }
        let text = json_text(&snapshot, "snapshot")?;
        let snap = RigSnapshot::from_json(&text).map_err(|e| JsError::new(&e.to_string()))?;
        let mut diagnostics = Vec::new();
        let config = snap
            .build_with_sink(&self.core, &mut diagnostics)
            .map_err(|e| JsError::new(&format!("build error: {e}")))?;
        to_js(
            &BuildReport {
                config,
                diagnostics,
            },
            "build report",
        )
    }

    /// Classify a bone name: `{ kind, biomechanical }`, either may be null.
    #[wasm_bindgen]
    pub fn classify(&self, name: String) -> Result<JsValue, JsError> {
        to_js(&self.core.profile().classifier.classify(&name), "classification")
    }

    /// Classify every bone of a skeleton `{ bones: [...] }` in order.
    #[wasm_bindgen(js_name = classify_skeleton)]
    pub fn classify_skeleton(&self, skeleton: JsValue) -> Result<JsValue, JsError> {
        let skeleton: vizij_rig_core::Skeleton = swb::from_value(skeleton)
            .map_err(|e| JsError::new(&format!("skeleton error: {e}")))?;
        let report = self
            .core
            .profile()
            .classifier
            .classify_bones(skeleton.bones());
        to_js(&report, "classification")
    }
}

/// ABI version for host compatibility checks.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
