use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    rigs: HashMap<String, RigEntry>,
    #[serde(default)]
    profiles: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RigEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        profile: Option<String>,
    },
}

impl RigEntry {
    fn as_path(&self) -> &str {
        match self {
            RigEntry::Path(path) => path,
            RigEntry::Detailed { path, .. } => path,
        }
    }

    fn profile(&self) -> Option<&str> {
        match self {
            RigEntry::Path(_) => None,
            RigEntry::Detailed { profile, .. } => profile.as_deref(),
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Rig snapshots: skeleton, recorded role mapping, recorded joint axes.
pub mod rigs {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.rigs.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        Ok(resolve_path(entry.as_path()))
    }

    /// Name of the profile fixture the rig should be built with, if not the standard one.
    pub fn profile_name(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.rigs, "rig", name)?;
        Ok(entry.profile().map(str::to_string))
    }
}

/// Rig profiles (biomechanical table, classifier rules, chain settings).
pub mod profiles {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.profiles.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.profiles, "profile", name)?;
        read_to_string(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.profiles, "profile", name)?;
        Ok(resolve_path(rel))
    }
}
