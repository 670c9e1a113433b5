use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::runtime::Runtime;

pub const MANIFEST_FILE: &str = "package.json";

/// The parts of a `package.json` this tool cares about. Version constraints
/// are kept as opaque strings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Invalid package.json")?;
        if !value.is_object() {
            bail!("Invalid package.json: expected a JSON object");
        }
        serde_json::from_value(value).context("Invalid package.json")
    }

    /// True when `package` is declared in any of the three dependency maps.
    pub fn depends_on(&self, package: &str) -> bool {
        self.dependency_names().contains(package)
    }

    /// Union of runtime, peer and dev dependency names.
    pub fn dependency_names(&self) -> BTreeSet<&str> {
        self.dependencies
            .keys()
            .chain(self.peer_dependencies.keys())
            .chain(self.dev_dependencies.keys())
            .map(String::as_str)
            .collect()
    }

    /// Declared name, if present and non-empty.
    pub fn package_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// A dependency map written as `null` counts as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of looking for a manifest in a directory.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestLookup {
    Missing,
    /// The file exists but could not be read or parsed.
    Invalid(String),
    Found(Manifest),
}

impl ManifestLookup {
    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            ManifestLookup::Found(manifest) => Some(manifest),
            _ => None,
        }
    }
}

#[tracing::instrument(skip(runtime))]
pub async fn load_manifest<R: Runtime>(runtime: &R, dir: &Path) -> ManifestLookup {
    let path = dir.join(MANIFEST_FILE);
    if !runtime.exists(&path).await {
        return ManifestLookup::Missing;
    }

    let parsed = match runtime.read_to_string(&path).await {
        Ok(content) => Manifest::parse(&content),
        Err(e) => Err(e),
    };
    match parsed {
        Ok(manifest) => ManifestLookup::Found(manifest),
        Err(e) => ManifestLookup::Invalid(format!("{:#}", e)),
    }
}
