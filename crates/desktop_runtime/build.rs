use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
struct AppManifest {
    #[serde(skip_serializing)]
    schema_version: u32,
    key: String,
    title: String,
    icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_bg_color: Option<String>,
    category: String,
    component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resizable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximizable: Option<bool>,
    #[serde(default)]
    singleton: bool,
    #[serde(default)]
    keep_in_dock: bool,
    #[serde(default)]
    hide_when_close: bool,
    #[serde(default)]
    hide_in_desktop: bool,
    #[serde(default)]
    essential: bool,
    #[serde(default)]
    system: bool,
    version: String,
    author: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    permissions: Vec<String>,
}

fn app_manifest_paths(dir: &Path) -> Vec<PathBuf> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", dir.display()));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    paths.sort();
    paths
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let manifest_dir = crate_root.join("manifests");
    println!("cargo:rerun-if-changed={}", manifest_dir.display());

    let mut manifests = Vec::<AppManifest>::new();
    for path in app_manifest_paths(&manifest_dir) {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let manifest: AppManifest = toml::from_str(&raw)
            .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
        if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            panic!(
                "manifest schema mismatch in {}: expected {MANIFEST_SCHEMA_VERSION} found {}",
                path.display(),
                manifest.schema_version
            );
        }
        if manifest.key.trim().is_empty() || manifest.title.trim().is_empty() {
            panic!("manifest {} must declare a key and title", path.display());
        }
        if manifests.iter().any(|existing| existing.key == manifest.key) {
            panic!("duplicate app key `{}` in {}", manifest.key, path.display());
        }
        manifests.push(manifest);
    }

    manifests.sort_by(|a, b| a.key.cmp(&b.key));
    let json = serde_json::to_string_pretty(&manifests).expect("serialize app manifest catalog");
    let generated = format!(
        "/// Build-time generated app descriptor catalog JSON.\n\
pub const APP_MANIFEST_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("app_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
