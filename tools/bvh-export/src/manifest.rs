//! bvh-export.toml batch manifest
//!
//! ```toml
//! [output]
//! dir = "csv"
//!
//! [defaults]
//! scale = 1.0
//! end_sites = true
//!
//! [[files]]
//! path = "takes/walk.bvh"
//!
//! [[files]]
//! path = "takes/run.bvh"
//! scale = 0.01
//! positions = false
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use serde::Deserialize;

use crate::convert::{ExportOptions, ExportReport, convert_file};

/// bvh-export.toml manifest structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportManifest {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Output location section
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Output directory, relative to the manifest.
    /// Default: next to each input file
    pub dir: Option<PathBuf>,
}

/// Export settings applied to every file unless overridden
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    /// Multiplier for offsets and positions. Default: 1.0
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Default: true
    #[serde(default = "default_true")]
    pub rotations: bool,
    /// Default: true
    #[serde(default = "default_true")]
    pub positions: bool,
    /// Default: true
    #[serde(default = "default_true")]
    pub hierarchy: bool,
    /// Include End Sites in positions. Default: false
    #[serde(default)]
    pub end_sites: bool,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            rotations: true,
            positions: true,
            hierarchy: true,
            end_sites: false,
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Single input file with optional overrides
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// BVH path, relative to the manifest
    pub path: PathBuf,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub rotations: Option<bool>,
    #[serde(default)]
    pub positions: Option<bool>,
    #[serde(default)]
    pub hierarchy: Option<bool>,
    #[serde(default)]
    pub end_sites: Option<bool>,
}

impl FileEntry {
    /// Defaults with this entry's overrides applied
    pub fn options(&self, defaults: &DefaultsSection) -> ExportOptions {
        ExportOptions {
            scale: self.scale.unwrap_or(defaults.scale),
            rotations: self.rotations.unwrap_or(defaults.rotations),
            positions: self.positions.unwrap_or(defaults.positions),
            hierarchy: self.hierarchy.unwrap_or(defaults.hierarchy),
            end_sites: self.end_sites.unwrap_or(defaults.end_sites),
        }
    }
}

/// Parse manifest text
pub fn parse_manifest(text: &str) -> Result<ExportManifest> {
    toml::from_str(text).context("Failed to parse manifest")
}

/// Load a manifest from disk
pub fn load_manifest(path: &Path) -> Result<ExportManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    parse_manifest(&text).with_context(|| format!("Invalid manifest: {:?}", path))
}

/// Check the manifest before converting anything
///
/// Rejects an empty file list, unusable scales, entries with every export
/// disabled, and entries whose CSVs would overwrite another entry's.
pub fn validate(manifest: &ExportManifest) -> Result<()> {
    if manifest.files.is_empty() {
        bail!("Manifest lists no files");
    }

    let mut outputs = HashSet::new();
    for entry in &manifest.files {
        // Every CSV of an entry is named after <dir>/<stem>
        let stem = entry.path.file_stem().unwrap_or_default();
        let dir = match &manifest.output.dir {
            Some(dir) => dir.as_path(),
            None => entry.path.parent().unwrap_or(Path::new("")),
        };
        if !outputs.insert(dir.join(stem)) {
            bail!(
                "Output name collision: {:?} writes the same CSV files as an earlier entry",
                entry.path
            );
        }

        let options = entry.options(&manifest.defaults);
        if !options.scale.is_finite() || options.scale == 0.0 {
            bail!("Invalid scale {} for {:?}", options.scale, entry.path);
        }
        if !(options.rotations || options.positions || options.hierarchy) {
            bail!("No exports enabled for {:?}", entry.path);
        }
    }

    Ok(())
}

/// Convert every file in the manifest, in parallel
///
/// Paths are resolved against `base_dir` (the manifest's directory).
/// Stops at and returns the first failure.
pub fn build_all(manifest: &ExportManifest, base_dir: &Path) -> Result<Vec<ExportReport>> {
    validate(manifest)?;

    let out_dir = manifest.output.dir.as_ref().map(|dir| base_dir.join(dir));

    manifest
        .files
        .par_iter()
        .map(|entry| {
            let input = base_dir.join(&entry.path);
            let options = entry.options(&manifest.defaults);
            convert_file(&input, out_dir.as_deref(), &options)
                .with_context(|| format!("Failed to export {:?}", entry.path))
        })
        .collect()
}
