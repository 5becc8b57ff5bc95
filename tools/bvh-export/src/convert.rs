//! Single-file BVH -> CSV conversion

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bvh_tree::BvhTree;

use crate::csv::{write_csv_file, write_hierarchy, write_positions, write_rotations};

/// Which CSV files to produce and how
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Multiplier for offsets and positions
    pub scale: f64,
    /// Write `<stem>_rot.csv`
    pub rotations: bool,
    /// Write `<stem>_pos.csv`
    pub positions: bool,
    /// Write `<stem>_hierarchy.csv`
    pub hierarchy: bool,
    /// Include End Sites in the positions file
    pub end_sites: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotations: true,
            positions: true,
            hierarchy: true,
            end_sites: false,
        }
    }
}

/// Files written for one input
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub joint_count: usize,
    pub frame_count: usize,
}

/// Output path `<out_dir>/<input stem><suffix>`
pub fn output_path(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{}{}", stem, suffix))
}

/// Parse one BVH file and write the enabled CSV exports
///
/// # Arguments
/// * `input` - BVH file to read
/// * `out_dir` - Output directory (input's directory if None; created if missing)
/// * `options` - Which files to write
pub fn convert_file(
    input: &Path,
    out_dir: Option<&Path>,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let tree = BvhTree::from_path(input).with_context(|| format!("Failed to load BVH: {:?}", input))?;

    let out_dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    if !out_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;
    }

    let mut report = ExportReport {
        input: input.to_path_buf(),
        outputs: Vec::new(),
        joint_count: tree.joints(false).len(),
        frame_count: tree.frames().len(),
    };

    if options.positions {
        let path = output_path(input, &out_dir, "_pos.csv");
        write_csv_file(&path, |out| write_positions(&tree, out, options.scale, options.end_sites))?;
        report.outputs.push(path);
    }

    if options.rotations {
        let path = output_path(input, &out_dir, "_rot.csv");
        write_csv_file(&path, |out| write_rotations(&tree, out))?;
        report.outputs.push(path);
    }

    if options.hierarchy {
        let path = output_path(input, &out_dir, "_hierarchy.csv");
        write_csv_file(&path, |out| write_hierarchy(&tree, out, options.scale))?;
        report.outputs.push(path);
    }

    tracing::info!(
        "Converted {:?}: {} joints, {} frames, {} files",
        input,
        report.joint_count,
        report.frame_count,
        report.outputs.len()
    );

    Ok(report)
}

/// Parse a BVH file and write it back out in normalized form
pub fn normalize_file(input: &Path, output: &Path) -> Result<()> {
    let tree = BvhTree::from_path(input).with_context(|| format!("Failed to load BVH: {:?}", input))?;
    tree.write_file(output)
        .with_context(|| format!("Failed to create output: {:?}", output))?;

    tracing::info!(
        "Normalized BVH: {} joints, {} frames -> {:?}",
        tree.joints(false).len(),
        tree.frames().len(),
        output
    );

    Ok(())
}
