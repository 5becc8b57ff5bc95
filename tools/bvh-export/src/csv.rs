//! CSV writers for joint hierarchy, rotations and world positions
//!
//! Each writer takes any `io::Write`; the `*_file` wrappers create the
//! file and report it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bvh_tree::numeric::lenient_f64;
use bvh_tree::{BvhTree, NodeId};

use crate::positions::world_positions;

/// Column label for a joint; End Sites become `<parent>_End`
pub fn joint_label(tree: &BvhTree, id: NodeId) -> String {
    let node = tree.node(id);
    if node.is_end_site() {
        let parent = tree.parent_joint(id).map_or("", |p| tree.node(p).name());
        format!("{}_End", parent)
    } else {
        node.name().to_string()
    }
}

/// `joint,parent,offset.x,offset.y,offset.z`, one row per joint and End Site
pub fn write_hierarchy<W: Write>(tree: &BvhTree, out: &mut W, scale: f64) -> Result<()> {
    writeln!(out, "joint,parent,offset.x,offset.y,offset.z")?;

    for id in tree.joints(true) {
        let parent = tree
            .parent_joint(id)
            .map(|p| joint_label(tree, p))
            .unwrap_or_default();
        let [x, y, z] = tree.node_offset(id).unwrap_or([0.0; 3]);
        writeln!(
            out,
            "{},{},{:.6},{:.6},{:.6}",
            joint_label(tree, id),
            parent,
            scale * x,
            scale * y,
            scale * z
        )?;
    }

    Ok(())
}

/// `time` plus one column per rotation channel, one row per frame
pub fn write_rotations<W: Write>(tree: &BvhTree, out: &mut W) -> Result<()> {
    let mut header = vec!["time".to_string()];
    let mut columns = Vec::new();

    for id in tree.joints(false) {
        let (Some(base), Some(channels)) =
            (tree.node_channel_base_offset(id), tree.node_channels(id))
        else {
            continue;
        };
        for (i, channel) in channels.iter().enumerate() {
            if let Some(axis) = channel.strip_suffix("rotation") {
                header.push(format!("{}.{}", joint_label(tree, id), axis.to_lowercase()));
                columns.push(base + i);
            }
        }
    }

    writeln!(out, "{}", header.join(","))?;

    let frame_time = tree.frame_time();
    for (frame, row) in tree.frames().iter().enumerate() {
        let mut cells = Vec::with_capacity(columns.len() + 1);
        cells.push(format!("{:10.5}", frame as f64 * frame_time));
        for &column in &columns {
            let value = row.get(column).map_or(0.0, |token| lenient_f64(token));
            cells.push(format!("{:10.5}", value));
        }
        writeln!(out, "{}", cells.join(","))?;
    }

    Ok(())
}

/// `time` plus `.x/.y/.z` columns per joint, one row of world positions per frame
pub fn write_positions<W: Write>(
    tree: &BvhTree,
    out: &mut W,
    scale: f64,
    end_sites: bool,
) -> Result<()> {
    let solved = world_positions(tree, end_sites);

    let mut header = vec!["time".to_string()];
    for &id in &solved.joints {
        let label = joint_label(tree, id);
        header.extend(["x", "y", "z"].map(|axis| format!("{}.{}", label, axis)));
    }
    writeln!(out, "{}", header.join(","))?;

    let frame_time = tree.frame_time();
    for (frame, positions) in solved.frames.iter().enumerate() {
        let mut cells = Vec::with_capacity(positions.len() * 3 + 1);
        cells.push(format!("{:10.5}", frame as f64 * frame_time));
        for position in positions {
            let scaled = *position * scale;
            cells.extend(scaled.to_array().map(|v| format!("{:10.5}", v)));
        }
        writeln!(out, "{}", cells.join(","))?;
    }

    Ok(())
}

/// Create `path` and fill it with `write`
pub fn write_csv_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write output: {:?}", path))?;
    tracing::info!("Wrote {:?}", path);
    Ok(())
}
