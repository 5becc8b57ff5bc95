//! CSV -> BVH import
//!
//! Rebuilds a BVH file from the three CSVs written by [`crate::csv`]:
//! `<stem>_hierarchy.csv` gives joints, parents and offsets,
//! `<stem>_rot.csv` gives the rotation channels of every joint, and
//! `<stem>_pos.csv` gives the ROOT's translation. Joints with neither
//! children nor rotation columns become End Sites.
//!
//! The skeleton is emitted as nested BVH text, parsed into a [`BvhTree`]
//! and rendered through the core writer, so the output has the same layout
//! as every other file this tool writes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bvh_tree::BvhTree;

const HIERARCHY_SUFFIX: &str = "_hierarchy.csv";
const TIME: &str = "time";

/// A comma-separated table: one header row plus data rows of equal width
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Read a table; cells are trimmed and blank lines skipped
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::default();
        let mut has_header = false;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<String> = line.split(',').map(|c| c.trim().to_string()).collect();

            if !has_header {
                table.header = cells;
                has_header = true;
            } else if cells.len() != table.header.len() {
                bail!(
                    "Line {}: expected {} columns, found {}",
                    index + 1,
                    table.header.len(),
                    cells.len()
                );
            } else {
                table.rows.push(cells);
            }
        }

        if !has_header {
            bail!("Missing header row");
        }
        Ok(table)
    }

    /// Read a table from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open CSV: {:?}", path))?;
        Self::read(BufReader::new(file)).with_context(|| format!("Invalid CSV: {:?}", path))
    }

    /// Index of a named column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    fn required_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .with_context(|| format!("Missing column '{}'", name))
    }

    fn number(&self, row: usize, column: usize) -> Result<f64> {
        let cell = &self.rows[row][column];
        cell.parse::<f64>().with_context(|| {
            format!(
                "Row {} column '{}': '{}' is not a number",
                row + 1,
                self.header[column],
                cell
            )
        })
    }
}

/// Locations of the three input tables
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPaths {
    pub hierarchy: PathBuf,
    pub positions: PathBuf,
    pub rotations: PathBuf,
}

impl ImportPaths {
    /// Sibling `_pos.csv` / `_rot.csv` of a `<stem>_hierarchy.csv` file
    pub fn from_hierarchy(hierarchy: &Path) -> Result<Self> {
        let stem = hierarchy_stem(hierarchy).with_context(|| {
            format!(
                "{:?} is not named <stem>{}; pass the position and rotation files explicitly",
                hierarchy, HIERARCHY_SUFFIX
            )
        })?;
        Ok(Self {
            hierarchy: hierarchy.to_path_buf(),
            positions: hierarchy.with_file_name(format!("{}_pos.csv", stem)),
            rotations: hierarchy.with_file_name(format!("{}_rot.csv", stem)),
        })
    }

    /// `<stem>.bvh` next to the hierarchy file
    pub fn default_output(&self) -> PathBuf {
        let stem = hierarchy_stem(&self.hierarchy).unwrap_or_else(|| {
            self.hierarchy
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        self.hierarchy.with_file_name(format!("{}.bvh", stem))
    }
}

fn hierarchy_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(HIERARCHY_SUFFIX).map(str::to_string)
}

/// One skeleton entry rebuilt from the hierarchy table
#[derive(Debug)]
struct ImportJoint {
    name: String,
    offset: [f64; 3],
    children: Vec<usize>,
    /// `(channel name, rotation table column)` in column order
    rotations: Vec<(String, usize)>,
}

impl ImportJoint {
    fn is_end_site(&self) -> bool {
        self.children.is_empty() && self.rotations.is_empty()
    }
}

/// Skeleton plus the index of its ROOT
struct Skeleton {
    joints: Vec<ImportJoint>,
    root: usize,
}

impl Skeleton {
    /// Joints in pre-order from the ROOT
    fn pre_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.joints.len());
        let mut pending = vec![self.root];
        while let Some(index) = pending.pop() {
            order.push(index);
            pending.extend(self.joints[index].children.iter().rev().copied());
        }
        order
    }
}

fn read_skeleton(table: &CsvTable, scale: f64) -> Result<Skeleton> {
    let joint_col = table.required_column("joint")?;
    let parent_col = table.required_column("parent")?;
    let offset_cols = [
        table.required_column("offset.x")?,
        table.required_column("offset.y")?,
        table.required_column("offset.z")?,
    ];

    let mut joints = Vec::with_capacity(table.rows.len());
    let mut by_name = HashMap::new();
    for (row, cells) in table.rows.iter().enumerate() {
        let name = cells[joint_col].clone();
        if name.is_empty() {
            bail!("Row {}: empty joint name", row + 1);
        }
        if by_name.insert(name.clone(), row).is_some() {
            bail!("Joint '{}' is defined more than once", name);
        }

        let mut offset = [0.0; 3];
        for (value, &column) in offset.iter_mut().zip(&offset_cols) {
            *value = scale * table.number(row, column)?;
        }
        joints.push(ImportJoint {
            name,
            offset,
            children: Vec::new(),
            rotations: Vec::new(),
        });
    }

    let mut root: Option<usize> = None;
    for (row, cells) in table.rows.iter().enumerate() {
        let parent = &cells[parent_col];
        if parent.is_empty() {
            if let Some(first) = root {
                bail!(
                    "Hierarchy has more than one root: '{}' and '{}'",
                    joints[first].name,
                    joints[row].name
                );
            }
            root = Some(row);
            continue;
        }
        if *parent == joints[row].name {
            bail!("Joint '{}' cannot be its own parent", parent);
        }
        let Some(&parent_index) = by_name.get(parent) else {
            bail!(
                "Parent '{}' of joint '{}' is not in the hierarchy",
                parent,
                joints[row].name
            );
        };
        joints[parent_index].children.push(row);
    }

    let Some(root) = root else {
        bail!("No root joint (a row with an empty parent) in the hierarchy");
    };

    let skeleton = Skeleton { joints, root };
    let reachable = skeleton.pre_order().len();
    if reachable != skeleton.joints.len() {
        bail!(
            "{} joints are not connected to root '{}' (cyclic parents?)",
            skeleton.joints.len() - reachable,
            skeleton.joints[root].name
        );
    }

    Ok(skeleton)
}

/// Split `<joint>.<axis>` at the last dot
fn split_column(column: &str) -> Result<(&str, char)> {
    let axis = column
        .rsplit_once('.')
        .and_then(|(joint, axis)| {
            let mut chars = axis.chars();
            let first = chars.next()?.to_ascii_uppercase();
            (chars.next().is_none() && matches!(first, 'X' | 'Y' | 'Z')).then_some((joint, first))
        });
    axis.with_context(|| format!("Column '{}' is not of the form <joint>.<x|y|z>", column))
}

fn assign_rotations(skeleton: &mut Skeleton, rotations: &CsvTable) -> Result<()> {
    let by_name: HashMap<String, usize> = skeleton
        .joints
        .iter()
        .enumerate()
        .map(|(i, j)| (j.name.clone(), i))
        .collect();

    for (column, header) in rotations.header.iter().enumerate() {
        if header == TIME {
            continue;
        }
        let (joint, axis) = split_column(header)?;
        let Some(&index) = by_name.get(joint) else {
            bail!("Rotation column '{}' names a joint missing from the hierarchy", header);
        };
        skeleton.joints[index]
            .rotations
            .push((format!("{}rotation", axis), column));
    }

    let missing: Vec<&str> = skeleton
        .joints
        .iter()
        .filter(|j| !j.children.is_empty() && j.rotations.is_empty())
        .map(|j| j.name.as_str())
        .collect();
    if !missing.is_empty() {
        bail!("No rotation data found for: {}", missing.join(", "));
    }

    Ok(())
}

/// `(channel name, position table column)` of the ROOT, in column order
fn root_positions(positions: &CsvTable, root: &str) -> Result<Vec<(String, usize)>> {
    let mut channels = Vec::new();
    for (column, header) in positions.header.iter().enumerate() {
        if header == TIME {
            continue;
        }
        let (joint, axis) = split_column(header)?;
        if joint == root {
            channels.push((format!("{}position", axis), column));
        }
    }
    if channels.is_empty() {
        bail!(
            "No position columns found for root '{}' (names are case-sensitive)",
            root
        );
    }
    Ok(channels)
}

/// Mean frame duration from cumulative time stamps, ignoring frame 0
fn frame_time(rotations: &CsvTable) -> Result<f64> {
    let column = rotations.required_column(TIME)?;
    let frames = rotations.rows.len();
    if frames < 2 {
        return Ok(0.0);
    }
    Ok(rotations.number(frames - 1, column)? / (frames - 1) as f64)
}

fn write_joint(
    out: &mut String,
    skeleton: &Skeleton,
    index: usize,
    depth: usize,
    root_channels: &[(String, usize)],
) {
    let indent = "  ".repeat(depth);
    let joint = &skeleton.joints[index];
    let [x, y, z] = joint.offset;

    if index == skeleton.root {
        out.push_str(&format!("{}ROOT {}\n", indent, joint.name));
    } else if joint.is_end_site() {
        out.push_str(&format!("{}End Site\n", indent));
    } else {
        out.push_str(&format!("{}JOINT {}\n", indent, joint.name));
    }
    out.push_str(&format!("{}{{\n", indent));
    out.push_str(&format!("{}  OFFSET {} {} {}\n", indent, x, y, z));

    if index == skeleton.root || !joint.is_end_site() {
        let names: Vec<&str> = root_channels
            .iter()
            .filter(|_| index == skeleton.root)
            .chain(&joint.rotations)
            .map(|(name, _)| name.as_str())
            .collect();
        out.push_str(&format!(
            "{}  CHANNELS {} {}\n",
            indent,
            names.len(),
            names.join(" ")
        ));
        for &child in &joint.children {
            write_joint(out, skeleton, child, depth + 1, root_channels);
        }
    }

    out.push_str(&format!("{}}}\n", indent));
}

/// Compose a BVH tree from the three tables
///
/// `scale` multiplies offsets and ROOT positions.
pub fn csv_to_bvh_tree(
    hierarchy: &CsvTable,
    positions: &CsvTable,
    rotations: &CsvTable,
    scale: f64,
) -> Result<BvhTree> {
    let mut skeleton = read_skeleton(hierarchy, scale).context("Invalid hierarchy table")?;
    assign_rotations(&mut skeleton, rotations).context("Invalid rotation table")?;
    let root_channels = root_positions(positions, &skeleton.joints[skeleton.root].name)
        .context("Invalid position table")?;

    let frames = positions.rows.len();
    if rotations.rows.len() != frames {
        bail!(
            "Frame count mismatch: {} position rows, {} rotation rows",
            frames,
            rotations.rows.len()
        );
    }

    let mut text = String::from("HIERARCHY\n");
    write_joint(&mut text, &skeleton, skeleton.root, 0, &root_channels);

    text.push_str(&format!(
        "MOTION\nFrames: {}\nFrame Time: {}\n",
        frames,
        frame_time(rotations)?
    ));

    let order = skeleton.pre_order();
    for frame in 0..frames {
        let mut row = Vec::new();
        for (_, column) in &root_channels {
            row.push((scale * positions.number(frame, *column)?).to_string());
        }
        for &index in &order {
            for (_, column) in &skeleton.joints[index].rotations {
                row.push(rotations.number(frame, *column)?.to_string());
            }
        }
        text.push_str(&row.join(" "));
        text.push('\n');
    }

    let tree = BvhTree::parse(&text).context("Rebuilt hierarchy does not parse")?;
    tracing::debug!(
        "Rebuilt {} joints, {} channels, {} frames",
        tree.joints(false).len(),
        tree.channel_count(),
        tree.frame_count()
    );
    Ok(tree)
}

/// [`csv_to_bvh_tree`] rendered as BVH text
pub fn csv_to_bvh_string(
    hierarchy: &CsvTable,
    positions: &CsvTable,
    rotations: &CsvTable,
    scale: f64,
) -> Result<String> {
    Ok(csv_to_bvh_tree(hierarchy, positions, rotations, scale)?.render())
}

/// Read the three CSVs and write the rebuilt BVH
///
/// # Arguments
/// * `paths` - Input tables
/// * `output` - Output .bvh (`<stem>.bvh` next to the hierarchy if None;
///   parent directory created if missing)
/// * `scale` - Multiplier for offsets and ROOT positions
pub fn import_file(paths: &ImportPaths, output: Option<&Path>, scale: f64) -> Result<PathBuf> {
    let hierarchy = CsvTable::from_path(&paths.hierarchy)?;
    let positions = CsvTable::from_path(&paths.positions)?;
    let rotations = CsvTable::from_path(&paths.rotations)?;

    let tree = csv_to_bvh_tree(&hierarchy, &positions, &rotations, scale)
        .with_context(|| format!("Failed to rebuild BVH from {:?}", paths.hierarchy))?;

    let output = output.map_or_else(|| paths.default_output(), Path::to_path_buf);
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }
    tree.write_file(&output)
        .with_context(|| format!("Failed to create output: {:?}", output))?;

    tracing::info!(
        "Imported {} joints, {} frames -> {:?}",
        tree.joints(false).len(),
        tree.frame_count(),
        output
    );
    Ok(output)
}
