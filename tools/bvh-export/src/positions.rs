//! World-space joint positions
//!
//! Composes each joint's local transform (translation, then the rotation
//! channels in file order) with its parent's world transform, frame by
//! frame. Angles in BVH are degrees.

use bvh_tree::numeric::lenient_f64;
use bvh_tree::{BvhTree, NodeId};
use glam::{DMat4, DQuat, DVec3};

/// How one joint's values are laid out in a frame row
struct JointLayout {
    id: NodeId,
    /// Arena index of the parent joint (None for the ROOT)
    parent: Option<usize>,
    offset: DVec3,
    /// Frame-row columns of the rotation channels, in channel order
    rotations: Vec<(Axis, usize)>,
    /// Frame-row columns of X/Y/Z position channels (used for the ROOT)
    positions: [Option<usize>; 3],
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn rotation(self, degrees: f64) -> DQuat {
        let radians = degrees.to_radians();
        match self {
            Axis::X => DQuat::from_rotation_x(radians),
            Axis::Y => DQuat::from_rotation_y(radians),
            Axis::Z => DQuat::from_rotation_z(radians),
        }
    }
}

/// World positions of a set of joints for every frame
#[derive(Debug, Clone)]
pub struct WorldPositions {
    /// Joints in `joints(include_end_sites)` order
    pub joints: Vec<NodeId>,
    /// `frames[frame][joint]`, unscaled
    pub frames: Vec<Vec<DVec3>>,
}

/// Solve world positions for every frame row
///
/// The ROOT is translated by its position channels when it has any,
/// otherwise by its OFFSET; every other joint and End Site by its OFFSET.
/// End Sites carry no rotation.
pub fn world_positions(tree: &BvhTree, include_end_sites: bool) -> WorldPositions {
    // Parents always precede children in pre-order
    let layouts: Vec<JointLayout> = tree
        .joints(true)
        .into_iter()
        .map(|id| joint_layout(tree, id))
        .collect();
    let wanted = tree.joints(include_end_sites);

    let mut world = vec![DMat4::IDENTITY; tree.nodes().count()];
    let frames = tree
        .frames()
        .iter()
        .map(|row| {
            for layout in &layouts {
                let local = local_transform(layout, row);
                world[layout.id.index()] = match layout.parent {
                    Some(parent) => world[parent] * local,
                    None => local,
                };
            }
            wanted
                .iter()
                .map(|id| world[id.index()].transform_point3(DVec3::ZERO))
                .collect()
        })
        .collect();

    WorldPositions {
        joints: wanted,
        frames,
    }
}

fn joint_layout(tree: &BvhTree, id: NodeId) -> JointLayout {
    let offset = DVec3::from_array(tree.node_offset(id).unwrap_or([0.0; 3]));
    let parent = tree.parent_joint(id).map(NodeId::index);

    let mut rotations = Vec::new();
    let mut positions = [None; 3];
    if let (Some(base), Some(channels)) = (tree.node_channel_base_offset(id), tree.node_channels(id)) {
        for (i, channel) in channels.iter().enumerate() {
            let column = base + i;
            match channel.as_str() {
                "Xrotation" => rotations.push((Axis::X, column)),
                "Yrotation" => rotations.push((Axis::Y, column)),
                "Zrotation" => rotations.push((Axis::Z, column)),
                "Xposition" => positions[0] = Some(column),
                "Yposition" => positions[1] = Some(column),
                "Zposition" => positions[2] = Some(column),
                _ => {}
            }
        }
    }

    JointLayout {
        id,
        parent,
        offset,
        rotations,
        positions,
    }
}

fn local_transform(layout: &JointLayout, row: &[String]) -> DMat4 {
    let value = |column: usize| row.get(column).map_or(0.0, |token| lenient_f64(token));

    let translation = if layout.parent.is_none() && layout.positions.iter().any(Option::is_some) {
        DVec3::from_array(layout.positions.map(|column| column.map_or(0.0, value)))
    } else {
        layout.offset
    };

    let rotation = layout
        .rotations
        .iter()
        .fold(DQuat::IDENTITY, |acc, &(axis, column)| {
            acc * axis.rotation(value(column))
        });

    DMat4::from_rotation_translation(rotation, translation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 100 100 100
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Arm
  {
    OFFSET 0 10 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 5 0 0
    }
  }
}
MOTION
Frames: 3
Frame Time: 0.1
0 0 0 0 0 0 0 0 0
1 2 3 90 0 0 0 0 0
0 0 0 0 0 0 90 0 0
";

    fn assert_close(actual: DVec3, expected: [f64; 3]) {
        let expected = DVec3::from_array(expected);
        assert!(
            actual.abs_diff_eq(expected, 1e-9),
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_rest_pose() {
        let tree = BvhTree::parse(ARM).unwrap();
        let solved = world_positions(&tree, true);

        assert_eq!(solved.joints.len(), 3);
        assert_eq!(solved.frames.len(), 3);
        // Root translates by its channels, not its OFFSET
        assert_close(solved.frames[0][0], [0.0, 0.0, 0.0]);
        assert_close(solved.frames[0][1], [0.0, 10.0, 0.0]);
        assert_close(solved.frames[0][2], [5.0, 10.0, 0.0]);
    }

    #[test]
    fn test_root_rotation_moves_children() {
        let tree = BvhTree::parse(ARM).unwrap();
        let solved = world_positions(&tree, true);

        // 90 degrees about Z maps +Y to -X
        assert_close(solved.frames[1][0], [1.0, 2.0, 3.0]);
        assert_close(solved.frames[1][1], [-9.0, 2.0, 3.0]);
        assert_close(solved.frames[1][2], [-9.0, 7.0, 3.0]);
    }

    #[test]
    fn test_child_rotation_moves_end_site() {
        let tree = BvhTree::parse(ARM).unwrap();
        let solved = world_positions(&tree, false);

        assert_eq!(solved.joints.len(), 2);
        assert_close(solved.frames[2][1], [0.0, 10.0, 0.0]);

        let with_end = world_positions(&tree, true);
        assert_close(with_end.frames[2][2], [0.0, 15.0, 0.0]);
    }

    #[test]
    fn test_root_without_position_channels_uses_offset() {
        let text = ARM
            .replace(
                "CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation",
                "CHANNELS 3 Zrotation Xrotation Yrotation",
            )
            .replace("0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0");
        let tree = BvhTree::parse(&text).unwrap();
        let solved = world_positions(&tree, false);
        assert_close(solved.frames[0][0], [100.0, 100.0, 100.0]);
        assert_close(solved.frames[0][1], [100.0, 110.0, 100.0]);
    }
}
