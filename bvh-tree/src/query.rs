//! Read-only queries over a built tree
//!
//! Name-based methods mirror how BVH consumers usually address joints.
//! Every one of them resolves the name once and delegates to an id-based
//! form, which is the only way to reach End Sites past the first one
//! (they are all named `Site`).

use crate::node::NodeId;
use crate::numeric::{lenient_f64, lenient_usize};
use crate::tree::BvhTree;
use crate::{CHANNELS, END, FRAME_TIME, FRAMES, JOINT, OFFSET, ROOT};

impl BvhTree {
    // =========================================================================
    // Node search
    // =========================================================================

    /// All nodes whose leading fields equal `prefix`, in document order
    ///
    /// Pre-order depth-first over the whole tree, synthetic root included
    /// (it only matches an empty prefix).
    pub fn search(&self, prefix: &[&str]) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending = vec![NodeId::ROOT];

        while let Some(id) = pending.pop() {
            let node = self.node(id);
            if node.matches_prefix(prefix) {
                found.push(id);
            }
            pending.extend(node.children.iter().rev().copied());
        }

        found
    }

    /// Payload of the first direct child line that contains `key`
    ///
    /// Returns the fields after `key`, or `None` when no child has it or
    /// `key` is the last field of that first child. Later children are not
    /// consulted.
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&[String]> {
        self.node(id)
            .children
            .iter()
            .find_map(|&child| {
                let fields = &self.node(child).fields;
                fields.iter().position(|f| f == key).map(|pos| &fields[pos + 1..])
            })
            .filter(|rest| !rest.is_empty())
    }

    /// Direct children of `id` with the given tag
    pub fn children_tagged<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(move |&child| self.node(child).tag() == tag)
    }

    // =========================================================================
    // Joint enumeration
    // =========================================================================

    /// The skeleton's ROOT joint
    pub fn root_joint(&self) -> Option<NodeId> {
        self.search(&[ROOT]).first().copied()
    }

    /// Joints in pre-order from the ROOT, following JOINT children
    ///
    /// With `include_end_sites`, each joint's End Sites follow it directly,
    /// before its JOINT children are visited.
    pub fn joints(&self, include_end_sites: bool) -> Vec<NodeId> {
        let mut joints = Vec::new();
        if let Some(root) = self.root_joint() {
            self.collect_joints(root, include_end_sites, &mut joints);
        }
        joints
    }

    fn collect_joints(&self, id: NodeId, include_end_sites: bool, out: &mut Vec<NodeId>) {
        out.push(id);
        if include_end_sites {
            out.extend(self.children_tagged(id, END));
        }
        for child in self.children_tagged(id, JOINT) {
            self.collect_joints(child, include_end_sites, out);
        }
    }

    /// Joint names in [`Self::joints`] order (End Sites appear as `Site`)
    pub fn joint_names(&self, include_end_sites: bool) -> Vec<&str> {
        self.joints(include_end_sites)
            .into_iter()
            .map(|id| self.node(id).name())
            .collect()
    }

    /// Find a joint by name: ROOT first, then JOINT, then End
    pub fn joint(&self, name: &str) -> Option<NodeId> {
        [ROOT, JOINT, END]
            .into_iter()
            .find_map(|tag| self.search(&[tag, name]).first().copied())
    }

    /// Position of a joint in `joints(false)`
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        let id = self.joint(name)?;
        self.joints(false).iter().position(|&j| j == id)
    }

    /// Direct JOINT children followed by End Site children
    pub fn joint_children(&self, name: &str) -> Vec<NodeId> {
        match self.joint(name) {
            Some(id) => self.node_children(id),
            None => Vec::new(),
        }
    }

    /// Id form of [`Self::joint_children`]
    pub fn node_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children_tagged(id, JOINT)
            .chain(self.children_tagged(id, END))
            .collect()
    }

    // =========================================================================
    // Parents and depth
    // =========================================================================

    /// Enclosing joint of `id`; `None` when the parent is the synthetic root
    pub fn parent_joint(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent.filter(|&p| p != NodeId::ROOT)
    }

    /// Parent of a named joint; `None` for the skeleton ROOT or unknown names
    pub fn joint_parent(&self, name: &str) -> Option<NodeId> {
        self.parent_joint(self.joint(name)?)
    }

    /// Position of the named joint's parent in `joints(false)`
    pub fn joint_parent_index(&self, name: &str) -> Option<usize> {
        let parent = self.joint_parent(name)?;
        self.joints(false).iter().position(|&j| j == parent)
    }

    /// Number of parent hops from `id` up to the skeleton ROOT
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent_joint(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Depth of a named joint (ROOT is 0)
    pub fn joint_depth(&self, name: &str) -> Option<usize> {
        self.joint(name).map(|id| self.depth(id))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// The three OFFSET values of a node (missing values read 0)
    pub fn node_offset(&self, id: NodeId) -> Option<[f64; 3]> {
        let fields = self.attribute(id, OFFSET)?;
        let mut offset = [0.0; 3];
        for (value, field) in offset.iter_mut().zip(fields) {
            *value = lenient_f64(field);
        }
        Some(offset)
    }

    /// OFFSET of a named joint
    pub fn joint_offset(&self, name: &str) -> Option<[f64; 3]> {
        self.node_offset(self.joint(name)?)
    }

    /// Channel names of a node (CHANNELS fields after the count)
    pub fn node_channels(&self, id: NodeId) -> Option<&[String]> {
        self.attribute(id, CHANNELS).map(|fields| &fields[1..])
    }

    /// Channel names of a named joint
    pub fn joint_channels(&self, name: &str) -> Option<&[String]> {
        self.node_channels(self.joint(name)?)
    }

    /// Declared channel count of a node; 0 without a CHANNELS line
    pub fn node_channel_count(&self, id: NodeId) -> usize {
        self.attribute(id, CHANNELS)
            .map(|fields| lenient_usize(&fields[0]))
            .unwrap_or(0)
    }

    /// Channels per frame row: the sum over all joints in pre-order
    pub fn channel_count(&self) -> usize {
        self.joints(false)
            .into_iter()
            .map(|id| self.node_channel_count(id))
            .sum()
    }

    // =========================================================================
    // Channel indexing
    // =========================================================================

    /// Index of a joint's first channel within a frame row
    ///
    /// `None` when `id` is not reachable through `joints(false)`, which
    /// includes every End Site.
    pub fn node_channel_base_offset(&self, id: NodeId) -> Option<usize> {
        let mut offset = 0;
        for joint in self.joints(false) {
            if joint == id {
                return Some(offset);
            }
            offset += self.node_channel_count(joint);
        }
        None
    }

    /// Index of a named joint's first channel within a frame row
    pub fn joint_channel_base_offset(&self, name: &str) -> Option<usize> {
        self.node_channel_base_offset(self.joint(name)?)
    }

    /// Position of `channel` in a node's channel list
    pub fn node_channel_index(&self, id: NodeId, channel: &str) -> Option<usize> {
        self.node_channels(id)?.iter().position(|c| c == channel)
    }

    /// Position of `channel` in a named joint's channel list
    pub fn channel_local_index(&self, name: &str, channel: &str) -> Option<usize> {
        self.node_channel_index(self.joint(name)?, channel)
    }

    // =========================================================================
    // Frame values
    // =========================================================================

    /// Value of one channel in one frame, strict form
    ///
    /// `None` for an unknown channel or an out-of-range frame or column.
    /// Unparsable tokens still read as 0.
    pub fn frame_channel(&self, frame: usize, id: NodeId, channel: &str) -> Option<f64> {
        let column = self.node_channel_base_offset(id)? + self.node_channel_index(id, channel)?;
        self.frames
            .get(frame)?
            .get(column)
            .map(|token| lenient_f64(token))
    }

    /// Value of one channel in one frame, with the legacy fallback rule
    ///
    /// When the joint or channel is unknown and `fallback` is non-zero,
    /// `fallback` is returned as-is. A zero `fallback` is indistinguishable
    /// from "no fallback": the lookup then proceeds with a channel index of
    /// -1 and reads the column just before the joint's block (0 at the
    /// start of the row). Out-of-range frames or columns read 0.
    ///
    /// Kept for compatibility with existing exports; this is most likely a
    /// latent defect, use [`Self::frame_channel`] for strict lookups.
    pub fn frame_channel_value(
        &self,
        frame: usize,
        joint: &str,
        channel: &str,
        fallback: f64,
    ) -> f64 {
        let Some(id) = self.joint(joint) else {
            return fallback;
        };
        let Some(base) = self.node_channel_base_offset(id) else {
            return fallback;
        };
        self.legacy_lookup(frame, base, self.node_channel_index(id, channel), fallback)
    }

    /// [`Self::frame_channel_value`] for several channels of one joint
    pub fn frame_channel_values(
        &self,
        frame: usize,
        joint: &str,
        channels: &[&str],
        fallback: f64,
    ) -> Vec<f64> {
        channels
            .iter()
            .map(|channel| self.frame_channel_value(frame, joint, channel, fallback))
            .collect()
    }

    /// [`Self::frame_channel_values`] for every frame
    pub fn frames_channel_values(
        &self,
        joint: &str,
        channels: &[&str],
        fallback: f64,
    ) -> Vec<Vec<f64>> {
        let Some(base) = self.joint(joint).and_then(|id| self.node_channel_base_offset(id)) else {
            return vec![vec![fallback; channels.len()]; self.frames.len()];
        };
        let locals: Vec<Option<usize>> = channels
            .iter()
            .map(|channel| self.channel_local_index(joint, channel))
            .collect();

        (0..self.frames.len())
            .map(|frame| {
                locals
                    .iter()
                    .map(|&local| self.legacy_lookup(frame, base, local, fallback))
                    .collect()
            })
            .collect()
    }

    fn legacy_lookup(&self, frame: usize, base: usize, local: Option<usize>, fallback: f64) -> f64 {
        if local.is_none() && fallback != 0.0 {
            return fallback;
        }

        let column = match local {
            Some(index) => Some(base + index),
            None => base.checked_sub(1),
        };

        column
            .and_then(|column| self.frames.get(frame)?.get(column))
            .map_or(0.0, |token| lenient_f64(token))
    }

    // =========================================================================
    // Motion header
    // =========================================================================

    /// Value of the `Frames:` header (0 when absent or unparsable)
    pub fn frame_count(&self) -> usize {
        self.search(&[FRAMES])
            .first()
            .and_then(|&id| self.node(id).fields.get(1))
            .map_or(0, |token| lenient_usize(token))
    }

    /// Value of the `Frame Time:` header in seconds (0 when absent)
    pub fn frame_time(&self) -> f64 {
        self.search(&FRAME_TIME)
            .first()
            .and_then(|&id| self.node(id).fields.get(2))
            .map_or(0.0, |token| lenient_f64(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{TWO_JOINT, WITH_BRANCHES};

    fn two_joint() -> BvhTree {
        BvhTree::parse(TWO_JOINT).unwrap()
    }

    fn branches() -> BvhTree {
        BvhTree::parse(WITH_BRANCHES).unwrap()
    }

    #[test]
    fn test_search_prefix() {
        let tree = two_joint();
        assert_eq!(tree.search(&[ROOT]).len(), 1);
        assert_eq!(tree.search(&[JOINT, "Spine"]).len(), 1);
        assert!(tree.search(&[JOINT, "Hips"]).is_empty());
        assert_eq!(tree.search(&[OFFSET]).len(), 3);
        // Every node, synthetic root included
        assert_eq!(tree.search(&[]).len(), tree.nodes().count());
    }

    #[test]
    fn test_search_prefix_law() {
        let tree = branches();
        let wide = tree.search(&[JOINT]);
        for name in ["LeftLeg", "RightLeg", "Chest", "Missing"] {
            let narrow = tree.search(&[JOINT, name]);
            assert!(narrow.iter().all(|id| wide.contains(id)));
            for id in narrow {
                assert_eq!(&tree.node(id).fields[..2], &[JOINT, name]);
            }
        }
    }

    #[test]
    fn test_search_document_order() {
        let tree = branches();
        let names: Vec<&str> = tree
            .search(&[JOINT])
            .into_iter()
            .map(|id| tree.node(id).name())
            .collect();
        assert_eq!(names, vec!["LeftLeg", "LeftFoot", "RightLeg", "Chest"]);
    }

    #[test]
    fn test_attribute() {
        let tree = two_joint();
        let spine = tree.joint("Spine").unwrap();
        let offset: Vec<&str> = tree
            .attribute(spine, OFFSET)
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(offset, vec!["0", "5", "0"]);
        assert!(tree.attribute(spine, "MISSING").is_none());

        let bare = BvhTree::parse("ROOT A\n{\nOFFSET 0 0 0\nCHANNELS 0\nMARK\n}\n").unwrap();
        let root = bare.joint("A").unwrap();
        assert!(bare.attribute(root, "MARK").is_none());
    }

    #[test]
    fn test_attribute_stops_at_first_match() {
        let tree =
            BvhTree::parse("ROOT A\n{\nOFFSET 0 0 0\nCHANNELS 0\nMARK\nMARK 7\n}\n").unwrap();
        let root = tree.joint("A").unwrap();
        assert!(tree.attribute(root, "MARK").is_none());

        let tree =
            BvhTree::parse("ROOT A\n{\nOFFSET 0 0 0\nCHANNELS 0\nMARK 3\nMARK 7\n}\n").unwrap();
        let root = tree.joint("A").unwrap();
        assert_eq!(tree.attribute(root, "MARK").unwrap(), ["3"]);
    }

    #[test]
    fn test_joints_order() {
        let tree = branches();
        assert_eq!(
            tree.joint_names(false),
            vec!["Hips", "LeftLeg", "LeftFoot", "RightLeg", "Chest"]
        );
        assert_eq!(
            tree.joint_names(true),
            vec!["Hips", "LeftLeg", "LeftFoot", "Site", "RightLeg", "Site", "Chest", "Site"]
        );

        let with_ends = tree.joints(true);
        assert!(tree.node(with_ends[3]).is_end_site());
        assert_eq!(tree.parent_joint(with_ends[3]), tree.joint("LeftFoot"));
        assert_eq!(tree.parent_joint(with_ends[5]), tree.joint("RightLeg"));
    }

    #[test]
    fn test_joint_by_name_priority() {
        let tree = branches();
        assert_eq!(tree.node(tree.joint("Hips").unwrap()).tag(), ROOT);
        assert_eq!(tree.node(tree.joint("Chest").unwrap()).tag(), JOINT);

        // Every End Site is named "Site"; the first one wins
        let site = tree.joint("Site").unwrap();
        assert_eq!(site, tree.joints(true)[3]);
        assert!(tree.joint("Nope").is_none());

        let shadowed = "ROOT X\n{\nOFFSET 0 0 0\nCHANNELS 0\n\
                        JOINT X\n{\nOFFSET 0 0 0\nCHANNELS 0\n}\n}";
        let tree = BvhTree::parse(shadowed).unwrap();
        assert_eq!(tree.node(tree.joint("X").unwrap()).tag(), ROOT);
    }

    #[test]
    fn test_joint_index_and_children() {
        let tree = branches();
        assert_eq!(tree.joint_index("Hips"), Some(0));
        assert_eq!(tree.joint_index("RightLeg"), Some(3));
        assert_eq!(tree.joint_index("Site"), None);
        assert_eq!(tree.joint_parent_index("LeftFoot"), Some(1));
        assert_eq!(tree.joint_parent_index("Hips"), None);

        let children: Vec<&str> = tree
            .joint_children("Hips")
            .into_iter()
            .map(|id| tree.node(id).name())
            .collect();
        assert_eq!(children, vec!["LeftLeg", "RightLeg", "Chest"]);
        let foot = tree.joint_children("LeftFoot");
        assert_eq!(foot.len(), 1);
        assert!(tree.node(foot[0]).is_end_site());
        assert!(tree.joint_children("Missing").is_empty());
    }

    #[test]
    fn test_parent_and_depth() {
        let tree = branches();
        assert!(tree.joint_parent("Hips").is_none());
        assert_eq!(tree.joint_parent("LeftFoot"), tree.joint("LeftLeg"));
        assert_eq!(tree.joint_depth("Hips"), Some(0));
        assert_eq!(tree.joint_depth("LeftLeg"), Some(1));
        assert_eq!(tree.joint_depth("LeftFoot"), Some(2));
        assert_eq!(tree.joint_depth("Missing"), None);

        let depths: Vec<usize> = tree.joints(true).into_iter().map(|id| tree.depth(id)).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 1, 2, 1, 2]);
    }

    #[test]
    fn test_depth_monotonic() {
        let tree = branches();
        for id in tree.joints(true) {
            if let Some(parent) = tree.parent_joint(id) {
                assert_eq!(tree.depth(id), tree.depth(parent) + 1);
            }
        }
    }

    #[test]
    fn test_offsets_and_channels() {
        let tree = branches();
        assert_eq!(tree.joint_offset("Hips"), Some([1.0, 2.0, 3.0]));
        assert_eq!(tree.joint_offset("RightLeg"), Some([-1.0, -1.0, 0.0]));
        assert_eq!(tree.joint_offset("Missing"), None);

        let end = tree.joints(true)[3];
        assert_eq!(tree.node_offset(end), Some([0.0, 0.0, 1.0]));
        assert!(tree.node_channels(end).is_none());
        assert_eq!(tree.node_channel_count(end), 0);

        assert_eq!(
            tree.joint_channels("LeftLeg").unwrap(),
            &["Zrotation", "Xrotation", "Yrotation"]
        );
    }

    #[test]
    fn test_channel_total_matches_rows() {
        for text in [TWO_JOINT, WITH_BRANCHES] {
            let tree = BvhTree::parse(text).unwrap();
            for row in tree.frames() {
                assert_eq!(row.len(), tree.channel_count());
            }
        }
    }

    #[test]
    fn test_channel_base_offset() {
        let tree = two_joint();
        assert_eq!(tree.joint_channel_base_offset("Hips"), Some(0));
        assert_eq!(tree.joint_channel_base_offset("Spine"), Some(6));
        assert_eq!(tree.joint_channel_base_offset("Missing"), None);
        assert_eq!(tree.joint_channel_base_offset("Site"), None);

        let tree = branches();
        assert_eq!(tree.joint_channel_base_offset("LeftFoot"), Some(9));
        assert_eq!(tree.joint_channel_base_offset("RightLeg"), Some(12));
        assert_eq!(tree.joint_channel_base_offset("Chest"), Some(15));
    }

    #[test]
    fn test_channel_local_index() {
        let tree = two_joint();
        assert_eq!(tree.channel_local_index("Spine", "Xrotation"), Some(0));
        assert_eq!(tree.channel_local_index("Spine", "Yrotation"), Some(2));
        assert_eq!(tree.channel_local_index("Spine", "Xposition"), None);
        assert_eq!(tree.channel_local_index("Missing", "Xrotation"), None);
    }

    #[test]
    fn test_frame_header() {
        let tree = two_joint();
        assert_eq!(tree.frame_count(), 2);
        assert!((tree.frame_time() - 0.033333).abs() < 1e-12);
    }

    #[test]
    fn test_frame_channel_value() {
        let tree = two_joint();
        // Column 6 + 0 of the second row
        assert_eq!(tree.frame_channel_value(1, "Spine", "Xrotation", 0.0), 16.0);
        assert_eq!(tree.frame_channel_value(0, "Hips", "Yposition", 0.0), 1.0);
        assert_eq!(tree.frame_channel_value(0, "Spine", "Yrotation", 0.0), 8.0);
    }

    #[test]
    fn test_frame_channel_value_out_of_range() {
        let tree = two_joint();
        assert_eq!(tree.frame_channel_value(2, "Spine", "Xrotation", 0.0), 0.0);
        assert_eq!(tree.frame_channel_value(99, "Hips", "Xposition", 3.0), 0.0);
    }

    #[test]
    fn test_frame_channel_value_fallback_rule() {
        let tree = two_joint();
        // Non-zero fallback is returned verbatim for a missing channel
        assert_eq!(tree.frame_channel_value(1, "Spine", "Xposition", 5.0), 5.0);
        assert_eq!(tree.frame_channel_value(1, "Nobody", "Xrotation", 5.0), 5.0);

        // Zero fallback reads the column just before the joint's block
        assert_eq!(tree.frame_channel_value(1, "Spine", "Xposition", 0.0), 15.0);
        // ...which does not exist for the first joint
        assert_eq!(tree.frame_channel_value(1, "Hips", "Missing", 0.0), 0.0);
        assert_eq!(tree.frame_channel_value(1, "Nobody", "Xrotation", 0.0), 0.0);
    }

    #[test]
    fn test_frame_channel_unparsable_token_reads_zero() {
        let tree = branches();
        assert_eq!(tree.frame_channel_value(2, "Chest", "Xrotation", 0.0), 6.0);
        assert_eq!(tree.frame_channel_value(2, "Chest", "Yrotation", 0.0), 0.0);
        let chest = tree.joint("Chest").unwrap();
        assert_eq!(tree.frame_channel(2, chest, "Yrotation"), Some(0.0));
    }

    #[test]
    fn test_frame_channel_strict() {
        let tree = branches();
        let hips = tree.joint("Hips").unwrap();
        assert_eq!(tree.frame_channel(1, hips, "Yrotation"), Some(90.0));
        assert_eq!(tree.frame_channel(1, hips, "Wrotation"), None);
        assert_eq!(tree.frame_channel(7, hips, "Yrotation"), None);
        let end = tree.joints(true)[3];
        assert_eq!(tree.frame_channel(0, end, "Xrotation"), None);
    }

    #[test]
    fn test_frame_channel_values() {
        let tree = branches();
        assert_eq!(
            tree.frame_channel_values(0, "LeftLeg", &["Xrotation", "Yrotation", "Wrotation"], -1.0),
            vec![20.0, 30.0, -1.0]
        );
        assert_eq!(
            tree.frames_channel_values("RightLeg", &["Zrotation"], 0.0),
            vec![vec![-10.0], vec![-11.0], vec![-12.0]]
        );
        assert_eq!(
            tree.frames_channel_values("Nobody", &["Zrotation", "Xrotation"], 2.0),
            vec![vec![2.0, 2.0]; 3]
        );
    }
}
