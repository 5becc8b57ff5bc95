//! The parsed BVH document

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BvhError, Result};
use crate::node::{Node, NodeId};
use crate::parser::build_tree;
use crate::tokenizer::tokenize;

/// A parsed BVH file: hierarchy node arena plus raw motion frame rows
///
/// The tree is immutable once built. Node `0` is a synthetic root whose
/// children are the top-level lines (`HIERARCHY`, `ROOT ...`, `MOTION`,
/// `Frames: ...`, `Frame Time: ...`). Frame tokens are kept as text and
/// parsed on demand by the query methods.
#[derive(Debug, Clone)]
pub struct BvhTree {
    source: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) frames: Vec<Vec<String>>,
}

impl BvhTree {
    /// Parse BVH text into a tree
    ///
    /// # Returns
    /// * `Ok(BvhTree)` - Parsed tree (possibly empty for empty input)
    /// * `Err(BvhError)` - Unbalanced braces, missing ROOT or a joint
    ///   without its OFFSET/CHANNELS attributes
    pub fn parse(text: &str) -> Result<Self> {
        let lines = tokenize(text);
        let built = build_tree(lines)?;

        let tree = Self {
            source: text.to_string(),
            nodes: built.nodes,
            frames: built.frames,
        };
        tree.validate()?;

        tracing::debug!(
            "Parsed BVH: {} nodes, {} joints, {} channels, {} frames",
            tree.nodes.len() - 1,
            tree.joints(false).len(),
            tree.channel_count(),
            tree.frames.len()
        );

        Ok(tree)
    }

    /// Read and parse a BVH file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!("Read {} bytes from {:?}", text.len(), path);
        Self::parse(&text)
    }

    /// The text this tree was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Node behind a handle
    ///
    /// # Panics
    /// Panics if `id` came from a different tree and is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// All nodes in creation (document) order, synthetic root first
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Raw motion rows, one token per channel
    pub fn frames(&self) -> &[Vec<String>] {
        &self.frames
    }

    /// True when the input held no lines at all
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }
}

impl FromStr for BvhTree {
    type Err = BvhError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BvhTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
