//! bvh-tree: BVH motion-capture hierarchy parser for the bvh tools
//!
//! This crate reads the two-block BVH text format (a skeleton `HIERARCHY`
//! followed by per-frame `MOTION` samples), keeps it as an arena-backed
//! node tree, answers joint/channel queries over it and writes it back
//! out in the same textual layout.
//!
//! # Pipeline
//!
//! ```text
//! text -> tokenize -> [TokenLine] -> build_tree -> BvhTree -> queries / render
//! ```
//!
//! - [`tokenize`] splits text into trimmed, space-delimited lines
//! - [`BvhTree::parse`] builds the node tree and collects frame rows
//! - query methods on [`BvhTree`] walk the tree read-only
//! - [`BvhTree::render`] reconstructs the text from joint depths
//!
//! # Usage
//!
//! ```ignore
//! use bvh_tree::BvhTree;
//!
//! let tree = BvhTree::from_path("walk.bvh")?;
//!
//! println!("Frames: {}", tree.frame_count());
//! println!("Frame time: {}", tree.frame_time());
//! for name in tree.joint_names(false) {
//!     println!("  Joint: {}", name);
//! }
//!
//! let x = tree.frame_channel_value(0, "Hips", "Xposition", 0.0);
//! ```
//!
//! # Numeric policy
//!
//! Frame tokens and offsets stay as strings until queried. Tokens that do
//! not parse as numbers read as zero, see [`numeric`].

mod error;
pub mod numeric;
mod node;
mod parser;
mod query;
#[cfg(test)]
mod test_data;
mod tokenizer;
mod tree;
mod writer;

pub use error::{BvhError, Result};
pub use node::{Node, NodeId};
pub use tree::BvhTree;
pub use tokenizer::{TokenLine, tokenize};

// =============================================================================
// Keywords
// =============================================================================

/// Tag of the skeleton root joint
pub const ROOT: &str = "ROOT";

/// Tag of a non-root joint
pub const JOINT: &str = "JOINT";

/// Tag of an End Site placeholder (`End Site`)
pub const END: &str = "End";

/// Offset attribute key
pub const OFFSET: &str = "OFFSET";

/// Channel list attribute key
pub const CHANNELS: &str = "CHANNELS";

/// Scope open token
pub const OPEN: &str = "{";

/// Scope close token
pub const CLOSE: &str = "}";

/// First header line of the hierarchy block
pub const HIERARCHY: &str = "HIERARCHY";

/// First header line of the motion block
pub const MOTION: &str = "MOTION";

/// Frame count header key (`Frames: <n>`)
pub const FRAMES: &str = "Frames:";

/// Frame time header keys (`Frame Time: <t>`)
pub const FRAME_TIME: [&str; 2] = ["Frame", "Time:"];

/// Indentation emitted per depth level when writing
pub const INDENT: &str = "  ";
