//! BVH text writer
//!
//! The hierarchy block is not produced by recursing the tree. It walks the
//! flat `joints(true)` list and infers brace nesting from each joint's
//! depth, closing scopes whenever the next joint sits shallower than the
//! last emitted line.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::node::NodeId;
use crate::tree::BvhTree;
use crate::{CHANNELS, CLOSE, HIERARCHY, INDENT, MOTION, OFFSET, OPEN};

/// Accumulates hierarchy lines and tracks the depth of the last one
struct HierarchyWriter {
    out: String,
    /// Indentation depth implied by the most recently emitted line
    open_depth: usize,
}

impl HierarchyWriter {
    fn new() -> Self {
        let mut out = String::new();
        out.push_str(HIERARCHY);
        out.push('\n');
        Self { out, open_depth: 0 }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emit `}` lines until the open depth is back down to `target`
    fn close_scopes(&mut self, target: usize) {
        while self.open_depth > target {
            self.open_depth -= 1;
            self.line(self.open_depth, CLOSE);
        }
    }

    fn attribute(&mut self, depth: usize, key: &str, values: Option<&[String]>) {
        match values {
            Some(values) => self.line(depth, &format!("{} {}", key, values.join(" "))),
            None => self.line(depth, key),
        }
    }
}

impl BvhTree {
    /// Reconstruct the full two-block BVH text
    pub fn render(&self) -> String {
        let mut out = self.hierarchy_string();
        out.push_str(&self.motion_string());
        out
    }

    /// `HIERARCHY` block with nesting rebuilt from joint depths
    pub fn hierarchy_string(&self) -> String {
        let mut writer = HierarchyWriter::new();

        for id in self.joints(true) {
            let depth = self.depth(id);
            writer.close_scopes(depth);
            self.write_joint(&mut writer, id, depth);
        }
        writer.close_scopes(0);

        writer.out
    }

    fn write_joint(&self, writer: &mut HierarchyWriter, id: NodeId, depth: usize) {
        let node = self.node(id);

        if node.is_end_site() {
            // Offset-only block, opened and closed in place
            writer.line(depth, "End Site");
            writer.line(depth, OPEN);
            writer.attribute(depth + 1, OFFSET, self.attribute(id, OFFSET));
            writer.line(depth, CLOSE);
            writer.open_depth = depth;
        } else {
            // Left open for descendants; closed by a later close_scopes
            writer.line(depth, &node.line_text());
            writer.line(depth, OPEN);
            writer.attribute(depth + 1, OFFSET, self.attribute(id, OFFSET));
            writer.attribute(depth + 1, CHANNELS, self.attribute(id, CHANNELS));
            writer.open_depth = depth + 1;
        }
    }

    /// `MOTION` block: frame count, frame time and raw frame rows
    pub fn motion_string(&self) -> String {
        let mut out = String::new();
        out.push_str(MOTION);
        out.push('\n');
        // Writing to a String cannot fail
        let _ = writeln!(out, "Frames: {}", self.frame_count());
        let _ = writeln!(out, "Frame Time: {}", self.frame_time());
        for row in &self.frames {
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }

    /// Write [`Self::render`] output to a stream
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.render().as_bytes())
    }

    /// Write the rendered tree to a file, replacing it
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        tracing::debug!("Wrote {} frames to {:?}", self.frames.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{TWO_JOINT, WITH_BRANCHES};

    #[test]
    fn test_render_two_joint_exact() {
        let tree = BvhTree::parse(TWO_JOINT).unwrap();
        let expected = "\
HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Spine
  {
    OFFSET 0 5 0
    CHANNELS 3 Xrotation Zrotation Yrotation
    End Site
    {
      OFFSET 0 1 0
    }
  }
}
MOTION
Frames: 2
Frame Time: 0.033333
0 1 2 3 4 5 6 7 8
10 11 12 13 14 15 16 17 18
";
        assert_eq!(tree.render(), expected);
    }

    #[test]
    fn test_render_closes_sibling_scopes() {
        let tree = BvhTree::parse(WITH_BRANCHES).unwrap();
        let hierarchy = tree.hierarchy_string();
        let lines: Vec<&str> = hierarchy.lines().collect();

        let opens = lines.iter().filter(|l| l.trim() == OPEN).count();
        let closes = lines.iter().filter(|l| l.trim() == CLOSE).count();
        assert_eq!(opens, closes);
        assert_eq!(lines.last(), Some(&CLOSE));

        // LeftLeg's subtree closes before RightLeg opens at the same depth
        let right = lines.iter().position(|l| *l == "  JOINT RightLeg").unwrap();
        assert_eq!(lines[right - 1], "  }");
        assert_eq!(lines[right - 2], "    }");
    }

    #[test]
    fn test_render_childless_joint_keeps_channels() {
        let text = "\
HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 1 Yrotation
  JOINT Tail
  {
    OFFSET 0 -1 0
    CHANNELS 1 Xrotation
  }
}
MOTION
Frames: 1
Frame Time: 0.5
1 2
";
        let tree = BvhTree::parse(text).unwrap();
        assert_eq!(tree.render(), text);
    }

    #[test]
    fn test_render_empty_tree() {
        let tree = BvhTree::parse("").unwrap();
        assert_eq!(tree.render(), "HIERARCHY\nMOTION\nFrames: 0\nFrame Time: 0\n");
    }

    #[test]
    fn test_display_matches_render() {
        let tree = BvhTree::parse(TWO_JOINT).unwrap();
        assert_eq!(tree.to_string(), tree.render());
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bvh");
        let tree = BvhTree::parse(TWO_JOINT).unwrap();

        tree.write_file(&path).unwrap();

        let reread = BvhTree::from_path(&path).unwrap();
        assert_eq!(reread.render(), tree.render());
    }
}
