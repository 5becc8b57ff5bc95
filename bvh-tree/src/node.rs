//! Arena-backed hierarchy nodes

use crate::{END, JOINT, ROOT};

/// Handle to a node inside a [`crate::BvhTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The synthetic root that owns every top-level line
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index of this node
    pub fn index(self) -> usize {
        self.0
    }
}

/// One hierarchy line, or the synthetic root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Line fields; `fields[0]` is the type tag, `fields[1]` the name
    pub fields: Vec<String>,
    /// Child nodes in document order
    pub children: Vec<NodeId>,
    /// Enclosing node; `None` only for the synthetic root
    pub parent: Option<NodeId>,
    /// 1-based source line (0 for the synthetic root)
    pub line: usize,
}

impl Node {
    pub(crate) fn new(fields: Vec<String>, parent: NodeId, line: usize) -> Self {
        Self {
            fields,
            children: Vec::new(),
            parent: Some(parent),
            line,
        }
    }

    /// Type tag (`ROOT`, `JOINT`, `End`, `OFFSET`, ...)
    pub fn tag(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    /// Second field: the joint name, or `Site` for End Sites
    pub fn name(&self) -> &str {
        self.fields.get(1).map(String::as_str).unwrap_or("")
    }

    /// True for `ROOT` and `JOINT` nodes
    pub fn is_joint(&self) -> bool {
        matches!(self.tag(), ROOT | JOINT)
    }

    /// True for `End Site` nodes
    pub fn is_end_site(&self) -> bool {
        self.tag() == END
    }

    /// True when the first `prefix.len()` fields equal `prefix`
    ///
    /// Nodes with fewer fields than the prefix never match.
    pub fn matches_prefix(&self, prefix: &[&str]) -> bool {
        self.fields.len() >= prefix.len()
            && self.fields.iter().zip(prefix).all(|(field, want)| field == want)
    }

    /// Fields joined back into a single line
    pub fn line_text(&self) -> String {
        self.fields.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(fields: &[&str]) -> Node {
        Node::new(fields.iter().map(|s| s.to_string()).collect(), NodeId::ROOT, 1)
    }

    #[test]
    fn test_tag_and_name() {
        let joint = node(&["JOINT", "Spine"]);
        assert_eq!(joint.tag(), "JOINT");
        assert_eq!(joint.name(), "Spine");
        assert!(joint.is_joint());
        assert!(!joint.is_end_site());

        let end = node(&["End", "Site"]);
        assert!(end.is_end_site());
        assert_eq!(end.name(), "Site");

        let empty = Node::default();
        assert_eq!(empty.tag(), "");
        assert_eq!(empty.name(), "");
    }

    #[test]
    fn test_matches_prefix() {
        let header = node(&["Frame", "Time:", "0.1"]);
        assert!(header.matches_prefix(&[]));
        assert!(header.matches_prefix(&["Frame"]));
        assert!(header.matches_prefix(&["Frame", "Time:"]));
        assert!(!header.matches_prefix(&["Frame", "Time"]));
        assert!(!header.matches_prefix(&["Frame", "Time:", "0.1", "extra"]));
    }

    #[test]
    fn test_line_text() {
        assert_eq!(node(&["OFFSET", "0", "1", "0"]).line_text(), "OFFSET 0 1 0");
    }
}
