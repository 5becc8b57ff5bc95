//! BVH parsing error types

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BvhError>;

/// Structural failures found while building a tree, plus file I/O
///
/// Lookups that find nothing and numbers that fail to parse are not
/// errors; they resolve to `None` or zero at the call site.
#[derive(Debug, Error)]
pub enum BvhError {
    /// `}` with no open scope
    #[error("Unexpected '}}' at line {line}: no open scope to close")]
    UnexpectedClose { line: usize },

    /// `{` before any node it could belong to
    #[error("Unexpected '{{' at line {line}: no preceding node to open")]
    OrphanOpen { line: usize },

    /// Input ended with scopes still open
    #[error("Unclosed scope: input ended at depth {depth}")]
    UnclosedScope { depth: usize },

    /// Hierarchy has content but no ROOT joint
    #[error("No ROOT joint found in hierarchy")]
    MissingRoot,

    /// More than one skeleton in a single hierarchy
    #[error("Hierarchy has {count} ROOT joints, expected exactly one")]
    MultipleRoots { count: usize },

    /// Joint or End Site without a required attribute line
    #[error("Joint '{joint}' is missing its {attribute} attribute")]
    MissingAttribute { joint: String, attribute: &'static str },

    /// CHANNELS payload that does not start with a usable count
    #[error("Joint '{joint}' has an invalid channel count: '{value}'")]
    InvalidChannelCount { joint: String, value: String },

    /// Reading or writing a BVH file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
