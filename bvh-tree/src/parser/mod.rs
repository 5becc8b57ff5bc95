//! BVH tree builder
//!
//! - `build` - Turns tokenized lines into the node arena and frame rows
//! - `validate` - Structural checks on a freshly built tree
//! - `tests` - Parser test suite

mod build;
mod validate;


pub(crate) use build::build_tree;
