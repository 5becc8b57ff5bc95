//! bvh-export library
//!
//! BVH motion capture to CSV conversion: joint hierarchy, rotation
//! channels and solved world positions. Used by the `bvh-export` binary
//! for single files and `bvh-export.toml` batches. The reverse direction,
//! rebuilding a BVH file from those CSVs, lives in [`csv2bvh`].

pub mod convert;
pub mod csv;
pub mod csv2bvh;
pub mod manifest;
pub mod positions;

pub use convert::{ExportOptions, ExportReport, convert_file, normalize_file};
pub use csv2bvh::{CsvTable, ImportPaths, import_file};
pub use manifest::{ExportManifest, build_all, load_manifest};
pub use positions::{WorldPositions, world_positions};
