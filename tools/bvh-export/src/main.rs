//! bvh-export - BVH motion capture inspection and CSV export tool
//!
//! Parses BVH files, prints their joint tree, re-serializes them in
//! normalized form, exports hierarchy/rotation/position CSVs and rebuilds
//! BVH files from those CSVs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bvh_tree::{BvhTree, NodeId};
use clap::{Parser, Subcommand};

use bvh_export::{ExportOptions, ImportPaths, convert, csv2bvh, manifest};

#[derive(Parser)]
#[command(name = "bvh-export")]
#[command(about = "BVH motion capture inspection and CSV export tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a BVH file
    Info {
        /// Input BVH file
        input: PathBuf,
    },

    /// Print the joint tree
    Joints {
        /// Input BVH file
        input: PathBuf,

        /// Include End Sites
        #[arg(long)]
        end_sites: bool,
    },

    /// Parse and re-serialize a BVH file
    Render {
        /// Input BVH file
        input: PathBuf,

        /// Output .bvh file (default: <stem>.normalized.bvh)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one BVH file to CSV
    Csv {
        /// Input BVH file
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Multiplier for offsets and positions
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,

        /// Skip <stem>_rot.csv
        #[arg(long)]
        no_rotations: bool,

        /// Skip <stem>_pos.csv
        #[arg(long)]
        no_positions: bool,

        /// Skip <stem>_hierarchy.csv
        #[arg(long)]
        no_hierarchy: bool,

        /// Include End Sites in positions
        #[arg(long)]
        end_sites: bool,
    },

    /// Rebuild a BVH file from hierarchy, position and rotation CSVs
    #[command(alias = "csv2bvh")]
    Import {
        /// Input <stem>_hierarchy.csv
        hierarchy: PathBuf,

        /// Positions CSV (default: <stem>_pos.csv next to the hierarchy)
        #[arg(long)]
        positions: Option<PathBuf>,

        /// Rotations CSV (default: <stem>_rot.csv next to the hierarchy)
        #[arg(long)]
        rotations: Option<PathBuf>,

        /// Output .bvh file (default: <stem>.bvh next to the hierarchy)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Multiplier for offsets and root positions
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,
    },

    /// Export every file listed in a manifest
    Build {
        /// Path to bvh-export.toml manifest
        #[arg(default_value = "bvh-export.toml")]
        manifest: PathBuf,
    },

    /// Validate manifest without converting
    Check {
        /// Path to bvh-export.toml manifest
        #[arg(default_value = "bvh-export.toml")]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // Logs go to stderr; stdout carries the `joints` listing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { input } => {
            let tree = load(&input)?;
            let joints = tree.joints(false).len();
            let end_sites = tree.joints(true).len() - joints;
            tracing::info!("{:?}", input);
            tracing::info!("  Joints:     {}", joints);
            tracing::info!("  End Sites:  {}", end_sites);
            tracing::info!("  Channels:   {}", tree.channel_count());
            tracing::info!("  Frames:     {}", tree.frame_count());
            tracing::info!("  Frame Time: {}", tree.frame_time());
        }

        Commands::Joints { input, end_sites } => {
            let tree = load(&input)?;
            for id in tree.joints(end_sites) {
                println!("{}", joint_line(&tree, id));
            }
        }

        Commands::Render { input, output } => {
            let output = output.unwrap_or_else(|| normalized_path(&input));
            tracing::info!("Rendering {:?} -> {:?}", input, output);
            convert::normalize_file(&input, &output)?;
            tracing::info!("Done!");
        }

        Commands::Csv {
            input,
            output,
            scale,
            no_rotations,
            no_positions,
            no_hierarchy,
            end_sites,
        } => {
            let options = ExportOptions {
                scale,
                rotations: !no_rotations,
                positions: !no_positions,
                hierarchy: !no_hierarchy,
                end_sites,
            };
            if !(options.rotations || options.positions || options.hierarchy) {
                anyhow::bail!("Nothing to export: all of rotations, positions and hierarchy are disabled");
            }
            let report = convert::convert_file(&input, output.as_deref(), &options)?;
            tracing::info!("Done! {} files written", report.outputs.len());
        }

        Commands::Import {
            hierarchy,
            positions,
            rotations,
            output,
            scale,
        } => {
            let paths = match (positions, rotations) {
                (Some(positions), Some(rotations)) => ImportPaths {
                    hierarchy,
                    positions,
                    rotations,
                },
                (positions, rotations) => {
                    let derived = ImportPaths::from_hierarchy(&hierarchy)?;
                    ImportPaths {
                        positions: positions.unwrap_or(derived.positions),
                        rotations: rotations.unwrap_or(derived.rotations),
                        hierarchy,
                    }
                }
            };
            tracing::info!("Importing {:?}", paths.hierarchy);
            let output = csv2bvh::import_file(&paths, output.as_deref(), scale)?;
            tracing::info!("Done! -> {:?}", output);
        }

        Commands::Build { manifest } => {
            tracing::info!("Building CSVs from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new(""));
            let reports = manifest::build_all(&config, base_dir)?;
            let files: usize = reports.iter().map(|r| r.outputs.len()).sum();
            tracing::info!("Build complete! {} inputs, {} files written", reports.len(), files);
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }
    }

    Ok(())
}

fn load(input: &Path) -> Result<BvhTree> {
    BvhTree::from_path(input).with_context(|| format!("Failed to load BVH: {:?}", input))
}

/// `<stem>.normalized.bvh` next to the input
fn normalized_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}.normalized.bvh", stem))
}

/// Indented `TAG name (n channels)` line for the joint tree listing
fn joint_line(tree: &BvhTree, id: NodeId) -> String {
    let node = tree.node(id);
    let indent = "  ".repeat(tree.depth(id));
    if node.is_end_site() {
        format!("{}End Site", indent)
    } else {
        format!(
            "{}{} {} ({} channels)",
            indent,
            node.tag(),
            node.name(),
            tree.node_channel_count(id)
        )
    }
}
