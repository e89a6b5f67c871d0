use std::path::PathBuf;

use clap::{
    Args as ClapArgs,
    Parser,
    Subcommand,
};

/// Locate and remove disk hungry directories below a root path
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete every node_modules directory below the root
    NodeModules(CleanArgs),

    /// Delete the immediate subdirectories of the root
    Subdirs(CleanArgs),

    /// Delete directories whose name matches a glob
    Pattern {
        /// Directory name pattern to match (e.g. '*cache*')
        pattern: String,

        /// Also match plain files against the pattern
        #[arg(long)]
        files: bool,

        /// Limit how deep below the root matches are collected
        #[arg(long)]
        max_depth: Option<usize>,

        #[command(flatten)]
        clean: CleanArgs,
    },

    /// Delete empty directories below the root
    EmptyDirs(CleanArgs),

    /// Run a predefined cleaning preset
    Preset {
        /// Preset name (node-modules, build-artifacts, cache-dirs, temp-files)
        name: String,

        #[command(flatten)]
        clean: CleanArgs,
    },

    /// Rank the largest directories without deleting anything
    Analyze {
        /// Directory to analyze
        root: PathBuf,

        /// Directory depth for the breakdown
        #[arg(long, default_value_t = 3)]
        depth: usize,

        /// How many entries to report
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Auto-discover cleanup opportunities
    Discover {
        /// Directory to scan
        root: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
pub struct CleanArgs {
    /// Directory to process
    pub root: PathBuf,

    /// Show what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,

    /// Patterns to exclude (e.g. '*important*'); excluded subtrees are never
    /// entered
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Only process directories older than N days
    #[arg(long, value_name = "DAYS")]
    pub older_than: Option<u64>,

    /// Only process directories larger than SIZE (e.g. '10MB')
    #[arg(long, value_name = "SIZE")]
    pub min_size: Option<String>,

    /// Move to the system trash instead of deleting permanently
    #[arg(long)]
    pub trash: bool,

    /// Prompt before each deletion
    #[arg(short, long)]
    pub interactive: bool,

    /// Process unrelated candidates concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Give up on a single deletion after N seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}
