use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dotmeta - structural decoder for .NET assembly metadata
#[derive(Debug, Parser)]
#[command(name = "dotmeta", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and inspect every assembly in the given files and directories.
    ///
    /// Without paths, the Mono installation and the Windows .NET Framework directories are
    /// scanned.
    Scan {
        /// Files or directories to scan.
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Only pick up directory entries ending with this suffix.
        #[arg(long, default_value = ".dll")]
        suffix: String,

        /// Descend into subdirectories.
        #[arg(short, long)]
        recursive: bool,

        /// Number of worker threads (default: available parallelism).
        #[arg(long)]
        workers: Option<usize>,

        /// Maximum number of assemblies in flight (default: 64).
        #[arg(long)]
        capacity: Option<usize>,

        /// Read files into memory instead of mapping them.
        #[arg(long)]
        no_mmap: bool,
    },

    /// List metadata tables and row counts, or dump the rows of one table.
    Tables {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Dump a specific table (e.g., TypeDef, MethodDef).
        #[arg(short, long)]
        table: Option<String>,

        /// Maximum number of rows to dump.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List type definitions with their base type and members.
    Types {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Filter by namespace.
        #[arg(long)]
        namespace: Option<String>,

        /// Show only public types.
        #[arg(long)]
        public_only: bool,
    },
}
