mod app;
mod commands;
mod output;
mod paths;
mod source;

use anyhow::Context;
use clap::Parser;
use dotmeta::scan::CancelToken;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cancel = CancelToken::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || {
        // First Ctrl+C drains the running scan, the second one exits right away
        if handler.is_cancelled() {
            eprintln!("\nCancelled.");
            std::process::exit(130);
        }
        eprintln!("\nCancelling, waiting for items in flight...");
        handler.cancel();
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // dotmeta info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("dotmeta", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Scan {
            paths,
            suffix,
            recursive,
            workers,
            capacity,
            no_mmap,
        } => commands::scan::run(
            &commands::scan::ScanOptions {
                paths,
                suffix,
                recursive: *recursive,
                workers: *workers,
                capacity: *capacity,
                mmap: !*no_mmap,
                global: &cli.global,
            },
            &cancel,
        ),
        Command::Tables { path, table, limit } => {
            commands::tables::run(path, table.as_deref(), *limit, &cli.global)
        }
        Command::Types {
            path,
            namespace,
            public_only,
        } => commands::types::run(path, namespace.as_deref(), *public_only, &cli.global),
    }
}
