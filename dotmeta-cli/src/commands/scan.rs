use std::path::PathBuf;

use anyhow::bail;
use dotmeta::scan::{scan, CancelToken, Outcome, ScanConfig};
use serde::Serialize;

use crate::{app::GlobalOptions, output::print_output, paths, source};

pub struct ScanOptions<'a> {
    pub paths: &'a [PathBuf],
    pub suffix: &'a str,
    pub recursive: bool,
    pub workers: Option<usize>,
    pub capacity: Option<usize>,
    pub mmap: bool,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
struct ItemEntry {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    types: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ScanOutput {
    items: Vec<ItemEntry>,
    inspected: usize,
    failed: usize,
    skipped: usize,
    cancelled: bool,
}

pub fn run(opts: &ScanOptions<'_>, cancel: &CancelToken) -> anyhow::Result<()> {
    let roots = if opts.paths.is_empty() {
        let defaults = paths::default_paths();
        if defaults.is_empty() {
            bail!("no paths given, and neither Mono nor a Windows .NET Framework was found");
        }
        for root in &defaults {
            log::info!("scanning default path {}", root.display());
        }
        defaults
    } else {
        opts.paths.to_vec()
    };

    let files = paths::collect(&roots, opts.suffix, opts.recursive)?;

    let mut config = ScanConfig::default();
    if let Some(workers) = opts.workers {
        config = config.workers(workers);
    }
    if let Some(capacity) = opts.capacity {
        config = config.capacity(capacity);
    }

    let mmap = opts.mmap;
    let items = files.into_iter().map(move |path| {
        let source = source::open(&path, mmap);
        (path.display().to_string(), source)
    });

    let json = opts.global.json;
    let mut entries = Vec::new();
    let summary = scan(&config, items, cancel, |report| {
        let entry = match report.outcome {
            Outcome::Skipped => ItemEntry {
                path: report.label,
                status: "skipped",
                types: None,
                errors: Vec::new(),
            },
            Outcome::Failed(error) => ItemEntry {
                path: report.label,
                status: "failed",
                types: None,
                errors: vec![error.to_string()],
            },
            Outcome::Inspected(inspection) => ItemEntry {
                path: report.label,
                status: if inspection.is_clean() { "ok" } else { "failed" },
                types: Some(inspection.types),
                errors: inspection.failures.iter().map(ToString::to_string).collect(),
            },
        };

        // Stream human-readable lines as results arrive, JSON is printed at the end
        if !json {
            print_entry(&entry);
        }
        entries.push(entry);
    })?;

    let output = ScanOutput {
        items: entries,
        inspected: summary.inspected,
        failed: summary.failed,
        skipped: summary.skipped,
        cancelled: summary.cancelled,
    };

    print_output(&output, opts.global, |out| {
        println!(
            "\n{} inspected, {} failed, {} skipped{}",
            out.inspected,
            out.failed,
            out.skipped,
            if out.cancelled { " (cancelled)" } else { "" }
        );
    })?;

    if summary.failed > 0 {
        bail!("{} of {} assemblies failed", summary.failed, summary.total());
    }

    Ok(())
}

fn print_entry(entry: &ItemEntry) {
    match entry.types {
        Some(types) => println!("{:<7} {} ({} types)", entry.status, entry.path, types),
        None => println!("{:<7} {}", entry.status, entry.path),
    }
    for error in &entry.errors {
        println!("          {error}");
    }
}
