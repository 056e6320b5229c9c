//! Bulk loading and inspection of many assemblies.
//!
//! [`scan`] takes an iterator of labelled byte sources, loads each one on a dedicated `rayon`
//! pool and runs [`inspect`] over it. Admission is bounded: once [`ScanConfig::capacity`] items
//! are in flight the producer blocks on completed results before pulling the next source, so
//! memory stays proportional to the capacity rather than to the input.
//!
//! Each item yields exactly one [`ItemReport`]:
//!
//! - [`Outcome::Skipped`] - not a managed assembly ([`Error::NotSupported`])
//! - [`Outcome::Failed`] - the source could not be read or the metadata is malformed
//! - [`Outcome::Inspected`] - loaded; every failed check is listed
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmeta::{file::Backend, scan::{scan, CancelToken, ScanConfig}};
//!
//! let sources = ["a.dll", "b.dll"].into_iter().map(|path| {
//!     let source = std::fs::read(path)
//!         .map(|data| Box::new(data) as Box<dyn Backend>)
//!         .map_err(dotmeta::Error::from);
//!     (path.to_string(), source)
//! });
//!
//! let config = ScanConfig::default().workers(4).capacity(16);
//! let summary = scan(&config, sources, &CancelToken::new(), |report| {
//!     println!("{}: {}", report.label, report.outcome);
//! })?;
//! println!("{} inspected", summary.inspected);
//! # Ok::<(), dotmeta::Error>(())
//! ```

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
};

use log::{debug, error, warn};
use rayon::ThreadPoolBuilder;

use crate::{
    file::Backend,
    metadata::{
        assembly::Assembly,
        tables::{AssemblyRow, ModuleRow, TableId, TableIndex, TypeAttributes, TypeDefRow},
    },
    Error, Result,
};

/// Default number of items in flight.
pub const DEFAULT_CAPACITY: usize = 64;

/// Worker and admission limits for [`scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    workers: usize,
    capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            workers: thread::available_parallelism().map_or(1, usize::from),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ScanConfig {
    /// Number of pool threads.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Maximum number of items admitted but not yet reported.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// The configured number of pool threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// The configured admission capacity.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.capacity
    }

    /// Check the limits.
    ///
    /// # Errors
    /// Returns [`Error::Error`] if either limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Error("scan workers must be at least 1".to_string()));
        }

        if self.capacity == 0 {
            return Err(Error::Error("scan capacity must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Stops [`scan`] from admitting further items. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Items already admitted still complete and are reported.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once [`CancelToken::cancel`] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// The result of inspecting one loaded assembly.
#[derive(Debug, Default)]
pub struct Inspection {
    /// Number of `TypeDef` rows walked
    pub types: u32,
    /// Every check that failed, in the order encountered
    pub failures: Vec<Error>,
}

impl Inspection {
    /// Returns true if every check passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.failures.push(error);
                None
            }
        }
    }
}

/// What happened to one scanned item.
#[derive(Debug)]
pub enum Outcome {
    /// Not a managed assembly
    Skipped,
    /// The source failed or the metadata could not be loaded
    Failed(Error),
    /// Loaded and inspected
    Inspected(Inspection),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Failed(error) => write!(f, "failed: {}", error),
            Outcome::Inspected(inspection) if inspection.is_clean() => {
                write!(f, "ok ({} types)", inspection.types)
            }
            Outcome::Inspected(inspection) => {
                write!(
                    f,
                    "{} failures ({} types)",
                    inspection.failures.len(),
                    inspection.types
                )?;
                for failure in &inspection.failures {
                    write!(f, "\n  {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

/// The report for one scanned item.
#[derive(Debug)]
pub struct ItemReport {
    /// The label the source was submitted with
    pub label: String,
    /// What happened
    pub outcome: Outcome,
}

/// Totals over a whole scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Items loaded and inspected without failures
    pub inspected: usize,
    /// Items loaded but with failed checks, or not loadable at all
    pub failed: usize,
    /// Items that are not managed assemblies
    pub skipped: usize,
    /// True if the scan stopped admitting items because of a [`CancelToken`]
    pub cancelled: bool,
}

impl ScanSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Inspected(inspection) if inspection.is_clean() => self.inspected += 1,
            Outcome::Inspected(_) | Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// Total number of reported items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inspected + self.failed + self.skipped
    }
}

/// Load and inspect every item, reporting each one through `on_report` on the calling thread.
///
/// Reports arrive in completion order, not submission order.
///
/// # Errors
/// Returns [`Error::Error`] if `config` is invalid or the worker pool cannot be created.
/// Per-item failures never abort the scan; a panic while inspecting an item is reported as
/// [`Outcome::Failed`] for that item.
pub fn scan<I, F>(
    config: &ScanConfig,
    items: I,
    cancel: &CancelToken,
    on_report: F,
) -> Result<ScanSummary>
where
    I: IntoIterator<Item = (String, Result<Box<dyn Backend>>)>,
    F: FnMut(ItemReport),
{
    scan_with(config, items, cancel, on_report, evaluate)
}

type Evaluator = fn(&str, Result<Box<dyn Backend>>) -> Outcome;

fn scan_with<I, F>(
    config: &ScanConfig,
    items: I,
    cancel: &CancelToken,
    mut on_report: F,
    evaluator: Evaluator,
) -> Result<ScanSummary>
where
    I: IntoIterator<Item = (String, Result<Box<dyn Backend>>)>,
    F: FnMut(ItemReport),
{
    config.validate()?;

    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|index| format!("dotmeta-scan-{}", index))
        .build()
        .map_err(|error| Error::Error(format!("failed to start scan workers - {}", error)))?;

    let (sender, receiver) = mpsc::channel::<ItemReport>();
    let mut summary = ScanSummary::default();
    let mut in_flight = 0_usize;

    let mut collect = |summary: &mut ScanSummary| -> Result<()> {
        let report = receiver
            .recv()
            .map_err(|_| Error::Error("scan workers disconnected".to_string()))?;
        summary.record(&report.outcome);
        on_report(report);
        Ok(())
    };

    for (label, source) in items {
        if cancel.is_cancelled() {
            debug!("scan cancelled with {} items in flight", in_flight);
            summary.cancelled = true;
            break;
        }

        while in_flight >= config.capacity {
            collect(&mut summary)?;
            in_flight -= 1;
        }

        // `on_report` may have cancelled while draining
        if cancel.is_cancelled() {
            debug!("scan cancelled with {} items in flight", in_flight);
            summary.cancelled = true;
            break;
        }

        let sender = sender.clone();
        pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| evaluator(&label, source)))
                .unwrap_or_else(|_| {
                    error!("{}: panicked during inspection", label);
                    Outcome::Failed(Error::Error(format!("{} - panicked during inspection", label)))
                });
            // The receiver outlives every admitted item
            let _ = sender.send(ItemReport { label, outcome });
        });
        in_flight += 1;
    }

    drop(sender);
    while in_flight > 0 {
        collect(&mut summary)?;
        in_flight -= 1;
    }

    debug!(
        "scan finished: {} inspected, {} failed, {} skipped",
        summary.inspected, summary.failed, summary.skipped
    );

    Ok(summary)
}

fn evaluate(label: &str, source: Result<Box<dyn Backend>>) -> Outcome {
    let assembly = match source.and_then(Assembly::from_backend) {
        Ok(assembly) => assembly,
        Err(Error::NotSupported) => {
            debug!("{}: not a managed assembly", label);
            return Outcome::Skipped;
        }
        Err(error) => {
            warn!("{}: {}", label, error);
            return Outcome::Failed(error);
        }
    };

    let inspection = inspect(&assembly);
    if !inspection.is_clean() {
        warn!("{}: {} failed checks", label, inspection.failures.len());
    }

    Outcome::Inspected(inspection)
}

/// Walk every type of `assembly` and check its identity rows.
///
/// For each `TypeDef`: fields, methods, the base type (unless it is an interface) and the
/// implemented interfaces. Then the `Module` row and, when the table is present, the
/// `Assembly` row, whose name must prefix the module name. `mscorlib` and the
/// `CommonLanguageRuntimeLibrary` module are exempt from the name check.
///
/// Failures are collected, never short-circuited.
#[must_use]
pub fn inspect(assembly: &Assembly) -> Inspection {
    let mut inspection = Inspection {
        types: assembly.row_count(TableId::TypeDef),
        failures: Vec::new(),
    };

    for rid in 1..=inspection.types {
        let typedef = TableIndex::new(TableId::TypeDef, rid);
        inspection.record(assembly.fields(typedef));
        inspection.record(assembly.methods(typedef));

        let Some(row) = inspection.record(assembly.row::<TypeDefRow>(rid)) else {
            continue;
        };

        if !TypeAttributes::from_flags(row.flags).is_interface() {
            inspection.record(assembly.extends(typedef));
        }

        inspection.record(assembly.implements(typedef));
    }

    let module_name = inspection
        .record(assembly.row::<ModuleRow>(1))
        .and_then(|module| inspection.record(assembly.string(module.name)));

    if assembly.row_count(TableId::Assembly) == 0 {
        return inspection;
    }

    let assembly_name = inspection
        .record(assembly.row::<AssemblyRow>(1))
        .and_then(|row| inspection.record(assembly.string(row.name)));

    if let (Some(module_name), Some(assembly_name)) = (module_name, assembly_name) {
        if !module_name.starts_with(assembly_name)
            && assembly_name != "mscorlib"
            && module_name != "CommonLanguageRuntimeLibrary"
        {
            inspection.failures.push(malformed_error!(
                "Module name {} does not start with assembly name {}",
                module_name,
                assembly_name
            ));
        }
    }

    inspection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::builder::{ImageBuilder, TypeTarget};

    fn item(label: &str, data: Vec<u8>) -> (String, Result<Box<dyn Backend>>) {
        (label.to_string(), Ok(Box::new(data)))
    }

    #[test]
    fn config() {
        let config = ScanConfig::default();
        assert!(config.worker_count() >= 1);
        assert_eq!(config.max_in_flight(), DEFAULT_CAPACITY);
        assert!(config.validate().is_ok());

        assert!(matches!(
            ScanConfig::default().workers(0).validate(),
            Err(Error::Error(_))
        ));
        assert!(matches!(
            ScanConfig::default().capacity(0).validate(),
            Err(Error::Error(_))
        ));
    }

    #[test]
    fn inspect_clean() {
        let mut builder = ImageBuilder::new();
        let object = builder.type_def(0x0010_2001, "System", "Object", None);
        let iface = builder.type_def(0x0000_00A1, "Sample", "IFoo", None);
        let derived = builder.type_def(
            0x0010_0001,
            "Sample",
            "Derived",
            Some(TypeTarget::TypeDef(object)),
        );
        builder.interface_impl(derived, TypeTarget::TypeDef(iface));

        let assembly = Assembly::from_mem(builder.build()).unwrap();
        let inspection = inspect(&assembly);
        assert!(inspection.is_clean(), "{:?}", inspection.failures);
        assert_eq!(inspection.types, 4);
    }

    #[test]
    fn inspect_names() {
        let mut builder = ImageBuilder::new();
        builder.assembly_name("other").module_name("sample.dll");
        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert_eq!(inspect(&assembly).failures.len(), 1);

        let mut builder = ImageBuilder::new();
        builder.assembly_name("mscorlib").module_name("System.Private.CoreLib.dll");
        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(inspect(&assembly).is_clean());

        let mut builder = ImageBuilder::new();
        builder
            .assembly_name("System.Runtime")
            .module_name("CommonLanguageRuntimeLibrary");
        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(inspect(&assembly).is_clean());

        let mut builder = ImageBuilder::new();
        builder.without_assembly().module_name("sample.netmodule");
        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(inspect(&assembly).is_clean());
    }

    #[test]
    fn inspect_aggregates() {
        let mut builder = ImageBuilder::new();
        builder.type_def(0x0010_0001, "", "A", Some(TypeTarget::TypeRef(3)));
        builder.type_def(0x0010_0001, "", "B", Some(TypeTarget::TypeRef(4)));
        builder.assembly_name("other");

        let assembly = Assembly::from_mem(builder.build()).unwrap();
        let inspection = inspect(&assembly);
        assert_eq!(inspection.failures.len(), 3);
        assert!(inspection.failures.iter().all(Error::is_malformed));
    }

    #[test]
    fn scan_mixed() {
        let mut malformed = ImageBuilder::new();
        malformed.override_stream_size("#~", 0x10_0000);

        let items = vec![
            item("managed", ImageBuilder::new().build()),
            item("native", ImageBuilder::new().without_clr_header().build()),
            item("garbage", vec![0xCC; 512]),
            item("malformed", malformed.build()),
            (
                "unreadable".to_string(),
                Err(Error::FileError(std::io::Error::from(
                    std::io::ErrorKind::NotFound,
                ))),
            ),
        ];

        let config = ScanConfig::default().workers(2).capacity(1);
        let mut labels = Vec::new();
        let summary = scan(&config, items, &CancelToken::new(), |report| {
            labels.push(report.label);
        })
        .unwrap();

        assert_eq!(
            summary,
            ScanSummary {
                inspected: 1,
                failed: 2,
                skipped: 2,
                cancelled: false,
            }
        );

        labels.sort();
        assert_eq!(
            labels,
            vec!["garbage", "malformed", "managed", "native", "unreadable"]
        );
    }

    #[test]
    fn scan_cancelled() {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let items = (0..10).map(|index| item(&index.to_string(), ImageBuilder::new().build()));

        let mut reported = 0;
        let summary = scan(
            &ScanConfig::default().workers(1).capacity(1),
            items,
            &cancel,
            |_| {
                reported += 1;
                token.cancel();
            },
        )
        .unwrap();

        assert!(summary.cancelled);
        assert!(cancel.is_cancelled());
        assert_eq!(summary.total(), reported);
        // The first report cancels while the producer is draining, so nothing else is admitted
        assert_eq!(reported, 1);
    }

    #[test]
    fn scan_panicking_item() {
        fn evaluator(label: &str, source: Result<Box<dyn Backend>>) -> Outcome {
            if label == "bad" {
                panic!("decoder bug");
            }
            evaluate(label, source)
        }

        let items = vec![
            item("good", ImageBuilder::new().build()),
            item("bad", ImageBuilder::new().build()),
            item("also-good", ImageBuilder::new().build()),
        ];

        let mut failed = Vec::new();
        let summary = scan_with(
            &ScanConfig::default().workers(2).capacity(2),
            items,
            &CancelToken::new(),
            |report| {
                if let Outcome::Failed(error) = report.outcome {
                    failed.push((report.label, error));
                }
            },
            evaluator,
        )
        .unwrap();

        assert_eq!(summary.inspected, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "bad");
        assert!(matches!(&failed[0].1, Error::Error(message) if message.contains("panicked")));
    }
}
