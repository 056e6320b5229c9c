//! # dotmeta Prelude
//!
//! The types most programs need, in one import:
//!
//! ```rust,no_run
//! use dotmeta::prelude::*;
//!
//! let assembly = dotmeta::load(std::fs::read("assembly.dll")?)?;
//! let module = assembly.row::<ModuleRow>(1)?;
//! println!("{}", assembly.string(module.name)?);
//! # Ok::<(), dotmeta::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotmeta operations
pub use crate::Error;

/// The result type used throughout dotmeta
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The loaded assembly and its entry point
pub use crate::{load, Assembly};

/// Low-level file parsing utilities
pub use crate::{
    file::{memory::Memory, Backend},
    File, Parser,
};

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Metadata root constants
pub use crate::metadata::root::CIL_HEADER_MAGIC;

/// Table identifiers, row references and coded indices
pub use crate::metadata::tables::{
    CodedIndex, CodedIndexType, TableId, TableIndex, TypeAttributes,
};

/// Heap references
pub use crate::metadata::tables::{BlobIndex, GuidIndex, StringIndex};

/// Typed rows
pub use crate::metadata::tables::{
    AssemblyRow, FieldRow, InterfaceImplRow, MethodDefRow, ModuleRow, ParamRow, Row,
    RowDefinition, TypeDefRow, TypeRefRow, TypeSpecRow,
};

// ================================================================================================
// Bulk Scanning
// ================================================================================================

/// Parallel loading and inspection
pub use crate::scan::{scan, CancelToken, ItemReport, Outcome, ScanConfig, ScanSummary};
