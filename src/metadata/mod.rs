//! Metadata decoding for .NET assemblies (ECMA-335 partition II).
//!
//! # Key Components
//!
//! - [`assembly`] - [`Assembly`](assembly::Assembly), the load result exposing every read
//!   operation
//! - [`cor20header`] - the CLR runtime header locating the metadata
//! - [`root`] - the metadata root and its stream headers
//! - [`streams`] - the tables stream header and the four heaps
//! - [`tables`] - layout resolution, table directory, column schemas and typed rows
//! - [`resolver`] - owned ranges, base types and implemented interfaces
//! - [`validation`] - a full pass over every row and reference
//! - [`token`] - 32-bit metadata tokens
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmeta::{metadata::tables::TableIndex, TableId};
//!
//! let assembly = dotmeta::load(std::fs::read("assembly.dll")?)?;
//! for rid in 1..=assembly.row_count(TableId::TypeDef) {
//!     let typedef = TableIndex::new(TableId::TypeDef, rid);
//!     println!(
//!         "{}: {} fields, {} methods, base {:?}",
//!         typedef,
//!         assembly.fields(typedef)?.len(),
//!         assembly.methods(typedef)?.len(),
//!         assembly.extends(typedef)?
//!     );
//! }
//! # Ok::<(), dotmeta::Error>(())
//! ```

/// Implementation of the loaded assembly
pub mod assembly;
/// Implementation of the Header of CIL
pub mod cor20header;
/// Implementation of cross-table navigation
pub mod resolver;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of the streams and heaps
pub mod streams;
/// Implementation of the metadata tables
pub mod tables;
/// Implementation of metadata tokens
pub mod token;
/// Implementation of whole-assembly row validation
pub mod validation;
