// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dotmeta
//!
//! A read-only structural decoder for .NET (ECMA-335) assembly metadata, in pure Rust.
//!
//! `dotmeta` validates the PE container, resolves the variable-width layout of the metadata
//! tables once, and then decodes rows and cross-table relationships on demand, straight from the
//! backing bytes. It never interprets IL and never writes.
//!
//! ## Features
//!
//! - **All 45 metadata tables** - typed rows, a closed [`metadata::tables::Row`] enum and an
//!   untyped column view, all generated from one declarative schema
//! - **Lazy heaps** - `#Strings`, `#Blob`, `#GUID` and `#US` values are resolved only when asked
//! - **Relationships** - owned fields, methods and parameters, base types and implemented
//!   interfaces, including the `*Ptr` indirection of uncompressed `#-` streams
//! - **Strict errors** - every structural violation is [`Error::Malformed`] with the location
//!   that detected it; there is no panic path on untrusted input
//! - **Bulk scanning** - [`scan`] loads many assemblies on a bounded worker pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotmeta::prelude::*;
//!
//! let assembly = dotmeta::load(std::fs::read("assembly.dll")?)?;
//!
//! for rid in 1..=assembly.row_count(TableId::TypeDef) {
//!     let row = assembly.row::<TypeDefRow>(rid)?;
//!     let typedef = TableIndex::new(TableId::TypeDef, rid);
//!
//!     println!(
//!         "{}.{} extends {:?}, implements {:?}",
//!         assembly.string(row.type_namespace)?,
//!         assembly.string(row.type_name)?,
//!         assembly.extends(typedef)?,
//!         assembly.implements(typedef)?
//!     );
//! }
//! # Ok::<(), dotmeta::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - PE container validation and the [`file::Backend`] byte source abstraction
//! - [`metadata`] - CLR header, metadata root, streams, tables and the [`Assembly`] itself
//! - [`scan`] - parallel loading and inspection of many assemblies
//! - [`prelude`] - the commonly used types in one import
//! - [`Error`] and [`Result`] - error handling
//!
//! Loading is two-phase. [`load`] resolves the layout (index widths, row widths, table offsets)
//! exactly once; afterwards every accessor is a read against the immutable [`Assembly`], which is
//! `Send + Sync` and can be shared freely between threads.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Implementation of the PE container access
pub mod file;
/// Implementation of the metadata decoding
pub mod metadata;
/// Commonly used types
pub mod prelude;
/// Implementation of bulk scanning
pub mod scan;

#[cfg(test)]
pub(crate) mod test;

/// `dotmeta` Result type
pub type Result<T> = std::result::Result<T, Error>;

/// `dotmeta` Error type
pub use error::Error;

/// Raw PE file access
pub use file::{parser::Parser, File};

/// A loaded assembly
pub use metadata::assembly::Assembly;

/// Metadata table identifiers
pub use metadata::tables::TableId;

/// Load an assembly from any byte source.
///
/// # Errors
/// - [`Error::NotSupported`] if the input is not a managed PE image
/// - [`Error::Malformed`] if the metadata is structurally invalid
///
/// # Examples
///
/// ```rust,no_run
/// let assembly = dotmeta::load(std::fs::read("assembly.dll")?)?;
/// println!("{} types", assembly.row_count(dotmeta::TableId::TypeDef));
/// # Ok::<(), dotmeta::Error>(())
/// ```
pub fn load(data: impl file::Backend + 'static) -> Result<Assembly> {
    Assembly::from_backend(Box::new(data))
}
