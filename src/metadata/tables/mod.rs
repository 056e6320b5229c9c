//! Metadata tables (ECMA-335 II.22 and II.24.2.6).
//!
//! Decoding is split in two phases:
//!
//! 1. **Layout** - [`TableInfo`] resolves every index, heap and row width from the tables stream
//!    header, and [`TableDirectory`] places each table in the file.
//! 2. **Rows** - [`RowReader`] decodes a row column by column following the table's static
//!    [`Column`] schema, either into the closed [`Row`] enum or into a statically selected row
//!    type implementing [`RowDefinition`].
//!
//! Rows are addressed by [`TableIndex`], a 1-based `(table, row)` pair.

use std::fmt;

use crate::metadata::token::Token;

mod codedindex;
mod directory;
mod flags;
mod reader;
mod rows;
mod schema;
mod tableid;
mod tableinfo;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use directory::{TableDirectory, TableEntry};
pub use flags::TypeAttributes;
pub use reader::{BlobIndex, ColumnValue, FromColumn, GuidIndex, RowReader, StringIndex};
pub use rows::*;
pub use schema::{row_width, Column, ColumnKind, HeapKind};
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TableRowInfo};

/// A 1-based reference to a row of a specific table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableIndex {
    /// The table
    pub table: TableId,
    /// The 1-based row, 0 only as a null reference
    pub row: u32,
}

impl TableIndex {
    /// Reference `row` of `table`.
    #[must_use]
    pub fn new(table: TableId, row: u32) -> TableIndex {
        TableIndex { table, row }
    }

    /// The metadata token of this row.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::new(self.table.token_prefix() | (self.row & 0x00FF_FFFF))
    }
}

impl From<CodedIndex> for TableIndex {
    fn from(index: CodedIndex) -> Self {
        TableIndex::new(index.tag, index.row)
    }
}

impl fmt::Debug for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.table, self.row)
    }
}

impl fmt::Display for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.table, self.row)
    }
}
