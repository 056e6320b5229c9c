//! Layout resolution for the tables stream.
//!
//! [`TableInfo`] turns the raw row counts and heap flags of a
//! [`crate::metadata::streams::TablesHeader`] into every width needed to decode a row:
//!
//! - simple table index: 4 bytes if the target table has more than 65535 rows, else 2
//! - heap offset: 4 bytes if the heap's `heap_sizes` bit is set, else 2
//! - coded index: 4 bytes if the largest target table has `2^(16 - tag_bits)` rows or more
//! - row width: the sum of the column widths of the table's schema
//!
//! All of it is computed once, up front. Nothing is revisited after load.

use std::fmt;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::{
    streams::TablesHeader,
    tables::{row_width, CodedIndexType, HeapKind, TableId},
};

/// Row count of one table, with its index width.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Whether indices into this table are 4 bytes wide
    pub is_large: bool,
}

impl TableRowInfo {
    /// Row info for a table with `rows` rows.
    #[must_use]
    pub fn new(rows: u32) -> Self {
        Self {
            rows,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// The resolved layout of a tables stream.
#[derive(Clone, PartialEq, Eq)]
pub struct TableInfo {
    rows: [TableRowInfo; TableId::COUNT],
    large_coded: [bool; CodedIndexType::COUNT],
    row_widths: [usize; TableId::COUNT],
    heap_sizes: u8,
}

impl TableInfo {
    /// Resolve the layout for the given row counts and `heap_sizes` flags.
    #[must_use]
    pub fn new(rows: &[u32; TableId::COUNT], heap_sizes: u8) -> TableInfo {
        let mut info = TableInfo {
            rows: [TableRowInfo::default(); TableId::COUNT],
            large_coded: [false; CodedIndexType::COUNT],
            row_widths: [0; TableId::COUNT],
            heap_sizes,
        };

        for table in TableId::iter() {
            info.rows[table as usize] = TableRowInfo::new(rows[table as usize]);
        }

        for kind in CodedIndexType::iter() {
            let max_rows = kind
                .targets()
                .map(|table| info.rows(table))
                .max()
                .unwrap_or(0);

            info.large_coded[kind as usize] = max_rows >= 1 << (16 - kind.tag_bits());
        }

        for table in TableId::iter() {
            info.row_widths[table as usize] = row_width(table.columns(), &info);
        }

        info
    }

    /// Resolve the layout described by a parsed tables stream header.
    #[must_use]
    pub fn from_header(header: &TablesHeader) -> TableInfo {
        TableInfo::new(&header.rows, header.heap_sizes)
    }

    /// Row count and index width of `table`.
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Number of rows in `table`, 0 if absent.
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Whether indices into `table` are 4 bytes wide.
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table as usize].is_large
    }

    /// Whether offsets into `heap` are 4 bytes wide.
    #[must_use]
    pub fn is_large_heap(&self, heap: HeapKind) -> bool {
        self.heap_sizes & heap.size_flag() != 0
    }

    /// Whether coded indices of `kind` are 4 bytes wide.
    #[must_use]
    pub fn is_large_coded(&self, kind: CodedIndexType) -> bool {
        self.large_coded[kind as usize]
    }

    /// Width of a simple index into `table`.
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> usize {
        if self.is_large(table) {
            4
        } else {
            2
        }
    }

    /// Width of an offset into `heap`.
    #[must_use]
    pub fn heap_index_bytes(&self, heap: HeapKind) -> usize {
        if self.is_large_heap(heap) {
            4
        } else {
            2
        }
    }

    /// Width of a coded index of `kind`.
    #[must_use]
    pub fn coded_index_bytes(&self, kind: CodedIndexType) -> usize {
        if self.is_large_coded(kind) {
            4
        } else {
            2
        }
    }

    /// Width of one row of `table`.
    #[must_use]
    pub fn row_width(&self, table: TableId) -> usize {
        self.row_widths[table as usize]
    }

    /// The raw `heap_sizes` flags.
    #[must_use]
    pub fn heap_sizes(&self) -> u8 {
        self.heap_sizes
    }
}

impl fmt::Debug for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<(TableId, u32)> = TableId::iter()
            .filter(|table| self.rows(*table) > 0)
            .map(|table| (table, self.rows(table)))
            .collect();

        f.debug_struct("TableInfo")
            .field("heap_sizes", &self.heap_sizes)
            .field("rows", &present)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(tables: &[(TableId, u32)]) -> [u32; TableId::COUNT] {
        let mut rows = [0_u32; TableId::COUNT];
        for (table, count) in tables {
            rows[*table as usize] = *count;
        }
        rows
    }

    #[test]
    fn heap_widths() {
        let info = TableInfo::new(&rows(&[]), 0);
        assert_eq!(info.heap_index_bytes(HeapKind::Strings), 2);
        assert_eq!(info.heap_index_bytes(HeapKind::Guid), 2);
        assert_eq!(info.heap_index_bytes(HeapKind::Blob), 2);

        let info = TableInfo::new(&rows(&[]), 0x05);
        assert_eq!(info.heap_index_bytes(HeapKind::Strings), 4);
        assert_eq!(info.heap_index_bytes(HeapKind::Guid), 2);
        assert_eq!(info.heap_index_bytes(HeapKind::Blob), 4);

        let info = TableInfo::new(&rows(&[]), 0x02 | 0x40);
        assert_eq!(info.heap_index_bytes(HeapKind::Strings), 2);
        assert_eq!(info.heap_index_bytes(HeapKind::Guid), 4);
        assert_eq!(info.heap_index_bytes(HeapKind::Blob), 2);
    }

    #[test]
    fn table_index_widths() {
        let info = TableInfo::new(
            &rows(&[(TableId::Field, 0xFFFF), (TableId::MethodDef, 0x1_0000)]),
            0,
        );

        assert_eq!(info.table_index_bytes(TableId::Field), 2);
        assert_eq!(info.table_index_bytes(TableId::MethodDef), 4);
        assert_eq!(info.table_index_bytes(TableId::Param), 2);
        assert_eq!(info.rows(TableId::MethodDef), 0x1_0000);
        assert_eq!(info.rows(TableId::Param), 0);
    }

    #[test]
    fn coded_index_widths() {
        // TypeDefOrRef: 2 tag bits, threshold 2^14
        let info = TableInfo::new(&rows(&[(TableId::TypeRef, 0x3FFF)]), 0);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 2);

        let info = TableInfo::new(&rows(&[(TableId::TypeSpec, 0x4000)]), 0);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 4);
        // ResolutionScope has no TypeSpec target
        assert_eq!(info.coded_index_bytes(CodedIndexType::ResolutionScope), 2);

        // HasCustomAttribute: 5 tag bits, threshold 2^11
        let info = TableInfo::new(&rows(&[(TableId::Param, 0x7FF)]), 0);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 2);
        let info = TableInfo::new(&rows(&[(TableId::Param, 0x800)]), 0);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasCustomAttribute), 4);
        assert_eq!(info.coded_index_bytes(CodedIndexType::HasFieldMarshal), 2);
    }

    #[test]
    fn row_widths() {
        let info = TableInfo::new(&rows(&[(TableId::TypeDef, 3), (TableId::InterfaceImpl, 1)]), 0);

        // class(2) + interface(2)
        assert_eq!(info.row_width(TableId::InterfaceImpl), 4);
        // rva(4) + impl_flags(2) + flags(2) + name(2) + signature(2) + param_list(2)
        assert_eq!(info.row_width(TableId::MethodDef), 14);
        // type(1) + padding(1) + parent(2) + value(2)
        assert_eq!(info.row_width(TableId::Constant), 6);

        let info = TableInfo::new(&rows(&[(TableId::TypeDef, 0x1_0000)]), 0x07);
        // class(4) + interface(4)
        assert_eq!(info.row_width(TableId::InterfaceImpl), 8);
        // hash_alg(4) + 4 * version(2) + flags(4) + public_key(4) + name(4) + culture(4)
        assert_eq!(info.row_width(TableId::Assembly), 28);
    }
}
