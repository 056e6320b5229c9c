//! Declarative column schemas.
//!
//! Every table is described by a static list of [`Column`]s (generated in
//! [`crate::metadata::tables::rows`]). A column's [`ColumnKind`] alone determines how many bytes
//! it occupies under a given [`TableInfo`], and what a zero value means:
//!
//! | Kind            | Width   | Zero                                     |
//! |-----------------|---------|------------------------------------------|
//! | `U8/U16/U32`    | 1/2/4   | a plain value                            |
//! | `Heap(_)`       | 2 or 4  | empty string / empty blob / no GUID      |
//! | `Table(_)`      | 2 or 4  | invalid, the reference is required       |
//! | `List(_)`       | 2 or 4  | no children                              |
//! | `Coded(_)`      | 2 or 4  | null reference (row 0 of the tagged kind)|

use crate::metadata::tables::{CodedIndexType, TableId, TableInfo};

/// The three heaps addressed by table columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeapKind {
    /// `#Strings`, width flag `0x01`
    Strings,
    /// `#GUID`, width flag `0x02`
    Guid,
    /// `#Blob`, width flag `0x04`
    Blob,
}

impl HeapKind {
    /// The `heap_sizes` bit selecting 4-byte offsets for this heap.
    #[must_use]
    pub fn size_flag(self) -> u8 {
        match self {
            HeapKind::Strings => 0x01,
            HeapKind::Guid => 0x02,
            HeapKind::Blob => 0x04,
        }
    }
}

/// The storage kind of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// 1-byte constant
    U8,
    /// 2-byte constant
    U16,
    /// 4-byte constant
    U32,
    /// Offset into a heap
    Heap(HeapKind),
    /// Required index into a single table
    Table(TableId),
    /// First row of a contiguous range owned by this row
    List(TableId),
    /// Tagged index into one of several tables
    Coded(CodedIndexType),
}

impl ColumnKind {
    /// Size of the column in bytes under the resolved layout.
    #[must_use]
    pub fn width(self, info: &TableInfo) -> usize {
        match self {
            ColumnKind::U8 => 1,
            ColumnKind::U16 => 2,
            ColumnKind::U32 => 4,
            ColumnKind::Heap(heap) => info.heap_index_bytes(heap),
            ColumnKind::Table(table) | ColumnKind::List(table) => info.table_index_bytes(table),
            ColumnKind::Coded(kind) => info.coded_index_bytes(kind),
        }
    }
}

/// A named column of a table schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    /// Field name of the column in the typed row
    pub name: &'static str,
    /// Storage kind
    pub kind: ColumnKind,
}

/// Size of a row made of `columns` under the resolved layout.
#[must_use]
pub fn row_width(columns: &[Column], info: &TableInfo) -> usize {
    columns.iter().map(|column| column.kind.width(info)).sum()
}

#[cfg(test)]
mod tests {
    use strum::EnumCount;

    use super::*;

    #[test]
    fn widths() {
        let mut rows = [0_u32; TableId::COUNT];
        rows[TableId::Field as usize] = 0x1_0000;
        rows[TableId::TypeDef as usize] = 0x4000;
        let info = TableInfo::new(&rows, 0x05);

        assert_eq!(ColumnKind::U8.width(&info), 1);
        assert_eq!(ColumnKind::U32.width(&info), 4);
        assert_eq!(ColumnKind::Heap(HeapKind::Strings).width(&info), 4);
        assert_eq!(ColumnKind::Heap(HeapKind::Guid).width(&info), 2);
        assert_eq!(ColumnKind::Heap(HeapKind::Blob).width(&info), 4);
        assert_eq!(ColumnKind::Table(TableId::Field).width(&info), 4);
        assert_eq!(ColumnKind::List(TableId::MethodDef).width(&info), 2);
        assert_eq!(
            ColumnKind::Coded(CodedIndexType::TypeDefOrRef).width(&info),
            4
        );
        assert_eq!(
            ColumnKind::Coded(CodedIndexType::TypeOrMethodDef).width(&info),
            2
        );
    }

    #[test]
    fn type_def_row_width() {
        let rows = [0_u32; TableId::COUNT];
        let info = TableInfo::new(&rows, 0);

        // flags(4) + name(2) + namespace(2) + extends(2) + field_list(2) + method_list(2)
        assert_eq!(row_width(TableId::TypeDef.columns(), &info), 14);

        let info = TableInfo::new(&rows, 0x07);
        assert_eq!(row_width(TableId::TypeDef.columns(), &info), 18);
        // generation(2) + name(4) + 3 * guid(4)
        assert_eq!(row_width(TableId::Module.columns(), &info), 18);
    }
}
