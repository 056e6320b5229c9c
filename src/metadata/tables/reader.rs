//! Column decoding.
//!
//! [`RowReader`] walks the bytes of a single row column by column, reading each value with the
//! width its [`ColumnKind`] has under the resolved [`TableInfo`]. Values come out either untyped
//! as [`ColumnValue`] or converted into a typed field through [`FromColumn`].

use std::fmt;

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::tables::{CodedIndex, ColumnKind, HeapKind, TableId, TableInfo},
    Result,
};

/// Offset into the `#Strings` heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringIndex(pub u32);

/// Offset into the `#Blob` heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobIndex(pub u32);

/// 1-based index into the `#GUID` heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GuidIndex(pub u32);

/// A decoded column value, before any heap or cross-table resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnValue {
    /// 1-byte constant
    U8(u8),
    /// 2-byte constant
    U16(u16),
    /// 4-byte constant
    U32(u32),
    /// `#Strings` offset
    String(StringIndex),
    /// `#GUID` index
    Guid(GuidIndex),
    /// `#Blob` offset
    Blob(BlobIndex),
    /// Simple index into the given table
    Table(TableId, u32),
    /// Owned-range start in the given table
    List(TableId, u32),
    /// Coded index
    Coded(CodedIndex),
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::U8(value) => write!(f, "0x{:02X}", value),
            ColumnValue::U16(value) => write!(f, "0x{:04X}", value),
            ColumnValue::U32(value) => write!(f, "0x{:08X}", value),
            ColumnValue::String(index) => write!(f, "#Strings[{}]", index.0),
            ColumnValue::Guid(index) => write!(f, "#GUID[{}]", index.0),
            ColumnValue::Blob(index) => write!(f, "#Blob[{}]", index.0),
            ColumnValue::Table(table, row) | ColumnValue::List(table, row) => {
                write!(f, "{}[{}]", table, row)
            }
            ColumnValue::Coded(index) => write!(f, "{}[{}]", index.tag, index.row),
        }
    }
}

/// Conversion from a decoded column into a typed row field.
pub trait FromColumn: Sized {
    /// Convert `value`, failing if it has the wrong kind for this field type.
    ///
    /// # Errors
    /// Returns `Malformed` on a kind mismatch.
    fn from_column(value: ColumnValue) -> Result<Self>;
}

macro_rules! impl_from_column {
    ($ty:ty, $($pattern:pat => $value:expr),+) => {
        impl FromColumn for $ty {
            fn from_column(value: ColumnValue) -> Result<Self> {
                match value {
                    $($pattern => Ok($value),)+
                    other => Err(malformed_error!(
                        "Column value {:?} does not fit {}",
                        other,
                        stringify!($ty)
                    )),
                }
            }
        }
    };
}

impl_from_column!(u8, ColumnValue::U8(value) => value);
impl_from_column!(u16, ColumnValue::U16(value) => value);
impl_from_column!(
    u32,
    ColumnValue::U32(value) => value,
    ColumnValue::Table(_, row) => row,
    ColumnValue::List(_, row) => row
);
impl_from_column!(StringIndex, ColumnValue::String(index) => index);
impl_from_column!(GuidIndex, ColumnValue::Guid(index) => index);
impl_from_column!(BlobIndex, ColumnValue::Blob(index) => index);
impl_from_column!(CodedIndex, ColumnValue::Coded(index) => index);

/// Sequential reader over the bytes of one row.
pub struct RowReader<'a> {
    data: &'a [u8],
    offset: usize,
    info: &'a TableInfo,
}

impl<'a> RowReader<'a> {
    /// A reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8], info: &'a TableInfo) -> Self {
        RowReader {
            data,
            offset: 0,
            info,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.offset
    }

    /// Read the next column as an untyped value.
    ///
    /// # Errors
    /// Returns `Malformed` if the row is truncated or a coded index has an undefined tag.
    pub fn read(&mut self, kind: ColumnKind) -> Result<ColumnValue> {
        let value = match kind {
            ColumnKind::U8 => ColumnValue::U8(read_le_at::<u8>(self.data, &mut self.offset)?),
            ColumnKind::U16 => ColumnValue::U16(read_le_at::<u16>(self.data, &mut self.offset)?),
            ColumnKind::U32 => ColumnValue::U32(read_le_at::<u32>(self.data, &mut self.offset)?),
            ColumnKind::Heap(heap) => {
                let index = self.read_dyn(self.info.is_large_heap(heap))?;
                match heap {
                    HeapKind::Strings => ColumnValue::String(StringIndex(index)),
                    HeapKind::Guid => ColumnValue::Guid(GuidIndex(index)),
                    HeapKind::Blob => ColumnValue::Blob(BlobIndex(index)),
                }
            }
            ColumnKind::Table(table) => {
                ColumnValue::Table(table, self.read_dyn(self.info.is_large(table))?)
            }
            ColumnKind::List(table) => {
                ColumnValue::List(table, self.read_dyn(self.info.is_large(table))?)
            }
            ColumnKind::Coded(coded) => {
                let raw = self.read_dyn(self.info.is_large_coded(coded))?;
                ColumnValue::Coded(CodedIndex::decode(raw, coded)?)
            }
        };

        Ok(value)
    }

    /// Read the next column and convert it into a typed field.
    ///
    /// # Errors
    /// See [`RowReader::read`].
    pub fn read_as<T: FromColumn>(&mut self, kind: ColumnKind) -> Result<T> {
        T::from_column(self.read(kind)?)
    }

    fn read_dyn(&mut self, is_large: bool) -> Result<u32> {
        read_le_at_dyn(self.data, &mut self.offset, is_large)
    }
}
