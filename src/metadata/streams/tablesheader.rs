//! Header of the tables stream (ECMA-335 II.24.2.6).
//!
//! ```text
//! reserved    u32
//! major       u8
//! minor       u8
//! heap_sizes  u8     0x01 strings, 0x02 guid, 0x04 blob, 0x40 extra data
//! reserved    u8
//! valid       u64    bit n set = table n present
//! sorted      u64
//! rows        u32 * popcount(valid)
//! extra       u32    only when heap_sizes & 0x40
//! ```
//!
//! The header only carries the raw counts. Everything derived from them (index widths, row
//! widths, table offsets) lives in [`crate::metadata::tables::TableInfo`] and
//! [`crate::metadata::tables::TableDirectory`].

use log::trace;
use strum::{EnumCount, IntoEnumIterator};

use crate::{file::parser::Parser, metadata::tables::TableId, Result};

/// `heap_sizes` flag: an extra `u32` follows the row counts.
pub const HEAP_EXTRA_DATA: u8 = 0x40;

/// The parsed tables stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablesHeader {
    /// Major schema version, 2 for every known producer
    pub major_version: u8,
    /// Minor schema version
    pub minor_version: u8,
    /// Heap width flags
    pub heap_sizes: u8,
    /// Bitmask of present tables
    pub valid: u64,
    /// Bitmask of sorted tables
    pub sorted: u64,
    /// Row count per table, 0 for absent tables
    pub rows: [u32; TableId::COUNT],
    /// Size of the header, i.e. the offset of the first row within the stream
    pub size: usize,
}

impl TablesHeader {
    /// Parse the header from the start of the tables stream.
    ///
    /// # Errors
    /// Returns `Malformed` if the header is truncated, or if `valid` names a table beyond
    /// `GenericParamConstraint`.
    pub fn read(data: &[u8]) -> Result<TablesHeader> {
        let mut parser = Parser::new(data);

        let _reserved = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        let _reserved = parser.read_le::<u8>()?;
        let valid = parser.read_le::<u64>()?;
        let sorted = parser.read_le::<u64>()?;

        let known = (1_u64 << TableId::COUNT) - 1;
        if valid & !known != 0 {
            return Err(malformed_error!(
                "Tables stream names unknown tables - valid: 0x{:016X}",
                valid
            ));
        }

        let mut rows = [0_u32; TableId::COUNT];
        for table in TableId::iter() {
            if valid & (1 << table as u64) == 0 {
                continue;
            }

            rows[table as usize] = parser.read_le::<u32>()?;
            trace!("table {:?} with {} rows", table, rows[table as usize]);
        }

        if heap_sizes & HEAP_EXTRA_DATA != 0 {
            let _extra = parser.read_le::<u32>()?;
        }

        Ok(TablesHeader {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            rows,
            size: parser.pos(),
        })
    }

    /// Whether `table` is present in the `valid` bitmask.
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        self.valid & (1 << table as u64) != 0
    }

    /// Number of tables present.
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }
}
