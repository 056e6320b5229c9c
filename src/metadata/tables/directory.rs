//! The table directory: where each table's rows start.
//!
//! Tables are stored back to back in ascending id order directly after the tables stream
//! header, so one pass over the resolved row widths gives every table's position:
//!
//! ```text
//! ptr(Module)  = tables data start
//! ptr(TypeRef) = ptr(Module) + rows(Module) * width(Module)
//! ...
//! ```

use log::debug;
use strum::{EnumCount, IntoEnumIterator};

use crate::{
    metadata::tables::{TableId, TableInfo},
    Result,
};

/// Location of one table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableEntry {
    /// Number of rows, 0 if the table is absent
    pub row_count: u32,
    /// File offset of row 1, 0 if the table is absent
    pub ptr: usize,
}

/// Row count and offset of every table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDirectory {
    entries: [TableEntry; TableId::COUNT],
}

impl TableDirectory {
    /// Lay out the tables of a stream.
    ///
    /// ## Arguments
    /// * `info` - The resolved layout
    /// * `start` - File offset of the first row of the first present table
    /// * `end` - File offset one past the end of the tables stream
    ///
    /// # Errors
    /// Returns `Malformed` if any table extends past `end`.
    pub fn build(info: &TableInfo, start: usize, end: usize) -> Result<TableDirectory> {
        let mut entries = [TableEntry::default(); TableId::COUNT];
        let mut current = start;

        for table in TableId::iter() {
            let row_count = info.rows(table);
            if row_count == 0 {
                continue;
            }

            let Some(table_end) = (row_count as usize)
                .checked_mul(info.row_width(table))
                .and_then(|size| size.checked_add(current))
            else {
                return Err(malformed_error!(
                    "Table {} size overflows - {} rows",
                    table,
                    row_count
                ));
            };

            if table_end > end {
                return Err(malformed_error!(
                    "Table {} exceeds the tables stream - {} rows of {} bytes at {}, stream ends at {}",
                    table,
                    row_count,
                    info.row_width(table),
                    current,
                    end
                ));
            }

            entries[table as usize] = TableEntry {
                row_count,
                ptr: current,
            };
            current = table_end;
        }

        debug!(
            "table directory: {} tables, {} bytes of rows",
            entries.iter().filter(|entry| entry.row_count > 0).count(),
            current - start
        );

        Ok(TableDirectory { entries })
    }

    /// Location of `table`.
    #[must_use]
    pub fn get(&self, table: TableId) -> TableEntry {
        self.entries[table as usize]
    }

    /// Present tables in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (TableId, TableEntry)> + '_ {
        TableId::iter()
            .map(|table| (table, self.get(table)))
            .filter(|(_, entry)| entry.row_count > 0)
    }
}
