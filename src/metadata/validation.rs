//! Whole-assembly row validation.
//!
//! [`validate_rows`] decodes every row of every present table and checks each reference it
//! holds:
//!
//! | Column          | Accepted values                                             |
//! |-----------------|-------------------------------------------------------------|
//! | `Heap`          | 0, or an offset that resolves within its heap               |
//! | `Table`         | `1..=rows(target)`                                          |
//! | `List`          | 0 (no children), or `1..=rows(target) + 1`                  |
//! | `Coded`         | row 0 (null), or `1..=rows(tag)`                            |
//!
//! Loading does not run this pass; it costs one decode per row.

use log::debug;

use crate::{
    metadata::{
        assembly::Assembly,
        tables::{ColumnValue, TableId, TableIndex},
    },
    Result,
};

/// Decode every row and resolve every reference it holds.
///
/// Returns the number of rows checked.
///
/// # Errors
/// Returns `Malformed` for the first row that fails to decode or holds a dangling reference.
///
/// ```rust,no_run
/// let assembly = dotmeta::load(std::fs::read("assembly.dll")?)?;
/// let rows = dotmeta::metadata::validation::validate_rows(&assembly)?;
/// println!("{} rows ok", rows);
/// # Ok::<(), dotmeta::Error>(())
/// ```
pub fn validate_rows(assembly: &Assembly) -> Result<u64> {
    let mut checked = 0_u64;

    for (table, entry) in assembly.directory().iter() {
        for rid in 1..=entry.row_count {
            let index = TableIndex::new(table, rid);
            for (column, value) in table.columns().iter().zip(assembly.columns(index)?) {
                validate_column(assembly, index, column.name, value)?;
            }
            checked += 1;
        }
    }

    debug!("validated {} rows", checked);
    Ok(checked)
}

fn validate_column(
    assembly: &Assembly,
    index: TableIndex,
    column: &str,
    value: ColumnValue,
) -> Result<()> {
    match value {
        ColumnValue::U8(_) | ColumnValue::U16(_) | ColumnValue::U32(_) => {}
        ColumnValue::String(string) => {
            assembly.string(string)?;
        }
        ColumnValue::Blob(blob) => {
            assembly.blob(blob)?;
        }
        ColumnValue::Guid(guid) => {
            assembly.guid(guid)?;
        }
        ColumnValue::Table(table, row) => {
            let rows = assembly.row_count(table);
            if row == 0 || row > rows {
                return Err(malformed_error!(
                    "{}.{} references {} row {} of {}",
                    index,
                    column,
                    table,
                    row,
                    rows
                ));
            }
        }
        ColumnValue::List(table, row) => {
            let rows = list_rows(assembly, table);
            if row > rows.saturating_add(1) {
                return Err(malformed_error!(
                    "{}.{} starts a {} list at {}, beyond {} rows",
                    index,
                    column,
                    table,
                    row,
                    rows
                ));
            }
        }
        ColumnValue::Coded(coded) => {
            let rows = assembly.row_count(coded.tag);
            if coded.row > rows {
                return Err(malformed_error!(
                    "{}.{} references {} row {} of {}",
                    index,
                    column,
                    coded.tag,
                    coded.row,
                    rows
                ));
            }
        }
    }

    Ok(())
}

/// Rows a list column pointing at `table` may range over, honoring `*Ptr` indirection.
///
/// A present pointer table replaces `table` as the list target, as in `Assembly::fields`.
fn list_rows(assembly: &Assembly, table: TableId) -> u32 {
    let target = table
        .indirection()
        .filter(|ptr| assembly.row_count(*ptr) > 0)
        .unwrap_or(table);
    assembly.row_count(target)
}
