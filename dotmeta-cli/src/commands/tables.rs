use std::path::Path;

use anyhow::{bail, Context};
use dotmeta::{
    metadata::tables::{ColumnValue, TableIndex},
    Assembly, TableId,
};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_assembly},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct TableEntry {
    table: String,
    rows: u32,
    row_size: usize,
}

#[derive(Debug, Serialize)]
struct TablesOutput {
    file: String,
    runtime_version: String,
    schema_version: String,
    heap_sizes: u8,
    uncompressed: bool,
    tables: Vec<TableEntry>,
}

#[derive(Debug, Serialize)]
struct TableDetailOutput {
    table: String,
    row_count: u32,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

pub fn run(
    path: &Path,
    table_filter: Option<&str>,
    limit: Option<u32>,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let assembly = load_assembly(path)?;

    match table_filter {
        Some(filter) => {
            let Some(table) = TableId::iter().find(|id| id.to_string().eq_ignore_ascii_case(filter))
            else {
                bail!("unknown table: {filter}");
            };

            let detail = format_table_detail(&assembly, table, limit)?;
            print_output(&detail, opts, |d| {
                println!("{} table ({} rows):\n", d.table, d.row_count);
                let columns: Vec<(&str, Align)> = d
                    .columns
                    .iter()
                    .map(|column| (column.as_str(), Align::Left))
                    .collect();
                let mut tw = TabWriter::new(&columns);
                for row in &d.rows {
                    tw.row(row.clone());
                }
                tw.print();
                if (d.rows.len() as u32) < d.row_count {
                    println!("\n... {} more row(s)", d.row_count - d.rows.len() as u32);
                }
            })
        }
        None => {
            let header = assembly.tables_header();
            let tables = TableId::iter()
                .filter(|table| header.has_table(*table))
                .map(|table| TableEntry {
                    table: table.to_string(),
                    rows: assembly.row_count(table),
                    row_size: assembly.info().row_width(table),
                })
                .collect();

            let output = TablesOutput {
                file: file_display_name(path),
                runtime_version: assembly.root().version.clone(),
                schema_version: format!("{}.{}", header.major_version, header.minor_version),
                heap_sizes: header.heap_sizes,
                uncompressed: assembly.is_uncompressed(),
                tables,
            };

            print_output(&output, opts, |out| {
                println!(
                    "{}: runtime {}, schema {}, heap sizes 0x{:02X}{}\n",
                    out.file,
                    out.runtime_version,
                    out.schema_version,
                    out.heap_sizes,
                    if out.uncompressed { ", uncompressed" } else { "" }
                );
                let mut tw = TabWriter::new(&[
                    ("Table", Align::Left),
                    ("Rows", Align::Right),
                    ("Row size", Align::Right),
                ]);
                for entry in &out.tables {
                    tw.row(vec![
                        entry.table.clone(),
                        entry.rows.to_string(),
                        entry.row_size.to_string(),
                    ]);
                }
                tw.print();
            })
        }
    }
}

fn format_table_detail(
    assembly: &Assembly,
    table: TableId,
    limit: Option<u32>,
) -> anyhow::Result<TableDetailOutput> {
    let row_count = assembly.row_count(table);
    let shown = limit.map_or(row_count, |limit| limit.min(row_count));

    let columns = ["RID", "Token"]
        .into_iter()
        .map(str::to_string)
        .chain(table.columns().iter().map(|column| column.name.to_string()))
        .collect();

    let mut rows = Vec::with_capacity(shown as usize);
    for rid in 1..=shown {
        let index = TableIndex::new(table, rid);
        let values = assembly
            .columns(index)
            .with_context(|| format!("failed to decode {index}"))?;

        let mut row = vec![rid.to_string(), index.token().to_string()];
        row.extend(values.into_iter().map(|value| format_value(assembly, value)));
        rows.push(row);
    }

    Ok(TableDetailOutput {
        table: table.to_string(),
        row_count,
        columns,
        rows,
    })
}

fn format_value(assembly: &Assembly, value: ColumnValue) -> String {
    match value {
        ColumnValue::String(index) => match assembly.string(index) {
            Ok(text) => format!("{text:?}"),
            Err(_) => format!("{value}?"),
        },
        ColumnValue::Blob(index) if index.0 == 0 => "blob[0]".to_string(),
        ColumnValue::Blob(index) => match assembly.blob(index) {
            Ok(bytes) => format!("blob[{} bytes]", bytes.len()),
            Err(_) => format!("{value}?"),
        },
        ColumnValue::Guid(index) => match assembly.guid(index) {
            Ok(Some(guid)) => guid.to_string(),
            Ok(None) => "null".to_string(),
            Err(_) => format!("{value}?"),
        },
        other => other.to_string(),
    }
}
