use std::path::Path;

use anyhow::Context;
use dotmeta::{
    metadata::tables::{TableIndex, TypeAttributes, TypeDefRow},
    Assembly, TableId,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{load_assembly, type_name},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct TypeEntry {
    token: String,
    visibility: String,
    kind: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extends: Option<String>,
    implements: Vec<String>,
    fields: usize,
    methods: usize,
}

#[derive(Debug, Serialize)]
struct TypesOutput {
    types: Vec<TypeEntry>,
    count: usize,
}

pub fn run(
    path: &Path,
    namespace: Option<&str>,
    public_only: bool,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let assembly = load_assembly(path)?;

    let mut entries = Vec::new();
    for rid in 1..=assembly.row_count(TableId::TypeDef) {
        let index = TableIndex::new(TableId::TypeDef, rid);
        let row = assembly.row::<TypeDefRow>(rid)?;
        let flags = TypeAttributes::from_flags(row.flags);

        if public_only && !is_public(flags) {
            continue;
        }

        if let Some(ns) = namespace {
            if assembly.string(row.type_namespace)? != ns {
                continue;
            }
        }

        entries.push(describe(&assembly, index, flags)?);
    }

    let count = entries.len();
    let output = TypesOutput {
        types: entries,
        count,
    };

    print_output(&output, opts, |out| {
        let mut tw = TabWriter::new(&[
            ("Token", Align::Left),
            ("Vis", Align::Left),
            ("Kind", Align::Left),
            ("Name", Align::Left),
            ("Extends", Align::Left),
            ("Fields", Align::Right),
            ("Methods", Align::Right),
            ("Implements", Align::Left),
        ]);
        for e in &out.types {
            tw.row(vec![
                e.token.clone(),
                e.visibility.clone(),
                e.kind.clone(),
                e.name.clone(),
                e.extends.clone().unwrap_or_default(),
                e.fields.to_string(),
                e.methods.to_string(),
                e.implements.join(", "),
            ]);
        }
        tw.print();
        println!("\n{} type(s) listed.", out.count);
    })
}

fn describe(
    assembly: &Assembly,
    index: TableIndex,
    flags: TypeAttributes,
) -> anyhow::Result<TypeEntry> {
    let fields = assembly
        .fields(index)
        .with_context(|| format!("fields of {index}"))?;
    let methods = assembly
        .methods(index)
        .with_context(|| format!("methods of {index}"))?;
    let extends = assembly
        .extends(index)
        .with_context(|| format!("base type of {index}"))?;
    let implements = assembly
        .implements(index)
        .with_context(|| format!("interfaces of {index}"))?;

    Ok(TypeEntry {
        token: index.token().to_string(),
        visibility: if is_public(flags) { "public" } else { "internal" }.to_string(),
        kind: if flags.is_interface() { "interface" } else { "class" }.to_string(),
        name: type_name(assembly, index),
        extends: extends.map(|base| type_name(assembly, base)),
        implements: implements
            .into_iter()
            .map(|interface| type_name(assembly, interface))
            .collect(),
        fields: fields.len(),
        methods: methods.len(),
    })
}

fn is_public(flags: TypeAttributes) -> bool {
    let visibility = flags.visibility();
    visibility == TypeAttributes::PUBLIC || visibility == TypeAttributes::NESTED_PUBLIC
}
