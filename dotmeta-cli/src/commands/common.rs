use std::path::Path;

use anyhow::Context;
use dotmeta::{
    metadata::tables::{TableIndex, TypeDefRow, TypeRefRow},
    Assembly, TableId,
};

use crate::source;

/// Map and load a single assembly.
pub fn load_assembly(path: &Path) -> anyhow::Result<Assembly> {
    let data = source::open(path, true)
        .with_context(|| format!("failed to read: {}", path.display()))?;

    Assembly::from_backend(data)
        .with_context(|| format!("failed to load assembly: {}", path.display()))
}

/// `Namespace.Name` of a `TypeDef` or `TypeRef` row, `TypeSpec[n]` for anything else.
pub fn type_name(assembly: &Assembly, index: TableIndex) -> String {
    let names = match index.table {
        TableId::TypeDef => assembly
            .row::<TypeDefRow>(index.row)
            .map(|row| (row.type_namespace, row.type_name)),
        TableId::TypeRef => assembly
            .row::<TypeRefRow>(index.row)
            .map(|row| (row.type_namespace, row.type_name)),
        _ => return index.to_string(),
    };

    let resolved = names.and_then(|(namespace, name)| {
        Ok((assembly.string(namespace)?, assembly.string(name)?))
    });

    match resolved {
        Ok(("", name)) => name.to_string(),
        Ok((namespace, name)) => format!("{namespace}.{name}"),
        Err(_) => format!("{index}?"),
    }
}

/// A display-friendly file name.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().to_string(),
    )
}
