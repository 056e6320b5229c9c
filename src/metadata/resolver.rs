//! Cross-table navigation.
//!
//! ECMA-335 encodes most relationships implicitly:
//!
//! - **Owned ranges** - a `TypeDef` owns the `Field` rows from its `field_list` up to (not
//!   including) the next `TypeDef`'s `field_list`; the last `TypeDef` owns everything up to the
//!   end of the table. `method_list` and `MethodDef.param_list` work the same way. Uncompressed
//!   streams may route these ranges through a `*Ptr` table.
//! - **Coded indices** - `TypeDef.extends` names a row of `TypeDef`, `TypeRef` or `TypeSpec`.
//! - **Reverse lookups** - the interfaces of a type are the `InterfaceImpl` rows whose `class`
//!   column names it, wherever they sit in the table.
//!
//! All operations take a [`TableIndex`] of the expected table and fail with `Malformed`
//! otherwise.

use log::{trace, warn};

use crate::{
    metadata::{
        assembly::{Assembly, InterfaceIndex},
        tables::{
            FieldPtrRow, InterfaceImplRow, MethodDefRow, MethodPtrRow, ParamPtrRow, TableId,
            TableIndex, TypeDefRow,
        },
    },
    Result,
};

/// One parent -> children relationship expressed through a list column.
struct OwnedList {
    parent: TableId,
    child: TableId,
    first: fn(&Assembly, u32) -> Result<u32>,
}

const FIELDS: OwnedList = OwnedList {
    parent: TableId::TypeDef,
    child: TableId::Field,
    first: field_list,
};

const METHODS: OwnedList = OwnedList {
    parent: TableId::TypeDef,
    child: TableId::MethodDef,
    first: method_list,
};

const PARAMS: OwnedList = OwnedList {
    parent: TableId::MethodDef,
    child: TableId::Param,
    first: param_list,
};

fn field_list(assembly: &Assembly, rid: u32) -> Result<u32> {
    Ok(assembly.row::<TypeDefRow>(rid)?.field_list)
}

fn method_list(assembly: &Assembly, rid: u32) -> Result<u32> {
    Ok(assembly.row::<TypeDefRow>(rid)?.method_list)
}

fn param_list(assembly: &Assembly, rid: u32) -> Result<u32> {
    Ok(assembly.row::<MethodDefRow>(rid)?.param_list)
}

impl Assembly {
    /// The fields owned by a `TypeDef`, in table order.
    ///
    /// # Errors
    /// Returns `Malformed` if `typedef` is not a valid `TypeDef` row or the owned range is
    /// inverted or out of bounds.
    pub fn fields(&self, typedef: TableIndex) -> Result<Vec<TableIndex>> {
        self.owned(&FIELDS, typedef)
    }

    /// The methods owned by a `TypeDef`, in table order.
    ///
    /// # Errors
    /// See [`Assembly::fields`].
    pub fn methods(&self, typedef: TableIndex) -> Result<Vec<TableIndex>> {
        self.owned(&METHODS, typedef)
    }

    /// The parameters owned by a `MethodDef`, in table order.
    ///
    /// # Errors
    /// See [`Assembly::fields`].
    pub fn params(&self, methoddef: TableIndex) -> Result<Vec<TableIndex>> {
        self.owned(&PARAMS, methoddef)
    }

    /// The base type of a `TypeDef`, `None` for roots such as `System.Object` and interfaces.
    ///
    /// # Errors
    /// Returns `Malformed` if `typedef` is not a valid `TypeDef` row or the base type names a
    /// row that does not exist.
    pub fn extends(&self, typedef: TableIndex) -> Result<Option<TableIndex>> {
        expect_table(typedef, TableId::TypeDef)?;

        let extends = self.row::<TypeDefRow>(typedef.row)?.extends;
        if extends.is_null() {
            return Ok(None);
        }

        let target = TableIndex::from(extends);
        self.expect_row(target)?;
        Ok(Some(target))
    }

    /// The interfaces a `TypeDef` declares, in `InterfaceImpl` table order.
    ///
    /// The first call scans the whole `InterfaceImpl` table once and caches a
    /// `class -> rows` index for the lifetime of the assembly.
    ///
    /// # Errors
    /// Returns `Malformed` if `typedef` is not a valid `TypeDef` row, or an `InterfaceImpl`
    /// row cannot be decoded or names a missing interface.
    pub fn implements(&self, typedef: TableIndex) -> Result<Vec<TableIndex>> {
        expect_table(typedef, TableId::TypeDef)?;
        self.expect_row(typedef)?;

        let Some(rows) = self.interface_index()?.get(&typedef.row) else {
            return Ok(Vec::new());
        };

        let mut interfaces = Vec::with_capacity(rows.len());
        for rid in rows {
            let interface = self.row::<InterfaceImplRow>(*rid)?.interface;
            let target = TableIndex::from(interface);
            self.expect_row(target)?;
            interfaces.push(target);
        }

        Ok(interfaces)
    }

    fn interface_index(&self) -> Result<&InterfaceIndex> {
        let cache = self.interface_cache();
        if let Some(index) = cache.get() {
            return Ok(index);
        }

        let mut index = InterfaceIndex::new();
        for rid in 1..=self.row_count(TableId::InterfaceImpl) {
            let class = self.row::<InterfaceImplRow>(rid)?.class;
            index.entry(class).or_default().push(rid);
        }

        trace!("interface index: {} implementing types", index.len());

        // A concurrent first use may have published already; keep whichever map won
        Ok(cache.get_or_init(|| index))
    }

    fn owned(&self, list: &OwnedList, parent: TableIndex) -> Result<Vec<TableIndex>> {
        expect_table(parent, list.parent)?;

        let first = (list.first)(self, parent.row)?;
        if first == 0 {
            warn!("{} has a null {} list", parent, list.child);
            return Ok(Vec::new());
        }

        let indirection = list
            .child
            .indirection()
            .filter(|ptr| self.row_count(*ptr) > 0);
        let list_rows = self.row_count(indirection.unwrap_or(list.child));

        let end = self.list_end(list, parent.row, list_rows)?;
        if first > end {
            return Err(malformed_error!(
                "Inverted {} range for {} - {}..{}",
                list.child,
                parent,
                first,
                end
            ));
        }

        if end > list_rows.saturating_add(1) {
            return Err(malformed_error!(
                "{} range for {} ends at {}, beyond {} rows",
                list.child,
                parent,
                end,
                list_rows
            ));
        }

        (first..end)
            .map(|rid| match indirection {
                Some(ptr) => self.pointer_target(ptr, list.child, rid),
                None => Ok(TableIndex::new(list.child, rid)),
            })
            .collect()
    }

    /// One past the last child of `parent`: the next non-null list value, or the end of the
    /// child table.
    fn list_end(&self, list: &OwnedList, parent: u32, list_rows: u32) -> Result<u32> {
        for next in parent.saturating_add(1)..=self.row_count(list.parent) {
            let value = (list.first)(self, next)?;
            if value != 0 {
                return Ok(value);
            }
        }

        Ok(list_rows.saturating_add(1))
    }

    fn pointer_target(&self, ptr: TableId, child: TableId, rid: u32) -> Result<TableIndex> {
        let target = match ptr {
            TableId::FieldPtr => self.row::<FieldPtrRow>(rid)?.field,
            TableId::MethodPtr => self.row::<MethodPtrRow>(rid)?.method,
            TableId::ParamPtr => self.row::<ParamPtrRow>(rid)?.param,
            _ => {
                return Err(malformed_error!(
                    "{} is not an indirection table for {}",
                    ptr,
                    child
                ))
            }
        };

        let target = TableIndex::new(child, target);
        self.expect_row(target)?;
        Ok(target)
    }

    fn expect_row(&self, index: TableIndex) -> Result<()> {
        let rows = self.row_count(index.table);
        if index.row == 0 || index.row > rows {
            return Err(malformed_error!(
                "Reference to {} beyond {} rows",
                index,
                rows
            ));
        }

        Ok(())
    }
}

fn expect_table(index: TableIndex, table: TableId) -> Result<()> {
    if index.table != table {
        return Err(malformed_error!("Expected a {} row, got {}", table, index));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        metadata::tables::{TableId, TableIndex},
        test::builder::{ImageBuilder, TypeTarget},
        Assembly,
    };

    fn typedef(row: u32) -> TableIndex {
        TableIndex::new(TableId::TypeDef, row)
    }

    /// `<Module>`, `Object` (no base), `IFoo` (interface), `Derived : Object, IFoo`
    fn hierarchy() -> Assembly {
        let mut builder = ImageBuilder::new();
        let object = builder.type_def(0x0010_2001, "System", "Object", None);
        builder.method(0x1886, ".ctor");
        let ifoo = builder.type_def(0x0000_00A1, "Sample", "IFoo", None);
        builder.method(0x05C6, "Run");
        let derived = builder.type_def(
            0x0010_0001,
            "Sample",
            "Derived",
            Some(TypeTarget::TypeDef(object)),
        );
        builder.field(0x0001, "count");
        builder.field(0x0001, "name");
        builder.method(0x01E6, "Run");
        builder.param(1, "value");
        builder.interface_impl(derived, TypeTarget::TypeDef(ifoo));

        Assembly::from_mem(builder.build()).unwrap()
    }

    #[test]
    fn extends() {
        let assembly = hierarchy();

        assert_eq!(assembly.extends(typedef(1)).unwrap(), None);
        assert_eq!(assembly.extends(typedef(2)).unwrap(), None);
        assert_eq!(assembly.extends(typedef(4)).unwrap(), Some(typedef(2)));
    }

    #[test]
    fn implements() {
        let assembly = hierarchy();

        assert_eq!(assembly.implements(typedef(4)).unwrap(), vec![typedef(3)]);
        assert!(assembly.implements(typedef(2)).unwrap().is_empty());

        // Served from the cache the second time
        assert_eq!(assembly.implements(typedef(4)).unwrap(), vec![typedef(3)]);
        assert!(assembly.implements(typedef(5)).unwrap_err().is_malformed());
    }

    #[test]
    fn owned_ranges() {
        let assembly = hierarchy();

        assert!(assembly.fields(typedef(1)).unwrap().is_empty());
        assert!(assembly.fields(typedef(2)).unwrap().is_empty());
        assert_eq!(
            assembly.fields(typedef(4)).unwrap(),
            vec![
                TableIndex::new(TableId::Field, 1),
                TableIndex::new(TableId::Field, 2)
            ]
        );

        assert_eq!(
            assembly.methods(typedef(2)).unwrap(),
            vec![TableIndex::new(TableId::MethodDef, 1)]
        );
        assert_eq!(
            assembly.methods(typedef(4)).unwrap(),
            vec![TableIndex::new(TableId::MethodDef, 3)]
        );

        let run = TableIndex::new(TableId::MethodDef, 3);
        assert_eq!(
            assembly.params(run).unwrap(),
            vec![TableIndex::new(TableId::Param, 1)]
        );
        assert!(assembly
            .params(TableIndex::new(TableId::MethodDef, 1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn wrong_table() {
        let assembly = hierarchy();
        let field = TableIndex::new(TableId::Field, 1);

        assert!(assembly.fields(field).unwrap_err().is_malformed());
        assert!(assembly.methods(field).unwrap_err().is_malformed());
        assert!(assembly.params(typedef(2)).unwrap_err().is_malformed());
        assert!(assembly.extends(field).unwrap_err().is_malformed());
        assert!(assembly.implements(field).unwrap_err().is_malformed());
        assert!(assembly.fields(typedef(9)).unwrap_err().is_malformed());
    }

    #[test]
    fn inverted_range() {
        let mut builder = ImageBuilder::new();
        builder.type_def(0x0010_0001, "", "A", None);
        builder.field(0x0001, "a");
        builder.field(0x0001, "b");
        builder.type_def(0x0010_0001, "", "B", None);
        builder.override_field_list(2, 3);
        builder.override_field_list(3, 1);

        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(assembly.fields(typedef(2)).unwrap_err().is_malformed());
    }

    #[test]
    fn range_beyond_table() {
        let mut builder = ImageBuilder::new();
        builder.type_def(0x0010_0001, "", "A", None);
        builder.field(0x0001, "a");
        builder.override_field_list(2, 1);
        builder.type_def(0x0010_0001, "", "B", None);
        builder.override_field_list(3, 5);

        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(assembly.fields(typedef(2)).unwrap_err().is_malformed());
    }

    #[test]
    fn extends_missing_row() {
        let mut builder = ImageBuilder::new();
        builder.type_def(
            0x0010_0001,
            "",
            "Orphan",
            Some(TypeTarget::TypeRef(7)),
        );

        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(assembly.extends(typedef(2)).unwrap_err().is_malformed());
    }

    #[test]
    fn indirection() {
        let mut builder = ImageBuilder::new();
        builder.uncompressed();
        builder.type_def(0x0010_0001, "", "A", None);
        builder.field(0x0001, "a");
        builder.field(0x0001, "b");
        builder.field_ptr(2);
        builder.field_ptr(1);

        let assembly = Assembly::from_mem(builder.build()).unwrap();
        assert!(assembly.is_uncompressed());
        assert_eq!(
            assembly.fields(typedef(2)).unwrap(),
            vec![
                TableIndex::new(TableId::Field, 2),
                TableIndex::new(TableId::Field, 1)
            ]
        );
    }
}
