//! Typed rows for all 45 metadata tables (ECMA-335 II.22).
//!
//! Each table is declared once, below, as a list of `field: Type => ColumnKind` entries. From
//! that single declaration the `metadata_tables!` macro generates:
//!
//! - the row struct (e.g. [`TypeDefRow`]),
//! - the static column schema returned by [`TableId::columns`],
//! - a [`RowDefinition`] impl, used by [`crate::Assembly::row`],
//! - a variant of the closed [`Row`] enum, used by [`crate::Assembly::decode`].
//!
//! Heap columns hold unresolved offsets ([`StringIndex`], [`BlobIndex`], [`GuidIndex`]); resolve
//! them through the owning [`crate::Assembly`].

use crate::{
    metadata::tables::{
        BlobIndex, CodedIndex,
        CodedIndexType::{
            CustomAttributeType, HasConstant, HasCustomAttribute, HasDeclSecurity,
            HasFieldMarshal, HasSemantics, Implementation, MemberForwarded, MemberRefParent,
            MethodDefOrRef, ResolutionScope, TypeDefOrRef, TypeOrMethodDef,
        },
        Column,
        ColumnKind::{Coded, Heap, List, Table, U16, U32, U8},
        GuidIndex,
        HeapKind::{Blob, Guid, Strings},
        RowReader, StringIndex, TableId,
    },
    Result,
};

/// A typed row of a specific table.
pub trait RowDefinition: Sized {
    /// The table this row belongs to.
    const TABLE: TableId;

    /// Decode one row, column by column.
    ///
    /// # Errors
    /// Returns `Malformed` if the row is truncated or holds an invalid coded index tag.
    fn read(reader: &mut RowReader) -> Result<Self>;
}

macro_rules! metadata_tables {
    ($(
        $(#[$meta:meta])*
        $table:ident => $row:ident {
            $( $(#[$field_meta:meta])* $field:ident : $ty:ty => $kind:expr ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq)]
            pub struct $row {
                $(
                    #[doc = concat!("`", stringify!($field), "` column")]
                    #[doc = ""]
                    $(#[$field_meta])*
                    pub $field: $ty,
                )*
            }

            impl RowDefinition for $row {
                const TABLE: TableId = TableId::$table;

                fn read(reader: &mut RowReader) -> Result<Self> {
                    Ok($row {
                        $( $field: reader.read_as::<$ty>($kind)?, )*
                    })
                }
            }
        )*

        impl TableId {
            /// The column schema of this table, in storage order.
            #[must_use]
            pub fn columns(self) -> &'static [Column] {
                match self {
                    $(
                        TableId::$table => {
                            const COLUMNS: &[Column] = &[
                                $( Column { name: stringify!($field), kind: $kind }, )*
                            ];
                            COLUMNS
                        }
                    )*
                }
            }
        }

        /// A decoded row of any table.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum Row {
            $(
                #[doc = concat!("A row of the `", stringify!($table), "` table")]
                $table($row),
            )*
        }

        impl Row {
            /// Decode a row of `table`.
            ///
            /// # Errors
            /// Returns `Malformed` if the row is truncated or holds an invalid coded index tag.
            pub fn read(table: TableId, reader: &mut RowReader) -> Result<Row> {
                Ok(match table {
                    $( TableId::$table => Row::$table($row::read(reader)?), )*
                })
            }

            /// The table this row belongs to.
            #[must_use]
            pub fn table(&self) -> TableId {
                match self {
                    $( Row::$table(_) => TableId::$table, )*
                }
            }
        }
    };
}

metadata_tables! {
    /// The single row describing the current module (II.22.30)
    Module => ModuleRow {
        /// Reserved, 0
        generation: u16 => U16,
        name: StringIndex => Heap(Strings),
        /// Module version id
        mvid: GuidIndex => Heap(Guid),
        enc_id: GuidIndex => Heap(Guid),
        enc_base_id: GuidIndex => Heap(Guid),
    }

    /// A reference to a type defined elsewhere (II.22.38)
    TypeRef => TypeRefRow {
        resolution_scope: CodedIndex => Coded(ResolutionScope),
        type_name: StringIndex => Heap(Strings),
        type_namespace: StringIndex => Heap(Strings),
    }

    /// A type defined in this module (II.22.37)
    TypeDef => TypeDefRow {
        /// `TypeAttributes`
        flags: u32 => U32,
        type_name: StringIndex => Heap(Strings),
        type_namespace: StringIndex => Heap(Strings),
        /// Base type, row 0 for none
        extends: CodedIndex => Coded(TypeDefOrRef),
        /// First field owned by this type
        field_list: u32 => List(TableId::Field),
        /// First method owned by this type
        method_list: u32 => List(TableId::MethodDef),
    }

    /// Field indirection (uncompressed streams only)
    FieldPtr => FieldPtrRow {
        field: u32 => Table(TableId::Field),
    }

    /// A field definition (II.22.15)
    Field => FieldRow {
        /// `FieldAttributes`
        flags: u16 => U16,
        name: StringIndex => Heap(Strings),
        signature: BlobIndex => Heap(Blob),
    }

    /// Method indirection (uncompressed streams only)
    MethodPtr => MethodPtrRow {
        method: u32 => Table(TableId::MethodDef),
    }

    /// A method definition (II.22.26)
    MethodDef => MethodDefRow {
        rva: u32 => U32,
        /// `MethodImplAttributes`
        impl_flags: u16 => U16,
        /// `MethodAttributes`
        flags: u16 => U16,
        name: StringIndex => Heap(Strings),
        signature: BlobIndex => Heap(Blob),
        /// First parameter owned by this method
        param_list: u32 => List(TableId::Param),
    }

    /// Parameter indirection (uncompressed streams only)
    ParamPtr => ParamPtrRow {
        param: u32 => Table(TableId::Param),
    }

    /// A method parameter (II.22.33)
    Param => ParamRow {
        /// `ParamAttributes`
        flags: u16 => U16,
        /// 0 for the return value
        sequence: u16 => U16,
        name: StringIndex => Heap(Strings),
    }

    /// An interface implemented by a type (II.22.23)
    InterfaceImpl => InterfaceImplRow {
        class: u32 => Table(TableId::TypeDef),
        interface: CodedIndex => Coded(TypeDefOrRef),
    }

    /// A reference to a field or method of another type (II.22.25)
    MemberRef => MemberRefRow {
        class: CodedIndex => Coded(MemberRefParent),
        name: StringIndex => Heap(Strings),
        signature: BlobIndex => Heap(Blob),
    }

    /// A compile-time constant (II.22.9)
    Constant => ConstantRow {
        /// `ELEMENT_TYPE_*`
        constant_type: u8 => U8,
        /// Always 0
        padding: u8 => U8,
        parent: CodedIndex => Coded(HasConstant),
        value: BlobIndex => Heap(Blob),
    }

    /// A custom attribute application (II.22.10)
    CustomAttribute => CustomAttributeRow {
        parent: CodedIndex => Coded(HasCustomAttribute),
        constructor: CodedIndex => Coded(CustomAttributeType),
        value: BlobIndex => Heap(Blob),
    }

    /// Marshalling information of a field or parameter (II.22.17)
    FieldMarshal => FieldMarshalRow {
        parent: CodedIndex => Coded(HasFieldMarshal),
        native_type: BlobIndex => Heap(Blob),
    }

    /// Declarative security (II.22.11)
    DeclSecurity => DeclSecurityRow {
        action: u16 => U16,
        parent: CodedIndex => Coded(HasDeclSecurity),
        permission_set: BlobIndex => Heap(Blob),
    }

    /// Explicit layout of a type (II.22.8)
    ClassLayout => ClassLayoutRow {
        packing_size: u16 => U16,
        class_size: u32 => U32,
        parent: u32 => Table(TableId::TypeDef),
    }

    /// Explicit offset of a field (II.22.16)
    FieldLayout => FieldLayoutRow {
        offset: u32 => U32,
        field: u32 => Table(TableId::Field),
    }

    /// A standalone signature (II.22.36)
    StandAloneSig => StandAloneSigRow {
        signature: BlobIndex => Heap(Blob),
    }

    /// Events owned by a type (II.22.12)
    EventMap => EventMapRow {
        parent: u32 => Table(TableId::TypeDef),
        event_list: u32 => List(TableId::Event),
    }

    /// Event indirection (uncompressed streams only)
    EventPtr => EventPtrRow {
        event: u32 => Table(TableId::Event),
    }

    /// An event definition (II.22.13)
    Event => EventRow {
        /// `EventAttributes`
        event_flags: u16 => U16,
        name: StringIndex => Heap(Strings),
        event_type: CodedIndex => Coded(TypeDefOrRef),
    }

    /// Properties owned by a type (II.22.35)
    PropertyMap => PropertyMapRow {
        parent: u32 => Table(TableId::TypeDef),
        property_list: u32 => List(TableId::Property),
    }

    /// Property indirection (uncompressed streams only)
    PropertyPtr => PropertyPtrRow {
        property: u32 => Table(TableId::Property),
    }

    /// A property definition (II.22.34)
    Property => PropertyRow {
        /// `PropertyAttributes`
        flags: u16 => U16,
        name: StringIndex => Heap(Strings),
        signature: BlobIndex => Heap(Blob),
    }

    /// Accessor methods of events and properties (II.22.28)
    MethodSemantics => MethodSemanticsRow {
        semantics: u16 => U16,
        method: u32 => Table(TableId::MethodDef),
        association: CodedIndex => Coded(HasSemantics),
    }

    /// An explicit method override (II.22.27)
    MethodImpl => MethodImplRow {
        class: u32 => Table(TableId::TypeDef),
        method_body: CodedIndex => Coded(MethodDefOrRef),
        method_declaration: CodedIndex => Coded(MethodDefOrRef),
    }

    /// A reference to another module (II.22.31)
    ModuleRef => ModuleRefRow {
        name: StringIndex => Heap(Strings),
    }

    /// A type specification (II.22.39)
    TypeSpec => TypeSpecRow {
        signature: BlobIndex => Heap(Blob),
    }

    /// A P/Invoke mapping (II.22.22)
    ImplMap => ImplMapRow {
        mapping_flags: u16 => U16,
        member_forwarded: CodedIndex => Coded(MemberForwarded),
        import_name: StringIndex => Heap(Strings),
        import_scope: u32 => Table(TableId::ModuleRef),
    }

    /// Initial data of a field (II.22.18)
    FieldRVA => FieldRvaRow {
        rva: u32 => U32,
        field: u32 => Table(TableId::Field),
    }

    /// Edit-and-continue log
    EncLog => EncLogRow {
        token: u32 => U32,
        func_code: u32 => U32,
    }

    /// Edit-and-continue token map
    EncMap => EncMapRow {
        token: u32 => U32,
    }

    /// The assembly manifest (II.22.2)
    Assembly => AssemblyRow {
        hash_alg_id: u32 => U32,
        major_version: u16 => U16,
        minor_version: u16 => U16,
        build_number: u16 => U16,
        revision_number: u16 => U16,
        /// `AssemblyFlags`
        flags: u32 => U32,
        public_key: BlobIndex => Heap(Blob),
        name: StringIndex => Heap(Strings),
        culture: StringIndex => Heap(Strings),
    }

    /// Unused, should be empty (II.22.4)
    AssemblyProcessor => AssemblyProcessorRow {
        processor: u32 => U32,
    }

    /// Unused, should be empty (II.22.3)
    AssemblyOS => AssemblyOsRow {
        os_platform_id: u32 => U32,
        os_major_version: u32 => U32,
        os_minor_version: u32 => U32,
    }

    /// A referenced assembly (II.22.5)
    AssemblyRef => AssemblyRefRow {
        major_version: u16 => U16,
        minor_version: u16 => U16,
        build_number: u16 => U16,
        revision_number: u16 => U16,
        flags: u32 => U32,
        public_key_or_token: BlobIndex => Heap(Blob),
        name: StringIndex => Heap(Strings),
        culture: StringIndex => Heap(Strings),
        hash_value: BlobIndex => Heap(Blob),
    }

    /// Unused, should be empty (II.22.7)
    AssemblyRefProcessor => AssemblyRefProcessorRow {
        processor: u32 => U32,
        assembly_ref: u32 => Table(TableId::AssemblyRef),
    }

    /// Unused, should be empty (II.22.6)
    AssemblyRefOS => AssemblyRefOsRow {
        os_platform_id: u32 => U32,
        os_major_version: u32 => U32,
        os_minor_version: u32 => U32,
        assembly_ref: u32 => Table(TableId::AssemblyRef),
    }

    /// A file of a multi-file assembly (II.22.19)
    File => FileRow {
        flags: u32 => U32,
        name: StringIndex => Heap(Strings),
        hash_value: BlobIndex => Heap(Blob),
    }

    /// A type exported from another module of the assembly (II.22.14)
    ExportedType => ExportedTypeRow {
        flags: u32 => U32,
        /// Hint into the target module's TypeDef table
        type_def_id: u32 => U32,
        type_name: StringIndex => Heap(Strings),
        type_namespace: StringIndex => Heap(Strings),
        implementation: CodedIndex => Coded(Implementation),
    }

    /// A managed resource (II.22.24)
    ManifestResource => ManifestResourceRow {
        offset: u32 => U32,
        flags: u32 => U32,
        name: StringIndex => Heap(Strings),
        /// Row 0 for a resource embedded in this file
        implementation: CodedIndex => Coded(Implementation),
    }

    /// Nesting of a type inside another (II.22.32)
    NestedClass => NestedClassRow {
        nested_class: u32 => Table(TableId::TypeDef),
        enclosing_class: u32 => Table(TableId::TypeDef),
    }

    /// A generic parameter of a type or method (II.22.20)
    GenericParam => GenericParamRow {
        number: u16 => U16,
        flags: u16 => U16,
        owner: CodedIndex => Coded(TypeOrMethodDef),
        name: StringIndex => Heap(Strings),
    }

    /// A generic method instantiation (II.22.29)
    MethodSpec => MethodSpecRow {
        method: CodedIndex => Coded(MethodDefOrRef),
        instantiation: BlobIndex => Heap(Blob),
    }

    /// A constraint on a generic parameter (II.22.21)
    GenericParamConstraint => GenericParamConstraintRow {
        owner: u32 => Table(TableId::GenericParam),
        constraint: CodedIndex => Coded(TypeDefOrRef),
    }
}
