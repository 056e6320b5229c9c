use std::fmt;

use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Identifiers of the metadata tables defined by ECMA-335 II.22.
///
/// The discriminant is the table number used in the `valid` bitmask of the tables stream and in
/// the high byte of a metadata token.
///
/// ## Table Categories
///
/// ### Core Type System
/// - **`Module`**, **`TypeRef`**, **`TypeDef`**, **`Field`**, **`MethodDef`**, **`Param`**
///
/// ### Indirection (uncompressed `#-` streams only)
/// - **`FieldPtr`**, **`MethodPtr`**, **`ParamPtr`**, **`EventPtr`**, **`PropertyPtr`**
///
/// ### Type Relationships
/// - **`InterfaceImpl`**, **`NestedClass`**, **`ClassLayout`**, **`FieldLayout`**
///
/// ### Members, Attributes and Signatures
/// - **`MemberRef`**, **`MethodImpl`**, **`MethodSemantics`**, **`CustomAttribute`**,
///   **`Constant`**, **`FieldMarshal`**, **`DeclSecurity`**, **`StandAloneSig`**,
///   **`TypeSpec`**, **`MethodSpec`**, **`GenericParam`**, **`GenericParamConstraint`**
///
/// ### Events and Properties
/// - **`EventMap`**, **`Event`**, **`PropertyMap`**, **`Property`**
///
/// ### Assembly Manifest
/// - **`Assembly`**, **`AssemblyProcessor`**, **`AssemblyOS`**, **`AssemblyRef`**,
///   **`AssemblyRefProcessor`**, **`AssemblyRefOS`**, **`File`**, **`ExportedType`**,
///   **`ManifestResource`**
///
/// ### Platform Interop and Edit-and-Continue
/// - **`ModuleRef`**, **`ImplMap`**, **`FieldRVA`**, **`EncLog`**, **`EncMap`**
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, EnumIter, EnumCount)]
#[repr(u8)]
pub enum TableId {
    /// `Module` table (0x00)
    Module = 0x00,
    /// `TypeRef` table (0x01)
    TypeRef = 0x01,
    /// `TypeDef` table (0x02)
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03)
    FieldPtr = 0x03,
    /// `Field` table (0x04)
    Field = 0x04,
    /// `MethodPtr` table (0x05)
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06)
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07)
    ParamPtr = 0x07,
    /// `Param` table (0x08)
    Param = 0x08,
    /// `InterfaceImpl` table (0x09)
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A)
    MemberRef = 0x0A,
    /// `Constant` table (0x0B)
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C)
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D)
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E)
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F)
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10)
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11)
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12)
    EventMap = 0x12,
    /// `EventPtr` table (0x13)
    EventPtr = 0x13,
    /// `Event` table (0x14)
    Event = 0x14,
    /// `PropertyMap` table (0x15)
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16)
    PropertyPtr = 0x16,
    /// `Property` table (0x17)
    Property = 0x17,
    /// `MethodSemantics` table (0x18)
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19)
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A)
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B)
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C)
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D)
    FieldRVA = 0x1D,
    /// `EncLog` table (0x1E)
    EncLog = 0x1E,
    /// `EncMap` table (0x1F)
    EncMap = 0x1F,
    /// `Assembly` table (0x20)
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21)
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22)
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (0x23)
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24)
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25)
    AssemblyRefOS = 0x25,
    /// `File` table (0x26)
    File = 0x26,
    /// `ExportedType` table (0x27)
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28)
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29)
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A)
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B)
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C)
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Look up a table by its number.
    #[must_use]
    pub fn from_id(id: u8) -> Option<TableId> {
        TableId::iter().nth(usize::from(id))
    }

    /// The `*Ptr` table that may stand between list columns and this table.
    ///
    /// Only uncompressed (`#-`) streams carry these; when present, owned ranges index the
    /// pointer table and each pointer row names the actual target row.
    #[must_use]
    pub fn indirection(self) -> Option<TableId> {
        match self {
            TableId::Field => Some(TableId::FieldPtr),
            TableId::MethodDef => Some(TableId::MethodPtr),
            TableId::Param => Some(TableId::ParamPtr),
            TableId::Event => Some(TableId::EventPtr),
            TableId::Property => Some(TableId::PropertyPtr),
            _ => None,
        }
    }

    /// The high byte of tokens referring to rows of this table, already shifted into place.
    #[must_use]
    pub fn token_prefix(self) -> u32 {
        (self as u32) << 24
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids() {
        assert_eq!(TableId::COUNT, 45);

        for (expected, table) in TableId::iter().enumerate() {
            assert_eq!(table as usize, expected);
            assert_eq!(TableId::from_id(table as u8), Some(table));
        }

        assert_eq!(TableId::from_id(0x2D), None);
        assert_eq!(TableId::from_id(0xFF), None);
    }

    #[test]
    fn token_prefix() {
        assert_eq!(TableId::Module.token_prefix(), 0);
        assert_eq!(TableId::TypeDef.token_prefix(), 0x0200_0000);
        assert_eq!(TableId::GenericParamConstraint.token_prefix(), 0x2C00_0000);
        assert_eq!(TableId::FieldRVA.to_string(), "FieldRVA");
    }

    #[test]
    fn indirection() {
        assert_eq!(TableId::Field.indirection(), Some(TableId::FieldPtr));
        assert_eq!(TableId::Param.indirection(), Some(TableId::ParamPtr));
        assert_eq!(TableId::TypeDef.indirection(), None);
        assert_eq!(TableId::FieldPtr.indirection(), None);
    }
}
