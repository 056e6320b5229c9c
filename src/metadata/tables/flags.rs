//! Attribute flags stored in table columns.

use bitflags::bitflags;

bitflags! {
    /// `TypeDef.flags` (ECMA-335 II.23.1.15)
    ///
    /// Visibility, layout and string format are multi-bit fields; compare them through
    /// [`TypeAttributes::visibility`], [`TypeAttributes::layout`] and
    /// [`TypeAttributes::string_format`] rather than with `contains`.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct TypeAttributes : u32 {
        /// Visibility mask
        const VISIBILITY_MASK = 0x0000_0007;
        /// Class has no public scope
        const NOT_PUBLIC = 0x0000_0000;
        /// Class has public scope
        const PUBLIC = 0x0000_0001;
        /// Nested, public
        const NESTED_PUBLIC = 0x0000_0002;
        /// Nested, private
        const NESTED_PRIVATE = 0x0000_0003;
        /// Nested, family
        const NESTED_FAMILY = 0x0000_0004;
        /// Nested, assembly
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Nested, family and assembly
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Nested, family or assembly
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;

        /// Layout mask
        const LAYOUT_MASK = 0x0000_0018;
        /// Fields are laid out by the runtime
        const AUTO_LAYOUT = 0x0000_0000;
        /// Fields are laid out in declaration order
        const SEQUENTIAL_LAYOUT = 0x0000_0008;
        /// Field offsets are given explicitly
        const EXPLICIT_LAYOUT = 0x0000_0010;

        /// Class semantics mask
        const CLASS_SEMANTICS_MASK = 0x0000_0020;
        /// Type is a class
        const CLASS = 0x0000_0000;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;

        /// Class is abstract
        const ABSTRACT = 0x0000_0080;
        /// Class cannot be extended
        const SEALED = 0x0000_0100;
        /// Name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Class is imported
        const IMPORT = 0x0000_1000;
        /// Class is serializable
        const SERIALIZABLE = 0x0000_2000;
        /// Windows Runtime type
        const WINDOWS_RUNTIME = 0x0000_4000;

        /// String format mask
        const STRING_FORMAT_MASK = 0x0003_0000;
        /// LPSTR is ANSI
        const ANSI_CLASS = 0x0000_0000;
        /// LPSTR is UNICODE
        const UNICODE_CLASS = 0x0001_0000;
        /// LPSTR is platform dependent
        const AUTO_CLASS = 0x0002_0000;
        /// Non-standard encoding
        const CUSTOM_FORMAT_CLASS = 0x0003_0000;
        /// Custom format mask
        const CUSTOM_FORMAT_MASK = 0x00C0_0000;

        /// Initialize the class before first static field access
        const BEFORE_FIELD_INIT = 0x0010_0000;
        /// Exported type forwarded to another assembly
        const FORWARDER = 0x0020_0000;

        /// Runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x0000_0800;
        /// Class has security information
        const HAS_SECURITY = 0x0004_0000;
    }
}

impl TypeAttributes {
    /// Interpret a raw `TypeDef.flags` value, keeping unknown bits.
    #[must_use]
    pub fn from_flags(flags: u32) -> TypeAttributes {
        TypeAttributes::from_bits_retain(flags)
    }

    /// Returns true for interfaces.
    #[must_use]
    pub fn is_interface(self) -> bool {
        self.bits() & TypeAttributes::CLASS_SEMANTICS_MASK.bits() == TypeAttributes::INTERFACE.bits()
    }

    /// The visibility field, one of `NOT_PUBLIC` ..= `NESTED_FAM_OR_ASSEM`.
    #[must_use]
    pub fn visibility(self) -> TypeAttributes {
        self & TypeAttributes::VISIBILITY_MASK
    }

    /// The layout field, one of `AUTO_LAYOUT`, `SEQUENTIAL_LAYOUT`, `EXPLICIT_LAYOUT`.
    #[must_use]
    pub fn layout(self) -> TypeAttributes {
        self & TypeAttributes::LAYOUT_MASK
    }

    /// The string format field, one of `ANSI_CLASS` ..= `CUSTOM_FORMAT_CLASS`.
    #[must_use]
    pub fn string_format(self) -> TypeAttributes {
        self & TypeAttributes::STRING_FORMAT_MASK
    }

    /// Returns true for types nested inside another type.
    #[must_use]
    pub fn is_nested(self) -> bool {
        self.visibility().bits() >= TypeAttributes::NESTED_PUBLIC.bits()
    }
}
