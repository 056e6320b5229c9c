//! Metadata streams and heaps (ECMA-335 II.24.2).
//!
//! A managed image stores its metadata as a handful of named streams behind the metadata root:
//!
//! - `#~` / `#-` - the tables stream, compressed or uncompressed ([`TablesHeader`])
//! - `#Strings` - NUL-terminated UTF-8 identifiers ([`Strings`])
//! - `#US` - length-prefixed UTF-16 literals ([`UserStrings`])
//! - `#Blob` - length-prefixed binary values ([`Blob`])
//! - `#GUID` - 16-byte GUIDs, addressed by 1-based index ([`Guid`])
//!
//! Heap views borrow the image and resolve values on demand; nothing is materialized up front.

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;
mod userstrings;

pub use blob::Blob;
pub use guid::Guid;
pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::TablesHeader;
pub use userstrings::UserStrings;

/// The streams this library reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `#~`, or its uncompressed variant `#-`
    Tables,
    /// `#Strings`
    Strings,
    /// `#US`
    UserStrings,
    /// `#Blob`
    Blob,
    /// `#GUID`
    Guid,
}

impl StreamKind {
    /// Number of distinct kinds.
    pub const COUNT: usize = 5;

    /// Classify a stream name, `None` if it is not one of the recognized streams.
    #[must_use]
    pub fn from_name(name: &str) -> Option<StreamKind> {
        match name {
            "#~" | "#-" => Some(StreamKind::Tables),
            "#Strings" => Some(StreamKind::Strings),
            "#US" => Some(StreamKind::UserStrings),
            "#Blob" => Some(StreamKind::Blob),
            "#GUID" => Some(StreamKind::Guid),
            _ => None,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}
