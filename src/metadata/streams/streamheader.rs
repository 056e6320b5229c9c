//! Stream headers of the metadata root (ECMA-335 II.24.2.2).
//!
//! Each header is `{offset: u32, size: u32, name}` where the name is NUL-terminated and padded
//! with zeros to the next 4-byte boundary.

use crate::{file::parser::Parser, metadata::streams::StreamKind, Result};

/// Longest stream name accepted, including the terminator.
const MAX_STREAM_NAME: usize = 32;

/// Location and name of one metadata stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name as stored, e.g. `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Read a header at the parser's position, leaving it on the following header.
    ///
    /// # Errors
    /// Returns an error if the header is truncated or its name is unterminated.
    pub fn read(parser: &mut Parser) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;
        let name = parser.read_string_utf8_bounded(MAX_STREAM_NAME)?;

        // The last header may end flush with the buffer
        if parser.align(4).is_err() {
            parser.advance_by(parser.len() - parser.pos())?;
        }

        Ok(StreamHeader { offset, size, name })
    }

    /// The recognized kind of this stream, `None` for names this library does not read.
    #[must_use]
    pub fn kind(&self) -> Option<StreamKind> {
        StreamKind::from_name(&self.name)
    }
}
