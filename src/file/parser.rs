//! Cursor-based binary parser for metadata structures.
//!
//! [`Parser`] keeps a position within a byte slice and offers bounds-checked, little-endian
//! reads plus the ECMA-335 compressed unsigned integer encoding (II.23.2) used by blob and
//! user string length prefixes.
//!
//! ```rust
//! use dotmeta::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! let first = parser.read_le::<u32>()?;
//! assert_eq!(first, 0x04030201);
//!
//! parser.seek(6)?;
//! assert_eq!(parser.read_le::<u16>()?, 0x0807);
//! # Ok::<(), dotmeta::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    Result,
};

/// A position-tracking reader over a byte slice.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move to an absolute position.
    ///
    /// # Errors
    /// Returns an error if `pos` is beyond the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move forward by `step` bytes.
    ///
    /// # Errors
    /// Returns an error if this would move past the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Current position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Align the position up to a multiple of `alignment`.
    ///
    /// # Errors
    /// Returns an error if the padding would move past the end of the data.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a little-endian value and advance past it.
    ///
    /// # Errors
    /// Returns an error if not enough data is left.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a compressed unsigned integer (1, 2 or 4 bytes, big-endian bit packing).
    ///
    /// # Errors
    /// Returns an error if the leading byte is not a valid encoding or data runs out.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a NUL-terminated string of at most `max` bytes, and consume the terminator.
    ///
    /// # Errors
    /// Returns an error if no terminator is found within `max` bytes.
    pub fn read_string_utf8_bounded(&mut self, max: usize) -> Result<String> {
        let start = self.position;
        let limit = self.data.len().min(start.saturating_add(max));

        let Some(len) = self.data[start..limit].iter().position(|byte| *byte == 0) else {
            return Err(malformed_error!(
                "Unterminated string at offset {} (limit {})",
                start,
                max
            ));
        };

        let value = String::from_utf8_lossy(&self.data[start..start + len]).into_owned();
        self.position = start + len + 1;
        Ok(value)
    }
}
