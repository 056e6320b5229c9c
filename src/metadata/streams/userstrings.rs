//! The `#US` heap (ECMA-335 II.24.2.4).
//!
//! String literals used by `ldstr` are stored like blobs: a compressed length, followed by that
//! many bytes of UTF-16LE code units, followed by one trailing flag byte when the length is odd.

use widestring::U16Str;

use crate::{file::parser::Parser, Result};

/// View over the `#US` heap.
#[derive(Clone, Copy)]
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Wrap the bytes of a `#US` stream. An empty slice stands for an absent heap.
    ///
    /// # Errors
    /// Returns `Malformed` if a non-empty heap does not start with the empty entry.
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.first().is_some_and(|first| *first != 0) {
            return Err(malformed_error!("#US heap does not start with a zero byte"));
        }

        Ok(UserStrings { data })
    }

    /// Wrap bytes that already passed [`UserStrings::from`].
    pub(crate) fn from_valid(data: &'a [u8]) -> UserStrings<'a> {
        UserStrings { data }
    }

    /// The string literal starting at byte `index`.
    ///
    /// # Errors
    /// Returns `Malformed` if `index` is beyond the heap, the entry is truncated, or the code
    /// units are not valid UTF-16.
    pub fn get(&self, index: usize) -> Result<String> {
        if index == 0 {
            return Ok(String::new());
        }

        let Some(tail) = self.data.get(index..).filter(|tail| !tail.is_empty()) else {
            return Err(malformed_error!(
                "#US index {} beyond heap of {} bytes",
                index,
                self.data.len()
            ));
        };

        let mut parser = Parser::new(tail);
        let len = parser.read_compressed_uint()? as usize;
        let start = parser.pos();
        let Some(bytes) = start
            .checked_add(len)
            .and_then(|end| tail.get(start..end))
        else {
            return Err(malformed_error!(
                "User string at index {} with length {} exceeds heap",
                index,
                len
            ));
        };

        // The odd trailing byte flags special characters, it is not part of the text
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        U16Str::from_slice(&units)
            .to_string()
            .map_err(|_| malformed_error!("Invalid UTF-16 user string at index - {}", index))
    }
}
