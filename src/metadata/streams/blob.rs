//! The `#Blob` heap (ECMA-335 II.24.2.4).
//!
//! Signatures, public keys, custom attribute values and marshalling descriptors are stored as
//! blobs: a compressed unsigned length (1, 2 or 4 bytes) followed by that many bytes.

use crate::{file::parser::Parser, Result};

/// View over the `#Blob` heap.
#[derive(Clone, Copy)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wrap the bytes of a `#Blob` stream. An empty slice stands for an absent heap.
    ///
    /// # Errors
    /// Returns `Malformed` if a non-empty heap does not start with the empty blob.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.first().is_some_and(|first| *first != 0) {
            return Err(malformed_error!("#Blob heap does not start with a zero byte"));
        }

        Ok(Blob { data })
    }

    /// Wrap bytes that already passed [`Blob::from`].
    pub(crate) fn from_valid(data: &'a [u8]) -> Blob<'a> {
        Blob { data }
    }

    /// The blob starting at byte `index`, without its length prefix.
    ///
    /// # Errors
    /// Returns `Malformed` if `index` is beyond the heap, the length prefix is invalid, or the
    /// blob extends past the end of the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index == 0 {
            return Ok(&[]);
        }

        let Some(tail) = self.data.get(index..).filter(|tail| !tail.is_empty()) else {
            return Err(malformed_error!(
                "#Blob index {} beyond heap of {} bytes",
                index,
                self.data.len()
            ));
        };

        let mut parser = Parser::new(tail);
        let len = parser.read_compressed_uint()? as usize;
        let data_start = parser.pos();

        match data_start.checked_add(len) {
            Some(data_end) if data_end <= tail.len() => Ok(&tail[data_start..data_end]),
            _ => Err(malformed_error!(
                "Blob at index {} with length {} exceeds heap",
                index,
                len
            )),
        }
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for an absent or empty heap.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
