//! The `#Strings` heap (ECMA-335 II.24.2.3).
//!
//! Identifiers (type, member and namespace names) are stored as NUL-terminated UTF-8 and are
//! addressed by byte offset. Offset 0 is always the empty string.

use std::ffi::CStr;

use crate::Result;

/// View over the `#Strings` heap.
///
/// ```rust
/// use dotmeta::metadata::streams::Strings;
///
/// let heap = Strings::from(b"\0Object\0System\0")?;
/// assert_eq!(heap.get(1)?, "Object");
/// assert_eq!(heap.get(8)?, "System");
/// # Ok::<(), dotmeta::Error>(())
/// ```
#[derive(Clone, Copy)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wrap the bytes of a `#Strings` stream. An empty slice stands for an absent heap.
    ///
    /// # Errors
    /// Returns `Malformed` if a non-empty heap does not start with the empty string.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.first().is_some_and(|first| *first != 0) {
            return Err(malformed_error!("#Strings heap does not start with a zero byte"));
        }

        Ok(Strings { data })
    }

    /// Wrap bytes that already passed [`Strings::from`].
    pub(crate) fn from_valid(data: &'a [u8]) -> Strings<'a> {
        Strings { data }
    }

    /// The string starting at byte `index`.
    ///
    /// # Errors
    /// Returns `Malformed` if `index` is beyond the heap, or if the string is unterminated or
    /// not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index == 0 {
            return Ok("");
        }

        let Some(tail) = self.data.get(index..).filter(|tail| !tail.is_empty()) else {
            return Err(malformed_error!(
                "#Strings index {} beyond heap of {} bytes",
                index,
                self.data.len()
            ));
        };

        CStr::from_bytes_until_nul(tail)
            .ok()
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| malformed_error!("Invalid string at index - {}", index))
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
