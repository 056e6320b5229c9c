//! The `#GUID` heap (ECMA-335 II.24.2.5).
//!
//! A flat array of 16-byte GUIDs. Indices are 1-based; index 0 means "no GUID".

use crate::Result;

const GUID_SIZE: usize = 16;

/// View over the `#GUID` heap.
#[derive(Clone, Copy, Debug)]
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Wrap the bytes of a `#GUID` stream. An empty slice stands for an absent heap.
    ///
    /// # Errors
    /// Returns `Malformed` if the size is not a multiple of 16.
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % GUID_SIZE != 0 {
            return Err(malformed_error!(
                "#GUID heap size {} is not a multiple of {}",
                data.len(),
                GUID_SIZE
            ));
        }

        Ok(Guid { data })
    }

    /// Wrap bytes that already passed [`Guid::from`].
    pub(crate) fn from_valid(data: &'a [u8]) -> Guid<'a> {
        Guid { data }
    }

    /// The GUID at 1-based `index`, `None` for index 0.
    ///
    /// # Errors
    /// Returns `Malformed` if `index` is beyond the heap.
    pub fn get(&self, index: usize) -> Result<Option<uguid::Guid>> {
        if index == 0 {
            return Ok(None);
        }

        if index > self.count() {
            return Err(malformed_error!(
                "#GUID index {} beyond heap of {} entries",
                index,
                self.count()
            ));
        }

        let start = (index - 1) * GUID_SIZE;
        let mut buffer = [0_u8; GUID_SIZE];
        buffer.copy_from_slice(&self.data[start..start + GUID_SIZE]);

        Ok(Some(uguid::Guid::from_bytes(buffer)))
    }

    /// Number of GUIDs in the heap.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / GUID_SIZE
    }
}
