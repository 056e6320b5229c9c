//! In-memory byte sources.
//!
//! Owned buffers (`Vec<u8>`, `Arc<[u8]>`) and static slices are [`Backend`]s as they are;
//! [`Memory`] wraps any buffer into a cheaply shareable one.

use std::sync::Arc;

use super::Backend;
use crate::Result;

/// In-memory backend over an owned buffer.
#[derive(Debug)]
pub struct Memory {
    data: Arc<[u8]>,
}

impl Memory {
    /// Wrap an owned buffer.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Memory {
        Memory { data: data.into() }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Backend for Vec<u8> {
    fn data(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Backend for Arc<[u8]> {
    fn data(&self) -> &[u8] {
        self
    }
}

impl Backend for &'static [u8] {
    fn data(&self) -> &[u8] {
        self
    }
}
