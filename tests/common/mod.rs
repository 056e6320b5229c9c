#![allow(dead_code)]

#[path = "../../src/test/builder.rs"]
pub mod builder;

pub use builder::{ImageBuilder, TypeTarget};

/// File offset of the metadata root in every built image.
pub const METADATA_OFFSET: usize = 0x200 + 72;

/// Position of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
        .expect("pattern not found")
}
