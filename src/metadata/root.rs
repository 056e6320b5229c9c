//! Metadata root header and stream directory (ECMA-335 II.24.2.1).
//!
//! The root starts with the `BSJB` signature, followed by a length-prefixed version string and
//! the stream headers. [`Root::read`] checks every stream extent against the metadata region and
//! classifies the names it knows; everything else is logged and ignored.
//!
//! # Example
//!
//! ```rust
//! use dotmeta::metadata::{root::Root, streams::StreamKind};
//!
//! let root = Root::read(&[
//!     0x42, 0x53, 0x4A, 0x42,
//!     0x01, 0x00,
//!     0x01, 0x00,
//!     0x00, 0x00, 0x00, 0x00,
//!     0x04, 0x00, 0x00, 0x00,
//!     b'v', b'4', 0x00, 0x00,
//!     0x00, 0x00,
//!     0x01, 0x00,
//!     0x24, 0x00, 0x00, 0x00,
//!     0x04, 0x00, 0x00, 0x00,
//!     0x23, 0x7E, 0x00, 0x00,
//!     0x00, 0x00, 0x00, 0x00,
//! ])?;
//!
//! assert_eq!(root.version, "v4");
//! assert!(root.stream(StreamKind::Tables).is_some());
//! # Ok::<(), dotmeta::Error>(())
//! ```

use log::{trace, warn};

use crate::{
    file::parser::Parser,
    metadata::streams::{StreamHeader, StreamKind},
    Result,
};

/// `BSJB`
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// The metadata root.
#[derive(Debug, Clone)]
pub struct Root {
    /// Major version, 1 for every known producer
    pub major_version: u16,
    /// Minor version, 1 for every known producer
    pub minor_version: u16,
    /// Runtime version string, e.g. `v4.0.30319`, with its padding removed
    pub version: String,
    /// Reserved flags
    pub flags: u16,
    /// All stream headers in file order, recognized or not
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Read the metadata root from the start of the metadata region.
    ///
    /// # Errors
    /// Returns `Malformed` if the signature does not match, a header is truncated, a stream
    /// lies outside `data`, or a recognized stream appears twice.
    pub fn read(data: &[u8]) -> Result<Root> {
        let mut parser = Parser::new(data);

        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - 0x{:08X}",
                signature
            ));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let _reserved = parser.read_le::<u32>()?;

        let version_length = parser.read_le::<u32>()? as usize;
        let version_start = parser.pos();
        let Some(version_bytes) = version_start
            .checked_add(version_length)
            .and_then(|version_end| data.get(version_start..version_end))
        else {
            return Err(malformed_error!(
                "Version string length exceeds metadata - {}",
                version_length
            ));
        };

        let version_end = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_end]).into_owned();
        parser.advance_by(version_length)?;

        let flags = parser.read_le::<u16>()?;
        let stream_count = parser.read_le::<u16>()?;

        let mut stream_headers = Vec::with_capacity(usize::from(stream_count));
        let mut seen = [false; StreamKind::COUNT];
        for _ in 0..stream_count {
            let header = StreamHeader::read(&mut parser)?;

            match header.offset.checked_add(header.size) {
                Some(end) if end as usize <= data.len() => {}
                _ => {
                    return Err(malformed_error!(
                        "Stream '{}' exceeds metadata - offset: {}, size: {}, metadata: {}",
                        header.name,
                        header.offset,
                        header.size,
                        data.len()
                    ))
                }
            }

            match header.kind() {
                Some(kind) => {
                    if seen[kind.slot()] {
                        return Err(malformed_error!("Duplicate stream - {}", header.name));
                    }
                    seen[kind.slot()] = true;
                    trace!(
                        "stream {} at offset {} ({} bytes)",
                        header.name,
                        header.offset,
                        header.size
                    );
                }
                None => warn!("Ignoring unrecognized stream '{}'", header.name),
            }

            stream_headers.push(header);
        }

        Ok(Root {
            major_version,
            minor_version,
            version,
            flags,
            stream_headers,
        })
    }

    /// The header of a recognized stream, if present.
    #[must_use]
    pub fn stream(&self, kind: StreamKind) -> Option<&StreamHeader> {
        self.stream_headers
            .iter()
            .find(|header| header.kind() == Some(kind))
    }
}
