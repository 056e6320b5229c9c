//! CLR runtime header (ECMA-335 II.25.3.3).
//!
//! The header sits behind the `IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR` data directory and is the
//! bridge from the PE container to the metadata root. Only the metadata location is required
//! for decoding; everything else is kept for display purposes.

use crate::{file::parser::Parser, Result};

/// Size in bytes of a CLR runtime header.
pub const COR20_HEADER_SIZE: usize = 72;

/// The CLR 2.0 runtime header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header in bytes, 72 for every known producer
    pub cb: u32,
    /// Minimum major runtime version required
    pub major_runtime_version: u16,
    /// Minor runtime version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata in bytes
    pub meta_data_size: u32,
    /// `COMIMAGE_FLAGS_*` runtime flags
    pub flags: u32,
    /// Token of the entry point method, or RVA of a native entry point
    pub entry_point_token: u32,
    /// RVA and size of the managed resources
    pub resources: (u32, u32),
    /// RVA and size of the strong name signature
    pub strong_name_signature: (u32, u32),
    /// RVA and size of the VTable fixups
    pub vtable_fixups: (u32, u32),
    /// RVA and size of the managed native header (ReadyToRun)
    pub managed_native_header: (u32, u32),
}

impl Cor20Header {
    /// Read a header from the start of `data`.
    ///
    /// # Errors
    /// Returns `Malformed` if fewer than 72 bytes are available, if `cb` is smaller than the
    /// header, or if the metadata location is empty.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if (cb as usize) < COR20_HEADER_SIZE {
            return Err(malformed_error!("Invalid CLR header size - {}", cb));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_rva == 0 || meta_data_size == 0 {
            return Err(malformed_error!(
                "Metadata directory is empty - rva: {}, size: {}",
                meta_data_rva,
                meta_data_size
            ));
        }

        let flags = parser.read_le::<u32>()?;
        let entry_point_token = parser.read_le::<u32>()?;
        let resources = (parser.read_le::<u32>()?, parser.read_le::<u32>()?);
        let strong_name_signature = (parser.read_le::<u32>()?, parser.read_le::<u32>()?);

        // CodeManagerTable, always zero
        parser.advance_by(8)?;

        let vtable_fixups = (parser.read_le::<u32>()?, parser.read_le::<u32>()?);

        // ExportAddressTableJumps, always zero
        parser.advance_by(8)?;

        let managed_native_header = (parser.read_le::<u32>()?, parser.read_le::<u32>()?);

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
            resources,
            strong_name_signature,
            vtable_fixups,
            managed_native_header,
        })
    }
}
