//! PE container access for .NET binaries.
//!
//! This module validates the outer Portable Executable container and locates the CLR runtime
//! header that points at the metadata. The PE headers are parsed once with `goblin`; only the
//! section table and the CLR data directory are kept alongside the owned bytes.
//!
//! # Data Sources
//!
//! Bytes are supplied through the [`Backend`] trait. The library ships implementations for
//! in-memory buffers ([`memory::Memory`], `Vec<u8>`, `Arc<[u8]>`, `&'static [u8]`); callers
//! can bring their own (for instance a memory-mapped file) without the library ever touching
//! the filesystem.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmeta::File;
//!
//! let data = std::fs::read("assembly.dll")?;
//! let file = File::from_mem(data)?;
//!
//! let (clr_rva, clr_size) = file.clr();
//! println!("CLR header at RVA 0x{:x}, size: {} bytes", clr_rva, clr_size);
//! # Ok::<(), dotmeta::Error>(())
//! ```

pub mod io;
pub mod memory;
pub mod parser;

use goblin::pe::{section_table::SectionTable, PE};
use log::trace;

use crate::{file::io::read_le, Error::NotSupported, Result};

/// 'MZ'
const DOS_MAGIC: u16 = 0x5A4D;
/// 'PE\0\0'
const PE_MAGIC: u32 = 0x0000_4550;
/// Offset of `e_lfanew` inside the DOS header
const PE_POINTER_OFFSET: usize = 0x3C;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of PE data, allowing for both in-memory and
/// caller-provided representations. All implementations must be thread-safe, and the complete
/// content must be resident: decoding performs random access and never streams.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.data();
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        data.get(offset..offset_end)
            .ok_or_else(|| out_of_bounds_error!())
    }

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize {
        self.data().len()
    }
}

/// A section header reduced to what address translation needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section {
    /// RVA of the first byte of the section when loaded
    pub virtual_address: u32,
    /// Size of the section when loaded
    pub virtual_size: u32,
    /// File offset of the section's raw data
    pub pointer_to_raw_data: u32,
    /// Size of the section's raw data in the file
    pub size_of_raw_data: u32,
}

impl From<&SectionTable> for Section {
    fn from(section: &SectionTable) -> Self {
        Section {
            virtual_address: section.virtual_address,
            virtual_size: section.virtual_size,
            pointer_to_raw_data: section.pointer_to_raw_data,
            size_of_raw_data: section.size_of_raw_data,
        }
    }
}

/// Represents a loaded PE file that carries a CLR runtime header.
///
/// Construction fails with [`crate::Error::NotSupported`] for anything that is not a managed PE
/// image, and with [`crate::Error::Malformed`] when the headers are recognized but damaged.
pub struct File {
    data: Box<dyn Backend>,
    image_base: u64,
    sections: Vec<Section>,
    clr_rva: u32,
    clr_size: u32,
}

impl File {
    /// Load a PE file from an in-memory buffer.
    ///
    /// # Errors
    /// See [`File::from_backend`].
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        Self::from_backend(Box::new(data))
    }

    /// Load a PE file from any data source.
    ///
    /// # Errors
    /// - [`crate::Error::NotSupported`] if the DOS or PE signature does not match, or if the
    ///   image has no CLR runtime header
    /// - [`crate::Error::Malformed`] if the PE headers cannot be parsed
    pub fn from_backend(data: Box<dyn Backend>) -> Result<File> {
        let bytes = data.data();
        if !Self::has_pe_signature(bytes) {
            return Err(NotSupported);
        }

        let pe = PE::parse(bytes)?;
        let Some(optional_header) = pe.header.optional_header else {
            return Err(NotSupported);
        };

        let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() else {
            return Err(NotSupported);
        };

        let (clr_rva, clr_size) = (clr_dir.virtual_address, clr_dir.size);
        if clr_rva == 0 || clr_size == 0 {
            return Err(NotSupported);
        }

        let sections: Vec<Section> = pe.sections.iter().map(Section::from).collect();
        trace!(
            "PE image with {} sections, CLR header at RVA 0x{:x} ({} bytes)",
            sections.len(),
            clr_rva,
            clr_size
        );

        let image_base = pe.image_base;
        drop(pe);

        Ok(File {
            data,
            image_base,
            sections,
            clr_rva,
            clr_size,
        })
    }

    /// Checks the DOS `MZ` signature and the `PE\0\0` signature it points at.
    fn has_pe_signature(data: &[u8]) -> bool {
        if data.len() < 0x40 || read_le::<u16>(data).ok() != Some(DOS_MAGIC) {
            return false;
        }

        let Ok(pe_pointer) = read_le::<u32>(&data[PE_POINTER_OFFSET..]) else {
            return false;
        };

        data.get(pe_pointer as usize..)
            .and_then(|pe_header| read_le::<u32>(pe_header).ok())
            == Some(PE_MAGIC)
    }

    /// Size of the loaded image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image is empty (never the case for a successfully loaded file).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// The preferred load address from the optional header.
    #[must_use]
    pub fn imagebase(&self) -> u64 {
        self.image_base
    }

    /// RVA and size of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        (self.clr_rva as usize, self.clr_size as usize)
    }

    /// The section table.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The complete image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Bounds-checked access to a region of the image.
    ///
    /// # Errors
    /// Returns an error if the region does not lie fully within the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Translate a relative virtual address into a file offset.
    ///
    /// # Errors
    /// Returns an error if no section contains `rva`.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        let rva_u32 =
            u32::try_from(rva).map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

        for section in &self.sections {
            let extent = section.virtual_size.max(section.size_of_raw_data);
            let Some(section_max) = section.virtual_address.checked_add(extent) else {
                return Err(malformed_error!(
                    "Section malformed, causing integer overflow - {} + {}",
                    section.virtual_address,
                    extent
                ));
            };

            if section.virtual_address <= rva_u32 && rva_u32 < section_max {
                return Ok((rva - section.virtual_address as usize)
                    + section.pointer_to_raw_data as usize);
            }
        }

        Err(malformed_error!(
            "RVA could not be converted to offset - {}",
            rva
        ))
    }
}
