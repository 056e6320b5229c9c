//! The loaded assembly.
//!
//! [`Assembly`] is the single result of [`crate::load`]. Loading walks the image once:
//!
//! ```text
//! PE headers -> CLR header -> metadata root -> stream headers
//!            -> tables stream header -> TableInfo (widths) -> TableDirectory (offsets)
//! ```
//!
//! After that the layout is frozen. Every accessor decodes on demand from the backing bytes:
//! rows through [`Assembly::decode`], [`Assembly::row`] and [`Assembly::columns`], heap values
//! through [`Assembly::string`], [`Assembly::blob`], [`Assembly::guid`] and
//! [`Assembly::user_string`]. Cross-table navigation lives in [`crate::metadata::resolver`].
//!
//! # Thread Safety
//!
//! [`Assembly`] is [`Send`] and [`Sync`]. The only lazily built state, the interface index used
//! by [`Assembly::implements`], is published through a [`OnceLock`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmeta::{metadata::tables::TypeDefRow, Assembly};
//!
//! let assembly = Assembly::from_mem(std::fs::read("assembly.dll")?)?;
//! for rid in 1..=assembly.row_count(dotmeta::TableId::TypeDef) {
//!     let row = assembly.row::<TypeDefRow>(rid)?;
//!     println!("{}", assembly.string(row.type_name)?);
//! }
//! # Ok::<(), dotmeta::Error>(())
//! ```

use std::{collections::HashMap, fmt, ops::Range, sync::OnceLock};

use log::debug;

use crate::{
    file::{Backend, File},
    metadata::{
        cor20header::{Cor20Header, COR20_HEADER_SIZE},
        root::Root,
        streams::{Blob, Guid, StreamKind, Strings, TablesHeader, UserStrings},
        tables::{
            BlobIndex, ColumnValue, GuidIndex, Row, RowDefinition, RowReader, StringIndex,
            TableDirectory, TableId, TableIndex, TableInfo,
        },
    },
    Result,
};

/// `InterfaceImpl.class` row -> `InterfaceImpl` rows naming it, in table order.
pub(crate) type InterfaceIndex = HashMap<u32, Vec<u32>>;

/// A managed assembly with its metadata layout resolved.
pub struct Assembly {
    file: File,
    cor20: Cor20Header,
    root: Root,
    tables_header: TablesHeader,
    info: TableInfo,
    directory: TableDirectory,
    strings: Range<usize>,
    blobs: Range<usize>,
    guids: Range<usize>,
    user_strings: Range<usize>,
    uncompressed: bool,
    interfaces: OnceLock<InterfaceIndex>,
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("cor20", &self.cor20)
            .field("root", &self.root)
            .field("tables_header", &self.tables_header)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Assembly {
    /// Load an assembly from an in-memory buffer.
    ///
    /// # Errors
    /// See [`Assembly::from_backend`].
    pub fn from_mem(data: Vec<u8>) -> Result<Assembly> {
        Self::from_file(File::from_mem(data)?)
    }

    /// Load an assembly from any byte source.
    ///
    /// # Errors
    /// - [`crate::Error::NotSupported`] if the input is not a managed PE image
    /// - [`crate::Error::Malformed`] if any structure of the metadata is invalid
    pub fn from_backend(data: Box<dyn Backend>) -> Result<Assembly> {
        Self::from_file(File::from_backend(data)?)
    }

    /// Resolve the metadata of an already validated PE file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if any structure of the metadata is invalid.
    pub fn from_file(file: File) -> Result<Assembly> {
        let (clr_rva, clr_size) = file.clr();
        if clr_size < COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "CLR header directory too small - {} bytes",
                clr_size
            ));
        }

        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20 = Cor20Header::read(file.data_slice(clr_offset, COR20_HEADER_SIZE)?)?;

        let metadata_offset = file.rva_to_offset(cor20.meta_data_rva as usize)?;
        let metadata_size = cor20.meta_data_size as usize;
        let metadata = file.data_slice(metadata_offset, metadata_size)?;
        let root = Root::read(metadata)?;

        debug!(
            "metadata root {} at 0x{:x}, {} bytes, {} streams",
            root.version,
            metadata_offset,
            metadata_size,
            root.stream_headers.len()
        );

        let Some(tables_stream) = root.stream(StreamKind::Tables) else {
            return Err(malformed_error!("Metadata has no tables stream"));
        };

        // Root::read checked every stream against the metadata region
        let stream_range = |kind: StreamKind| -> Range<usize> {
            root.stream(kind).map_or(0..0, |header| {
                let start = metadata_offset + header.offset as usize;
                start..start + header.size as usize
            })
        };

        let tables = stream_range(StreamKind::Tables);
        let strings = stream_range(StreamKind::Strings);
        let blobs = stream_range(StreamKind::Blob);
        let guids = stream_range(StreamKind::Guid);
        let user_strings = stream_range(StreamKind::UserStrings);
        let uncompressed = tables_stream.name == "#-";

        let data = file.data();
        Strings::from(&data[strings.clone()])?;
        Blob::from(&data[blobs.clone()])?;
        Guid::from(&data[guids.clone()])?;
        UserStrings::from(&data[user_strings.clone()])?;

        let tables_header = TablesHeader::read(&data[tables.clone()])?;
        let info = TableInfo::from_header(&tables_header);
        let directory = TableDirectory::build(&info, tables.start + tables_header.size, tables.end)?;

        debug!(
            "tables stream {} v{}.{}, heap sizes 0x{:02x}, {} tables",
            tables_stream.name,
            tables_header.major_version,
            tables_header.minor_version,
            tables_header.heap_sizes,
            tables_header.table_count()
        );

        Ok(Assembly {
            file,
            cor20,
            root,
            tables_header,
            info,
            directory,
            strings,
            blobs,
            guids,
            user_strings,
            uncompressed,
            interfaces: OnceLock::new(),
        })
    }

    /// The underlying PE file.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// The CLR runtime header.
    #[must_use]
    pub fn cor20header(&self) -> &Cor20Header {
        &self.cor20
    }

    /// The metadata root with all stream headers.
    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The tables stream header.
    #[must_use]
    pub fn tables_header(&self) -> &TablesHeader {
        &self.tables_header
    }

    /// Resolved index, heap and row widths.
    #[must_use]
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    /// Row count and position of every table.
    #[must_use]
    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    /// Returns true if the tables stream is the uncompressed `#-` variant.
    #[must_use]
    pub fn is_uncompressed(&self) -> bool {
        self.uncompressed
    }

    /// Number of rows of `table`, 0 if the table is absent.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.directory.get(table).row_count
    }

    /// Decode a row of any table.
    ///
    /// # Errors
    /// Returns `Malformed` if the row is out of range, truncated, or holds an invalid coded
    /// index tag.
    pub fn decode(&self, index: TableIndex) -> Result<Row> {
        let data = self.row_data(index.table, index.row)?;
        Row::read(index.table, &mut RowReader::new(data, &self.info))
    }

    /// Decode row `rid` of the table `T` belongs to.
    ///
    /// # Errors
    /// See [`Assembly::decode`].
    pub fn row<T: RowDefinition>(&self, rid: u32) -> Result<T> {
        let data = self.row_data(T::TABLE, rid)?;
        T::read(&mut RowReader::new(data, &self.info))
    }

    /// Decode a row into untyped column values, in schema order.
    ///
    /// # Errors
    /// See [`Assembly::decode`].
    pub fn columns(&self, index: TableIndex) -> Result<Vec<ColumnValue>> {
        let data = self.row_data(index.table, index.row)?;
        let mut reader = RowReader::new(data, &self.info);

        index
            .table
            .columns()
            .iter()
            .map(|column| reader.read(column.kind))
            .collect()
    }

    /// The bytes of row `rid` of `table`.
    ///
    /// # Errors
    /// Returns `Malformed` if `rid` is 0 or beyond the row count.
    pub fn row_data(&self, table: TableId, rid: u32) -> Result<&[u8]> {
        let entry = self.directory.get(table);
        if rid == 0 || rid > entry.row_count {
            return Err(malformed_error!(
                "Row {} out of range for {} with {} rows",
                rid,
                table,
                entry.row_count
            ));
        }

        let width = self.info.row_width(table);
        self.file
            .data_slice(entry.ptr + (rid as usize - 1) * width, width)
    }

    /// The `#Strings` heap, empty if absent.
    #[must_use]
    pub fn strings(&self) -> Strings<'_> {
        Strings::from_valid(self.heap(&self.strings))
    }

    /// The `#Blob` heap, empty if absent.
    #[must_use]
    pub fn blobs(&self) -> Blob<'_> {
        Blob::from_valid(self.heap(&self.blobs))
    }

    /// The `#GUID` heap, empty if absent.
    #[must_use]
    pub fn guids(&self) -> Guid<'_> {
        Guid::from_valid(self.heap(&self.guids))
    }

    /// The `#US` heap, empty if absent.
    #[must_use]
    pub fn user_strings(&self) -> UserStrings<'_> {
        UserStrings::from_valid(self.heap(&self.user_strings))
    }

    /// Resolve a `#Strings` reference. Index 0 is the empty string.
    ///
    /// # Errors
    /// Returns `Malformed` if the index lies beyond the heap or the entry is not UTF-8.
    pub fn string(&self, index: StringIndex) -> Result<&str> {
        self.strings().get(index.0 as usize)
    }

    /// Resolve a `#Blob` reference. Index 0 is the empty blob.
    ///
    /// # Errors
    /// Returns `Malformed` if the index lies beyond the heap or the entry is truncated.
    pub fn blob(&self, index: BlobIndex) -> Result<&[u8]> {
        self.blobs().get(index.0 as usize)
    }

    /// Resolve a `#GUID` reference. Index 0 is `None`.
    ///
    /// # Errors
    /// Returns `Malformed` if the index lies beyond the heap.
    pub fn guid(&self, index: GuidIndex) -> Result<Option<uguid::Guid>> {
        self.guids().get(index.0 as usize)
    }

    /// Resolve a `#US` string literal by byte offset, e.g. the operand of `ldstr` masked to
    /// 24 bits. Offset 0 is the empty string.
    ///
    /// # Errors
    /// Returns `Malformed` if the offset lies beyond the heap or the entry is invalid.
    pub fn user_string(&self, offset: u32) -> Result<String> {
        self.user_strings().get(offset as usize)
    }

    pub(crate) fn interface_cache(&self) -> &OnceLock<InterfaceIndex> {
        &self.interfaces
    }

    fn heap(&self, range: &Range<usize>) -> &[u8] {
        // Ranges were sliced successfully during load
        self.file.data().get(range.clone()).unwrap_or_default()
    }
}
