use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Decoding distinguishes exactly two outcomes for bad input:
///
/// - [`Error::NotSupported`] - the input is not a managed PE image at all. Batch callers are
///   expected to skip such inputs and move on.
/// - [`Error::Malformed`] - the input is a managed PE image, but a structural invariant of the
///   metadata was violated somewhere downstream (truncated stream, invalid coded index tag,
///   inverted owned range, ...). This is never a panic, and never retried.
///
/// # Examples
///
/// ```rust,no_run
/// use dotmeta::Error;
///
/// let data = std::fs::read("assembly.dll")?;
/// match dotmeta::load(data) {
///     Ok(assembly) => println!("{} types", assembly.row_count(dotmeta::TableId::TypeDef)),
///     Err(Error::NotSupported) => eprintln!("not a .NET assembly"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed metadata: {} ({}:{})", message, file, line)
///     }
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// This file type is not supported.
    ///
    /// Returned when the outer container signature does not match (no `MZ` / `PE\0\0`), or when
    /// the PE image carries no CLR runtime header. Recoverable: the input is simply not a
    /// managed assembly.
    #[error("This file type is not supported")]
    NotSupported,

    /// The file is damaged and could not be parsed.
    ///
    /// This error indicates that the container was recognized but its metadata does not
    /// conform to ECMA-335. The error includes the source location where the malformation was
    /// detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    ///
    /// Only produced by byte sources handed to [`crate::scan`]; decoding itself never touches
    /// the filesystem.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures, such as an invalid configuration value.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns true for the "not this container format" sentinel.
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported)
    }

    /// Returns true for the "this format, but structurally invalid" sentinel.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Malformed { .. })
    }
}

impl From<goblin::error::Error> for Error {
    fn from(error: goblin::error::Error) -> Self {
        // Signatures are checked before goblin runs, so anything it rejects is damaged
        malformed_error!("PE headers could not be parsed - {}", error)
    }
}
