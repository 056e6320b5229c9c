//! Byte sources for the library: memory-mapped or read into memory.

use std::{fs, path::Path};

use dotmeta::{file::Backend, Result};
use memmap2::Mmap;

/// A read-only mapping of a whole file.
pub struct Mapped {
    data: Mmap,
}

impl Mapped {
    /// Map the file at `path`.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be opened or mapped.
    pub fn open(path: &Path) -> Result<Mapped> {
        let file = fs::File::open(path)?;
        // SAFETY: read-only mapping, the file is not modified while mapped
        let data = unsafe { Mmap::map(&file) }?;

        Ok(Mapped { data })
    }
}

impl Backend for Mapped {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

/// Open `path` as a byte source, mapped when `mmap` is set and the file is not empty.
///
/// # Errors
/// Returns [`Error::FileError`] if the file cannot be read.
pub fn open(path: &Path, mmap: bool) -> Result<Box<dyn Backend>> {
    let len = fs::metadata(path)?.len();

    // Empty files cannot be mapped on every platform
    if mmap && len > 0 {
        Ok(Box::new(Mapped::open(path)?))
    } else {
        Ok(Box::new(fs::read(path)?))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use dotmeta::Error;

    #[test]
    fn open_both_ways() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();

        let path = dir.join("data.bin");
        fs::File::create(&path).unwrap().write_all(b"MZ\x90\x00").unwrap();
        let empty = dir.join("empty.bin");
        fs::File::create(&empty).unwrap();

        assert_eq!(open(&path, true).unwrap().data(), b"MZ\x90\x00");
        assert_eq!(open(&path, false).unwrap().data(), b"MZ\x90\x00");
        assert!(open(&empty, true).unwrap().data().is_empty());
        assert!(matches!(
            open(&dir.join("missing.bin"), true),
            Err(Error::FileError(_))
        ));
    }
}
