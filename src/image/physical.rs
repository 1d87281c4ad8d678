//! Memory-mapped file backend.
//!
//! [`Physical`] maps an image file into the address space of the process instead of
//! reading it up front. The mapping is read-only; writing metadata back replaces the file
//! on disk and maps it again.

use std::{fs, path::Path};

use memmap2::Mmap;

use super::{out_of_bounds, Backend};
use crate::{ErrorCode, Result};

/// Image data mapped from a file on disk.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data, `None` for empty files which cannot be mapped
    data: Option<Mmap>,
}

impl Physical {
    /// Create a new physical backend by memory-mapping the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if the file cannot be opened and
    /// [`crate::Error::Native`] with [`ErrorCode::DataSourceOpenFailed`] if mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        Self::from_file(&file)
    }

    /// Create a new physical backend from an opened file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::DataSourceOpenFailed`] if mapping
    /// fails.
    pub fn from_file(file: &fs::File) -> Result<Physical> {
        if file.metadata()?.len() == 0 {
            return Ok(Physical { data: None });
        }

        // SAFETY: the mapping is read-only; the crate never writes through it and replaces
        // the whole backend after rewriting the file.
        match unsafe { Mmap::map(file) } {
            Ok(mmap) => Ok(Physical { data: Some(mmap) }),
            Err(error) => Err(native_error!(
                ErrorCode::DataSourceOpenFailed,
                "Failed to map file: {}",
                error
            )),
        }
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.data();
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds(offset, len, data.len()));
        };

        if offset_end > data.len() {
            return Err(out_of_bounds(offset, len, data.len()));
        }

        Ok(&data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.data().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn physical() {
        let path = std::env::temp_dir().join(format!("metabind-physical-{}.bin", std::process::id()));
        fs::File::create(&path)
            .unwrap()
            .write_all(b"<?xpacket begin")
            .unwrap();

        let physical = Physical::new(&path).unwrap();
        assert_eq!(physical.len(), 15);
        assert_eq!(physical.data_slice(2, 7).unwrap(), b"xpacket");
        assert!(physical.data_slice(10, 10).is_err());
        assert!(physical.data_slice(usize::MAX, 2).is_err());

        drop(physical);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_file() {
        let path = std::env::temp_dir().join(format!("metabind-empty-{}.bin", std::process::id()));
        fs::File::create(&path).unwrap();

        let physical = Physical::new(&path).unwrap();
        assert_eq!(physical.len(), 0);
        assert!(physical.data().is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file() {
        let err = Physical::new("/this/file/does/not/exist").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
