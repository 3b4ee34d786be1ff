//! [`Vfs`] backed by the real file system.

use std::fs;
use std::io;
use std::path::Path;

use super::Vfs;

/// Reads directly from disk through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsVfs;

impl FsVfs {
    pub fn new() -> Self {
        Self
    }
}

impl Vfs for FsVfs {
    fn read_file(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(Path::new(path))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let mut names = fs::read_dir(Path::new(path))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        // read_dir order is platform dependent
        names.sort();
        Ok(names)
    }

    fn is_path_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn is_path_exist(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}
