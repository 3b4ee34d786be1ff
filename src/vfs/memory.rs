//! In-memory [`Vfs`] used for unpacked tarballs and test fixtures.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use super::{paths, Vfs};

/// A file tree held entirely in memory.
///
/// Only files are stored; directories exist implicitly as prefixes of file
/// paths. Keys are normalized absolute paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryVfs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryVfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, returning `self` for chaining.
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.files.insert(paths::normalize(path), content.into());
    }

    fn dir_prefix(path: &str) -> String {
        let normalized = paths::normalize(path);
        if normalized.ends_with('/') {
            normalized
        } else {
            format!("{}/", normalized)
        }
    }
}

impl Vfs for MemoryVfs {
    fn read_file(&self, path: &str) -> io::Result<String> {
        let bytes = self.files.get(&paths::normalize(path)).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path))
        })?;
        String::from_utf8(bytes.clone()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        if !self.is_path_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path),
            ));
        }
        let prefix = Self::dir_prefix(path);
        let names: BTreeSet<String> = self
            .files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| key[prefix.len()..].split('/').next())
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }

    fn is_path_dir(&self, path: &str) -> bool {
        let prefix = Self::dir_prefix(path);
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }

    fn is_path_exist(&self, path: &str) -> bool {
        self.files.contains_key(&paths::normalize(path)) || self.is_path_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryVfs {
        MemoryVfs::new()
            .with_file("/pkg/package.json", "{}")
            .with_file("/pkg/alpha.js", "")
            .with_file("/pkg/dual-extension/index.js", "")
            .with_file("/pkg/dual-extension/index.mjs", "")
            .with_file("/pkg-other/index.js", "")
    }

    #[test]
    fn test_read_dir_lists_immediate_children() {
        let vfs = fixture();
        assert_eq!(
            vfs.read_dir("/pkg").unwrap(),
            vec!["alpha.js", "dual-extension", "package.json"]
        );
        assert_eq!(
            vfs.read_dir("/pkg/dual-extension/").unwrap(),
            vec!["index.js", "index.mjs"]
        );
    }

    #[test]
    fn test_directories_are_implicit() {
        let vfs = fixture();
        assert!(vfs.is_path_dir("/pkg/dual-extension"));
        assert!(!vfs.is_path_dir("/pkg/alpha.js"));
        assert!(vfs.is_path_exist("/pkg/alpha.js"));
        assert!(!vfs.is_path_exist("/pkg/missing.js"));
        assert!(vfs.read_dir("/pkg/missing").is_err());
    }

    #[test]
    fn test_read_file_errors() {
        let vfs = MemoryVfs::new().with_file("/pkg/bin", vec![0xff, 0xfe]);
        assert_eq!(
            vfs.read_file("/pkg/bin").unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        assert_eq!(
            vfs.read_file("/pkg/none").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
