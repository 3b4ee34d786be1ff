//! Virtual file system used by the linter.
//!
//! The lint engine never touches the disk directly. Every read, directory
//! listing and existence probe goes through the [`Vfs`] trait so the same
//! checks run against a directory on disk ([`FsVfs`]), an unpacked tarball
//! or a test fixture ([`MemoryVfs`]).
//!
//! # Example
//!
//! ```
//! use publint::vfs::{MemoryVfs, Vfs};
//!
//! let vfs = MemoryVfs::new()
//!     .with_file("/pkg/package.json", r#"{"name": "demo"}"#)
//!     .with_file("/pkg/dist/index.js", "module.exports = 1");
//!
//! assert!(vfs.is_path_dir("/pkg/dist"));
//! assert_eq!(vfs.read_dir("/pkg").unwrap(), vec!["dist", "package.json"]);
//! ```

mod fs;
mod memory;
pub mod paths;

use std::io;

pub use fs::FsVfs;
pub use memory::MemoryVfs;

/// File system operations consumed by the lint engine.
///
/// Implementations must be shareable across the worker threads that run
/// independent checks, hence the `Send + Sync` bound. Path helpers have
/// posix defaults; implementations only need to provide I/O.
pub trait Vfs: Send + Sync {
    /// Reads a file as UTF-8 text. Missing files fail with
    /// [`io::ErrorKind::NotFound`], non UTF-8 content with
    /// [`io::ErrorKind::InvalidData`].
    fn read_file(&self, path: &str) -> io::Result<String>;

    /// Lists the basenames of a directory's entries in a stable order.
    fn read_dir(&self, path: &str) -> io::Result<Vec<String>>;

    /// Returns true if `path` is an existing directory.
    fn is_path_dir(&self, path: &str) -> bool;

    /// Returns true if `path` exists as a file or directory.
    fn is_path_exist(&self, path: &str) -> bool;

    fn path_join(&self, parts: &[&str]) -> String {
        paths::join(parts)
    }

    fn path_relative(&self, from: &str, to: &str) -> String {
        paths::relative(from, to)
    }

    fn get_dir_name(&self, path: &str) -> String {
        paths::dirname(path)
    }

    fn get_ext_name(&self, path: &str) -> String {
        paths::extname(path)
    }
}
