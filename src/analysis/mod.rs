//! Source and path analysis used by the lint checks.
//!
//! # Features
//!
//! - Detect whether source text is ESM, CommonJS, both, or neither
//! - Determine the format a path is expected to have from its extension
//!   and nearest `package.json`
//! - Expand `exports` wildcard patterns into concrete files
//!
//! # Example
//!
//! ```
//! use publint::analysis::{detect_format, expected_format, CodeFormat, ModuleFormat};
//! use publint::vfs::MemoryVfs;
//!
//! let vfs = MemoryVfs::new()
//!     .with_file("/pkg/package.json", r#"{"type": "module"}"#)
//!     .with_file("/pkg/index.js", "module.exports = {}");
//!
//! assert_eq!(detect_format("module.exports = {}"), CodeFormat::Cjs);
//! assert_eq!(expected_format("/pkg/index.js", &vfs), ModuleFormat::Esm);
//! ```

pub mod format;
pub mod glob;
pub mod path_format;

// Re-export main types for convenience
pub use format::{
    detect_format, is_explicit_extension, is_lintable_content, is_lintable_path, strip_comments,
    CodeFormat, ModuleFormat,
};
pub use glob::resolve_glob;
pub use path_format::expected_format;
