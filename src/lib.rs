//! publint - lints npm package publishing metadata
//!
//! This crate checks that a package's `package.json` entry points
//! (`main`, `module`, `exports`, `types`, `browser`, ...) point at files
//! that exist, are published and are written in the module format
//! Node.js and bundlers will interpret them as.

pub mod analysis;
pub mod lint;
pub mod pack;
pub mod parser;
pub mod report;
pub mod vfs;

pub use lint::{lint, lint_tarball, LintError, LintOptions, LintResult, Message, MessageCode, Severity};
