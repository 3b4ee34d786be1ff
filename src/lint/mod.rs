//! The lint engine.
//!
//! [`lint`] reads a package's manifest through a [`Vfs`], runs every
//! independent check concurrently on a rayon scope and returns the
//! filtered, sorted diagnostics.
//!
//! # Example
//!
//! ```
//! use publint::lint::{lint, LintOptions, MessageCode};
//! use publint::vfs::MemoryVfs;
//!
//! let vfs = MemoryVfs::new()
//!     .with_file("/pkg/package.json", r#"{"name": "demo"}"#)
//!     .with_file("/pkg/index.js", "export default 1");
//!
//! let result = lint(&vfs, &LintOptions::new("/pkg")).unwrap();
//! assert_eq!(result.messages.len(), 1);
//! assert_eq!(result.messages[0].code, MessageCode::ImplicitIndexJsInvalidFormat);
//! ```

pub mod conditions;
pub mod diagnostics;
mod exports;
mod fields;
pub mod message;
mod types;

use std::io;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{
    detect_format, expected_format, is_explicit_extension, is_lintable_content, is_lintable_path,
    CodeFormat, ModuleFormat,
};
use crate::pack::archive;
use crate::parser::{self, ExportsNode, PackageJson, ParseError};
use crate::vfs::{paths, MemoryVfs, Vfs};

pub use diagnostics::Diagnostics;
pub use message::{format_path, Message, MessageCode, Severity};

/// Fatal failures that abort a lint run.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("no package.json found at {path}")]
    ManifestNotFound { path: String },

    #[error("failed to parse {path}: {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read package tarball: {0}")]
    Archive(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, LintError>;

/// Failure of a single check. Logged and isolated from sibling checks.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

pub(crate) type CheckResult<T = ()> = std::result::Result<T, CheckError>;

/// Options for a lint run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOptions {
    /// Package directory inside the VFS.
    pub pkg_dir: String,
    /// Minimum severity to report.
    pub level: Severity,
    /// Report warnings as errors.
    pub strict: bool,
    /// Files that would be published, relative to `pkg_dir` or absolute.
    /// `None` treats every file on disk as published.
    pub packed_files: Option<Vec<String>>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            pkg_dir: "/".to_string(),
            level: Severity::Suggestion,
            strict: false,
            packed_files: None,
        }
    }
}

impl LintOptions {
    pub fn new(pkg_dir: impl Into<String>) -> Self {
        Self {
            pkg_dir: pkg_dir.into(),
            ..Self::default()
        }
    }
}

/// Result of a lint run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintResult {
    pub messages: Vec<Message>,
}

impl LintResult {
    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

/// Lints the package at `options.pkg_dir`.
///
/// Only a missing or unparsable root manifest fails the run. Everything
/// else surfaces as diagnostics, and a check that fails unexpectedly is
/// logged without affecting the others.
pub fn lint(vfs: &dyn Vfs, options: &LintOptions) -> Result<LintResult> {
    let pkg_dir = paths::normalize(&options.pkg_dir);
    let manifest_path = vfs.path_join(&[&pkg_dir, "package.json"]);
    let content = vfs.read_file(&manifest_path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LintError::ManifestNotFound {
                path: manifest_path.clone(),
            }
        } else {
            LintError::Io {
                path: manifest_path.clone(),
                source,
            }
        }
    })?;
    let pkg = parser::parse_str(&content).map_err(|source| LintError::ManifestParse {
        path: manifest_path.clone(),
        source,
    })?;

    let packed_files = options.packed_files.as_ref().map(|files| {
        let mut absolute: Vec<String> = files
            .iter()
            .map(|f| {
                if f.starts_with('/') {
                    paths::normalize(f)
                } else {
                    vfs.path_join(&[&pkg_dir, f])
                }
            })
            .collect();
        absolute.sort();
        absolute.dedup();
        absolute
    });

    let diagnostics = Diagnostics::new();
    let ctx = Context::new(vfs, &pkg_dir, &pkg, packed_files, &diagnostics);

    debug!(pkg_dir = %pkg_dir, name = ?pkg.name(), "linting package");
    rayon::scope(|s| {
        let ctx = &ctx;
        s.spawn(move |_| run_check("implicit-index", || fields::check_implicit_index(ctx)));
        s.spawn(move |_| run_check("main", || fields::check_main(ctx)));
        s.spawn(move |_| run_check("module", || fields::check_module(ctx)));
        s.spawn(move |_| run_check("known-fields", || fields::check_known_fields(ctx)));
        s.spawn(move |_| run_check("browser", || fields::check_browser(ctx)));
        s.spawn(move |_| run_check("no-exports-scan", || fields::check_unexported_files(ctx)));
        s.spawn(move |_| run_check("repository", || fields::check_repository(ctx)));
        s.spawn(move |_| run_check("package-hints", || fields::check_package_hints(ctx)));
        s.spawn(move |_| run_check("types-exported", || types::check_types_exported(ctx)));
        exports::walk_exports_field(ctx, s);
    });

    let collected = diagnostics.len();
    let messages = diagnostics.finalize(options.level, options.strict);
    info!(
        name = ?pkg.name(),
        collected,
        reported = messages.len(),
        "lint finished"
    );
    Ok(LintResult { messages })
}

/// Lints a gzipped package tarball. The single top-level directory of the
/// archive is mounted at `options.pkg_dir` and every file in it counts as
/// published.
pub fn lint_tarball(bytes: &[u8], options: &LintOptions) -> Result<LintResult> {
    let pkg_dir = paths::normalize(&options.pkg_dir);
    let entries = archive::read_tarball(bytes).map_err(LintError::Archive)?;
    let mut vfs = MemoryVfs::new();
    let mut packed = Vec::with_capacity(entries.len());
    for (rel, content) in entries {
        vfs.insert(&paths::join(&[&pkg_dir, &rel]), content);
        packed.push(rel);
    }
    debug!(files = packed.len(), "unpacked tarball");

    let options = LintOptions {
        pkg_dir,
        packed_files: Some(packed),
        ..options.clone()
    };
    lint(&vfs, &options)
}

fn run_check(name: &'static str, check: impl FnOnce() -> CheckResult) {
    debug!(check = name, "running check");
    if let Err(err) = check() {
        warn!(check = name, error = %err, "check failed");
    }
}

/// A file referenced from the manifest that exists and is published.
#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub path: String,
    /// `None` when the file is not valid UTF-8.
    pub content: Option<String>,
}

/// Shared state of one lint run.
pub(crate) struct Context<'a> {
    pub vfs: &'a dyn Vfs,
    pub pkg_dir: &'a str,
    pub pkg: &'a PackageJson,
    /// Absolute and sorted.
    pub packed_files: Option<Vec<String>>,
    pub diagnostics: &'a Diagnostics,
    /// The published `exports` tree and its manifest path.
    pub exports: Option<(ExportsNode, Vec<String>)>,
}

impl<'a> Context<'a> {
    pub fn new(
        vfs: &'a dyn Vfs,
        pkg_dir: &'a str,
        pkg: &'a PackageJson,
        packed_files: Option<Vec<String>>,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        let exports = pkg
            .published_field("exports")
            .map(|(value, path)| (ExportsNode::from_json(value), path));
        Self {
            vfs,
            pkg_dir,
            pkg,
            packed_files,
            diagnostics,
            exports,
        }
    }

    pub fn has_exports(&self) -> bool {
        self.exports.is_some()
    }

    pub fn report(&self, message: Message) {
        self.diagnostics.push(message);
    }

    /// Absolute path of a manifest-relative value such as `./dist/a.js`.
    pub fn resolve_path(&self, value: &str) -> String {
        self.vfs.path_join(&[self.pkg_dir, value])
    }

    /// `./`-prefixed path of `file` relative to the package root.
    pub fn display_path(&self, file: &str) -> String {
        format!("./{}", self.vfs.path_relative(self.pkg_dir, file))
    }

    pub fn packed(&self) -> Option<&[String]> {
        self.packed_files.as_deref()
    }

    pub fn is_packed(&self, file: &str) -> bool {
        match &self.packed_files {
            Some(files) => files.binary_search_by(|f| f.as_str().cmp(file)).is_ok(),
            None => true,
        }
    }

    /// Looks up the file a manifest value points at.
    ///
    /// With `try_extensions`, `<value>.js` and `<value>/index.js` are tried
    /// after the exact path. When `pkg_path` is given, a missing file is
    /// reported as `FILE_DOES_NOT_EXIST` and an unpublished one as
    /// `FILE_NOT_PUBLISHED`.
    pub fn read_entry(
        &self,
        value: &str,
        pkg_path: Option<&[String]>,
        try_extensions: bool,
    ) -> CheckResult<Option<FileEntry>> {
        let base = self.resolve_path(value);
        let mut candidates = vec![base.clone()];
        if try_extensions {
            candidates.push(format!("{}.js", base));
            candidates.push(self.vfs.path_join(&[&base, "index.js"]));
        }

        for candidate in candidates {
            if self.vfs.is_path_dir(&candidate) {
                continue;
            }
            let content = match self.vfs.read_file(&candidate) {
                Ok(content) => Some(content),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) if err.kind() == io::ErrorKind::InvalidData => None,
                Err(source) => {
                    return Err(CheckError::Io {
                        path: candidate,
                        source,
                    })
                }
            };

            if !self.is_packed(&candidate) {
                if let Some(pkg_path) = pkg_path {
                    self.report(Message::new(
                        MessageCode::FileNotPublished,
                        Severity::Error,
                        pkg_path.to_vec(),
                    ));
                }
                return Ok(None);
            }
            return Ok(Some(FileEntry {
                path: candidate,
                content,
            }));
        }

        if let Some(pkg_path) = pkg_path {
            self.report(Message::new(
                MessageCode::FileDoesNotExist,
                Severity::Error,
                pkg_path.to_vec(),
            ));
        }
        Ok(None)
    }

    /// Compares a file's detected format with the format its path
    /// implies. Returns a `FILE_INVALID_FORMAT` or
    /// `FILE_INVALID_EXPLICIT_FORMAT` warning on mismatch.
    pub fn format_mismatch(
        &self,
        file: &str,
        content: &str,
        pkg_path: &[String],
        display_path: &str,
    ) -> Option<Message> {
        if !is_lintable_path(file) || !is_lintable_content(content) {
            return None;
        }
        let actual = detect_format(content);
        let expected = expected_format(file, self.vfs);
        if !actual.conflicts_with(expected) || is_bundler_output(actual, file) {
            return None;
        }

        let actual_ext = self.vfs.get_ext_name(file);
        let code = if is_explicit_extension(&actual_ext) {
            MessageCode::FileInvalidExplicitFormat
        } else {
            MessageCode::FileInvalidFormat
        };
        let expect_ext = match actual.module_format() {
            Some(ModuleFormat::Esm) => ".mjs",
            _ => ".cjs",
        };
        Some(
            Message::new(code, Severity::Warning, pkg_path.to_vec())
                .with_arg("actualFormat", actual)
                .with_arg("expectFormat", expected)
                .with_arg("actualExtension", actual_ext)
                .with_arg("expectExtension", expect_ext)
                .with_arg("actualFilePath", display_path),
        )
    }
}

/// ESM output under a `browser` or `bundler` directory is meant for
/// bundlers, which accept ESM regardless of the nearest `type`.
pub(crate) fn is_bundler_output(actual: CodeFormat, file: &str) -> bool {
    actual == CodeFormat::Esm && (file.contains("browser") || file.contains("bundler"))
}
