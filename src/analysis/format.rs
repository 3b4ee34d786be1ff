//! Heuristic module format detection for JavaScript source text.
//!
//! Detection is deliberately regex based: two independent probes look for
//! ESM syntax (`import`/`export` statements, `import()`, `import.meta`) and
//! CommonJS syntax (`module.exports`, `exports.x`, `require()`,
//! `Object.defineProperty(exports, ...)`). Comments are stripped before
//! probing. String and template literals are not understood, so comment-like
//! text inside them can hide markers; ambiguous files fall back to
//! [`CodeFormat::Unknown`] or [`CodeFormat::Mixed`], which never produce a
//! format mismatch.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Module format inferred from source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CodeFormat {
    #[serde(rename = "ESM")]
    Esm,
    #[serde(rename = "CJS")]
    Cjs,
    /// Both ESM and CommonJS markers were found.
    #[serde(rename = "mixed")]
    Mixed,
    /// No marker was found (side-effect only or not JavaScript).
    #[serde(rename = "unknown")]
    Unknown,
}

impl CodeFormat {
    /// The authoritative module format, if detection was conclusive.
    pub fn module_format(&self) -> Option<ModuleFormat> {
        match self {
            CodeFormat::Esm => Some(ModuleFormat::Esm),
            CodeFormat::Cjs => Some(ModuleFormat::Cjs),
            CodeFormat::Mixed | CodeFormat::Unknown => None,
        }
    }

    /// Returns true if this detected format contradicts `expected`.
    /// `Mixed` and `Unknown` never contradict anything.
    pub fn conflicts_with(&self, expected: ModuleFormat) -> bool {
        self.module_format().is_some_and(|actual| actual != expected)
    }
}

impl fmt::Display for CodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CodeFormat::Esm => "ESM",
            CodeFormat::Cjs => "CJS",
            CodeFormat::Mixed => "mixed",
            CodeFormat::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// The format a file is expected to have, as declared by its extension or
/// nearest `package.json`. Always conclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleFormat {
    #[serde(rename = "ESM")]
    Esm,
    #[serde(rename = "CJS")]
    Cjs,
}

impl ModuleFormat {
    /// Explicit JavaScript extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ModuleFormat::Esm => ".mjs",
            ModuleFormat::Cjs => ".cjs",
        }
    }

    /// Explicit declaration file extension for this format.
    pub fn dts_extension(&self) -> &'static str {
        match self {
            ModuleFormat::Esm => ".d.mts",
            ModuleFormat::Cjs => ".d.cts",
        }
    }

    /// Format a conditional-exports module kind loads as.
    pub fn for_condition(kind: &str) -> Option<Self> {
        match kind {
            "import" => Some(ModuleFormat::Esm),
            "require" => Some(ModuleFormat::Cjs),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleFormat::Esm => write!(f, "ESM"),
            ModuleFormat::Cjs => write!(f, "CJS"),
        }
    }
}

impl From<ModuleFormat> for CodeFormat {
    fn from(format: ModuleFormat) -> Self {
        match format {
            ModuleFormat::Esm => CodeFormat::Esm,
            ModuleFormat::Cjs => CodeFormat::Cjs,
        }
    }
}

const ESM_PATTERN: &str = r#"(?m)(?:^|[\s;])(?:import[\s\w*,{}]*from|import\s*['"*{(]|import\.meta\b|export\b\s*(?:[*{]|default\b|type\b|function\b|const\b|var\b|let\b|class\b|async\s+function\b))"#;
const CJS_PATTERN: &str = r"\bmodule\.exports\b|\bexports[.\[]|\brequire\s*\(|\bObject\.(?:defineProperty|defineProperties|assign)\s*\(\s*exports\b";
const BLOCK_COMMENT_PATTERN: &str = r"(?s)/\*.*?\*/";
// `//` right after `:` or `\` is part of a URL or an escape, not a comment.
const LINE_COMMENT_PATTERN: &str = r"(?m)(^|[^\\:])//.*$";
const FLOW_PATTERN: &str = r"^\s*(?://|/\*+)\s*@flow\b";

/// Compiles a literal pattern once.
///
/// Panics if `pattern` is not a valid regex. Every caller passes a string
/// literal, and each literal is compiled by the unit tests, so this can
/// only fire on a programming error.
pub(crate) fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {pattern}: {e}")))
}

fn esm_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, ESM_PATTERN)
}

fn cjs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, CJS_PATTERN)
}

fn block_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, BLOCK_COMMENT_PATTERN)
}

fn line_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, LINE_COMMENT_PATTERN)
}

fn flow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, FLOW_PATTERN)
}

/// Removes `/* ... */` and `// ...` spans from source text.
pub fn strip_comments(code: &str) -> String {
    let without_blocks = block_comment_re().replace_all(code, "");
    line_comment_re()
        .replace_all(&without_blocks, "${1}")
        .into_owned()
}

/// Classifies source text as ESM, CommonJS, both, or neither.
///
/// # Example
///
/// ```
/// use publint::analysis::{detect_format, CodeFormat};
///
/// assert_eq!(detect_format("export default 1"), CodeFormat::Esm);
/// assert_eq!(detect_format("module.exports = 1"), CodeFormat::Cjs);
/// assert_eq!(detect_format("// export default 1"), CodeFormat::Unknown);
/// ```
pub fn detect_format(code: &str) -> CodeFormat {
    let code = strip_comments(code);
    let is_esm = esm_re().is_match(&code);
    let is_cjs = cjs_re().is_match(&code);

    match (is_esm, is_cjs) {
        (true, true) => CodeFormat::Mixed,
        (true, false) => CodeFormat::Esm,
        (false, true) => CodeFormat::Cjs,
        (false, false) => CodeFormat::Unknown,
    }
}

/// Returns true if the path has an extension the format checks understand.
pub fn is_lintable_path(path: &str) -> bool {
    [".js", ".mjs", ".cjs"].iter().any(|ext| path.ends_with(ext))
}

/// Returns false for Flow-annotated sources, whose syntax the probes
/// cannot judge.
pub fn is_lintable_content(code: &str) -> bool {
    !flow_re().is_match(code)
}

/// Returns true for extensions that pin the module format on their own.
pub fn is_explicit_extension(ext: &str) -> bool {
    matches!(ext, ".mjs" | ".cjs")
}
