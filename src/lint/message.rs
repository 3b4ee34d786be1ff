//! Diagnostics produced by a lint run.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic, also used as the minimum reporting level.
///
/// Ordered from least to most severe, so `level <= severity` keeps a
/// diagnostic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Suggestion,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Suggestion => "suggestion",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suggestion" => Ok(Severity::Suggestion),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!(
                "Unknown level: '{}'. Valid levels: suggestion, warning, error",
                s
            )),
        }
    }
}

/// Stable identifier of each kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    ImplicitIndexJsInvalidFormat,
    FileInvalidFormat,
    FileInvalidExplicitFormat,
    FileDoesNotExist,
    FileNotPublished,
    HasEsmMainButNoExports,
    HasModuleButNoExports,
    ModuleShouldBeEsm,
    ExportsGlobNoMatchedFiles,
    ExportsGlobNoDeprecatedSubpathMapping,
    ExportsTypesShouldBeFirst,
    ExportsModuleShouldPrecedeRequire,
    ExportsDefaultShouldBeLast,
    ExportsModuleShouldBeEsm,
    ExportsValueInvalid,
    TypesNotExported,
    ExportsTypesInvalidFormat,
    FieldInvalidValueType,
    DeprecatedFieldJsnext,
    UseExportsBrowser,
    UseExportsOrImportsBrowser,
    UseFiles,
    UseType,
    UseLicense,
    InvalidRepositoryValue,
}

impl MessageCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCode::ImplicitIndexJsInvalidFormat => "IMPLICIT_INDEX_JS_INVALID_FORMAT",
            MessageCode::FileInvalidFormat => "FILE_INVALID_FORMAT",
            MessageCode::FileInvalidExplicitFormat => "FILE_INVALID_EXPLICIT_FORMAT",
            MessageCode::FileDoesNotExist => "FILE_DOES_NOT_EXIST",
            MessageCode::FileNotPublished => "FILE_NOT_PUBLISHED",
            MessageCode::HasEsmMainButNoExports => "HAS_ESM_MAIN_BUT_NO_EXPORTS",
            MessageCode::HasModuleButNoExports => "HAS_MODULE_BUT_NO_EXPORTS",
            MessageCode::ModuleShouldBeEsm => "MODULE_SHOULD_BE_ESM",
            MessageCode::ExportsGlobNoMatchedFiles => "EXPORTS_GLOB_NO_MATCHED_FILES",
            MessageCode::ExportsGlobNoDeprecatedSubpathMapping => {
                "EXPORTS_GLOB_NO_DEPRECATED_SUBPATH_MAPPING"
            }
            MessageCode::ExportsTypesShouldBeFirst => "EXPORTS_TYPES_SHOULD_BE_FIRST",
            MessageCode::ExportsModuleShouldPrecedeRequire => {
                "EXPORTS_MODULE_SHOULD_PRECEDE_REQUIRE"
            }
            MessageCode::ExportsDefaultShouldBeLast => "EXPORTS_DEFAULT_SHOULD_BE_LAST",
            MessageCode::ExportsModuleShouldBeEsm => "EXPORTS_MODULE_SHOULD_BE_ESM",
            MessageCode::ExportsValueInvalid => "EXPORTS_VALUE_INVALID",
            MessageCode::TypesNotExported => "TYPES_NOT_EXPORTED",
            MessageCode::ExportsTypesInvalidFormat => "EXPORTS_TYPES_INVALID_FORMAT",
            MessageCode::FieldInvalidValueType => "FIELD_INVALID_VALUE_TYPE",
            MessageCode::DeprecatedFieldJsnext => "DEPRECATED_FIELD_JSNEXT",
            MessageCode::UseExportsBrowser => "USE_EXPORTS_BROWSER",
            MessageCode::UseExportsOrImportsBrowser => "USE_EXPORTS_OR_IMPORTS_BROWSER",
            MessageCode::UseFiles => "USE_FILES",
            MessageCode::UseType => "USE_TYPE",
            MessageCode::UseLicense => "USE_LICENSE",
            MessageCode::InvalidRepositoryValue => "INVALID_REPOSITORY_VALUE",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic.
///
/// Two messages are the same diagnostic when code, severity, path and
/// args are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    pub code: MessageCode,
    #[serde(rename = "type")]
    pub severity: Severity,
    /// Pointer into the manifest, e.g. `["exports", ".", "module"]`.
    pub path: Vec<String>,
    /// Interpolation data for rendering.
    pub args: BTreeMap<String, String>,
}

impl Message {
    pub fn new(code: MessageCode, severity: Severity, path: Vec<String>) -> Self {
        Self {
            code,
            severity,
            path,
            args: BTreeMap::new(),
        }
    }

    /// Adds an interpolation argument.
    pub fn with_arg(mut self, key: &str, value: impl ToString) -> Self {
        self.args.insert(key.to_string(), value.to_string());
        self
    }

    fn arg(&self, key: &str) -> &str {
        self.args.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Human-readable description of the diagnostic.
    pub fn render(&self) -> String {
        let at = format_path(&self.path);
        match self.code {
            MessageCode::ImplicitIndexJsInvalidFormat => format!(
                "index.js should be {} but it is written in {}. No entry fields are set, so index.js is the implicit entry point.",
                self.arg("expectFormat"),
                self.arg("actualFormat")
            ),
            MessageCode::FileInvalidFormat => format!(
                "{} is written in {} but is interpreted as {}. Consider using the {} extension, e.g. {}",
                self.file_label(&at),
                self.arg("actualFormat"),
                self.arg("expectFormat"),
                self.arg("expectExtension"),
                self.suggested_file()
            ),
            MessageCode::FileInvalidExplicitFormat => format!(
                "{} ends with the {} extension but is written in {}. Consider using the {} extension, e.g. {}",
                self.file_label(&at),
                self.arg("actualExtension"),
                self.arg("actualFormat"),
                self.arg("expectExtension"),
                self.suggested_file()
            ),
            MessageCode::FileDoesNotExist => format!("{} points to a file that does not exist.", at),
            MessageCode::FileNotPublished => format!(
                "{} points to a file that exists but is not published. Check the \"files\" field or .npmignore.",
                at
            ),
            MessageCode::HasEsmMainButNoExports => format!(
                "{} is an ESM file, but it is usually better to declare entry points with the \"exports\" field.",
                at
            ),
            MessageCode::HasModuleButNoExports => format!(
                "{} is only read by bundlers. Consider adding an \"exports\" field so Node.js can load the ESM entry too.",
                at
            ),
            MessageCode::ModuleShouldBeEsm => {
                format!("{} should be ESM, but the file is written in CJS.", at)
            }
            MessageCode::ExportsGlobNoMatchedFiles => {
                format!("{} is a glob that does not match any files.", at)
            }
            MessageCode::ExportsGlobNoDeprecatedSubpathMapping => format!(
                "{} maps a subpath folder with a trailing slash, which is deprecated. Use {}: \"{}\" instead.",
                at,
                self.arg("expectPath"),
                self.arg("expectValue")
            ),
            MessageCode::ExportsTypesShouldBeFirst => format!(
                "{} should be the first condition in its object so TypeScript picks it up.",
                at
            ),
            MessageCode::ExportsModuleShouldPrecedeRequire => format!(
                "{} should come before the \"require\" condition so bundlers pick the ESM file.",
                at
            ),
            MessageCode::ExportsDefaultShouldBeLast => format!(
                "{} should be the last condition, conditions after it are never matched.",
                at
            ),
            MessageCode::ExportsModuleShouldBeEsm => {
                format!("{} should be ESM, but the file is written in CJS.", at)
            }
            MessageCode::ExportsValueInvalid => format!(
                "{} is invalid as it does not start with \"./\". Use \"{}\" instead.",
                at,
                self.arg("suggestValue")
            ),
            MessageCode::TypesNotExported => format!(
                "{} has no matching type declarations. The package ships {}, but it is not exported for this entry point.",
                at,
                self.arg("typesFilePath")
            ),
            MessageCode::ExportsTypesInvalidFormat => format!(
                "{} types are interpreted as {} but the \"{}\" condition loads {}. Consider using the {} extension.",
                at,
                self.arg("actualFormat"),
                self.arg("condition"),
                self.arg("expectFormat"),
                self.arg("expectExtension")
            ),
            MessageCode::FieldInvalidValueType => format!(
                "{} is a {} but expected {}.",
                at,
                self.arg("actualTypes"),
                self.arg("expectTypes").replace(',', " | ")
            ),
            MessageCode::DeprecatedFieldJsnext => format!(
                "{} is deprecated. Use \"module\" or \"exports\" instead.",
                at
            ),
            MessageCode::UseExportsBrowser => format!(
                "{} can be replaced with the \"browser\" condition in \"exports\".",
                at
            ),
            MessageCode::UseExportsOrImportsBrowser => format!(
                "{} can be replaced with the \"browser\" condition in \"exports\" or \"imports\".",
                at
            ),
            MessageCode::UseFiles => format!(
                "The package publishes internal files such as {}. Use the \"files\" field to publish only the files consumers need.",
                self.arg("filePath")
            ),
            MessageCode::UseType => {
                "The package does not set the \"type\" field. Set it explicitly so .js files are interpreted predictably.".to_string()
            }
            MessageCode::UseLicense => format!(
                "The package has a {} file but no \"license\" field. Set it so registries can show the license.",
                self.arg("licenseFilePath")
            ),
            MessageCode::InvalidRepositoryValue => match self.arg("type") {
                "invalid-string-shorthand" => format!(
                    "{} is not a valid shorthand. Use the object form {{ \"type\": \"git\", \"url\": \"...\" }} instead.",
                    at
                ),
                "invalid-git-url" => format!("{} is not a valid git URL.", at),
                "deprecated-github-git-protocol" => format!(
                    "{} uses the git:// protocol which GitHub no longer supports. Use \"{}\" instead.",
                    at,
                    self.arg("suggestValue")
                ),
                _ => format!(
                    "{} is a web URL. npm normalizes it to \"{}\", consider using that form.",
                    at,
                    self.arg("suggestValue")
                ),
            },
        }
    }

    fn file_label(&self, at: &str) -> String {
        match self.args.get("actualFilePath") {
            Some(file) if !self.path.is_empty() && self.path[0] != "name" => {
                format!("{} ({})", at, file)
            }
            Some(file) => file.clone(),
            None => at.to_string(),
        }
    }

    fn suggested_file(&self) -> String {
        let file = self.arg("actualFilePath");
        let actual = self.arg("actualExtension");
        match file.strip_suffix(actual) {
            Some(stem) if !actual.is_empty() => format!("{}{}", stem, self.arg("expectExtension")),
            _ => self.arg("expectExtension").to_string(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.render())
    }
}

/// Formats a manifest pointer the way it reads in JavaScript, e.g.
/// `pkg.exports["."].import`.
///
/// # Example
///
/// ```
/// use publint::lint::format_path;
///
/// let path = vec!["exports".to_string(), ".".to_string(), "import".to_string()];
/// assert_eq!(format_path(&path), r#"pkg.exports["."].import"#);
/// ```
pub fn format_path(path: &[String]) -> String {
    let mut out = String::from("pkg");
    for segment in path {
        if segment.chars().all(|c| c.is_ascii_digit()) && !segment.is_empty() {
            out.push_str(&format!("[{}]", segment));
        } else if is_identifier(segment) {
            out.push('.');
            out.push_str(segment);
        } else {
            out.push_str(&format!("[\"{}\"]", segment));
        }
    }
    out
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
