//! Parser for npm package.json files.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::types::{Dependency, PackageJson};

/// Errors that can occur during package.json parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The document is valid JSON but not a package manifest.
    #[error("Invalid package.json: {0}")]
    InvalidPackage(String),
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a package.json file from a file path.
pub fn parse_file(path: &Path) -> ParseResult<PackageJson> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses a package.json from a string. The top-level value must be an
/// object; key order is preserved.
///
/// # Example
///
/// ```
/// use publint::parser::package_json::parse_str;
///
/// let pkg = parse_str(r#"{"name": "my-app", "version": "1.0.0"}"#).unwrap();
/// assert_eq!(pkg.name(), Some("my-app"));
/// assert!(parse_str("[]").is_err());
/// ```
pub fn parse_str(content: &str) -> ParseResult<PackageJson> {
    // tolerate a UTF-8 byte order mark, which some editors write
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    match serde_json::from_str::<Value>(content)? {
        Value::Object(fields) => Ok(PackageJson::new(fields)),
        other => Err(ParseError::InvalidPackage(format!(
            "expected an object at the top level, found {}",
            super::types::json_type_name(&other)
        ))),
    }
}

/// Extracts the `dependencies` entries, the set the `deps` command lints.
///
/// # Example
///
/// ```
/// use publint::parser::package_json::{parse_str, extract_production_dependencies};
///
/// let json = r#"{
///     "name": "my-app",
///     "dependencies": {"react": "^18.0.0"},
///     "devDependencies": {"typescript": "^5.0.0"}
/// }"#;
///
/// let pkg = parse_str(json).unwrap();
/// let deps = extract_production_dependencies(&pkg);
///
/// assert_eq!(deps.len(), 1);
/// assert_eq!(deps[0].name, "react");
/// ```
pub fn extract_production_dependencies(pkg: &PackageJson) -> Vec<Dependency> {
    pkg.dependency_map("dependencies")
        .into_iter()
        .map(|(name, version)| Dependency::new(name, version))
        .collect()
}
