//! Shared types for package manifests.
//!
//! The manifest is kept as an order-preserving JSON object rather than a
//! fully typed struct: the linter must report fields with the wrong type
//! instead of failing to parse, and the key order of `exports` condition
//! maps is meaningful.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A parsed `package.json`.
///
/// # Example
///
/// ```
/// use publint::parser::parse_str;
///
/// let pkg = parse_str(r#"{"name": "my-lib", "publishConfig": {"main": "./dist/index.js"}}"#).unwrap();
/// assert_eq!(pkg.name(), Some("my-lib"));
///
/// let (main, path) = pkg.published_field("main").unwrap();
/// assert_eq!(main.as_str(), Some("./dist/index.js"));
/// assert_eq!(path, vec!["publishConfig", "main"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PackageJson {
    fields: Map<String, Value>,
}

impl PackageJson {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw access to a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns true if the field is present, even when `null`.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Looks up a field as it will be published: an identically named field
    /// inside `publishConfig` overrides the top-level one. Returns the value
    /// and its path inside the manifest. `null` values count as absent.
    pub fn published_field(&self, field: &str) -> Option<(&Value, Vec<String>)> {
        if let Some(value) = self
            .fields
            .get("publishConfig")
            .and_then(Value::as_object)
            .and_then(|config| config.get(field))
            .filter(|v| !v.is_null())
        {
            return Some((value, vec!["publishConfig".to_string(), field.to_string()]));
        }

        self.fields
            .get(field)
            .filter(|v| !v.is_null())
            .map(|value| (value, vec![field.to_string()]))
    }

    /// The package name, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// The package version, if it is a string.
    pub fn version(&self) -> Option<&str> {
        self.fields.get("version").and_then(Value::as_str)
    }

    /// String-valued entries of a dependency map such as `dependencies`.
    pub fn dependency_map(&self, field: &str) -> Vec<(&str, &str)> {
        self.fields
            .get(field)
            .and_then(Value::as_object)
            .map(|deps| {
                deps.iter()
                    .filter_map(|(name, range)| range.as_str().map(|r| (name.as_str(), r)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Name of a JSON value's type as reported in diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The package name (e.g., "react", "@scope/pkg").
    pub name: String,

    /// The version specifier (e.g., "^18.0.0").
    pub version: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
