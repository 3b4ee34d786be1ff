//! Parsing of npm package manifests.
//!
//! # Example
//!
//! ```
//! use publint::parser::{parse_str, ExportsNode};
//!
//! let pkg = parse_str(r#"{"name": "lib", "exports": {".": "./index.js"}}"#).unwrap();
//! let (exports, path) = pkg.published_field("exports").unwrap();
//!
//! assert_eq!(path, vec!["exports"]);
//! assert!(matches!(ExportsNode::from_json(exports), ExportsNode::Subpaths(_)));
//! ```

pub mod exports;
pub mod package_json;
pub mod types;

// Re-export commonly used types for convenience
pub use exports::ExportsNode;
pub use package_json::{
    extract_production_dependencies, parse_file, parse_str, ParseError, ParseResult,
};
pub use types::{json_type_name, Dependency, PackageJson};
