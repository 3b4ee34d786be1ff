//! Typed view of the `exports` field.

use serde_json::Value;

use super::types::json_type_name;

/// One node of an `exports` tree.
///
/// Map entries keep their manifest order, which decides which condition
/// wins at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportsNode {
    /// A target path such as `./dist/index.js`, possibly with one `*`.
    Path(String),
    /// Fallback candidates; the first viable one wins.
    Array(Vec<ExportsNode>),
    /// Condition name (`import`, `node`, `types`, ...) to target.
    Conditions(Vec<(String, ExportsNode)>),
    /// Subpath pattern (`.`, `./feature`, `./utils/*`) to target.
    Subpaths(Vec<(String, ExportsNode)>),
    /// Deliberately unexported.
    Null,
    /// A value of a type `exports` does not allow, with its JSON type name.
    Invalid(&'static str),
}

impl ExportsNode {
    /// Builds the tree from raw JSON. A map is a subpath map when its first
    /// key starts with `.`, otherwise a condition map.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => ExportsNode::Path(s.clone()),
            Value::Array(items) => ExportsNode::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                let entries: Vec<(String, ExportsNode)> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect();
                let is_subpaths = map.keys().next().is_some_and(|k| k.starts_with('.'));
                if is_subpaths {
                    ExportsNode::Subpaths(entries)
                } else {
                    ExportsNode::Conditions(entries)
                }
            }
            Value::Null => ExportsNode::Null,
            other => ExportsNode::Invalid(json_type_name(other)),
        }
    }

    /// Map entries for either kind of map.
    pub fn entries(&self) -> Option<&[(String, ExportsNode)]> {
        match self {
            ExportsNode::Conditions(entries) | ExportsNode::Subpaths(entries) => Some(entries),
            _ => None,
        }
    }

    /// Value under `key` of a map node.
    pub fn get(&self, key: &str) -> Option<&ExportsNode> {
        self.entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns true if `key` appears in this map or any nested map or array.
    pub fn has_key_nested(&self, key: &str) -> bool {
        match self {
            ExportsNode::Conditions(entries) | ExportsNode::Subpaths(entries) => entries
                .iter()
                .any(|(k, v)| k == key || v.has_key_nested(key)),
            ExportsNode::Array(items) => items.iter().any(|item| item.has_key_nested(key)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_classifies_maps() {
        let node = ExportsNode::from_json(&json!({
            ".": { "import": "./a.mjs", "require": "./a.cjs" },
            "./package.json": "./package.json",
            "./internal": null
        }));
        let ExportsNode::Subpaths(entries) = &node else {
            panic!("expected subpaths, got {:?}", node);
        };
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0].1, ExportsNode::Conditions(_)));
        assert_eq!(entries[2].1, ExportsNode::Null);
    }

    #[test]
    fn test_from_json_invalid_values() {
        assert_eq!(ExportsNode::from_json(&json!(1)), ExportsNode::Invalid("number"));
        assert_eq!(ExportsNode::from_json(&json!(true)), ExportsNode::Invalid("boolean"));
    }

    #[test]
    fn test_condition_order_is_preserved() {
        let node = ExportsNode::from_json(&json!({ "require": "./a.cjs", "module": "./a.mjs" }));
        let keys: Vec<_> = node.entries().unwrap().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["require", "module"]);
    }

    #[test]
    fn test_has_key_nested() {
        let node = ExportsNode::from_json(&json!({
            "node": { "import": { "types": "./a.d.mts", "default": "./a.mjs" } },
            "default": ["./a.js"]
        }));
        assert!(node.has_key_nested("types"));
        assert!(node.has_key_nested("default"));
        assert!(!node.has_key_nested("browser"));
        assert_eq!(node.get("default"), Some(&ExportsNode::Array(vec![ExportsNode::Path("./a.js".into())])));
    }
}
