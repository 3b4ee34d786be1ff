//! Conditional exports resolution.
//!
//! Mirrors how a runtime picks a branch of an `exports` tree for a set of
//! active conditions, without touching the file system.

use crate::parser::ExportsNode;

/// Outcome of resolving an `exports` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExport<'a> {
    /// The target path string.
    pub value: &'a str,
    /// Manifest path of the chosen leaf.
    pub path: Vec<String>,
    /// True once any visited map declared both `import` and `require`.
    pub dual_publish: bool,
}

/// Resolves `node` against the active `conditions`.
///
/// Keys are scanned in manifest order and the first one that is `default`
/// or listed in `conditions` wins; the order of `conditions` itself does
/// not matter. Arrays resolve through their first element only.
///
/// # Example
///
/// ```
/// use publint::lint::conditions::resolve;
/// use publint::parser::ExportsNode;
/// use serde_json::json;
///
/// let node = ExportsNode::from_json(&json!({
///     "import": { "types": "./index.d.mts", "default": "./index.mjs" },
///     "require": "./index.cjs"
/// }));
/// let resolved = resolve(&node, &["require", "types"], &["exports".to_string()]).unwrap();
/// assert_eq!(resolved.value, "./index.cjs");
/// assert!(resolved.dual_publish);
/// ```
pub fn resolve<'a>(
    node: &'a ExportsNode,
    conditions: &[&str],
    path: &[String],
) -> Option<ResolvedExport<'a>> {
    resolve_inner(node, conditions, path.to_vec(), false)
}

fn resolve_inner<'a>(
    node: &'a ExportsNode,
    conditions: &[&str],
    mut path: Vec<String>,
    dual_publish: bool,
) -> Option<ResolvedExport<'a>> {
    match node {
        ExportsNode::Path(value) => Some(ResolvedExport {
            value,
            path,
            dual_publish,
        }),
        ExportsNode::Array(items) => {
            let first = items.first()?;
            path.push("0".to_string());
            resolve_inner(first, conditions, path, dual_publish)
        }
        ExportsNode::Conditions(entries) | ExportsNode::Subpaths(entries) => {
            let dual_publish = dual_publish
                || (entries.iter().any(|(k, _)| k == "import")
                    && entries.iter().any(|(k, _)| k == "require"));
            let (key, child) = entries
                .iter()
                .find(|(k, _)| k == "default" || conditions.contains(&k.as_str()))?;
            path.push(key.clone());
            resolve_inner(child, conditions, path, dual_publish)
        }
        ExportsNode::Null | ExportsNode::Invalid(_) => None,
    }
}
