//! Walker for the `exports` tree.
//!
//! Structural rules (condition order, target syntax, trailing-slash
//! mappings) are applied while descending. File reads and format checks
//! for each target run as separate tasks on the enclosing rayon scope.

use rayon::Scope;

use super::{run_check, CheckResult, Context, Message, MessageCode, Severity};
use crate::analysis::{detect_format, is_lintable_content, is_lintable_path, resolve_glob, CodeFormat};
use crate::parser::ExportsNode;

/// Walks the published `exports` field, if any.
pub(crate) fn walk_exports_field<'s>(ctx: &'s Context<'_>, scope: &Scope<'s>) {
    let Some((node, path)) = &ctx.exports else {
        return;
    };
    walk(ctx, scope, node, path.clone(), false);
}

/// Applies structural rules to `node` and schedules target checks.
///
/// `after_node` is set for siblings that follow a `node` condition and
/// for everything beneath them.
fn walk<'s>(
    ctx: &'s Context<'_>,
    scope: &Scope<'s>,
    node: &'s ExportsNode,
    path: Vec<String>,
    after_node: bool,
) {
    match node {
        ExportsNode::Path(value) => {
            scope.spawn(move |s| {
                run_check("exports-target", || check_target(ctx, s, value, path, after_node))
            });
        }
        ExportsNode::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(ctx, scope, item, child_path(&path, &i.to_string()), after_node);
            }
        }
        ExportsNode::Conditions(entries) => {
            check_condition_order(ctx, entries, &path);
            let mut after_node = after_node;
            for (key, child) in entries {
                walk(ctx, scope, child, child_path(&path, key), after_node);
                if key == "node" {
                    after_node = true;
                }
            }
        }
        ExportsNode::Subpaths(entries) => {
            for (key, child) in entries {
                walk(ctx, scope, child, child_path(&path, key), after_node);
            }
        }
        ExportsNode::Null => {}
        ExportsNode::Invalid(actual) => {
            ctx.report(
                Message::new(MessageCode::FieldInvalidValueType, Severity::Error, path)
                    .with_arg("actualTypes", actual)
                    .with_arg("expectTypes", "string,array,object,null"),
            );
        }
    }
}

fn child_path(path: &[String], key: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(key.to_string());
    child
}

fn check_condition_order(ctx: &Context<'_>, entries: &[(String, ExportsNode)], path: &[String]) {
    let position = |key: &str| entries.iter().position(|(k, _)| k == key);

    if let Some(types_idx) = position("types") {
        // A preceding sibling that carries its own `types` is fine.
        let shadowed = entries[..types_idx]
            .iter()
            .any(|(_, child)| child.has_key_nested("types"));
        if types_idx > 0 && !shadowed {
            ctx.report(Message::new(
                MessageCode::ExportsTypesShouldBeFirst,
                Severity::Error,
                child_path(path, "types"),
            ));
        }
    }

    if let (Some(module_idx), Some(require_idx)) = (position("module"), position("require")) {
        if module_idx > require_idx {
            ctx.report(Message::new(
                MessageCode::ExportsModuleShouldPrecedeRequire,
                Severity::Error,
                child_path(path, "module"),
            ));
        }
    }

    if let Some(default_idx) = position("default") {
        if default_idx + 1 != entries.len() {
            ctx.report(Message::new(
                MessageCode::ExportsDefaultShouldBeLast,
                Severity::Error,
                child_path(path, "default"),
            ));
        }
    }
}

fn check_target<'s>(
    ctx: &'s Context<'_>,
    scope: &Scope<'s>,
    value: &str,
    path: Vec<String>,
    after_node: bool,
) -> CheckResult {
    let mut value = value.to_string();

    if value.ends_with('/') {
        let expect_path: Vec<String> = path
            .iter()
            .map(|p| {
                if p.ends_with('/') {
                    format!("{}*", p)
                } else {
                    p.clone()
                }
            })
            .collect();
        ctx.report(
            Message::new(
                MessageCode::ExportsGlobNoDeprecatedSubpathMapping,
                Severity::Warning,
                path.clone(),
            )
            .with_arg("expectPath", super::format_path(&expect_path))
            .with_arg("expectValue", format!("{}*", value)),
        );
        value.push('*');
    }

    if !value.starts_with("./") {
        ctx.report(
            Message::new(MessageCode::ExportsValueInvalid, Severity::Error, path.clone())
                .with_arg("suggestValue", format!("./{}", value.trim_start_matches('/'))),
        );
    }

    if !value.contains('*') {
        if let Some(entry) = ctx.read_entry(&value, Some(&path), false)? {
            check_file(ctx, &entry.path, entry.content.as_deref(), &path, &value, after_node);
        }
        return Ok(());
    }

    let glob = ctx.resolve_path(&value);
    let files = resolve_glob(&glob, ctx.vfs, ctx.packed()).map_err(|source| {
        super::CheckError::Io {
            path: glob.clone(),
            source,
        }
    })?;

    if files.is_empty() {
        let on_disk = ctx.packed().is_some()
            && resolve_glob(&glob, ctx.vfs, None).is_ok_and(|all| !all.is_empty());
        let code = if on_disk {
            MessageCode::FileNotPublished
        } else {
            MessageCode::ExportsGlobNoMatchedFiles
        };
        let severity = if on_disk {
            Severity::Error
        } else {
            Severity::Warning
        };
        ctx.report(Message::new(code, severity, path));
        return Ok(());
    }

    if is_types_path(&path) {
        return Ok(());
    }
    for file in files {
        let path = path.clone();
        scope.spawn(move |_| {
            run_check("exports-glob-file", || {
                if !is_lintable_path(&file) {
                    return Ok(());
                }
                let content = ctx.vfs.read_file(&file).ok();
                let display = ctx.display_path(&file);
                check_file(ctx, &file, content.as_deref(), &path, &display, after_node);
                Ok(())
            })
        });
    }
    Ok(())
}

/// Format checks for one resolved target file.
fn check_file(
    ctx: &Context<'_>,
    file: &str,
    content: Option<&str>,
    path: &[String],
    display_path: &str,
    after_node: bool,
) {
    if is_types_path(path) || !is_lintable_path(file) {
        return;
    }
    let Some(content) = content.filter(|c| is_lintable_content(c)) else {
        return;
    };

    if path.iter().any(|p| p == "module") {
        if detect_format(content) == CodeFormat::Cjs {
            ctx.report(
                Message::new(MessageCode::ExportsModuleShouldBeEsm, Severity::Error, path.to_vec())
                    .with_arg("actualFilePath", display_path),
            );
        }
        return;
    }

    if after_node || path.iter().any(|p| p == "browser") {
        return;
    }

    if let Some(message) = ctx.format_mismatch(file, content, path, display_path) {
        ctx.report(message);
    }
}

fn is_types_path(path: &[String]) -> bool {
    path.iter().any(|p| p == "types")
}

#[cfg(test)]
mod tests {
    use crate::lint::{lint, LintOptions, Message, MessageCode, Severity};
    use crate::vfs::MemoryVfs;

    fn run(vfs: &MemoryVfs) -> Vec<Message> {
        lint(vfs, &LintOptions::new("/pkg")).unwrap().messages
    }

    fn codes_at(messages: &[Message], code: MessageCode) -> Vec<Vec<String>> {
        messages
            .iter()
            .filter(|m| m.code == code)
            .map(|m| m.path.clone())
            .collect()
    }

    fn manifest(exports: &str) -> String {
        format!(
            r#"{{"name": "x", "type": "module", "files": ["dist"], "exports": {}}}"#,
            exports
        )
    }

    // ===== Ordering rules =====

    #[test]
    fn test_module_after_require() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{".": {"require": "./a.cjs", "module": "./a.mjs"}}"#),
            )
            .with_file("/pkg/a.cjs", "module.exports = 1")
            .with_file("/pkg/a.mjs", "export default 1");
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::ExportsModuleShouldPrecedeRequire),
            vec![vec!["exports", ".", "module"]]
        );
    }

    #[test]
    fn test_default_not_last() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{".": {"default": "./a.js", "node": "./b.js"}}"#),
            )
            .with_file("/pkg/a.js", "export default 1")
            .with_file("/pkg/b.js", "export default 2");
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::ExportsDefaultShouldBeLast),
            vec![vec!["exports", ".", "default"]]
        );
    }

    #[test]
    fn test_types_not_first() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{"import": "./a.js", "types": "./a.d.ts"}"#),
            )
            .with_file("/pkg/a.js", "export default 1")
            .with_file("/pkg/a.d.ts", "export default 1");
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::ExportsTypesShouldBeFirst),
            vec![vec!["exports", "types"]]
        );
    }

    #[test]
    fn test_types_after_sibling_with_nested_types() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(
                    r#"{"import": {"types": "./a.d.mts", "default": "./a.js"}, "types": "./a.d.ts"}"#,
                ),
            )
            .with_file("/pkg/a.js", "export default 1")
            .with_file("/pkg/a.d.mts", "")
            .with_file("/pkg/a.d.ts", "");
        let messages = run(&vfs);
        assert!(codes_at(&messages, MessageCode::ExportsTypesShouldBeFirst).is_empty());
    }

    // ===== Targets =====

    #[test]
    fn test_value_must_start_with_dot_slash() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{".": "dist/index.js"}"#))
            .with_file("/pkg/dist/index.js", "export default 1");
        let messages = run(&vfs);
        let invalid: Vec<_> = messages
            .iter()
            .filter(|m| m.code == MessageCode::ExportsValueInvalid)
            .collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].args["suggestValue"], "./dist/index.js");
    }

    #[test]
    fn test_missing_target() {
        let vfs =
            MemoryVfs::new().with_file("/pkg/package.json", manifest(r#"{".": "./nope.js"}"#));
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::FileDoesNotExist),
            vec![vec!["exports", "."]]
        );
    }

    #[test]
    fn test_format_mismatch() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{".": "./index.js"}"#))
            .with_file("/pkg/index.js", "module.exports = {}");
        let messages = run(&vfs);
        let mismatch: Vec<_> = messages
            .iter()
            .filter(|m| m.code == MessageCode::FileInvalidFormat)
            .collect();
        assert_eq!(mismatch.len(), 1);
        assert_eq!(mismatch[0].severity, Severity::Warning);
        assert_eq!(mismatch[0].args["actualFormat"], "CJS");
        assert_eq!(mismatch[0].args["expectFormat"], "ESM");
        assert_eq!(mismatch[0].args["expectExtension"], ".cjs");
    }

    #[test]
    fn test_explicit_extension_mismatch() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{".": "./index.mjs"}"#))
            .with_file("/pkg/index.mjs", "module.exports = {}");
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::FileInvalidExplicitFormat),
            vec![vec!["exports", "."]]
        );
    }

    #[test]
    fn test_module_condition_must_be_esm() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{"module": "./a.js", "default": "./a.js"}"#),
            )
            .with_file("/pkg/a.js", "exports.a = 1");
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::ExportsModuleShouldBeEsm),
            vec![vec!["exports", "module"]]
        );
    }

    #[test]
    fn test_after_node_skips_format_check() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{"node": "./node.js", "worker": "./worker.js", "default": "./index.js"}"#),
            )
            .with_file("/pkg/node.js", "export default 1")
            .with_file("/pkg/worker.js", "module.exports = 1")
            .with_file("/pkg/index.js", "module.exports = 1");
        let messages = run(&vfs);
        assert!(codes_at(&messages, MessageCode::FileInvalidFormat).is_empty());
    }

    #[test]
    fn test_node_branch_itself_is_checked() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{"node": "./node.js", "default": "./index.js"}"#),
            )
            .with_file("/pkg/node.js", "module.exports = 1")
            .with_file("/pkg/index.js", "export default 1");
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::FileInvalidFormat),
            vec![vec!["exports", "node"]]
        );
    }

    #[test]
    fn test_browser_path_escape_hatch() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                r#"{"name": "x", "files": ["dist"], "exports": {".": "./dist/browser/index.js"}}"#,
            )
            .with_file("/pkg/dist/browser/index.js", "export default 1");
        let messages = run(&vfs);
        assert!(codes_at(&messages, MessageCode::FileInvalidFormat).is_empty());
    }

    #[test]
    fn test_browser_condition_skips_format_check() {
        let vfs = MemoryVfs::new()
            .with_file(
                "/pkg/package.json",
                manifest(r#"{".": {"browser": "./web.js", "default": "./index.js"}}"#),
            )
            .with_file("/pkg/web.js", "module.exports = 1")
            .with_file("/pkg/index.js", "module.exports = 1");
        let messages = run(&vfs);
        // only the default branch is held to the package type
        assert_eq!(
            codes_at(&messages, MessageCode::FileInvalidFormat),
            vec![vec!["exports", ".", "default"]]
        );
    }

    #[test]
    fn test_invalid_exports_type() {
        let vfs = MemoryVfs::new().with_file("/pkg/package.json", manifest("true"));
        let messages = run(&vfs);
        let invalid: Vec<_> = messages
            .iter()
            .filter(|m| m.code == MessageCode::FieldInvalidValueType)
            .collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].args["actualTypes"], "boolean");
    }

    // ===== Globs =====

    #[test]
    fn test_glob_without_matches() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{"./*": "./dist/*.js"}"#));
        let messages = run(&vfs);
        assert_eq!(
            codes_at(&messages, MessageCode::ExportsGlobNoMatchedFiles),
            vec![vec!["exports", "./*"]]
        );
    }

    #[test]
    fn test_glob_checks_each_file() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{"./*": "./dist/*.js"}"#))
            .with_file("/pkg/dist/a.js", "export const a = 1")
            .with_file("/pkg/dist/b.js", "module.exports = 2");
        let messages = run(&vfs);
        let mismatch: Vec<_> = messages
            .iter()
            .filter(|m| m.code == MessageCode::FileInvalidFormat)
            .collect();
        assert_eq!(mismatch.len(), 1);
        assert_eq!(mismatch[0].args["actualFilePath"], "./dist/b.js");
    }

    #[test]
    fn test_deprecated_trailing_slash_mapping() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{"./utils/": "./dist/utils/"}"#))
            .with_file("/pkg/dist/utils/a.js", "export const a = 1");
        let messages = run(&vfs);
        let deprecated: Vec<_> = messages
            .iter()
            .filter(|m| m.code == MessageCode::ExportsGlobNoDeprecatedSubpathMapping)
            .collect();
        assert_eq!(deprecated.len(), 1);
        assert_eq!(deprecated[0].args["expectValue"], "./dist/utils/*");
        assert_eq!(deprecated[0].args["expectPath"], r#"pkg.exports["./utils/*"]"#);
        assert!(codes_at(&messages, MessageCode::ExportsGlobNoMatchedFiles).is_empty());
    }

    #[test]
    fn test_glob_matching_only_unpublished_files() {
        let vfs = MemoryVfs::new()
            .with_file("/pkg/package.json", manifest(r#"{"./*": "./src/*.js"}"#))
            .with_file("/pkg/src/a.js", "export const a = 1");
        let options = LintOptions {
            packed_files: Some(vec!["package.json".to_string()]),
            ..LintOptions::new("/pkg")
        };
        let messages = lint(&vfs, &options).unwrap().messages;
        assert_eq!(
            codes_at(&messages, MessageCode::FileNotPublished),
            vec![vec!["exports", "./*"]]
        );
        assert!(codes_at(&messages, MessageCode::ExportsGlobNoMatchedFiles).is_empty());
    }
}
