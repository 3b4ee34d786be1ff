//! Checks that type declarations line up with the runtime entry points.

use std::collections::HashSet;

use super::conditions::resolve;
use super::{CheckResult, Context, Message, MessageCode, Severity};
use crate::analysis::{expected_format, ModuleFormat};
use crate::parser::ExportsNode;

const ENVIRONMENTS: [Option<&str>; 4] = [None, Some("node"), Some("browser"), Some("worker")];
const KINDS: [&str; 2] = ["import", "require"];

/// For every environment and module kind, resolves the types a consumer
/// would load for the package root and compares their format with the
/// runtime file the same conditions select.
pub(crate) fn check_types_exported(ctx: &Context<'_>) -> CheckResult {
    let Some((exports, exports_path)) = &ctx.exports else {
        return Ok(());
    };
    let (root, root_path) = match exports {
        ExportsNode::Subpaths(_) => match exports.get(".") {
            Some(node) => {
                let mut path = exports_path.clone();
                path.push(".".to_string());
                (node, path)
            }
            None => return Ok(()),
        },
        other => (other, exports_path.clone()),
    };

    let shipped_types = shipped_types_file(ctx);
    let mut seen = HashSet::new();

    for env in ENVIRONMENTS {
        for kind in KINDS {
            let mut conditions = vec!["types", kind];
            conditions.extend(env);
            let Some(resolved) = resolve(root, &conditions, &root_path) else {
                continue;
            };

            let key = if resolved.dual_publish {
                format!("{}:{}", resolved.path.join("."), kind)
            } else {
                resolved.path.join(".")
            };
            if !seen.insert(key) {
                continue;
            }

            let types_value = if resolved.path.iter().any(|p| p == "types") {
                resolved.value.to_string()
            } else {
                let Some(adjacent) = adjacent_declaration(resolved.value) else {
                    continue;
                };
                if !ctx.vfs.is_path_exist(&ctx.resolve_path(&adjacent)) {
                    if let Some(types_file) = &shipped_types {
                        ctx.report(
                            Message::new(
                                MessageCode::TypesNotExported,
                                Severity::Suggestion,
                                resolved.path.clone(),
                            )
                            .with_arg("typesFilePath", types_file),
                        );
                    }
                    continue;
                }
                adjacent
            };

            if types_value.contains('*') {
                continue;
            }
            let types_file = ctx.resolve_path(&types_value);
            if !ctx.vfs.is_path_exist(&types_file) {
                // Reported by the exports walker.
                continue;
            }

            let expect = if resolved.dual_publish {
                ModuleFormat::for_condition(kind)
            } else {
                let mut runtime_conditions = vec![kind];
                runtime_conditions.extend(env);
                resolve(root, &runtime_conditions, &root_path)
                    .filter(|runtime| !runtime.value.contains('*'))
                    .map(|runtime| expected_format(&ctx.resolve_path(runtime.value), ctx.vfs))
            };
            let Some(expect) = expect else {
                continue;
            };

            let actual = expected_format(&types_file, ctx.vfs);
            if actual != expect {
                tracing::debug!(file = %types_file, %actual, %expect, kind, "types format mismatch");
                ctx.report(
                    Message::new(
                        MessageCode::ExportsTypesInvalidFormat,
                        Severity::Warning,
                        resolved.path.clone(),
                    )
                    .with_arg("condition", kind)
                    .with_arg("actualFormat", actual)
                    .with_arg("expectFormat", expect)
                    .with_arg("actualExtension", declaration_extension(&types_value))
                    .with_arg("expectExtension", expect.dts_extension()),
                );
            }
        }
    }
    Ok(())
}

/// The declaration file the package advertises, if it ships any.
fn shipped_types_file(ctx: &Context<'_>) -> Option<String> {
    for field in ["types", "typings"] {
        if let Some(value) = ctx.pkg.published_field(field).and_then(|(v, _)| v.as_str()) {
            return Some(value.to_string());
        }
    }
    ctx.vfs
        .is_path_exist(&ctx.resolve_path("index.d.ts"))
        .then(|| "./index.d.ts".to_string())
}

/// `./a.js` -> `./a.d.ts`, `./a.mjs` -> `./a.d.mts`, `./a.cjs` -> `./a.d.cts`.
fn adjacent_declaration(value: &str) -> Option<String> {
    [(".mjs", ".d.mts"), (".cjs", ".d.cts"), (".js", ".d.ts")]
        .iter()
        .find_map(|(js, dts)| {
            value
                .strip_suffix(js)
                .map(|stem| format!("{}{}", stem, dts))
        })
}

fn declaration_extension(value: &str) -> &'static str {
    if value.ends_with(".d.mts") {
        ".d.mts"
    } else if value.ends_with(".d.cts") {
        ".d.cts"
    } else {
        ".d.ts"
    }
}
