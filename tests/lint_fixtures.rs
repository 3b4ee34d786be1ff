//! Fixture-style tests running the whole linter over small packages.

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use publint::analysis::{detect_format, expected_format, resolve_glob, CodeFormat, ModuleFormat};
use publint::lint::diagnostics::promote_warnings;
use publint::lint::{lint, lint_tarball, LintOptions, Message, MessageCode, Severity};
use publint::vfs::{FsVfs, MemoryVfs};
use tempfile::tempdir;

/// Lints `/pkg` and returns `(code, path)` pairs sorted by code.
fn lint_codes(vfs: &MemoryVfs, options: LintOptions) -> Vec<(MessageCode, Vec<String>)> {
    let mut codes: Vec<_> = lint(vfs, &options)
        .unwrap()
        .messages
        .into_iter()
        .map(|m| (m.code, m.path))
        .collect();
    codes.sort();
    codes
}

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

fn sorted_by_code(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by(|a, b| (a.code, &a.path).cmp(&(b.code, &b.path)));
    messages
}

// ===== Format detection =====

#[test]
fn test_detect_format_classes() {
    assert_eq!(detect_format("const a = require('a');\nmodule.exports = a;"), CodeFormat::Cjs);
    assert_eq!(detect_format("import a from 'a';\nexport default a;"), CodeFormat::Esm);
    assert_eq!(detect_format("import a from 'a';\nmodule.exports = a;"), CodeFormat::Mixed);
    assert_eq!(detect_format("console.log('side effect');"), CodeFormat::Unknown);
}

#[test]
fn test_detect_format_ignores_comments() {
    assert_eq!(detect_format("/* module.exports = 1 */\nconsole.log(1);"), CodeFormat::Unknown);
    assert_eq!(detect_format("// export default 1\nconsole.log(1);"), CodeFormat::Unknown);
    assert_eq!(detect_format("// require('x')\nexport const a = 1;"), CodeFormat::Esm);
}

// ===== Path format =====

#[test]
fn test_explicit_extensions_ignore_package_type() {
    for pkg_type in ["module", "commonjs"] {
        let vfs = MemoryVfs::new().with_file(
            "/pkg/package.json",
            format!(r#"{{"type": "{}"}}"#, pkg_type),
        );
        assert_eq!(expected_format("/pkg/a.mjs", &vfs), ModuleFormat::Esm);
        assert_eq!(expected_format("/pkg/a.cjs", &vfs), ModuleFormat::Cjs);
    }
}

// ===== Globs =====

#[test]
fn test_glob_resolves_nested_js_files() {
    let vfs = MemoryVfs::new()
        .with_file("/pkg/package.json", "{}")
        .with_file("/pkg/alpha.js", "")
        .with_file("/pkg/bravo.mjs", "")
        .with_file("/pkg/dual-extension/index.js", "")
        .with_file("/pkg/dual-extension/index.mjs", "");
    let mut files = resolve_glob("/pkg/*.js", &vfs, None).unwrap();
    files.sort();
    assert_eq!(files, vec!["/pkg/alpha.js", "/pkg/dual-extension/index.js"]);
}

// ===== Exports ordering =====

#[test]
fn test_module_after_require_is_reported_once() {
    let vfs = MemoryVfs::new()
        .with_file(
            "/pkg/package.json",
            r#"{"name": "a", "type": "module", "files": ["a.cjs", "a.mjs"], "exports": {".": {"require": "./a.cjs", "module": "./a.mjs"}}}"#,
        )
        .with_file("/pkg/a.cjs", "module.exports = 1")
        .with_file("/pkg/a.mjs", "export default 1");
    let codes = lint_codes(&vfs, LintOptions::new("/pkg"));
    assert_eq!(
        codes,
        vec![(
            MessageCode::ExportsModuleShouldPrecedeRequire,
            path(&["exports", ".", "module"])
        )]
    );
}

#[test]
fn test_default_must_be_last() {
    let vfs = MemoryVfs::new()
        .with_file(
            "/pkg/package.json",
            r#"{"name": "a", "type": "module", "files": ["a.js", "b.js"], "exports": {".": {"default": "./a.js", "node": "./b.js"}}}"#,
        )
        .with_file("/pkg/a.js", "export default 1")
        .with_file("/pkg/b.js", "export default 2");
    let codes = lint_codes(&vfs, LintOptions::new("/pkg"));
    assert!(codes.contains(&(
        MessageCode::ExportsDefaultShouldBeLast,
        path(&["exports", ".", "default"])
    )));
}

// ===== Strict mode and levels =====

fn noisy_package() -> MemoryVfs {
    MemoryVfs::new()
        .with_file(
            "/pkg/package.json",
            r#"{
                "name": "noisy",
                "main": "./index.js",
                "exports": {
                    ".": {"default": "./index.js", "require": "./index.cjs"},
                    "./utils/": "./dist/utils/",
                    "./missing/*": "./dist/missing/*.js"
                }
            }"#,
        )
        .with_file("/pkg/index.js", "export default 1")
        .with_file("/pkg/index.cjs", "module.exports = 1")
        .with_file("/pkg/dist/utils/a.js", "module.exports = 1")
}

#[test]
fn test_strict_commutes_with_level_filter() {
    let vfs = noisy_package();

    let strict = lint(
        &vfs,
        &LintOptions {
            level: Severity::Error,
            strict: true,
            ..LintOptions::new("/pkg")
        },
    )
    .unwrap()
    .messages;

    let mut manual = lint(
        &vfs,
        &LintOptions {
            level: Severity::Warning,
            ..LintOptions::new("/pkg")
        },
    )
    .unwrap()
    .messages;
    promote_warnings(&mut manual);

    assert!(strict.iter().any(|m| m.code == MessageCode::ExportsGlobNoMatchedFiles));
    assert_eq!(sorted_by_code(strict), sorted_by_code(manual));
}

#[test]
fn test_level_filtering() {
    let vfs = noisy_package();
    let all = lint(&vfs, &LintOptions::new("/pkg")).unwrap();
    let warnings = lint(
        &vfs,
        &LintOptions {
            level: Severity::Warning,
            ..LintOptions::new("/pkg")
        },
    )
    .unwrap();
    let errors = lint(
        &vfs,
        &LintOptions {
            level: Severity::Error,
            ..LintOptions::new("/pkg")
        },
    )
    .unwrap();

    assert!(all.count(Severity::Suggestion) > 0);
    assert_eq!(warnings.count(Severity::Suggestion), 0);
    assert_eq!(warnings.messages.len(), all.messages.len() - all.count(Severity::Suggestion));
    assert!(errors.messages.iter().all(|m| m.severity == Severity::Error));
    assert!(errors.has_errors());
}

#[test]
fn test_output_order_is_deterministic() {
    let vfs = noisy_package();
    let first = lint(&vfs, &LintOptions::new("/pkg")).unwrap();
    for _ in 0..5 {
        assert_eq!(lint(&vfs, &LintOptions::new("/pkg")).unwrap(), first);
    }
    let package_level = first
        .messages
        .iter()
        .take_while(|m| m.path.len() <= 1)
        .count();
    assert!(first.messages[package_level..].iter().all(|m| m.path.len() > 1));
}

// ===== Implicit index =====

#[test]
fn test_no_entry_fields_with_cjs_index() {
    let vfs = MemoryVfs::new()
        .with_file("/pkg/package.json", r#"{"name": "legacy"}"#)
        .with_file("/pkg/index.js", "module.exports = function () {};");
    assert!(lint_codes(&vfs, LintOptions::new("/pkg")).is_empty());
}

#[test]
fn test_no_entry_fields_with_esm_index() {
    let vfs = MemoryVfs::new()
        .with_file("/pkg/package.json", r#"{"name": "legacy"}"#)
        .with_file("/pkg/index.js", "export default function () {}");
    assert_eq!(
        lint_codes(&vfs, LintOptions::new("/pkg")),
        vec![(MessageCode::ImplicitIndexJsInvalidFormat, path(&["name"]))]
    );
}

// ===== Packed files =====

#[test]
fn test_unpublished_glob_target_differs_from_missing() {
    let vfs = MemoryVfs::new()
        .with_file(
            "/pkg/package.json",
            r#"{"name": "a", "type": "module", "files": ["dist"], "exports": {"./*": "./src/*.js", "./missing": "./dist/missing.js"}}"#,
        )
        .with_file("/pkg/src/a.js", "export const a = 1");
    let options = LintOptions {
        packed_files: Some(vec!["package.json".to_string()]),
        ..LintOptions::new("/pkg")
    };
    let codes = lint_codes(&vfs, options);
    assert_eq!(
        codes,
        vec![
            (MessageCode::FileDoesNotExist, path(&["exports", "./missing"])),
            (MessageCode::FileNotPublished, path(&["exports", "./*"])),
        ]
    );
}

#[test]
fn test_publish_config_override_path() {
    let vfs = MemoryVfs::new()
        .with_file(
            "/pkg/package.json",
            r#"{"name": "a", "type": "module", "files": ["dist"], "exports": "./src/index.ts", "publishConfig": {"exports": {".": "./dist/index.js"}}}"#,
        );
    let codes = lint_codes(&vfs, LintOptions::new("/pkg"));
    assert_eq!(
        codes,
        vec![(
            MessageCode::FileDoesNotExist,
            path(&["publishConfig", "exports", "."])
        )]
    );
}

// ===== Real file system =====

#[test]
fn test_lint_directory_on_disk() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(
        root.join("package.json"),
        r#"{"name": "disk", "type": "module", "files": ["dist"], "exports": {".": {"import": "./dist/index.js", "require": "./dist/index.cjs"}}}"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("dist")).unwrap();
    fs::write(root.join("dist/index.js"), "export default 1;").unwrap();
    fs::write(root.join("dist/index.cjs"), "export default 1;").unwrap();

    let options = LintOptions::new(root.to_string_lossy().into_owned());
    let messages = lint(&FsVfs::new(), &options).unwrap().messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].code, MessageCode::FileInvalidExplicitFormat);
    assert_eq!(messages[0].path, path(&["exports", ".", "require"]));
    assert_eq!(messages[0].args["actualFormat"], "ESM");
}

// ===== Tarballs =====

fn build_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, content.as_bytes()).unwrap();
        }
        builder.finish().unwrap();
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_lint_tarball() {
    let tgz = build_tarball(&[
        (
            "package/package.json",
            r#"{"name": "packed", "files": ["lib"], "main": "./lib/index.js", "module": "./lib/index.mjs"}"#,
        ),
        ("package/lib/index.js", "module.exports = 1;"),
    ]);
    let messages = lint_tarball(&tgz, &LintOptions::new("/package")).unwrap().messages;
    let codes: Vec<_> = messages.iter().map(|m| m.code).collect();
    assert!(codes.contains(&MessageCode::FileDoesNotExist));
    assert!(codes.contains(&MessageCode::HasModuleButNoExports));
}

#[test]
fn test_lint_tarball_rejects_garbage() {
    assert!(lint_tarball(b"garbage", &LintOptions::new("/package")).is_err());
}
