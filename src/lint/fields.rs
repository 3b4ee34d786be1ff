//! Checks for individual manifest fields other than `exports`.

use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

use super::{is_bundler_output, CheckError, CheckResult, Context, Message, MessageCode, Severity};
use crate::analysis::format::compiled;
use crate::analysis::{
    detect_format, expected_format, is_lintable_content, is_lintable_path, resolve_glob,
    CodeFormat,
};
use crate::parser::json_type_name;

/// Fields that point at a single file and are only checked for existence.
const KNOWN_FILE_FIELDS: [&str; 6] = ["types", "typings", "jsnext:main", "jsnext", "unpkg", "jsdelivr"];

/// Fields whose files the no-exports scan leaves to their own checks.
const ENTRY_FIELDS: [&str; 6] = ["main", "module", "jsnext:main", "jsnext", "unpkg", "jsdelivr"];

const LICENSE_NAMES: [&str; 3] = ["LICENSE", "LICENCE", "COPYING"];

/// Top-level directories holding development-only files.
const INTERNAL_DIRS: [&str; 8] = [
    "test",
    "tests",
    "__tests__",
    "__mocks__",
    ".github",
    ".circleci",
    ".vscode",
    ".idea",
];

/// File name prefixes of tooling configuration at the package root.
const INTERNAL_CONFIG_PREFIXES: [&str; 13] = [
    ".eslintrc",
    "eslint.config.",
    ".prettierrc",
    "prettier.config.",
    ".editorconfig",
    ".travis.yml",
    "jest.config.",
    "vitest.config.",
    "vite.config.",
    "rollup.config.",
    "webpack.config.",
    "babel.config.",
    ".babelrc",
];

fn name_path() -> Vec<String> {
    vec!["name".to_string()]
}

/// Reports a value that is not a string and returns the string otherwise.
fn expect_string<'v>(ctx: &Context<'_>, value: &'v Value, path: &[String]) -> Option<&'v str> {
    if let Some(s) = value.as_str() {
        return Some(s);
    }
    report_invalid_type(ctx, value, path, "string");
    None
}

fn report_invalid_type(ctx: &Context<'_>, value: &Value, path: &[String], expect: &str) {
    ctx.report(
        Message::new(MessageCode::FieldInvalidValueType, Severity::Error, path.to_vec())
            .with_arg("actualTypes", json_type_name(value))
            .with_arg("expectTypes", expect),
    );
}

fn has_entry_fields(ctx: &Context<'_>) -> bool {
    ["main", "module", "exports"]
        .iter()
        .any(|field| ctx.pkg.published_field(field).is_some())
}

/// Without any entry field, `index.js` at the root is what `require` and
/// `import` load.
pub(crate) fn check_implicit_index(ctx: &Context<'_>) -> CheckResult {
    if has_entry_fields(ctx) {
        return Ok(());
    }
    let Some(entry) = ctx.read_entry("./index.js", None, false)? else {
        return Ok(());
    };
    let Some(content) = entry.content.as_deref().filter(|c| is_lintable_content(c)) else {
        return Ok(());
    };

    let actual = detect_format(content);
    let expected = expected_format(&entry.path, ctx.vfs);
    if actual.conflicts_with(expected) && !is_bundler_output(actual, &entry.path) {
        ctx.report(
            Message::new(
                MessageCode::ImplicitIndexJsInvalidFormat,
                Severity::Warning,
                name_path(),
            )
            .with_arg("actualFormat", actual)
            .with_arg("expectFormat", expected),
        );
    }
    Ok(())
}

pub(crate) fn check_main(ctx: &Context<'_>) -> CheckResult {
    let Some((value, path)) = ctx.pkg.published_field("main") else {
        return Ok(());
    };
    let Some(main) = expect_string(ctx, value, &path) else {
        return Ok(());
    };
    let Some(entry) = ctx.read_entry(main, Some(&path), true)? else {
        return Ok(());
    };
    let Some(content) = entry.content.as_deref() else {
        return Ok(());
    };

    let display = ctx.display_path(&entry.path);
    if let Some(message) = ctx.format_mismatch(&entry.path, content, &path, &display) {
        ctx.report(message);
    }

    let is_esm = is_lintable_path(&entry.path)
        && is_lintable_content(content)
        && detect_format(content) == CodeFormat::Esm;
    if is_esm && !ctx.has_exports() {
        ctx.report(Message::new(
            MessageCode::HasEsmMainButNoExports,
            Severity::Suggestion,
            path,
        ));
    }
    Ok(())
}

pub(crate) fn check_module(ctx: &Context<'_>) -> CheckResult {
    let Some((value, path)) = ctx.pkg.published_field("module") else {
        return Ok(());
    };
    let Some(module) = expect_string(ctx, value, &path) else {
        return Ok(());
    };

    if !ctx.has_exports() {
        ctx.report(Message::new(
            MessageCode::HasModuleButNoExports,
            Severity::Suggestion,
            path.clone(),
        ));
    }

    let Some(entry) = ctx.read_entry(module, Some(&path), true)? else {
        return Ok(());
    };
    let is_cjs = entry.content.as_deref().is_some_and(|content| {
        is_lintable_path(&entry.path)
            && is_lintable_content(content)
            && detect_format(content) == CodeFormat::Cjs
    });
    if is_cjs {
        ctx.report(Message::new(
            MessageCode::ModuleShouldBeEsm,
            Severity::Error,
            path,
        ));
    }
    Ok(())
}

pub(crate) fn check_known_fields(ctx: &Context<'_>) -> CheckResult {
    let has_types_versions = ctx.pkg.published_field("typesVersions").is_some();

    for field in KNOWN_FILE_FIELDS {
        let is_types = matches!(field, "types" | "typings");
        if is_types && has_types_versions {
            continue;
        }
        let Some((value, path)) = ctx.pkg.published_field(field) else {
            continue;
        };
        if matches!(field, "jsnext:main" | "jsnext") {
            ctx.report(Message::new(
                MessageCode::DeprecatedFieldJsnext,
                Severity::Warning,
                path.clone(),
            ));
        }
        let Some(target) = expect_string(ctx, value, &path) else {
            continue;
        };
        ctx.read_entry(target, Some(&path), !is_types)?;
    }
    Ok(())
}

pub(crate) fn check_browser(ctx: &Context<'_>) -> CheckResult {
    let Some((value, path)) = ctx.pkg.published_field("browser") else {
        return Ok(());
    };

    match value {
        Value::String(target) => {
            if ctx.has_exports() {
                ctx.report(Message::new(
                    MessageCode::UseExportsBrowser,
                    Severity::Suggestion,
                    path.clone(),
                ));
            }
            ctx.read_entry(target, Some(&path), true)?;
        }
        Value::Object(map) => {
            if ctx.has_exports() {
                ctx.report(Message::new(
                    MessageCode::UseExportsOrImportsBrowser,
                    Severity::Suggestion,
                    path.clone(),
                ));
            }
            // `false` disables a module and bare names redirect to other
            // packages; only relative targets are files.
            for (key, target) in map {
                let Some(target) = target.as_str().filter(|t| t.starts_with('.')) else {
                    continue;
                };
                let mut entry_path = path.clone();
                entry_path.push(key.clone());
                ctx.read_entry(target, Some(&entry_path), true)?;
            }
        }
        other => report_invalid_type(ctx, other, &path, "string,object"),
    }
    Ok(())
}

/// Without `exports`, every published JavaScript file is reachable by deep
/// imports, so each one is format-checked.
pub(crate) fn check_unexported_files(ctx: &Context<'_>) -> CheckResult {
    if ctx.has_exports() {
        return Ok(());
    }

    let mut covered = vec![ctx.resolve_path("./index.js")];
    for field in ENTRY_FIELDS {
        if let Some(target) = ctx.pkg.published_field(field).and_then(|(v, _)| v.as_str()) {
            if let Some(entry) = ctx.read_entry(target, None, true)? {
                covered.push(entry.path);
            }
        }
    }
    if let Some(target) = ctx.pkg.published_field("browser").and_then(|(v, _)| v.as_str()) {
        if let Some(entry) = ctx.read_entry(target, None, true)? {
            covered.push(entry.path);
        }
    }

    let glob = ctx.resolve_path("*");
    let files = resolve_glob(&glob, ctx.vfs, ctx.packed())
        .map_err(|source| CheckError::Io { path: glob, source })?;
    tracing::debug!(files = files.len(), "scanning files without exports");

    files
        .par_iter()
        .filter(|file| is_lintable_path(file) && !covered.contains(file))
        .for_each(|file| {
            let Ok(content) = ctx.vfs.read_file(file) else {
                return;
            };
            let display = ctx.display_path(file);
            if let Some(message) = ctx.format_mismatch(file, &content, &name_path(), &display) {
                ctx.report(message);
            }
        });
    Ok(())
}

const SHORTHAND_PATTERN: &str = r"^(?:(?:github|gitlab|bitbucket):)?[\w.-]+/[\w.-]+$|^gist:\w+$";
const GIT_URL_PATTERN: &str =
    r"^(?:git\+(?:https?|ssh|file)://|git://|https?://|ssh://|file://|git@[\w.-]+:)";
const GITHUB_GIT_PROTOCOL_PATTERN: &str = r"^git://github\.com/";
const SHORTHAND_SITE_PATTERN: &str = r"^https://(?:github\.com|gitlab\.com)/[\w.-]+/[\w.-]+/?$";

fn shorthand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, SHORTHAND_PATTERN)
}

fn git_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, GIT_URL_PATTERN)
}

fn github_git_protocol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, GITHUB_GIT_PROTOCOL_PATTERN)
}

fn shorthand_site_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, SHORTHAND_SITE_PATTERN)
}

pub(crate) fn check_repository(ctx: &Context<'_>) -> CheckResult {
    let Some((value, path)) = ctx.pkg.published_field("repository") else {
        return Ok(());
    };

    match value {
        Value::String(shorthand) => {
            if !shorthand_re().is_match(shorthand) {
                ctx.report(
                    Message::new(MessageCode::InvalidRepositoryValue, Severity::Warning, path)
                        .with_arg("type", "invalid-string-shorthand"),
                );
            }
        }
        Value::Object(repo) => {
            let is_git = repo.get("type").and_then(Value::as_str) == Some("git");
            let Some(url) = repo.get("url").and_then(Value::as_str).filter(|_| is_git) else {
                return Ok(());
            };
            let mut url_path = path;
            url_path.push("url".to_string());

            if !git_url_re().is_match(url) {
                ctx.report(
                    Message::new(MessageCode::InvalidRepositoryValue, Severity::Warning, url_path)
                        .with_arg("type", "invalid-git-url"),
                );
            } else if github_git_protocol_re().is_match(url) {
                ctx.report(
                    Message::new(
                        MessageCode::InvalidRepositoryValue,
                        Severity::Suggestion,
                        url_path,
                    )
                    .with_arg("type", "deprecated-github-git-protocol")
                    .with_arg("suggestValue", url.replacen("git://", "git+https://", 1)),
                );
            } else if shorthand_site_re().is_match(url) && !url.ends_with(".git") {
                ctx.report(
                    Message::new(
                        MessageCode::InvalidRepositoryValue,
                        Severity::Suggestion,
                        url_path,
                    )
                    .with_arg("type", "shorthand-git-sites")
                    .with_arg("suggestValue", format!("git+{}.git", url.trim_end_matches('/'))),
                );
            }
        }
        other => report_invalid_type(ctx, other, &path, "string,object"),
    }
    Ok(())
}

/// `type`, `files` and `license` suggestions.
pub(crate) fn check_package_hints(ctx: &Context<'_>) -> CheckResult {
    // Packages still relying on legacy entry fields are left alone.
    if ctx.has_exports() && !ctx.pkg.has("type") {
        ctx.report(Message::new(MessageCode::UseType, Severity::Suggestion, name_path()));
    }

    let npmignore = ctx.resolve_path(".npmignore");
    if !ctx.pkg.has("files") && !ctx.vfs.is_path_exist(&npmignore) {
        if let Some(internal) = published_internal_path(ctx)? {
            ctx.report(
                Message::new(MessageCode::UseFiles, Severity::Suggestion, name_path())
                    .with_arg("filePath", internal),
            );
        }
    }

    if !ctx.pkg.has("license") {
        let entries = ctx.vfs.read_dir(ctx.pkg_dir).map_err(|source| CheckError::Io {
            path: ctx.pkg_dir.to_string(),
            source,
        })?;
        let license = entries.iter().find(|name| {
            let stem = name.split('.').next().unwrap_or_default().to_uppercase();
            LICENSE_NAMES.contains(&stem.as_str())
        });
        if let Some(license) = license {
            ctx.report(
                Message::new(MessageCode::UseLicense, Severity::Suggestion, name_path())
                    .with_arg("licenseFilePath", format!("./{}", license)),
            );
        }
    }
    Ok(())
}

/// The first published file that only matters while developing the
/// package, as a `./`-relative path.
fn published_internal_path(ctx: &Context<'_>) -> CheckResult<Option<String>> {
    let glob = ctx.resolve_path("*");
    let mut files = resolve_glob(&glob, ctx.vfs, ctx.packed())
        .map_err(|source| CheckError::Io { path: glob, source })?;
    files.sort();
    Ok(files.into_iter().find_map(|file| {
        let relative = ctx.vfs.path_relative(ctx.pkg_dir, &file);
        is_internal_path(&relative).then(|| format!("./{}", relative))
    }))
}

fn is_internal_path(relative: &str) -> bool {
    match relative.split_once('/') {
        Some((dir, _)) => INTERNAL_DIRS.contains(&dir),
        None => INTERNAL_CONFIG_PREFIXES
            .iter()
            .any(|prefix| relative.starts_with(prefix)),
    }
}
