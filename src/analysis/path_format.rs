//! Expected module format of a file path.
//!
//! `.mjs`/`.mts` files are always ESM and `.cjs`/`.cts` files are always
//! CommonJS. Everything else (`.js`, `.jsx`, `.d.ts`, ...) takes the format
//! declared by the `type` field of the nearest ancestor `package.json`,
//! defaulting to CommonJS.

use serde_json::Value;

use super::format::ModuleFormat;
use crate::vfs::Vfs;

/// React Native resolves `.native.js` itself and treats it as CommonJS no
/// matter what the nearest manifest says.
const NATIVE_SEGMENT: &str = ".native";

/// Returns the format `file_path` is declared to have.
///
/// Malformed `package.json` files met during the upward walk are skipped as
/// if absent.
pub fn expected_format(file_path: &str, vfs: &dyn Vfs) -> ModuleFormat {
    let path = strip_native_segment(file_path);
    if path.len() != file_path.len() && path.ends_with(".js") {
        return ModuleFormat::Cjs;
    }

    if path.ends_with(".mjs") || path.ends_with(".mts") {
        return ModuleFormat::Esm;
    }
    if path.ends_with(".cjs") || path.ends_with(".cts") {
        return ModuleFormat::Cjs;
    }

    match nearest_package_type(file_path, vfs) {
        Some(ty) if ty == "module" => ModuleFormat::Esm,
        _ => ModuleFormat::Cjs,
    }
}

/// Rewrites `foo.native.<ext>` to `foo.<ext>`.
fn strip_native_segment(file_path: &str) -> String {
    let ext_start = match file_path.rfind('.') {
        Some(idx) => idx,
        None => return file_path.to_string(),
    };
    let stem = &file_path[..ext_start];
    match stem.strip_suffix(NATIVE_SEGMENT) {
        Some(base) => format!("{}{}", base, &file_path[ext_start..]),
        None => file_path.to_string(),
    }
}

/// Walks up from the file's directory and returns the `type` field of the
/// first parseable `package.json`. `Some("")` means a manifest was found
/// without a `type` field.
fn nearest_package_type(file_path: &str, vfs: &dyn Vfs) -> Option<String> {
    let mut dir = vfs.get_dir_name(file_path);
    loop {
        let manifest_path = vfs.path_join(&[&dir, "package.json"]);
        if let Ok(content) = vfs.read_file(&manifest_path) {
            match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => {
                    let ty = map
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    tracing::trace!(manifest = %manifest_path, package_type = %ty, "nearest package.json");
                    return Some(ty);
                }
                _ => {
                    tracing::debug!(manifest = %manifest_path, "skipping malformed package.json");
                }
            }
        }

        let parent = vfs.get_dir_name(&dir);
        if parent == dir {
            return None;
        }
        dir = parent;
    }
}
