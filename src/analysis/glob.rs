//! Expansion of `exports` wildcard patterns into concrete files.
//!
//! A pattern such as `/pkg/dist/*.js` is matched against every file below
//! its longest wildcard-free directory (`/pkg/dist`). As in Node's subpath
//! patterns, `*` may span directory separators. When the pattern carries
//! more than one `*`, every wildcard must capture the same text.

use std::io;

use regex::Regex;

use crate::vfs::Vfs;

/// Directories that are never published and never scanned.
fn is_ignored_dir(name: &str) -> bool {
    matches!(name, "node_modules" | ".git")
}

/// Returns every file matching `glob`.
///
/// `glob` must be an absolute path under the package root containing at
/// least one `*`. When `packed_files` is given, only files in that list (or
/// directories containing such files) are visited. The result is in
/// directory-walk order.
///
/// # Example
///
/// ```
/// use publint::analysis::resolve_glob;
/// use publint::vfs::MemoryVfs;
///
/// let vfs = MemoryVfs::new()
///     .with_file("/pkg/alpha.js", "")
///     .with_file("/pkg/bravo.mjs", "")
///     .with_file("/pkg/nested/index.js", "");
///
/// let files = resolve_glob("/pkg/*.js", &vfs, None).unwrap();
/// assert_eq!(files, vec!["/pkg/alpha.js", "/pkg/nested/index.js"]);
/// ```
pub fn resolve_glob(
    glob: &str,
    vfs: &dyn Vfs,
    packed_files: Option<&[String]>,
) -> io::Result<Vec<String>> {
    let mut matched = Vec::new();

    let prefix = glob.split('*').next().unwrap_or_default();
    let top_dir = match prefix.rfind('/') {
        Some(idx) if idx > 0 => &prefix[..idx],
        Some(_) => "/",
        None => return Ok(matched),
    };
    if !vfs.is_path_dir(top_dir) {
        return Ok(matched);
    }

    let pattern = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("(.+)");
    let re = Regex::new(&format!("^{}$", pattern))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    scan_dir(top_dir, vfs, packed_files, &re, &mut matched)?;
    Ok(matched)
}

fn scan_dir(
    dir: &str,
    vfs: &dyn Vfs,
    packed_files: Option<&[String]>,
    re: &Regex,
    matched: &mut Vec<String>,
) -> io::Result<()> {
    for name in vfs.read_dir(dir)? {
        if is_ignored_dir(&name) {
            continue;
        }
        let item_path = vfs.path_join(&[dir, &name]);
        if let Some(packed) = packed_files {
            if !packed.iter().any(|f| is_same_or_inside(f, &item_path)) {
                continue;
            }
        }

        if vfs.is_path_dir(&item_path) {
            scan_dir(&item_path, vfs, packed_files, re, matched)?;
        } else if captures_agree(re, &item_path) {
            matched.push(item_path);
        }
    }
    Ok(())
}

fn is_same_or_inside(file: &str, item: &str) -> bool {
    file == item
        || file
            .strip_prefix(item)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Matches `path` and requires all wildcard captures to be identical.
fn captures_agree(re: &Regex, path: &str) -> bool {
    let Some(caps) = re.captures(path) else {
        return false;
    };
    let mut groups = caps.iter().skip(1).flatten().map(|m| m.as_str());
    match groups.next() {
        Some(first) => groups.all(|g| g == first),
        None => false,
    }
}
