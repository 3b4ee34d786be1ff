//! Reading gzipped package tarballs.

use std::io::{self, Read};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;

/// Reads every regular file of a `.tgz`, returning paths relative to the
/// single top-level directory (usually `package/`) and their contents.
///
/// Absolute paths and `..` components are rejected. Symlinks and other
/// special entries are skipped.
pub fn read_tarball(bytes: &[u8]) -> io::Result<Vec<(String, Vec<u8>)>> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.into_owned();
        let Some(relative) = strip_top_level(&path)? else {
            continue;
        };

        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        files.push((relative, content));
    }

    if files.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "tarball contains no files",
        ));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Lists the relative paths of the files in a `.tgz`.
pub fn list_files(bytes: &[u8]) -> io::Result<Vec<String>> {
    Ok(read_tarball(bytes)?
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}

fn strip_top_level(path: &Path) -> io::Result<Option<String>> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("tarball entry escapes the package: {}", path.display()),
                ))
            }
        }
    }
    // A file directly at the top level has no package directory to strip.
    if parts.len() < 2 {
        return Ok(None);
    }
    Ok(Some(parts[1..].join("/")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tar::Builder;

    /// Builds a gzipped tarball from `(path, content)` pairs.
    pub(crate) fn build_tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut tar_bytes = Vec::new();
        {
            let mut builder = Builder::new(&mut tar_bytes);
            for (path, content) in files {
                let mut header = tar::Header::new_gnu();
                header.set_path(path).unwrap();
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
    fn test_read_tarball_strips_package_dir() {
        let tgz = build_tarball(&[
            ("package/package.json", r#"{"name":"test"}"#),
            ("package/dist/index.js", "module.exports = 42;"),
        ]);
        let files = read_tarball(&tgz).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "dist/index.js");
        assert_eq!(files[0].1, b"module.exports = 42;");
        assert_eq!(files[1].0, "package.json");
    }

    #[test]
    fn test_list_files_with_other_top_level_name() {
        let tgz = build_tarball(&[("node/package.json", "{}"), ("node/a.js", "")]);
        assert_eq!(list_files(&tgz).unwrap(), vec!["a.js", "package.json"]);
    }

    #[test]
    fn test_reject_empty_tarball() {
        let tgz = build_tarball(&[]);
        assert!(read_tarball(&tgz).is_err());
    }

    #[test]
    fn test_reject_garbage() {
        assert!(read_tarball(b"not a tarball").is_err());
    }

    #[test]
    fn test_strip_top_level_rejects_traversal() {
        assert!(strip_top_level(Path::new("package/../etc/passwd")).is_err());
        assert_eq!(strip_top_level(Path::new("package.json")).unwrap(), None);
    }
}
