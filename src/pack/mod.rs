//! Determining which files a package manager would publish.
//!
//! npm reports its file list with `npm pack --dry-run --json`. The other
//! package managers have no dry run, so they pack into a temporary
//! directory and the tarball is read back.

pub mod archive;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// A package manager able to pack a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

impl PackageManager {
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    /// Lockfiles that identify this package manager.
    fn lockfiles(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &["package-lock.json", "npm-shrinkwrap.json"],
            PackageManager::Yarn => &["yarn.lock"],
            PackageManager::Pnpm => &["pnpm-lock.yaml"],
            PackageManager::Bun => &["bun.lockb", "bun.lock"],
        }
    }

    const ALL: [PackageManager; 4] = [
        PackageManager::Npm,
        PackageManager::Yarn,
        PackageManager::Pnpm,
        PackageManager::Bun,
    ];
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// How the packed file list is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackStrategy {
    /// Detect the package manager from lockfiles.
    #[default]
    Auto,
    Manager(PackageManager),
    /// Treat every file on disk as published.
    Disabled,
}

impl FromStr for PackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PackStrategy::Auto),
            "false" | "off" | "none" => Ok(PackStrategy::Disabled),
            "npm" => Ok(PackStrategy::Manager(PackageManager::Npm)),
            "yarn" => Ok(PackStrategy::Manager(PackageManager::Yarn)),
            "pnpm" => Ok(PackStrategy::Manager(PackageManager::Pnpm)),
            "bun" => Ok(PackStrategy::Manager(PackageManager::Bun)),
            _ => Err(format!(
                "Unknown pack option: '{}'. Valid options: auto, npm, yarn, pnpm, bun, false",
                s
            )),
        }
    }
}

impl fmt::Display for PackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStrategy::Auto => write!(f, "auto"),
            PackStrategy::Manager(pm) => write!(f, "{}", pm),
            PackStrategy::Disabled => write!(f, "false"),
        }
    }
}

/// Errors from running a package manager.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to run {manager}: {source}")]
    Spawn {
        manager: PackageManager,
        #[source]
        source: io::Error,
    },

    #[error("{manager} pack exited with {status}: {stderr}")]
    Failed {
        manager: PackageManager,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from npm pack: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{manager} pack produced no tarball")]
    NoTarball { manager: PackageManager },

    #[error("failed to read packed tarball: {0}")]
    Io(#[from] io::Error),
}

/// Finds the package manager managing `dir` by looking for lockfiles in
/// it and its ancestors. Defaults to npm.
pub fn detect_package_manager(dir: &Path) -> PackageManager {
    for ancestor in dir.ancestors() {
        for pm in PackageManager::ALL {
            if pm.lockfiles().iter().any(|lock| ancestor.join(lock).is_file()) {
                debug!(manager = %pm, dir = %ancestor.display(), "detected package manager");
                return pm;
            }
        }
    }
    PackageManager::Npm
}

/// Resolves a strategy to a concrete package manager, or `None` when
/// packing is disabled.
pub fn resolve_strategy(strategy: PackStrategy, dir: &Path) -> Option<PackageManager> {
    match strategy {
        PackStrategy::Auto => Some(detect_package_manager(dir)),
        PackStrategy::Manager(pm) => Some(pm),
        PackStrategy::Disabled => None,
    }
}

/// Returns the paths, relative to `dir`, that `manager` would publish.
pub fn pack_files(dir: &Path, manager: PackageManager) -> Result<Vec<String>, PackError> {
    info!(manager = %manager, dir = %dir.display(), "packing");
    let files = match manager {
        PackageManager::Npm => {
            let stdout = run(manager, dir, &["pack", "--dry-run", "--json", "--ignore-scripts"])?;
            parse_npm_pack_output(&stdout)?
        }
        _ => {
            let dest = tempfile::tempdir()?;
            let dest_str = dest.path().to_string_lossy().into_owned();
            let tarball_path = dest.path().join("package.tgz");
            let tarball_str = tarball_path.to_string_lossy().into_owned();
            let args: Vec<&str> = match manager {
                PackageManager::Yarn => vec!["pack", "--out", &tarball_str],
                PackageManager::Pnpm => vec!["pack", "--pack-destination", &dest_str],
                _ => vec!["pm", "pack", "--destination", &dest_str],
            };
            run(manager, dir, &args)?;
            let tarball = find_tarball(dest.path()).ok_or(PackError::NoTarball { manager })?;
            archive::list_files(&fs::read(tarball)?)?
        }
    };
    debug!(files = files.len(), "packed file list");
    Ok(files)
}

fn run(manager: PackageManager, dir: &Path, args: &[&str]) -> Result<String, PackError> {
    let output = Command::new(manager.command())
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| PackError::Spawn { manager, source })?;
    if !output.status.success() {
        return Err(PackError::Failed {
            manager,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn find_tarball(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| path.extension().is_some_and(|ext| ext == "tgz"))
}

#[derive(Debug, Deserialize)]
struct NpmPackResult {
    files: Vec<NpmPackFile>,
}

#[derive(Debug, Deserialize)]
struct NpmPackFile {
    path: String,
}

/// Parses `npm pack --dry-run --json`. Lifecycle scripts may print before
/// the JSON array, so parsing starts at the first `[`.
fn parse_npm_pack_output(stdout: &str) -> Result<Vec<String>, PackError> {
    let json = stdout.find('[').map(|idx| &stdout[idx..]).unwrap_or(stdout);
    let results: Vec<NpmPackResult> = serde_json::from_str(json)?;
    Ok(results
        .into_iter()
        .flat_map(|r| r.files)
        .map(|f| f.path)
        .collect())
}
