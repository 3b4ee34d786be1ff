mod logging;

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use publint::lint::{lint, lint_tarball, LintOptions, LintResult, Severity};
use publint::pack::{self, PackStrategy};
use publint::parser;
use publint::report::{self, ReportData, ReportFormat};
use publint::vfs::FsVfs;

#[derive(Parser)]
#[command(name = "publint")]
#[command(version)]
#[command(about = "Lint npm package publishing metadata", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint a package directory or a packed .tgz (the default command)
    Run(RunArgs),
    /// Lint every production dependency installed in node_modules
    Deps(DepsArgs),
}

#[derive(Args, Clone)]
struct LintArgs {
    /// Minimum severity to report
    #[arg(long, value_enum, env = "PUBLINT_LEVEL", default_value_t = Severity::Suggestion)]
    level: Severity,

    /// Report warnings as errors
    #[arg(long, env = "PUBLINT_STRICT")]
    strict: bool,

    /// Output format: text, json or markdown
    #[arg(long, default_value = "text")]
    format: ReportFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Package directory or tarball (defaults to the current directory)
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// How to determine published files: auto, npm, yarn, pnpm, bun or false
    #[arg(long, env = "PUBLINT_PACK", default_value = "auto")]
    pack: PackStrategy,

    #[command(flatten)]
    lint: LintArgs,
}

#[derive(Args, Clone)]
struct DepsArgs {
    /// Project directory whose dependencies are linted
    #[arg(default_value = ".")]
    dir: PathBuf,

    #[command(flatten)]
    lint: LintArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let outcome = match cli.command {
        Some(Commands::Run(args)) => run_package(&args),
        Some(Commands::Deps(args)) => run_deps(&args),
        None => run_package(&cli.run),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

impl LintArgs {
    fn options(&self, pkg_dir: &Path) -> LintOptions {
        LintOptions {
            pkg_dir: pkg_dir.to_string_lossy().into_owned(),
            level: self.level,
            strict: self.strict,
            packed_files: None,
        }
    }

    fn print(&self, data: &ReportData) -> Result<()> {
        let stdout = io::stdout();
        let color = !self.no_color && stdout.is_terminal();
        let mut out = stdout.lock();
        report::report(self.format, data, color, &mut out).context("failed to write report")?;
        out.flush().context("failed to write report")
    }
}

/// Lints one package. Returns false if errors remain.
fn run_package(args: &RunArgs) -> Result<bool> {
    let _span = info_span!("run", dir = %args.dir.display()).entered();

    if args.dir.is_file() {
        let bytes = fs::read(&args.dir)
            .with_context(|| format!("failed to read {}", args.dir.display()))?;
        let options = args.lint.options(Path::new("/package"));
        let result = lint_tarball(&bytes, &options)
            .with_context(|| format!("failed to lint {}", args.dir.display()))?;
        let data = ReportData::for_package(None, &args.dir.display().to_string(), result);
        args.lint.print(&data)?;
        return Ok(!has_errors(&data));
    }

    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("cannot access {}", args.dir.display()))?;

    let packed_files = pack::resolve_strategy(args.pack, &dir).and_then(|manager| {
        match pack::pack_files(&dir, manager) {
            Ok(files) => Some(files),
            Err(err) => {
                warn!(error = %err, "packing failed, treating every file as published");
                None
            }
        }
    });

    let options = LintOptions {
        packed_files,
        ..args.lint.options(&dir)
    };
    let result = lint(&FsVfs::new(), &options)
        .with_context(|| format!("failed to lint {}", dir.display()))?;

    let data = report_data(&dir, &args.dir, result);
    args.lint.print(&data)?;
    Ok(!has_errors(&data))
}

/// Lints each installed production dependency. Returns false if any of
/// them has errors.
fn run_deps(args: &DepsArgs) -> Result<bool> {
    let _span = info_span!("deps", dir = %args.dir.display()).entered();

    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("cannot access {}", args.dir.display()))?;
    let manifest = dir.join("package.json");
    let pkg = parser::parse_file(&manifest)
        .with_context(|| format!("failed to read {}", manifest.display()))?;

    let deps = parser::extract_production_dependencies(&pkg);
    info!(count = deps.len(), "linting dependencies");

    let reports: Vec<ReportData> = deps
        .par_iter()
        .filter_map(|dep| {
            let Some(dep_dir) = find_installed(&dir, &dep.name) else {
                warn!(dependency = %dep.name, "not installed, skipping");
                return None;
            };
            // Installed files are exactly what was published.
            match lint(&FsVfs::new(), &args.lint.options(&dep_dir)) {
                Ok(result) => Some(report_data(&dep_dir, Path::new(&dep.name), result)),
                Err(err) => {
                    warn!(dependency = %dep.name, error = %err, "failed to lint dependency");
                    None
                }
            }
        })
        .collect();

    let mut ok = true;
    for data in &reports {
        args.lint.print(data)?;
        ok &= !has_errors(data);
    }
    Ok(ok)
}

/// Finds `node_modules/<name>` in `dir` or its ancestors.
fn find_installed(dir: &Path, name: &str) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join("node_modules").join(name))
        .find(|candidate| candidate.join("package.json").is_file())
}

fn report_data(dir: &Path, display: &Path, result: LintResult) -> ReportData {
    let pkg = parser::parse_file(&dir.join("package.json")).ok();
    ReportData::for_package(pkg.as_ref(), &display.display().to_string(), result)
}

fn has_errors(data: &ReportData) -> bool {
    data.count(Severity::Error) > 0
}
