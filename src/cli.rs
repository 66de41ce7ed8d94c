//! Command-line interface for stubfill.

use clap::{ArgAction, ArgGroup, Parser};
use colored::*;
use std::path::PathBuf;

use crate::engine::{Engine, EnrichConfig, OutputMode};
use crate::runtime::{ManifestProvider, RuntimeFacts, SymbolProvider};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Add documentation from a live runtime to type stubs.
///
/// Stubfill walks one or more stub directories, resolves every module,
/// class and function declaration against the runtime's symbols, and
/// inserts the docstring the live implementation carries. Declarations
/// that already have documentation, or that are dead under the target
/// version/platform, are left alone. Untouched text survives
/// byte-for-byte.
#[derive(Parser)]
#[command(name = "stubfill")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("dest").required(true).multiple(false)))]
pub struct Cli {
    /// Directories to read stubs from
    #[arg(value_name = "INPUT_DIR", required = true)]
    pub input_dirs: Vec<PathBuf>,

    /// Modify stubs in place
    #[arg(short, long, group = "dest")]
    pub in_place: bool,

    /// Directory to write modified stubs to
    #[arg(short, long, value_name = "OUTPUT_DIR", group = "dest")]
    pub output: Option<PathBuf>,

    /// Directory containing runtime symbol manifests
    #[arg(short, long, value_name = "MANIFEST_DIR")]
    pub manifest: PathBuf,

    /// Increase verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Only process modules built into the runtime
    #[arg(short = 'b', long)]
    pub builtins_only: bool,

    /// Only add a docstring when the symbol's source cannot be found
    #[arg(long)]
    pub if_needed: bool,

    /// Runtime version to fold conditions against (default: manifest)
    #[arg(long, value_name = "X.Y[.Z]")]
    pub target_version: Option<String>,

    /// Runtime platform to fold conditions against (default: manifest)
    #[arg(long, value_name = "NAME")]
    pub target_platform: Option<String>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Parse a dotted version like "3.12" or "3.12.1".
fn parse_version(text: &str) -> anyhow::Result<Vec<u32>> {
    let parts: Result<Vec<u32>, _> = text.split('.').map(|p| p.trim().parse::<u32>()).collect();
    let parts = parts.map_err(|_| anyhow::anyhow!("invalid version {:?}", text))?;
    if parts.is_empty() {
        anyhow::bail!("invalid version {:?}", text);
    }
    Ok(parts)
}

/// Resolve the version/platform facts: explicit flags win, then the
/// manifest's own runtime facts. Guessing is not an option.
fn resolve_facts(cli: &Cli, provider: &dyn SymbolProvider) -> anyhow::Result<RuntimeFacts> {
    let manifest_facts = provider.runtime_facts();

    let version = match &cli.target_version {
        Some(text) => parse_version(text)?,
        None => match &manifest_facts {
            Some(facts) => facts.version.clone(),
            None => anyhow::bail!(
                "no target version: pass --target-version or add runtime.json to the manifest directory"
            ),
        },
    };
    let platform = match &cli.target_platform {
        Some(name) => name.clone(),
        None => match &manifest_facts {
            Some(facts) => facts.platform.clone(),
            None => anyhow::bail!(
                "no target platform: pass --target-platform or add runtime.json to the manifest directory"
            ),
        },
    };
    Ok(RuntimeFacts { version, platform })
}

/// Run the enrichment over the configured directories.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let provider = match ManifestProvider::new(&cli.manifest) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let facts = match resolve_facts(cli, &provider) {
        Ok(facts) => facts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    for dir in &cli.input_dirs {
        if !dir.is_dir() {
            eprintln!("Error: input path {:?} is not a directory", dir);
            return Ok(EXIT_ERROR);
        }
    }

    let output = match &cli.output {
        Some(dir) => OutputMode::OutputDir(dir.clone()),
        None => OutputMode::InPlace,
    };

    let config = EnrichConfig {
        input_dirs: cli.input_dirs.clone(),
        output,
        builtins_only: cli.builtins_only,
        if_needed: cli.if_needed,
        facts,
        progress: !cli.no_progress && cli.quiet == 0,
    };

    let engine = Engine::new(config, Box::new(provider));
    let summary = engine.run()?;

    let counts = format!(
        "{} file(s), {} docstring(s) added",
        summary.processed, summary.docs_added
    );
    if summary.skipped > 0 {
        println!(
            "{} {} ({} skipped)",
            "done:".green().bold(),
            counts,
            summary.skipped.to_string().yellow()
        );
    } else {
        println!("{} {}", "done:".green().bold(), counts);
    }

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("3.12").unwrap(), vec![3, 12]);
        assert_eq!(parse_version("3.12.1").unwrap(), vec![3, 12, 1]);
        assert_eq!(parse_version("3").unwrap(), vec![3]);
        assert!(parse_version("three").is_err());
        assert!(parse_version("").is_err());
    }

    #[test]
    fn test_cli_requires_destination() {
        use clap::CommandFactory;
        let result = Cli::try_parse_from(["stubfill", "stubs", "-m", "manifests"]);
        assert!(result.is_err());
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_rejects_both_destinations() {
        let result = Cli::try_parse_from([
            "stubfill", "stubs", "-m", "manifests", "-i", "-o", "out",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_full_surface() {
        let cli = Cli::try_parse_from([
            "stubfill",
            "stubs",
            "more-stubs",
            "-m",
            "manifests",
            "-o",
            "out",
            "-vv",
            "-b",
            "--if-needed",
            "--target-version",
            "3.11",
            "--target-platform",
            "darwin",
            "--no-progress",
        ])
        .unwrap();
        assert_eq!(cli.input_dirs.len(), 2);
        assert_eq!(cli.verbose, 2);
        assert!(cli.builtins_only);
        assert!(cli.if_needed);
        assert_eq!(cli.target_version.as_deref(), Some("3.11"));
        assert_eq!(cli.target_platform.as_deref(), Some("darwin"));
        assert!(cli.no_progress);
    }
}
