//! Command-line surface (spec §6), matching the teacher's `clap` dependency
//! and derive-macro style.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::build::{prepare, sdist, wheel};
use crate::registry::{BuilderRegistry, BuilderRole};

#[derive(Debug, Parser)]
#[command(name = "whey", about = "A PEP 621 build backend for pure-Python projects")]
pub struct Cli {
    /// Build an sdist
    #[arg(short = 's', long)]
    pub sdist: bool,

    /// Build a wheel
    #[arg(short = 'w', long)]
    pub wheel: bool,

    /// Build a binary artifact via the configured binary builder
    #[arg(short = 'b', long)]
    pub binary: bool,

    /// Output directory
    #[arg(short = 'o', long, default_value = "dist")]
    pub out_dir: PathBuf,

    /// Emit full error context on failures
    #[arg(short = 'T', long)]
    pub traceback: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
}

impl Cli {
    /// Drives the same code path the PEP 517 hooks use. Returns the paths of
    /// every artifact produced.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        install_tracing(self.verbose);

        // With no flags, the default is sdist + wheel (spec §6).
        let (want_sdist, want_wheel) = if !self.sdist && !self.wheel && !self.binary {
            (true, true)
        } else {
            (self.sdist, self.wheel)
        };

        let prepared = prepare(&self.project_root)?;
        for diagnostic in &prepared.diagnostics {
            tracing::warn!("{diagnostic}");
        }

        let mut artifacts = Vec::new();
        if want_sdist {
            artifacts.push(sdist::build(&prepared, &self.out_dir)?);
        }
        if want_wheel {
            artifacts.push(wheel::build(&prepared, &self.out_dir)?);
        }
        if self.binary {
            BuilderRegistry::new(&prepared.tool.builders).resolve(BuilderRole::Binary)?;
        }

        Ok(artifacts)
    }

    /// Prints `error` per `WHEY_TRACEBACK`/`--traceback` (spec §6).
    pub fn report_error(&self, error: &anyhow::Error) {
        let traceback = self.traceback || std::env::var("WHEY_TRACEBACK").as_deref() == Ok("1");
        if traceback {
            eprintln!("Error: {error:?}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

fn install_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
