//! Command-line driver for the cedarc front end.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::arena_ctx::AstArenas;
use crate::compile::{parse_file, FrontendOptions};
use crate::dump::dump_translation_unit;
use crate::intern::Interner;

#[derive(Parser)]
#[command(name = "cedarc")]
#[command(about = "C99 front end: parse C sources and report diagnostics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Input source files
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Print the parsed AST for each successful input
    #[arg(long)]
    pub ast: bool,

    /// Append a user include search directory (order preserved)
    #[arg(short = 'I', long = "include-directory", value_name = "DIR")]
    pub include_directory: Vec<PathBuf>,

    /// Append a system include search directory (order preserved)
    #[arg(long = "system-include-directory", value_name = "DIR")]
    pub system_include_directory: Vec<PathBuf>,
}

/// Rewrite the traditional single-dash `-isystem<dir>` spelling (with or
/// without an attached value) to the long option before clap sees it.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    for arg in args {
        match arg.to_str() {
            Some("-isystem") => out.push(OsString::from("--system-include-directory")),
            Some(s) if s.starts_with("-isystem") => {
                out.push(OsString::from(format!(
                    "--system-include-directory={}",
                    &s["-isystem".len()..]
                )));
            }
            _ => out.push(arg),
        }
    }
    out
}

/// Entry point for the driver. Usage errors exit through clap; compilation
/// errors surface as an `Err` so `main` can set the exit code.
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    run_with(cli)
}

fn run_with(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = FrontendOptions {
        user_include_paths: cli.include_directory.clone(),
        system_include_paths: cli.system_include_directory.clone(),
    };

    let mut failed = false;
    for input in &cli.inputs {
        let arenas = AstArenas::new();
        let mut interner = Interner::new();
        let outcome = parse_file(input, arenas.ctx(), &mut interner, &options)
            .map_err(|err| format!("{}: {}", input.display(), err))?;

        for diag in &outcome.diagnostics {
            eprintln!("{}", diag.render(&interner));
        }
        if outcome.is_success() {
            if cli.ast {
                print!("{}", dump_translation_unit(&outcome.unit, &interner));
            }
        } else {
            failed = true;
        }
    }

    if failed {
        return Err("compilation failed".into());
    }
    Ok(())
}
