// Author: Dustin Pilgrim
// License: MIT

//! Command-line front end.
//!
//! ```bash
//! # Check every .pxml/.pjson file under a directory
//! pairc check defs/
//!
//! # Diagnostics as JSON
//! pairc check --json site.pxml
//!
//! # Print the expanded documents
//! pairc dump site.pxml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pairc::ast::TargetFormat;
use pairc::compiler::{CompileOutput, Compiler};
use pairc::export::{export_diagnostics_to_json, export_unit_to_json};
use pairc::options::CompilerOptions;
use pairc::utils::format_summary;
use pairc::PaircError;

#[derive(Parser)]
#[command(name = "pairc")]
#[command(version)]
#[command(about = "Compiler for the indentation-sensitive pair notation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Options file (JSON)
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// Format of inputs whose extension names neither format
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Xml,
    Json,
}

impl From<FormatArg> for TargetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xml => TargetFormat::Xml,
            FormatArg::Json => TargetFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and resolve inputs, printing diagnostics
    Check {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the expanded documents as JSON
    Dump {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "pairc=info",
        1 => "pairc=debug",
        _ => "pairc=trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .init();
}

fn load_options(cli: &Cli) -> Result<CompilerOptions, PaircError> {
    let mut options = match &cli.options {
        Some(path) => CompilerOptions::from_file(path)?,
        None => CompilerOptions::default(),
    };
    if let Some(format) = cli.format {
        options.default_format = format.into();
    }
    Ok(options)
}

fn print_diagnostics(output: &CompileOutput, json: bool) -> Result<(), PaircError> {
    if json {
        println!("{}", export_diagnostics_to_json(&output.diagnostics)?);
    } else {
        for diagnostic in &output.diagnostics {
            println!("{}", diagnostic);
        }
        println!(
            "{}",
            format_summary(output.unit.modules().len(), output.diagnostics.len())
        );
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<bool, PaircError> {
    let compiler = Compiler::new(load_options(cli)?);
    match &cli.command {
        Commands::Check { paths, json } => {
            let output = compiler.compile_paths(paths.as_slice())?;
            print_diagnostics(&output, *json)?;
            Ok(!output.has_errors())
        }
        Commands::Dump { paths } => {
            let output = compiler.compile_paths(paths.as_slice())?;
            for diagnostic in &output.diagnostics {
                eprintln!("{}", diagnostic);
            }
            println!(
                "{}",
                export_unit_to_json(&output.unit, compiler.options().expand_max_depth)?
            );
            Ok(!output.has_errors())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
