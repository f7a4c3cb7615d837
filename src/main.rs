//! Breakpoint density main executable

pub mod breaks;
pub mod cohort;
pub mod common;
pub mod conf;
pub mod density;
pub mod err;
pub mod genome;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Breakpoint density in callable genome bins",
    long_about = "This tool counts breakpoints per sample or histology group in fixed-width \
                  genome bins, masking bins with too little callable sequence"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Write genome bins with their callable fraction.
    Bins(genome::cli::Args),
    /// Density-related commands.
    Density(Density),
}

/// Parsing of "density *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Density {
    /// The sub command to run
    #[command(subcommand)]
    command: DensityCommands,
}

/// Enum supporting the parsing of "density *" sub commands.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Subcommand)]
enum DensityCommands {
    Samples(cohort::cli::SamplesArgs),
    Groups(cohort::cli::GroupsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    let result = tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Bins(args) => genome::cli::run(&cli.common, args)?,
            Commands::Density(density) => match &density.command {
                DensityCommands::Samples(args) => cohort::cli::run_samples(&cli.common, args)?,
                DensityCommands::Groups(args) => cohort::cli::run_groups(&cli.common, args)?,
            },
        }

        Ok::<(), anyhow::Error>(())
    });

    match result {
        Ok(()) => {
            if let Err(e) =
                term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))
            {
                eprintln!("could not write to terminal: {}", e);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(
                e.downcast_ref::<err::DensityError>()
                    .map(err::DensityError::exit_code)
                    .unwrap_or(1),
            )
        }
    }
}
