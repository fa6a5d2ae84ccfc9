//! Stowage CLI - reproducible static-library archives

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use stowage::builder::ArchiveError;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        if let Some(diagnostic) = e.downcast_ref::<ArchiveError>() {
            if let Some(code) = diagnostic.code() {
                eprintln!("  code: {}", code);
            }
            if let Some(help) = diagnostic.help() {
                eprintln!("  help: {}", help);
            }
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stowage=debug")
    } else if cli.quiet {
        EnvFilter::new("stowage=error")
    } else {
        EnvFilter::new("stowage=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Archive(args) => commands::archive::execute(args, cli.verbose, cli.quiet),
        Commands::RuleKey(args) => commands::rule_key::execute(args),
        Commands::Toolchain(args) => commands::toolchain::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
