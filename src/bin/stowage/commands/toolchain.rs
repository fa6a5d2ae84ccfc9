//! `stowage toolchain` command

use anyhow::{Context, Result};

use stowage::ops::{set_override, toolchain_report, OverrideOptions};
use stowage::util::config::{global_toolchain_config_path, project_toolchain_config_path};

use crate::cli::{MessageFormat, ToolchainArgs, ToolchainCommands, ToolchainOverrideArgs};

pub fn execute(args: ToolchainArgs) -> Result<()> {
    match args.command {
        None | Some(ToolchainCommands::Show) => show_toolchain(&args),
        Some(ToolchainCommands::Override(ref override_args)) => {
            override_toolchain(&args, override_args)
        }
    }
}

fn show_toolchain(args: &ToolchainArgs) -> Result<()> {
    let report = toolchain_report(&args.root, &args.tools.overrides())?;

    if args.message_format == MessageFormat::Json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("Toolchain:");
    println!();
    println!("  Archiver: {}", report.archiver.join(" "));
    println!("    Flavor: {}", report.flavor);
    println!(
        "    Thin:   {}",
        if report.thin_archives { "supported" } else { "not supported" }
    );
    println!("  Ranlib:   {}", report.ranlib.join(" "));
    println!("  Contents: {}", report.contents);
    println!();

    // Config files
    println!("Config:");
    if report.config_files.is_empty() {
        println!("  (none)");
    }
    for path in &report.config_files {
        println!("  {}", path.display());
    }
    println!();

    // Environment variables
    println!("Environment:");
    if let Ok(ar) = std::env::var("AR") {
        println!("  AR={}", ar);
    }
    if let Ok(ranlib) = std::env::var("RANLIB") {
        println!("  RANLIB={}", ranlib);
    }

    Ok(())
}

fn override_toolchain(args: &ToolchainArgs, override_args: &ToolchainOverrideArgs) -> Result<()> {
    let path = if override_args.global {
        global_toolchain_config_path().context("could not determine home directory")?
    } else {
        project_toolchain_config_path(&args.root)
    };

    set_override(
        &path,
        &OverrideOptions {
            ar: override_args.ar.clone(),
            ranlib: override_args.ranlib.clone(),
            flavor: override_args.flavor,
            contents: override_args.contents,
            ar_flags: override_args.ar_flags.clone(),
        },
    )?;

    eprintln!("Wrote {}", path.display());
    Ok(())
}
