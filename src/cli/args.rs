//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct. Running without a subcommand
//! diagnoses the registry snapshot given by [`DiagnoseArgs`].

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::scan::ScanOptions;

/// VkDiag - Vulkan driver and layer registration diagnostics.
#[derive(Debug, Parser)]
#[command(name = "vkdiag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides the default config location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never prompt; print the fix menu and take the choice from VKDIAG_FIX
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub diagnose: DiagnoseArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the diagnose run.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DiagnoseArgs {
    /// Remove broken driver and layer registration entries
    #[arg(short = 'f', long)]
    pub fix: bool,

    /// Remove explicit (legacy) Vulkan driver registration
    #[arg(short = 'c', long)]
    pub clear_explicit_driver_reg: bool,

    /// Disable incompatible and duplicate Vulkan layers
    #[arg(short = 'd', long)]
    pub disable_incompatible_layers: bool,

    /// Registry snapshot (JSON) to diagnose
    #[arg(long, value_name = "FILE", env = "VKDIAG_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Write the snapshot, with any fixes applied, to this file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Skip the release check
    #[arg(long)]
    pub no_update_check: bool,
}

impl DiagnoseArgs {
    /// Scan modes requested on the command line.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            autofix: self.fix,
            clear: self.clear_explicit_driver_reg,
            disable_layers: self.disable_incompatible_layers,
        }
    }
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_diagnoses_without_fixes() {
        let cli = Cli::try_parse_from(["vkdiag"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.diagnose.scan_options(), ScanOptions::default());
        assert!(!cli.non_interactive);
    }

    #[test]
    fn short_flags_enable_fix_modes() {
        let cli = Cli::try_parse_from(["vkdiag", "-f", "-c", "-d"]).unwrap();
        assert_eq!(
            cli.diagnose.scan_options(),
            ScanOptions {
                autofix: true,
                clear: true,
                disable_layers: true,
            }
        );
    }

    #[test]
    fn long_flags_and_paths() {
        let cli = Cli::try_parse_from([
            "vkdiag",
            "--disable-incompatible-layers",
            "--snapshot",
            "reg.json",
            "--output",
            "fixed.json",
            "--no-update-check",
            "--non-interactive",
            "--config",
            "vkdiag.yml",
        ])
        .unwrap();
        assert!(cli.diagnose.disable_incompatible_layers);
        assert_eq!(cli.diagnose.snapshot, Some(PathBuf::from("reg.json")));
        assert_eq!(cli.diagnose.output, Some(PathBuf::from("fixed.json")));
        assert!(cli.diagnose.no_update_check);
        assert!(cli.non_interactive);
        assert_eq!(cli.config, Some(PathBuf::from("vkdiag.yml")));
    }

    #[test]
    fn completions_subcommand() {
        let cli = Cli::try_parse_from(["vkdiag", "completions", "bash"]).unwrap();
        match cli.command {
            Some(Commands::Completions(args)) => assert_eq!(args.shell, Shell::Bash),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
