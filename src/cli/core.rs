
use anyhow::bail;
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use std::path::Path;

use crate::cli::centrifuge::CentrifugeSettings;
use crate::cli::classify::ClassifySettings;
use crate::cli::run::RunSettings;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.3.1-6bb9635-dirty` - while on a dirty branch
    /// * `0.3.1-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string containing the legalese.
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2019-{}     readrunner contributors
This program comes with ABSOLUTELY NO WARRANTY; it is distributed under
the terms of the MIT license.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// readrunner, sorts sequencing reads into pairs and runs job batches over them.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Sorts read files into forward, reverse, and unpaired sets
    Classify(Box<ClassifySettings>),
    /// Runs Centrifuge over every read file or read pair
    Centrifuge(Box<CentrifugeSettings>),
    /// Runs a file of shell commands with bounded parallelism
    Run(Box<RunSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_optional_filename(opt_filename: Option<&Path>, label: &str) -> anyhow::Result<()> {
    if let Some(filename) = opt_filename {
        if !filename.exists() {
            bail!("{} does not exist: \"{}\"", label, filename.display());
        }
    }

    // file either was not specified OR it exists
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from(["readrunner", "classify", "-q", "a", "-q", "b", "-r"]).unwrap();
        match cli.command {
            Commands::Classify(settings) => {
                assert_eq!(settings.query.len(), 2);
                assert!(settings.reads_are_paired);
            },
            _ => panic!("expected the classify subcommand")
        }
    }

    #[test]
    fn test_group_samples_conflicts_with_paired() {
        assert!(Cli::try_parse_from(["readrunner", "classify", "-q", "a", "--group-samples"]).is_ok());
        assert!(Cli::try_parse_from(["readrunner", "classify", "-q", "a", "-r", "--group-samples"]).is_err());
    }

    #[test]
    fn test_check_filenames() {
        assert!(check_required_filename(Path::new("test_data/reads"), "Reads").is_ok());
        assert!(check_required_filename(Path::new("test_data/missing"), "Reads").is_err());
        assert!(check_optional_filename(None, "Plot script").is_ok());
        assert!(check_optional_filename(Some(Path::new("test_data/missing")), "Plot script").is_err());
    }
}
