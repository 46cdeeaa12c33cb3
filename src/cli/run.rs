
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::job_runner::DEFAULT_EXECUTOR;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct RunSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    readrunner_version: String,

    /// File of shell commands, one per line; blank lines are ignored
    #[clap(required = true)]
    #[clap(short = 'j')]
    #[clap(long = "jobs")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub jobs_filename: PathBuf,

    /// Only run the first N commands [default: all]
    #[clap(long = "max-jobs")]
    #[clap(value_name = "N")]
    #[clap(help_heading = Some("Input/Output"))]
    pub max_jobs: Option<usize>,

    /// Max number of jobs to run concurrently
    #[clap(short = 'P')]
    #[clap(long = "procs")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Execution"))]
    #[clap(default_value = "4")]
    pub procs: usize,

    /// Parallel executor to use; falls back to sequential execution if it is not found
    #[clap(long = "parallel-bin")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help_heading = Some("Execution"))]
    #[clap(default_value = DEFAULT_EXECUTOR)]
    pub parallel_bin: String,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_run_settings(mut settings: RunSettings) -> anyhow::Result<RunSettings> {
    // hard code the version in
    settings.readrunner_version = FULL_VERSION.clone();
    info!("readrunner version: {:?}", &settings.readrunner_version);
    info!("Sub-command: run");

    info!("Inputs:");
    check_required_filename(&settings.jobs_filename, "Job file")?;
    info!("\tJob file: {:?}", &settings.jobs_filename);
    if let Some(max_jobs) = settings.max_jobs {
        info!("\tMax jobs: {max_jobs}");
    }

    info!("Execution parameters:");
    ensure!(settings.procs > 0, "--procs must be >0");
    info!("\tProcesses: {}", settings.procs);
    info!("\tExecutor: {:?}", &settings.parallel_bin);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> RunSettings {
        RunSettings {
            jobs_filename: PathBuf::from("test_data/jobs/mixed.txt"),
            procs: 4,
            parallel_bin: DEFAULT_EXECUTOR.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_run_settings() {
        let settings = check_run_settings(base_settings()).unwrap();
        assert_eq!(settings.readrunner_version, *FULL_VERSION);

        let mut zero_procs = base_settings();
        zero_procs.procs = 0;
        assert!(check_run_settings(zero_procs).is_err());

        let mut missing = base_settings();
        missing.jobs_filename = PathBuf::from("test_data/jobs/missing.txt");
        assert!(check_run_settings(missing).is_err());
    }
}
