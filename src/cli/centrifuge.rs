
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::centrifuge::{check_index, parse_excluded_tax_ids};
use crate::cli::core::{check_optional_filename, AFTER_HELP, FULL_VERSION};
use crate::data_types::file_format::FileFormat;
use crate::job_runner::DEFAULT_EXECUTOR;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CentrifugeSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    readrunner_version: String,

    /// File or directory of input reads, may be given multiple times
    #[clap(required = true)]
    #[clap(short = 'q')]
    #[clap(long = "query")]
    #[clap(value_name = "PATH")]
    #[clap(help_heading = Some("Input/Output"))]
    pub query: Vec<PathBuf>,

    /// Output directory for reports and figures
    #[clap(short = 'o')]
    #[clap(long = "out-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "centrifuge-out")]
    pub out_dir: PathBuf,

    /// Expect forward/reverse (1/2) reads in --query
    #[clap(short = 'r')]
    #[clap(long = "reads-are-paired")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reads_are_paired: bool,

    /// Input file format [default: guessed from the extensions]
    #[clap(short = 'f')]
    #[clap(long = "format")]
    #[clap(value_name = "FORMAT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub format: Option<FileFormat>,

    /// Centrifuge index name
    #[clap(short = 'i')]
    #[clap(long = "index")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Centrifuge"))]
    #[clap(default_value = "p_compressed+h+v")]
    pub index_name: String,

    /// Centrifuge index directory
    #[clap(required = true)]
    #[clap(short = 'I')]
    #[clap(long = "index-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Centrifuge"))]
    pub index_dir: PathBuf,

    /// Comma-separated list of tax ids to exclude
    #[clap(short = 'x')]
    #[clap(long = "exclude-tax-ids")]
    #[clap(value_name = "IDS")]
    #[clap(help_heading = Some("Centrifuge"))]
    #[clap(default_value = "", hide_default_value = true)]
    pub exclude_tax_ids: String,

    /// Number of threads per instance of centrifuge
    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Centrifuge"))]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Script that draws the bubble chart from the reports folder
    #[clap(long = "plot-script")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Figures"))]
    pub plot_script: Option<PathBuf>,

    /// Title for the bubble chart
    #[clap(short = 'T')]
    #[clap(long = "figure-title")]
    #[clap(value_name = "TITLE")]
    #[clap(help_heading = Some("Figures"))]
    #[clap(default_value = "Species abundance by sample")]
    pub figure_title: String,

    /// Max number of centrifuge processes to run concurrently
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

pub fn check_centrifuge_settings(mut settings: CentrifugeSettings) -> anyhow::Result<CentrifugeSettings> {
    // hard code the version in
    settings.readrunner_version = FULL_VERSION.clone();
    info!("readrunner version: {:?}", &settings.readrunner_version);
    info!("Sub-command: centrifuge");

    info!("Inputs:");
    for qry in settings.query.iter() {
        info!("\tQuery: {qry:?}");
    }
    info!("\tPaired reads: {}", if settings.reads_are_paired { "ENABLED" } else { "DISABLED" });
    match settings.format {
        Some(format) => info!("\tFormat: {format}"),
        None => info!("\tFormat: guess")
    }

    info!("Centrifuge parameters:");
    ensure!(!settings.index_name.is_empty(), "--index is required");
    check_index(&settings.index_dir, &settings.index_name)?;
    info!("\tIndex: {:?} in {:?}", &settings.index_name, &settings.index_dir);
    settings.exclude_tax_ids = parse_excluded_tax_ids(&settings.exclude_tax_ids);
    if !settings.exclude_tax_ids.is_empty() {
        info!("\tExcluded tax ids: {}", settings.exclude_tax_ids);
    }
    ensure!(settings.threads > 0, "--threads must be >0");
    info!("\tThreads per instance: {}", settings.threads);

    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.out_dir);
    check_optional_filename(settings.plot_script.as_deref(), "Plot script")?;
    if let Some(script) = settings.plot_script.as_deref() {
        info!("\tPlot script: {script:?}");
        info!("\tFigure title: {:?}", &settings.figure_title);
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

    fn base_settings() -> CentrifugeSettings {
        CentrifugeSettings {
            query: vec![PathBuf::from("test_data/reads")],
            out_dir: PathBuf::from("centrifuge-out"),
            index_name: "p_compressed+h+v".to_string(),
            index_dir: PathBuf::from("test_data/index"),
            exclude_tax_ids: "9606, nope".to_string(),
            threads: 1,
            procs: 4,
            parallel_bin: DEFAULT_EXECUTOR.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_centrifuge_settings() {
        let settings = check_centrifuge_settings(base_settings()).unwrap();
        assert_eq!(settings.exclude_tax_ids, "9606");

        let mut bad_index = base_settings();
        bad_index.index_name = "nt".to_string();
        assert!(check_centrifuge_settings(bad_index).is_err());

        let mut bad_dir = base_settings();
        bad_dir.index_dir = PathBuf::from("test_data/no_index_here");
        assert!(check_centrifuge_settings(bad_dir).is_err());

        let mut no_script = base_settings();
        no_script.plot_script = Some(PathBuf::from("test_data/missing_plot.r"));
        assert!(check_centrifuge_settings(no_script).is_err());
    }
}
