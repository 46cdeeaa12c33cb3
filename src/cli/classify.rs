
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ClassifySettings {
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

    /// Output table (TSV, or CSV if it ends in .csv) [default: stdout]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: Option<PathBuf>,

    /// Expect forward/reverse (1/2) reads in --query
    #[clap(short = 'r')]
    #[clap(long = "reads-are-paired")]
    #[clap(help_heading = Some("Classification"))]
    pub reads_are_paired: bool,

    /// Group files by the sample name in front of the mate suffix instead
    #[clap(long = "group-samples")]
    #[clap(conflicts_with = "reads_are_paired")]
    #[clap(help_heading = Some("Classification"))]
    pub group_samples: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_classify_settings(mut settings: ClassifySettings) -> anyhow::Result<ClassifySettings> {
    // hard code the version in
    settings.readrunner_version = FULL_VERSION.clone();
    info!("readrunner version: {:?}", &settings.readrunner_version);
    info!("Sub-command: classify");

    // input existence is part of classification itself, so just report here
    info!("Inputs:");
    for qry in settings.query.iter() {
        info!("\tQuery: {qry:?}");
    }

    info!("Outputs:");
    match settings.output_filename.as_deref() {
        Some(filename) => info!("\tTable: {filename:?}"),
        None => info!("\tTable: stdout")
    }

    info!("Classification parameters:");
    info!("\tPaired reads: {}", if settings.reads_are_paired { "ENABLED" } else { "DISABLED" });
    info!("\tSample grouping: {}", if settings.group_samples { "ENABLED" } else { "DISABLED" });

    Ok(settings)
}
