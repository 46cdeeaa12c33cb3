
use log::{LevelFilter, error, info, warn};
use std::time::Instant;

use readrunner::centrifuge::{build_centrifuge_jobs, done_message, guess_format, make_bubble, CentrifugeConfigBuilder};
use readrunner::classifier::{classify_files, resolve_input_files, ClassifyError};
use readrunner::cli::centrifuge::{CentrifugeSettings, check_centrifuge_settings};
use readrunner::cli::classify::{ClassifySettings, check_classify_settings};
use readrunner::cli::core::{Commands, get_cli};
use readrunner::cli::run::{RunSettings, check_run_settings};
use readrunner::data_types::classified_files::ClassifiedFiles;
use readrunner::data_types::job_batch::JobBatch;
use readrunner::job_runner::{run_jobs, JobRunnerConfig, JobRunnerConfigBuilder, JobRunnerError, RunReport};
use readrunner::sample_groups::group_by_sample;
use readrunner::util::json_io::save_json;
use readrunner::writers::classification::ClassificationWriter;

/// Set up logging before we check the other settings
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Maps classification failures onto process exit codes
fn classify_exit_code(err: &ClassifyError) -> exitcode::ExitCode {
    match err {
        ClassifyError::InvalidInput { .. } => exitcode::NOINPUT,
        ClassifyError::UnbalancedPairs { .. } => exitcode::DATAERR,
        ClassifyError::Io { .. } => exitcode::IOERR,
        ClassifyError::Pattern(_) => exitcode::SOFTWARE
    }
}

/// Classifies the inputs, exiting on any failure
fn classify_or_exit(query: &[std::path::PathBuf], reads_are_paired: bool) -> ClassifiedFiles {
    match classify_files(query, reads_are_paired) {
        Ok(cf) => cf,
        Err(e) => {
            error!("Error while classifying input files: {e}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

/// Builds the runner configuration, exiting if it is invalid
fn runner_config_or_exit(procs: usize, parallel_bin: &str, label: &str) -> JobRunnerConfig {
    match JobRunnerConfigBuilder::default()
        .max_parallel(procs)
        .executor_program(Some(parallel_bin.to_string()))
        .label(label)
        .build() {
        Ok(rc) => rc,
        Err(e) => {
            error!("Error while building job runner config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

/// Runs the batch and exits on a fatal executor error or on any sequential command failure
fn run_jobs_or_exit(batch: &JobBatch, config: &JobRunnerConfig) -> RunReport {
    let report = match run_jobs(batch, config) {
        Ok(r) => r,
        Err(e @ JobRunnerError::ExecutorFailure { .. }) => {
            error!("Error while running jobs: {e}");
            std::process::exit(exitcode::SOFTWARE);
        },
        Err(e) => {
            error!("Error while running jobs: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };

    if !report.is_success() {
        for failure in report.failures().iter() {
            let status = failure.status.map(|s| s.to_string()).unwrap_or("not started".to_string());
            error!("Job #{} failed ({status}): {}", failure.index + 1, failure.command);
        }
        error!("{} of {} jobs failed", report.failures().len(), report.total());
        std::process::exit(exitcode::SOFTWARE);
    }
    report
}

fn run_classify(settings: ClassifySettings) {
    let start_time = Instant::now();
    init_logging(settings.verbosity);

    let settings = match check_classify_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let write_result = if settings.group_samples {
        let files = match resolve_input_files(&settings.query) {
            Ok(f) => f,
            Err(e) => {
                error!("Error while resolving input files: {e}");
                std::process::exit(classify_exit_code(&e));
            }
        };
        let groups = match group_by_sample(&files) {
            Ok(g) => g,
            Err(e) => {
                error!("Error while grouping samples: {e}");
                std::process::exit(exitcode::SOFTWARE);
            }
        };
        info!("Samples found: {}, unpaired files: {}", groups.paired().len(), groups.unpaired().len());

        match settings.output_filename.as_deref() {
            Some(filename) => ClassificationWriter::from_path(filename)
                .and_then(|mut w| w.write_sample_groups(&groups)),
            None => ClassificationWriter::from_writer(std::io::stdout().lock())
                .write_sample_groups(&groups)
        }
    } else {
        let classified = classify_or_exit(&settings.query, settings.reads_are_paired);
        info!(
            "Files found: forward = {}, reverse = {}, unpaired = {}",
            classified.forward().len(), classified.reverse().len(), classified.unpaired().len()
        );

        match settings.output_filename.as_deref() {
            Some(filename) => ClassificationWriter::from_path(filename)
                .and_then(|mut w| w.write_classified(&classified)),
            None => ClassificationWriter::from_writer(std::io::stdout().lock())
                .write_classified(&classified)
        }
    };

    if let Err(e) = write_result {
        error!("Error while writing classification table: {e}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Classification completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_centrifuge(settings: CentrifugeSettings) {
    let start_time = Instant::now();
    init_logging(settings.verbosity);

    let settings = match check_centrifuge_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // create the primary output folders
    let reports_dir = settings.out_dir.join("reports");
    info!("Creating output folder at {reports_dir:?}...");
    if let Err(e) = std::fs::create_dir_all(&reports_dir) {
        error!("Error while creating output folder: {e}");
        std::process::exit(exitcode::IOERR);
    }

    // save the CLI options
    let cli_json = settings.out_dir.join("cli_settings.json");
    info!("Saving CLI options to {cli_json:?}...");
    if let Err(e) = save_json(&settings, &cli_json) {
        error!("Error while saving CLI options: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let classified = classify_or_exit(&settings.query, settings.reads_are_paired);
    let file_format = match settings.format {
        Some(f) => f,
        None => match guess_format(classified.iter().map(|(_, p)| p)) {
            Ok(f) => {
                info!("Guessed input format: {f}");
                f
            },
            Err(e) => {
                error!("Error while guessing file format: {e:#}");
                std::process::exit(exitcode::CONFIG);
            }
        }
    };

    println!(
        "Files found: forward = \"{}\", reverse = \"{}\", unpaired = \"{}\"",
        classified.forward().len(), classified.reverse().len(), classified.unpaired().len()
    );

    let centrifuge_config = match CentrifugeConfigBuilder::default()
        .index_dir(settings.index_dir.clone())
        .index_name(settings.index_name.clone())
        .file_format(file_format)
        .threads(settings.threads)
        .exclude_tax_ids(settings.exclude_tax_ids.clone())
        .reports_dir(reports_dir.clone())
        .build() {
        Ok(cc) => cc,
        Err(e) => {
            error!("Error while building centrifuge config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let batch = match build_centrifuge_jobs(&classified, &centrifuge_config) {
        Ok(b) => b,
        Err(e) => {
            error!("Error while building centrifuge jobs: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let runner_config = runner_config_or_exit(settings.procs, &settings.parallel_bin, "Running Centrifuge");
    run_jobs_or_exit(&batch, &runner_config);

    let fig_dir = settings.out_dir.join("figures");
    let plotted = match settings.plot_script.as_deref() {
        Some(script) => match make_bubble(script, &reports_dir, &settings.figure_title, &fig_dir) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error while making the bubble chart: {e:#}");
                false
            }
        },
        None => false
    };

    println!("{}", done_message(&reports_dir, plotted.then_some(fig_dir.as_path())));
    info!("Centrifuge pipeline completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_job_file(settings: RunSettings) {
    let start_time = Instant::now();
    init_logging(settings.verbosity);

    let settings = match check_run_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let text = match std::fs::read_to_string(&settings.jobs_filename) {
        Ok(t) => t,
        Err(e) => {
            error!("Error while reading job file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let batch = JobBatch::from_lines(&text, settings.max_jobs);

    let runner_config = runner_config_or_exit(settings.procs, &settings.parallel_bin, "Running jobs");
    let report = run_jobs_or_exit(&batch, &runner_config);
    info!("Ran {} jobs ({}) in {} seconds.", report.total(), report.mode(), start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Classify(settings) => {
            run_classify(*settings);
        },
        Commands::Centrifuge(settings) => {
            run_centrifuge(*settings);
        },
        Commands::Run(settings) => {
            run_job_file(*settings);
        }
    }

    info!("Process finished successfully.");
}
