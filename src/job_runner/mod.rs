/*!
# Job runner
Executes a batch of independent shell commands, delegating the parallelism to an external executor (GNU `parallel`) when one is available.
The batch is written to a temporary job-list file that only lives for the duration of a single `run_jobs` call.

Two strategies exist and are chosen at call time by probing for the executor program:
* Parallel - the executor runs with a concurrency bound and halts on the first failure; a failure is fatal to the batch.
* Sequential - each command is run through `sh -c` in order; failures are recorded and the batch keeps going.

## Example usage
```rust
use readrunner::data_types::job_batch::JobBatch;
use readrunner::job_runner::{run_jobs, ExecutionMode, JobRunnerConfigBuilder};

let batch = JobBatch::new();
let config = JobRunnerConfigBuilder::default()
    .max_parallel(4)
    .build().unwrap();

// nothing to do, so no executor is probed or started
let report = run_jobs(&batch, &config).unwrap();
assert_eq!(report.mode(), ExecutionMode::Skipped);
assert_eq!(report.total(), 0);
```
*/

/// Executor strategies and the program probe
pub mod executor;

use derive_builder::Builder;
use log::{debug, info, warn};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tempfile::NamedTempFile;

use crate::data_types::job_batch::JobBatch;
use crate::job_runner::executor::ExecutorStrategy;

/// Default program name probed for the parallel strategy
pub const DEFAULT_EXECUTOR: &str = "parallel";

/// Controls how a batch gets executed
#[derive(Builder, Clone, Debug)]
#[builder(default)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct JobRunnerConfig {
    /// Maximum number of concurrent jobs handed to the parallel executor
    max_parallel: usize,
    /// Program to probe for the parallel strategy; None forces the sequential fallback
    executor_program: Option<String>,
    /// Folder to create the job-list file in; None uses the system temporary folder
    job_dir: Option<PathBuf>,
    /// Prefix for the progress messages
    #[builder(setter(into))]
    label: String
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            executor_program: Some(DEFAULT_EXECUTOR.to_string()),
            job_dir: None,
            label: "Running jobs".to_string()
        }
    }
}

impl JobRunnerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.max_parallel {
            return Err("max_parallel must be >0".to_string());
        }
        Ok(())
    }
}

impl JobRunnerConfig {
    // getters
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn executor_program(&self) -> Option<&str> {
        self.executor_program.as_deref()
    }

    pub fn job_dir(&self) -> Option<&Path> {
        self.job_dir.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// How a batch ended up being executed
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
pub enum ExecutionMode {
    /// There were no jobs, nothing was started
    #[strum(serialize = "skipped")]
    Skipped,
    /// Delegated to the external executor, fail-fast
    #[strum(serialize = "parallel")]
    Parallel,
    /// Run one at a time, best-effort
    #[strum(serialize = "sequential")]
    Sequential
}

/// A single command that failed in the sequential fallback
#[derive(Clone, Debug)]
pub struct CommandFailure {
    /// 0-based position of the command in the batch
    pub index: usize,
    /// The command text
    pub command: String,
    /// Exit status, None if the shell could not be started at all
    pub status: Option<ExitStatus>
}

/// Outcome of a batch that was not fatal
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The strategy that was used
    mode: ExecutionMode,
    /// Number of jobs in the batch
    total: usize,
    /// Failed commands; only ever populated by the sequential fallback
    failures: Vec<CommandFailure>
}

impl RunReport {
    pub fn new(mode: ExecutionMode, total: usize, failures: Vec<CommandFailure>) -> Self {
        Self { mode, total, failures }
    }

    // getters
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn failures(&self) -> &[CommandFailure] {
        &self.failures
    }

    /// True if every job completed successfully (or there were none)
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fatal errors from running a batch; the job-list file is already removed when these are returned
#[derive(thiserror::Error, Debug)]
pub enum JobRunnerError {
    #[error("error while writing the job list: {0}")]
    JobFile(#[source] std::io::Error),
    #[error("error while launching {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("{program:?} halted with {status}:\n{stderr}\n{stdout}")]
    ExecutorFailure {
        program: PathBuf,
        status: ExitStatus,
        stdout: String,
        stderr: String
    }
}

/// Writes the batch to a fresh job-list file, which is removed when the returned handle drops
fn write_job_file(batch: &JobBatch, job_dir: Option<&Path>) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("readrunner-jobs-").suffix(".txt");
    let job_file = match job_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?
    };

    let mut writer = BufWriter::new(job_file.as_file());
    batch.write_job_list(&mut writer)?;
    drop(writer);
    Ok(job_file)
}

/// Runs every job in the batch.
/// # Arguments
/// * `batch` - the commands to run
/// * `config` - concurrency and executor selection
/// # Errors
/// * if the job-list file cannot be created
/// * if the parallel executor cannot be launched or exits non-zero
pub fn run_jobs(batch: &JobBatch, config: &JobRunnerConfig) -> Result<RunReport, JobRunnerError> {
    let num_jobs = batch.len();
    info!("{} (# jobs = {num_jobs})", config.label());
    if num_jobs == 0 {
        info!("No jobs to run");
        return Ok(RunReport::new(ExecutionMode::Skipped, 0, vec![]));
    }

    let strategy = ExecutorStrategy::probe(config.executor_program());
    debug!("Selected executor strategy: {strategy:?}");

    // the handle owns the file, every return below deletes it
    let job_file = write_job_file(batch, config.job_dir()).map_err(JobRunnerError::JobFile)?;
    debug!("Job list written to {:?}", job_file.path());

    let result = strategy.execute(batch, job_file.path(), config.max_parallel());

    let job_path = job_file.path().to_path_buf();
    if let Err(e) = job_file.close() {
        warn!("Error while removing job list {job_path:?}: {e}");
    }

    if let Ok(report) = result.as_ref() {
        if !report.is_success() {
            warn!("{} of {} commands failed", report.failures().len(), report.total());
        }
    }
    result
}
