
use log::{debug, warn};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::data_types::job_batch::JobBatch;
use crate::job_runner::{CommandFailure, ExecutionMode, JobRunnerError, RunReport};

/// The two interchangeable ways of executing a batch
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecutorStrategy {
    /// Hand the job list to an external parallel executor, halting on the first failure
    Parallel { program: PathBuf },
    /// Run each command through the shell, in order, continuing past failures
    Sequential
}

impl ExecutorStrategy {
    /// Picks the parallel strategy if the program can be found, otherwise falls back to sequential.
    /// # Arguments
    /// * `program` - a bare program name (searched on `PATH`) or a path to it; None always selects sequential
    pub fn probe(program: Option<&str>) -> Self {
        match program.and_then(find_program) {
            Some(program) => ExecutorStrategy::Parallel { program },
            None => {
                if let Some(name) = program {
                    warn!("Executor {name:?} was not found, falling back to sequential execution");
                }
                ExecutorStrategy::Sequential
            }
        }
    }

    /// Executes the batch with this strategy.
    /// # Arguments
    /// * `batch` - the commands, used directly by the sequential strategy
    /// * `job_file` - the job-list file, fed to the parallel executor on stdin
    /// * `max_parallel` - concurrency bound for the parallel executor
    pub fn execute(&self, batch: &JobBatch, job_file: &Path, max_parallel: usize) -> Result<RunReport, JobRunnerError> {
        match self {
            ExecutorStrategy::Parallel { program } => run_parallel(program, batch, job_file, max_parallel),
            ExecutorStrategy::Sequential => Ok(run_sequential(batch))
        }
    }
}

/// Resolves a program name to an executable path, searching `PATH` for bare names
pub fn find_program(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(name))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Fail-fast path, the executor reads the job list on stdin.
/// Captured output is re-emitted on success and attached to the error otherwise.
fn run_parallel(program: &Path, batch: &JobBatch, job_file: &Path, max_parallel: usize) -> Result<RunReport, JobRunnerError> {
    let launch_err = |source| JobRunnerError::Launch { program: program.to_path_buf(), source };
    let stdin = File::open(job_file).map_err(launch_err)?;

    debug!("Launching {program:?} with {max_parallel} slots");
    let output = Command::new(program)
        .args(["--halt", "soon,fail=1", "-P", &max_parallel.to_string()])
        .stdin(stdin)
        .output()
        .map_err(launch_err)?;

    if !output.status.success() {
        return Err(JobRunnerError::ExecutorFailure {
            program: program.to_path_buf(),
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string()
        });
    }

    // the jobs have finished at this point, so a closed pipe here is not worth failing the batch over
    if let Err(e) = std::io::stdout().write_all(&output.stdout) {
        warn!("Error while forwarding executor stdout: {e}");
    }
    if let Err(e) = std::io::stderr().write_all(&output.stderr) {
        warn!("Error while forwarding executor stderr: {e}");
    }

    Ok(RunReport::new(ExecutionMode::Parallel, batch.len(), vec![]))
}

/// Best-effort path, strictly in order and one at a time; output goes straight to our own streams
fn run_sequential(batch: &JobBatch) -> RunReport {
    let total = batch.len();
    let mut failures = vec![];
    for (index, command) in batch.commands().iter().enumerate() {
        debug!("Job {}/{total}: {command}", index + 1);
        let status = match Command::new("sh").arg("-c").arg(command).status() {
            Ok(status) => status,
            Err(e) => {
                warn!("Job {}/{total} could not be started: {e}", index + 1);
                failures.push(CommandFailure { index, command: command.clone(), status: None });
                continue;
            }
        };

        if !status.success() {
            warn!("Job {}/{total} failed ({status}): {command}", index + 1);
            failures.push(CommandFailure { index, command: command.clone(), status: Some(status) });
        }
    }
    RunReport::new(ExecutionMode::Sequential, total, failures)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Writes an executable shell script and returns its path
    #[cfg(unix)]
    pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_probe_missing() {
        assert_eq!(ExecutorStrategy::probe(None), ExecutorStrategy::Sequential);
        assert_eq!(ExecutorStrategy::probe(Some("")), ExecutorStrategy::Sequential);
        assert_eq!(ExecutorStrategy::probe(Some("/no/such/parallel")), ExecutorStrategy::Sequential);
        assert_eq!(
            ExecutorStrategy::probe(Some("readrunner-this-program-does-not-exist")),
            ExecutorStrategy::Sequential
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_found() {
        // "sh" is on PATH anywhere the sequential fallback can work at all
        match ExecutorStrategy::probe(Some("sh")) {
            ExecutorStrategy::Parallel { program } => assert!(program.ends_with("sh")),
            other => panic!("expected Parallel, got {other:?}")
        }

        let bin_dir = TempDir::new().unwrap();
        let script = write_script(bin_dir.path(), "runner", "exit 0\n");
        assert_eq!(
            ExecutorStrategy::probe(Some(&script.to_string_lossy())),
            ExecutorStrategy::Parallel { program: script.clone() }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_not_executable() {
        let bin_dir = TempDir::new().unwrap();
        let plain = bin_dir.path().join("parallel");
        std::fs::write(&plain, "not a program").unwrap();
        assert_eq!(find_program(&plain.to_string_lossy()), None);
        assert_eq!(find_program(&bin_dir.path().to_string_lossy()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_sequential_order() {
        let out_dir = TempDir::new().unwrap();
        let out_fn = out_dir.path().join("order.txt");
        let batch = JobBatch::from_lines(&format!(
            "echo 1 >> '{0}'\nexit 7\necho 3 >> '{0}'\nexit 9\necho 5 >> '{0}'",
            out_fn.display()
        ), None);

        let report = run_sequential(&batch);
        assert_eq!(report.total(), 5);
        let failed: Vec<usize> = report.failures().iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![1, 3]);
        assert_eq!(std::fs::read_to_string(&out_fn).unwrap(), "1\n3\n5\n");
    }
}
