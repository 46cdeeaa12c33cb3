/*!
# Centrifuge
Builds the shell commands that run the Centrifuge classifier over a set of classified read files.
One command is generated per unpaired file and one per forward/reverse pair; each writes a `<basename>.sum` and a `<basename>.tsv` report.
Units whose `.tsv` report already exists are skipped so an interrupted run can be resumed.

## Example usage
```rust
use readrunner::centrifuge::{build_centrifuge_jobs, CentrifugeConfigBuilder};
use readrunner::data_types::classified_files::ClassifiedFiles;
use readrunner::data_types::file_format::FileFormat;
use std::path::PathBuf;

let files = ClassifiedFiles::all_unpaired(vec![PathBuf::from("reads/s1.fa")]);
let config = CentrifugeConfigBuilder::default()
    .index_dir("/idx")
    .index_name("p_compressed")
    .file_format(FileFormat::Fasta)
    .reports_dir("/no/such/reports")
    .build().unwrap();

let batch = build_centrifuge_jobs(&files, &config).unwrap();
assert_eq!(batch.commands(), &[
    "CENTRIFUGE_INDEXES=/idx centrifuge -f -p 1 -x p_compressed -U \"reads/s1.fa\" -S \"/no/such/reports/s1.fa.sum\" --report-file \"/no/such/reports/s1.fa.tsv\""
]);
```
*/
use anyhow::{bail, ensure, Context};
use derive_builder::Builder;
use itertools::Itertools;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::data_types::classified_files::ClassifiedFiles;
use crate::data_types::file_format::FileFormat;
use crate::data_types::job_batch::JobBatch;

lazy_static! {
    /// Index files look like `<name>.<n>.cf`
    static ref INDEX_SUFFIX: Regex = Regex::new(r"\.\d+\.cf$").unwrap();
}

/// Everything needed to format one Centrifuge command
#[derive(Builder, Clone, Debug)]
pub struct CentrifugeConfig {
    /// Folder holding the index files, exported as CENTRIFUGE_INDEXES
    #[builder(setter(into))]
    index_dir: PathBuf,
    /// Index name, i.e. the file names without `.<n>.cf`
    #[builder(setter(into))]
    index_name: String,
    /// Input format, FASTA adds the `-f` flag
    file_format: FileFormat,
    /// Threads per Centrifuge instance
    #[builder(default = "1")]
    threads: usize,
    /// Comma-separated numeric tax ids, already cleaned by `parse_excluded_tax_ids`
    #[builder(setter(into), default)]
    exclude_tax_ids: String,
    /// Folder that receives the .sum/.tsv outputs
    #[builder(setter(into))]
    reports_dir: PathBuf
}

impl CentrifugeConfig {
    // getters
    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn file_format(&self) -> FileFormat {
        self.file_format
    }

    /// The shared prefix of every command
    fn command_base(&self) -> String {
        let mut parts = vec![
            format!("CENTRIFUGE_INDEXES={}", self.index_dir.display()),
            "centrifuge".to_string()
        ];
        if !self.exclude_tax_ids.is_empty() {
            parts.push(format!("--exclude-taxids {}", self.exclude_tax_ids));
        }
        if self.file_format == FileFormat::Fasta {
            parts.push("-f".to_string());
        }
        parts.push(format!("-p {}", self.threads));
        parts.push(format!("-x {}", self.index_name));
        parts.join(" ")
    }

    /// Returns the (.sum, .tsv) outputs for an input file
    fn report_files(&self, input: &Path) -> (PathBuf, PathBuf) {
        let basename = input.file_name()
            .map(|b| b.to_string_lossy().to_string())
            .unwrap_or_default();
        (
            self.reports_dir.join(format!("{basename}.sum")),
            self.reports_dir.join(format!("{basename}.tsv"))
        )
    }
}

/// Lists the index names available in a Centrifuge index folder.
/// # Errors
/// * if the path is not a directory or cannot be read
pub fn valid_index_names(index_dir: &Path) -> anyhow::Result<BTreeSet<String>> {
    ensure!(index_dir.is_dir(), "--index-dir {index_dir:?} is not a directory");
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(index_dir).with_context(|| format!("Error while reading {index_dir:?}:"))? {
        let entry = entry.with_context(|| format!("Error while reading {index_dir:?}:"))?;
        let filename = entry.file_name().to_string_lossy().to_string();
        names.insert(INDEX_SUFFIX.replace(&filename, "").to_string());
    }
    Ok(names)
}

/// Verifies that an index name exists in the folder
/// # Errors
/// * if the folder cannot be listed
/// * if the index is not one of the available names
pub fn check_index(index_dir: &Path, index_name: &str) -> anyhow::Result<()> {
    let valid_index = valid_index_names(index_dir)?;
    if !valid_index.contains(index_name) {
        bail!("--index {index_name:?} is not valid, please choose from: {}", valid_index.iter().join(", "));
    }
    Ok(())
}

/// Guesses the input format from the file extensions, ignoring any trailing `.gz`.
/// # Errors
/// * if the extensions do not map to exactly one format
pub fn guess_format<'a, I: IntoIterator<Item = &'a Path>>(files: I) -> anyhow::Result<FileFormat> {
    let mut extensions: BTreeSet<String> = BTreeSet::new();
    for file in files {
        let basename = file.file_name()
            .map(|b| b.to_string_lossy().to_string())
            .unwrap_or_default();
        let base = basename.strip_suffix(".gz").unwrap_or(&basename);
        let ext = Path::new(base).extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        extensions.insert(ext);
    }

    let guesses: BTreeSet<FileFormat> = extensions.iter()
        .filter_map(|ext| FileFormat::from_extension(ext))
        .collect();

    match guesses.first() {
        Some(&format) if guesses.len() == 1 => Ok(format),
        _ => bail!(
            "Cannot guess file format ({}) from extensions ({})",
            guesses.iter().join(", "), extensions.iter().join(", ")
        )
    }
}

/// Keeps only the numeric ids from a comma-separated list, warning about the rest
pub fn parse_excluded_tax_ids(ids: &str) -> String {
    let mut tax_ids = vec![];
    for s in ids.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if s.chars().all(|c| c.is_ascii_digit()) {
            tax_ids.push(s);
        } else {
            warn!("tax_id {s:?} is not numeric, ignoring");
        }
    }
    tax_ids.join(",")
}

/// Generates the Centrifuge job batch.
/// Unpaired files come first, then the forward/reverse pairs.
/// If only one mate direction was found, those files are run as unpaired reads.
/// # Errors
/// * if a generated command is not a valid single-line job
pub fn build_centrifuge_jobs(files: &ClassifiedFiles, config: &CentrifugeConfig) -> anyhow::Result<JobBatch> {
    let base = config.command_base();
    let mut batch = JobBatch::new();
    let mut skipped = 0;

    let mut singles: Vec<&Path> = files.unpaired().iter().map(|p| p.as_path()).collect();
    if !files.has_pairs() {
        singles.extend(files.forward().iter().chain(files.reverse().iter()).map(|p| p.as_path()));
    }

    for file in singles.into_iter() {
        let (sum_file, tsv_file) = config.report_files(file);
        if tsv_file.is_file() {
            debug!("Skipping {file:?}, report {tsv_file:?} exists");
            skipped += 1;
            continue;
        }
        batch.push(format!(
            "{base} -U \"{}\" -S \"{}\" --report-file \"{}\"",
            file.display(), sum_file.display(), tsv_file.display()
        ))?;
    }

    for (forward, reverse) in files.pairs() {
        let (sum_file, tsv_file) = config.report_files(forward);
        if tsv_file.is_file() {
            debug!("Skipping pair {forward:?}, report {tsv_file:?} exists");
            skipped += 1;
            continue;
        }
        batch.push(format!(
            "{base} -1 \"{}\" -2 \"{}\" -S \"{}\" --report-file \"{}\"",
            forward.display(), reverse.display(), sum_file.display(), tsv_file.display()
        ))?;
    }

    if skipped > 0 {
        warn!("Skipped {skipped} inputs with existing reports");
    }
    Ok(batch)
}

/// Formats the command that renders the bubble chart from the reports folder
pub fn plot_command(script: &Path, reports_dir: &Path, title: &str, fig_dir: &Path) -> String {
    format!(
        "{} --dir \"{}\" --title \"{title}\" --outdir \"{}\"",
        script.display(), reports_dir.display(), fig_dir.display()
    )
}

/// Renders the bubble chart, creating the figures folder first.
/// # Errors
/// * if the figures folder cannot be created
/// * if the script cannot be started or exits non-zero
pub fn make_bubble(script: &Path, reports_dir: &Path, title: &str, fig_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(fig_dir)
        .with_context(|| format!("Error while creating {fig_dir:?}:"))?;

    let command = plot_command(script, reports_dir, title, fig_dir);
    info!("Plotting: {command}");
    let status = Command::new("sh").arg("-c").arg(&command).status()
        .with_context(|| format!("Error while launching {script:?}:"))?;
    ensure!(status.success(), "{script:?} exited with {status}");
    Ok(())
}

/// Final status line, figures are only mentioned if a chart was rendered
pub fn done_message(reports_dir: &Path, fig_dir: Option<&Path>) -> String {
    match fig_dir {
        Some(fd) => format!("Done, reports in \"{}\", figures in \"{}\"", reports_dir.display(), fd.display()),
        None => format!("Done, reports in \"{}\"", reports_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(v: &[&str]) -> Vec<PathBuf> {
        v.iter().map(PathBuf::from).collect()
    }

    fn fastq_config(reports_dir: &Path) -> CentrifugeConfig {
        CentrifugeConfigBuilder::default()
            .index_dir("/idx")
            .index_name("p_compressed+h+v")
            .file_format(FileFormat::Fastq)
            .threads(4)
            .exclude_tax_ids("9606,32630")
            .reports_dir(reports_dir)
            .build().unwrap()
    }

    #[test]
    fn test_valid_index_names() {
        let names: Vec<String> = valid_index_names(Path::new("test_data/index")).unwrap().into_iter().collect();
        assert_eq!(names, vec!["hvc", "p_compressed+h+v"]);

        assert!(check_index(Path::new("test_data/index"), "hvc").is_ok());
        let err = check_index(Path::new("test_data/index"), "nt").unwrap_err();
        assert!(format!("{err}").contains("please choose from: hvc, p_compressed+h+v"));
        assert!(valid_index_names(Path::new("test_data/index/hvc.1.cf")).is_err());
    }

    #[test]
    fn test_guess_format() {
        let fasta = paths(&["a.fa", "b.fasta.gz", "c.fna"]);
        assert_eq!(guess_format(fasta.iter().map(|p| p.as_path())).unwrap(), FileFormat::Fasta);

        let fastq = paths(&["a_R1.fastq.gz", "a_R2.fastq.gz", "b.fq"]);
        assert_eq!(guess_format(fastq.iter().map(|p| p.as_path())).unwrap(), FileFormat::Fastq);

        let mixed = paths(&["a.fa", "b.fq"]);
        assert!(guess_format(mixed.iter().map(|p| p.as_path())).is_err());

        let unknown = paths(&["a.txt"]);
        assert!(guess_format(unknown.iter().map(|p| p.as_path())).is_err());
    }

    #[test]
    fn test_parse_excluded_tax_ids() {
        assert_eq!(parse_excluded_tax_ids(""), "");
        assert_eq!(parse_excluded_tax_ids("9606, 32630 ,abc,,12x"), "9606,32630");
    }

    #[test]
    fn test_build_jobs() {
        let reports = TempDir::new().unwrap();
        let config = fastq_config(reports.path());
        let files = ClassifiedFiles::new(
            paths(&["in/s_R1.fq"]), paths(&["in/s_R2.fq"]), paths(&["in/u.fq"])
        );

        let batch = build_centrifuge_jobs(&files, &config).unwrap();
        let r = reports.path().display();
        let base = "CENTRIFUGE_INDEXES=/idx centrifuge --exclude-taxids 9606,32630 -p 4 -x p_compressed+h+v";
        assert_eq!(batch.commands(), &[
            format!("{base} -U \"in/u.fq\" -S \"{r}/u.fq.sum\" --report-file \"{r}/u.fq.tsv\""),
            format!("{base} -1 \"in/s_R1.fq\" -2 \"in/s_R2.fq\" -S \"{r}/s_R1.fq.sum\" --report-file \"{r}/s_R1.fq.tsv\"")
        ]);
    }

    #[test]
    fn test_existing_reports_are_skipped() {
        let reports = TempDir::new().unwrap();
        std::fs::write(reports.path().join("u.fq.tsv"), "done").unwrap();
        let config = fastq_config(reports.path());
        let files = ClassifiedFiles::all_unpaired(paths(&["in/u.fq", "in/v.fq"]));

        let batch = build_centrifuge_jobs(&files, &config).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.commands()[0].contains("-U \"in/v.fq\""));
    }

    #[test]
    fn test_forward_only_runs_unpaired() {
        let reports = TempDir::new().unwrap();
        let config = fastq_config(reports.path());
        let files = ClassifiedFiles::new(paths(&["x_1.fq", "y_1.fq"]), vec![], vec![]);

        let batch = build_centrifuge_jobs(&files, &config).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.commands().iter().all(|c| c.contains(" -U ")));
    }

    #[cfg(unix)]
    #[test]
    fn test_make_bubble() {
        let tmp_dir = TempDir::new().unwrap();
        let fig_dir = tmp_dir.path().join("figures");
        let script = tmp_dir.path().join("bubble.sh");
        std::fs::write(&script, "touch \"$6/bubble.png\"\n").unwrap();

        let script_cmd = PathBuf::from(format!("sh {}", script.display()));
        make_bubble(&script_cmd, tmp_dir.path(), "title", &fig_dir).unwrap();
        assert!(fig_dir.join("bubble.png").exists());

        let failing = PathBuf::from("exit 2;");
        assert!(make_bubble(&failing, tmp_dir.path(), "title", &fig_dir).is_err());
    }

    #[test]
    fn test_plot_command() {
        let cmd = plot_command(Path::new("bin/bubble.r"), Path::new("out/reports"), "My title", Path::new("out/figures"));
        assert_eq!(cmd, "bin/bubble.r --dir \"out/reports\" --title \"My title\" --outdir \"out/figures\"");
    }

    #[test]
    fn test_done_message() {
        assert_eq!(done_message(Path::new("out/reports"), None), "Done, reports in \"out/reports\"");
        assert_eq!(
            done_message(Path::new("out/reports"), Some(Path::new("out/figures"))),
            "Done, reports in \"out/reports\", figures in \"out/figures\""
        );
    }
}
