
use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::classifier::unique_extensions;

/// Read files grouped by the sample name embedded in their file names
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleGroups {
    /// Sample name to all files carrying a mate suffix for that sample, in first-seen order
    paired: IndexMap<String, Vec<PathBuf>>,
    /// Files without a recognizable mate suffix
    unpaired: Vec<PathBuf>
}

impl SampleGroups {
    // getters
    pub fn paired(&self) -> &IndexMap<String, Vec<PathBuf>> {
        &self.paired
    }

    pub fn unpaired(&self) -> &[PathBuf] {
        &self.unpaired
    }
}

/// Builds the sample pattern; capture 1 is the sample name.
/// Mate suffixes may also carry a trailing lane/chunk number, e.g. `s_R1_001.fastq`.
fn sample_regex(extensions: &BTreeSet<String>) -> Result<Regex, regex::Error> {
    let alternatives = extensions.iter()
        .map(|ext| regex::escape(ext))
        .join("|");
    Regex::new(&format!(r"^(.+)[_-][Rr]?[12](?:_\d+)?\.(?:{alternatives})$"))
}

/// Groups files by sample, using only the file name (not the parent folders) for matching.
/// # Arguments
/// * `files` - resolved input files, typically from `classifier::resolve_input_files`
/// # Errors
/// * if the extension pattern cannot be compiled
pub fn group_by_sample(files: &[PathBuf]) -> Result<SampleGroups, regex::Error> {
    let extensions = unique_extensions(files);
    if extensions.is_empty() {
        return Ok(SampleGroups {
            paired: Default::default(),
            unpaired: files.to_vec()
        });
    }

    let re = sample_regex(&extensions)?;
    let mut groups = SampleGroups::default();
    for filename in files.iter() {
        let basename = filename.file_name()
            .map(|b| b.to_string_lossy().to_string())
            .unwrap_or_default();
        match re.captures(&basename).and_then(|c| c.get(1)) {
            Some(sample) => groups.paired.entry(sample.as_str().to_string())
                .or_default()
                .push(filename.clone()),
            None => groups.unpaired.push(filename.clone())
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_sample() {
        let files: Vec<PathBuf> = [
            "run/zeta_R1_001.fastq", "run/zeta_R2_001.fastq",
            "run/alpha-1.fastq", "run/alpha-2.fastq",
            "run/lonely.fastq", "run/zeta_R1_002.fastq"
        ].iter().map(PathBuf::from).collect();

        let groups = group_by_sample(&files).unwrap();
        let samples: Vec<&String> = groups.paired().keys().collect();
        assert_eq!(samples, vec!["zeta", "alpha"]);
        assert_eq!(groups.paired()["zeta"], vec![
            PathBuf::from("run/zeta_R1_001.fastq"),
            PathBuf::from("run/zeta_R2_001.fastq"),
            PathBuf::from("run/zeta_R1_002.fastq")
        ]);
        assert_eq!(groups.paired()["alpha"].len(), 2);
        assert_eq!(groups.unpaired(), &[PathBuf::from("run/lonely.fastq")]);
    }

    #[test]
    fn test_folder_names_are_ignored() {
        // the mate-looking folder must not make the file paired
        let files = vec![PathBuf::from("lane_1.fq/sample.fq")];
        let groups = group_by_sample(&files).unwrap();
        assert!(groups.paired().is_empty());
        assert_eq!(groups.unpaired().len(), 1);
    }

    #[test]
    fn test_no_extensions() {
        let files = vec![PathBuf::from("s_1"), PathBuf::from("s_2")];
        let groups = group_by_sample(&files).unwrap();
        assert!(groups.paired().is_empty());
        assert_eq!(groups.unpaired().len(), 2);
    }
}
