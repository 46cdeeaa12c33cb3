/*!
# Classifier
Sorts a set of sequencing read files into forward, reverse, and unpaired groups based on their file names.
Inputs may be files or directories; directories are expanded one level deep.

When pairing is requested, a file is "forward" if its path ends with a `_` or `-` separator, an optional `R`/`r`, the digit `1`, and one of the extensions observed across the inputs.
"Reverse" is the same rule with the digit `2`.
The forward rule is checked first, so a name that could satisfy both is always forward.

## Example usage
```rust
use readrunner::classifier::classify_files;
use std::path::PathBuf;

let query = vec![PathBuf::from("test_data/reads")];
let classified = classify_files(&query, true).unwrap();
assert_eq!(classified.forward(), &[PathBuf::from("test_data/reads/sampleA_R1.fastq")]);
assert_eq!(classified.reverse(), &[PathBuf::from("test_data/reads/sampleA_R2.fastq")]);
assert_eq!(classified.unpaired(), &[PathBuf::from("test_data/reads/sampleB.fastq")]);
```
*/
use itertools::Itertools;
use log::{debug, trace};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::data_types::classified_files::ClassifiedFiles;

/// Fatal problems with the classifier inputs; no partial results are ever returned alongside these
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("input {path:?} is neither a file nor a directory")]
    InvalidInput { path: PathBuf },
    #[error("number of forward ({forward}) and reverse ({reverse}) reads do not match")]
    UnbalancedPairs { forward: usize, reverse: usize },
    #[error("error while listing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("error while building the mate pattern: {0}")]
    Pattern(#[from] regex::Error)
}

/// Expands the inputs into a flat, lexicographically sorted list of files.
/// Directories contribute their immediate file entries (sub-directories are skipped), files are kept as-is.
/// Duplicates are intentionally preserved.
/// # Arguments
/// * `query` - the user-provided files and/or directories
/// # Errors
/// * if any input is neither a file nor a directory
/// * if a directory cannot be listed
pub fn resolve_input_files(query: &[PathBuf]) -> Result<Vec<PathBuf>, ClassifyError> {
    let mut files: Vec<PathBuf> = vec![];
    for qry in query.iter() {
        if qry.is_dir() {
            let io_err = |source| ClassifyError::Io { path: qry.clone(), source };
            for entry in std::fs::read_dir(qry).map_err(io_err)? {
                let path = entry.map_err(io_err)?.path();
                if path.is_file() {
                    files.push(path);
                } else {
                    trace!("Skipping non-file entry {path:?}");
                }
            }
        } else if qry.is_file() {
            files.push(qry.clone());
        } else {
            return Err(ClassifyError::InvalidInput { path: qry.clone() });
        }
    }

    // byte-wise ordering on the full path so results are reproducible across platforms
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}

/// Collects the distinct extensions (without the leading ".") across all files.
/// Files with no extension do not contribute anything.
pub fn unique_extensions<P: AsRef<Path>>(files: &[P]) -> BTreeSet<String> {
    files.iter()
        .filter_map(|f| f.as_ref().extension())
        .map(|ext| ext.to_string_lossy().to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Builds the regex for a given mate number; the extensions are escaped before joining.
fn mate_regex(extensions: &BTreeSet<String>, mate: char) -> Result<Regex, regex::Error> {
    let alternatives = extensions.iter()
        .map(|ext| regex::escape(ext))
        .join("|");
    Regex::new(&format!(r".+[_-][Rr]?{mate}\.(?:{alternatives})$"))
}

/// Resolves the inputs and sorts them into forward, reverse, and unpaired reads.
/// # Arguments
/// * `query` - the user-provided files and/or directories
/// * `reads_are_paired` - if false, everything is reported as unpaired
/// # Errors
/// * if any input is neither a file nor a directory
/// * if pairing was requested and there are forward and reverse reads but the counts differ
pub fn classify_files(query: &[PathBuf], reads_are_paired: bool) -> Result<ClassifiedFiles, ClassifyError> {
    let files = resolve_input_files(query)?;
    debug!("Resolved {} input files from {} queries", files.len(), query.len());
    classify_resolved(files, reads_are_paired)
}

/// Same as `classify_files`, but for a list that has already been resolved and sorted
pub fn classify_resolved(files: Vec<PathBuf>, reads_are_paired: bool) -> Result<ClassifiedFiles, ClassifyError> {
    if !reads_are_paired {
        return Ok(ClassifiedFiles::all_unpaired(files));
    }

    let extensions = unique_extensions(&files);
    debug!("Observed extensions: {extensions:?}");
    if extensions.is_empty() {
        // nothing can carry a mate suffix without an extension
        return Ok(ClassifiedFiles::all_unpaired(files));
    }

    let forward_re = mate_regex(&extensions, '1')?;
    let reverse_re = mate_regex(&extensions, '2')?;

    let mut forward = vec![];
    let mut reverse = vec![];
    let mut unpaired = vec![];
    for filename in files.into_iter() {
        let name = filename.to_string_lossy();
        if forward_re.is_match(&name) {
            forward.push(filename);
        } else if reverse_re.is_match(&name) {
            reverse.push(filename);
        } else {
            unpaired.push(filename);
        }
    }

    let (num_forward, num_reverse) = (forward.len(), reverse.len());
    if num_forward > 0 && num_reverse > 0 && num_forward != num_reverse {
        return Err(ClassifyError::UnbalancedPairs { forward: num_forward, reverse: num_reverse });
    }

    Ok(ClassifiedFiles::new(forward, reverse, unpaired))
}
