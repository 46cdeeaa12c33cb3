
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which bucket a read file was sorted into
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum ReadDirection {
    /// Mate 1 of a pair, e.g. `sample_R1.fastq`
    #[strum(serialize = "forward")]
    Forward,
    /// Mate 2 of a pair, e.g. `sample_R2.fastq`
    #[strum(serialize = "reverse")]
    Reverse,
    /// No mate detected, or pairing was not requested
    #[strum(serialize = "unpaired")]
    Unpaired
}

/// Partition of the resolved input files.
/// Every resolved input lands in exactly one of the three lists, each kept in sorted discovery order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ClassifiedFiles {
    /// Forward (mate 1) reads
    forward: Vec<PathBuf>,
    /// Reverse (mate 2) reads
    reverse: Vec<PathBuf>,
    /// Everything else
    unpaired: Vec<PathBuf>
}

impl ClassifiedFiles {
    /// Constructor, no checks are performed here; see `classifier::classify_files` for the invariants
    pub fn new(forward: Vec<PathBuf>, reverse: Vec<PathBuf>, unpaired: Vec<PathBuf>) -> Self {
        Self {
            forward, reverse, unpaired
        }
    }

    /// Wraps a list where nothing is paired
    pub fn all_unpaired(unpaired: Vec<PathBuf>) -> Self {
        Self {
            unpaired,
            ..Default::default()
        }
    }

    // getters
    pub fn forward(&self) -> &[PathBuf] {
        &self.forward
    }

    pub fn reverse(&self) -> &[PathBuf] {
        &self.reverse
    }

    pub fn unpaired(&self) -> &[PathBuf] {
        &self.unpaired
    }

    /// Total number of files across all three lists
    pub fn len(&self) -> usize {
        self.forward.len() + self.reverse.len() + self.unpaired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if there are forward and reverse reads that can be zipped together
    pub fn has_pairs(&self) -> bool {
        !self.forward.is_empty() && self.forward.len() == self.reverse.len()
    }

    /// Iterates over the forward/reverse mates in order.
    /// Only meaningful when `has_pairs()` is true, otherwise this yields nothing.
    pub fn pairs(&self) -> impl Iterator<Item = (&Path, &Path)> {
        let count = if self.has_pairs() { self.forward.len() } else { 0 };
        self.forward.iter()
            .zip(self.reverse.iter())
            .take(count)
            .map(|(f, r)| (f.as_path(), r.as_path()))
    }

    /// Iterates over every file with the bucket it was assigned to, forward first, then reverse, then unpaired
    pub fn iter(&self) -> impl Iterator<Item = (ReadDirection, &Path)> {
        let forward = self.forward.iter().map(|p| (ReadDirection::Forward, p.as_path()));
        let reverse = self.reverse.iter().map(|p| (ReadDirection::Reverse, p.as_path()));
        let unpaired = self.unpaired.iter().map(|p| (ReadDirection::Unpaired, p.as_path()));
        forward.chain(reverse).chain(unpaired)
    }
}
