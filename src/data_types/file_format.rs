
use serde::Serialize;
use strum_macros::EnumString;

/// Sequence file formats the classifier can be told to expect
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, strum_macros::Display, EnumString, Serialize, clap::ValueEnum)]
pub enum FileFormat {
    /// FASTA, typically .fa/.fna/.fasta
    #[strum(ascii_case_insensitive, serialize = "fasta")]
    #[clap(name = "fasta")]
    Fasta,
    /// FASTQ, typically .fq/.fastq
    #[strum(ascii_case_insensitive, serialize = "fastq")]
    #[clap(name = "fastq")]
    Fastq
}

impl FileFormat {
    /// Maps a bare file extension (no leading ".") to a format, if it is a recognized one.
    /// Matching is case-insensitive and requires the whole extension to match.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "fa" | "fna" | "fasta" => Some(FileFormat::Fasta),
            "fq" | "fastq" => Some(FileFormat::Fastq),
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileFormat::from_extension("fa"), Some(FileFormat::Fasta));
        assert_eq!(FileFormat::from_extension("FNA"), Some(FileFormat::Fasta));
        assert_eq!(FileFormat::from_extension("fasta"), Some(FileFormat::Fasta));
        assert_eq!(FileFormat::from_extension("fq"), Some(FileFormat::Fastq));
        assert_eq!(FileFormat::from_extension("fastq"), Some(FileFormat::Fastq));

        // prefixes of a valid extension are not enough
        assert_eq!(FileFormat::from_extension("faa"), None);
        assert_eq!(FileFormat::from_extension("fastqz"), None);
        assert_eq!(FileFormat::from_extension(""), None);
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(FileFormat::from_str("FASTA").unwrap(), FileFormat::Fasta);
        assert_eq!(FileFormat::Fastq.to_string(), "fastq");
        assert!(FileFormat::from_str("bam").is_err());
    }
}
