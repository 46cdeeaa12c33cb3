
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data_types::classified_files::{ClassifiedFiles, ReadDirection};
use crate::sample_groups::SampleGroups;

/// This is a wrapper for writing out classification tables
pub struct ClassificationWriter<W: Write> {
    /// Handle on the writer
    csv_writer: csv::Writer<W>
}

/// One row per classified file
#[derive(Serialize)]
struct ClassifiedRow<'a> {
    /// forward, reverse, or unpaired
    direction: ReadDirection,
    /// The file as it was resolved
    path: &'a str
}

/// One row per file in a sample grouping
#[derive(Serialize)]
struct SampleRow<'a> {
    /// Sample name; empty for files without a mate suffix
    sample: &'a str,
    /// The file as it was resolved
    path: &'a str
}

impl ClassificationWriter<File> {
    /// Creates a new writer at the given path
    /// # Arguments
    /// * `filename` - path to the filename that will get opened, .csv is comma-delimited and everything else is tab-delimited
    pub fn from_path(filename: &Path) -> csv::Result<Self> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;
        Ok(Self {
            csv_writer
        })
    }
}

impl<W: Write> ClassificationWriter<W> {
    /// Wraps an existing writer (e.g. stdout) with tab delimiters
    pub fn from_writer(writer: W) -> Self {
        let csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        Self {
            csv_writer
        }
    }

    /// Writes every classified file, forward first, then reverse, then unpaired
    pub fn write_classified(&mut self, classified: &ClassifiedFiles) -> csv::Result<()> {
        for (direction, path) in classified.iter() {
            let path = path.to_string_lossy();
            self.csv_writer.serialize(ClassifiedRow { direction, path: &path })?;
        }
        self.csv_writer.flush()?;
        Ok(())
    }

    /// Writes the sample groups; grouped files first in sample order, then the unpaired files
    pub fn write_sample_groups(&mut self, groups: &SampleGroups) -> csv::Result<()> {
        for (sample, files) in groups.paired().iter() {
            for path in files.iter() {
                let path = path.to_string_lossy();
                self.csv_writer.serialize(SampleRow { sample, path: &path })?;
            }
        }
        for path in groups.unpaired().iter() {
            let path = path.to_string_lossy();
            self.csv_writer.serialize(SampleRow { sample: "", path: &path })?;
        }
        self.csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::sample_groups::group_by_sample;

    fn paths(v: &[&str]) -> Vec<PathBuf> {
        v.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_write_classified() {
        let classified = ClassifiedFiles::new(paths(&["a_1.fq"]), paths(&["a_2.fq"]), paths(&["b.fq"]));
        let mut buffer: Vec<u8> = vec![];
        {
            let mut writer = ClassificationWriter::from_writer(&mut buffer);
            writer.write_classified(&classified).unwrap();
        }
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "direction\tpath\nforward\ta_1.fq\nreverse\ta_2.fq\nunpaired\tb.fq\n"
        );
    }

    #[test]
    fn test_write_sample_groups_csv() {
        let tmp_dir = TempDir::new().unwrap();
        let out_fn = tmp_dir.path().join("groups.csv");
        let groups = group_by_sample(&paths(&["s_1.fq", "s_2.fq", "other.fq"])).unwrap();
        {
            let mut writer = ClassificationWriter::from_path(&out_fn).unwrap();
            writer.write_sample_groups(&groups).unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(&out_fn).unwrap(),
            "sample,path\ns,s_1.fq\ns,s_2.fq\n,other.fq\n"
        );
    }
}
