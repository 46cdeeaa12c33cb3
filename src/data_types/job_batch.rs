
use anyhow::ensure;
use std::io::Write;

/// Ordered list of independent shell commands submitted together for one run.
/// Each command must fit on a single line since the job-list file is line-oriented.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JobBatch {
    commands: Vec<String>
}

impl JobBatch {
    /// Creates an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from the lines of a job file; blank lines are skipped and trailing whitespace is dropped.
    /// # Arguments
    /// * `text` - the raw job-file contents
    /// * `max_jobs` - optional cap on the number of commands kept
    pub fn from_lines(text: &str, max_jobs: Option<usize>) -> Self {
        let commands = text.lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.trim_start().is_empty())
            .take(max_jobs.unwrap_or(usize::MAX))
            .map(String::from)
            .collect();
        Self { commands }
    }

    /// Appends a command to the end of the batch
    /// # Errors
    /// * if the command is blank or spans multiple lines
    pub fn push(&mut self, command: String) -> anyhow::Result<()> {
        ensure!(!command.trim().is_empty(), "Job commands cannot be blank");
        ensure!(!command.contains(['\n', '\r']), "Job commands must be a single line: {command:?}");
        self.commands.push(command);
        Ok(())
    }

    // getters
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Writes the batch in job-list format, one newline-terminated command per line
    pub fn write_job_list<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for command in self.commands.iter() {
            writeln!(writer, "{command}")?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines() {
        let text = "echo 1\n\n   \necho 2  \necho 3\n";
        let batch = JobBatch::from_lines(text, None);
        assert_eq!(batch.commands(), &["echo 1", "echo 2", "echo 3"]);

        let batch = JobBatch::from_lines(text, Some(2));
        assert_eq!(batch.commands(), &["echo 1", "echo 2"]);

        assert!(JobBatch::from_lines("\n\n", None).is_empty());
    }

    #[test]
    fn test_push() {
        let mut batch = JobBatch::new();
        batch.push("echo hi".to_string()).unwrap();
        assert!(batch.push("   ".to_string()).is_err());
        assert!(batch.push("echo a\necho b".to_string()).is_err());
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_write_job_list() {
        let batch = JobBatch::from_lines("true\nfalse", None);
        let mut buffer: Vec<u8> = vec![];
        batch.write_job_list(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "true\nfalse\n");
    }
}
