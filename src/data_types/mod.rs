
/// Forward/reverse/unpaired partition of the input files
pub mod classified_files;
/// Supported sequence file formats
pub mod file_format;
/// Ordered list of shell commands for one run
pub mod job_batch;
