/// Builds the Centrifuge job batch and related helpers
pub mod centrifuge;
/// Sorts read files into forward, reverse, and unpaired sets
pub mod classifier;
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Runs job batches through an external parallel executor or sequentially
pub mod job_runner;
/// Groups read files by their sample name
pub mod sample_groups;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
