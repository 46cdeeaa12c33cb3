/*!
# CLI module
Command line interface functionality that is specific to readrunner.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The centrifuge CLI subcommand
pub mod centrifuge;
/// The classify CLI subcommand
pub mod classify;
/// The run CLI subcommand
pub mod run;
