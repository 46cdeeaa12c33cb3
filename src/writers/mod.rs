/*!
# Writers module
Contains the logic for writing the output tables for the classify command.
*/
/// Writes the classification and sample grouping tables
pub mod classification;
