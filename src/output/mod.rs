//! Output module for reporting on stored pages
//!
//! Reads the page store and renders plain-text reports for the terminal.

mod stats;

pub use stats::{format_statistics, load_statistics, print_statistics, PageStatistics};
