//! Git status acquisition for the subdirectories of a listing
//!
//! A [`StatusProbe`] produces raw records for every immediate subdirectory in
//! one external invocation, and [`build`] turns them into a [`StatusTable`]
//! plus the [`FieldWidths`] needed to align annotations.

mod probe;
mod record;
mod table;

pub use probe::{classify_output, ShellProbe, StatusProbe, PROBE_SCRIPT};
pub use record::{normalize_path, path_key, DirectoryStatusRecord, FastForward, Field};
pub use table::{build, parse_records, parse_records_in, FieldWidths, StatusTable};
