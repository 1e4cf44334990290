//! lsgit Core - git status annotations for directory listings
//!
//! A refresh runs one shell probe over the immediate subdirectories of a
//! listing, parses the records into a status table, and draws one annotation
//! per git working tree next to its row, without blocking the caller.

pub mod annotate;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod status;

pub use annotate::{
    Annotation, AnnotationRenderer, ListingRow, ListingTarget, MemoryListing, OwnerTag, TargetGone,
};
pub use config::{AnnotationStyle, Config, ProbeConfig};
pub use error::{Error, PipelineError, Result};
pub use pipeline::{report_failure, RefreshReport, Refresher};
pub use status::{
    build, DirectoryStatusRecord, FastForward, Field, FieldWidths, ShellProbe, StatusProbe,
    StatusTable,
};
