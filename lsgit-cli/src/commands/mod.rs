//! CLI command implementations

pub mod probe;
pub mod show;

pub use probe::ProbeArgs;
pub use show::ShowArgs;
