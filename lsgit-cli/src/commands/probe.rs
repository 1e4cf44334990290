//! Probe command - print the raw status records for a directory

use std::path::PathBuf;

use clap::Args;
use lsgit_core::{Config, PipelineError, ShellProbe, StatusProbe};

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Directory whose subdirectories are probed
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

impl ProbeArgs {
    /// Execute the probe command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let root = self.dir.canonicalize()?;
        let probe = ShellProbe::new(&config.probe);

        if verbose {
            tracing::info!(
                root = %root.display(),
                shell = %config.probe.shell,
                git_path = %config.probe.git_path,
                "Running status probe"
            );
        }

        match probe.probe(&root).await {
            Ok(raw) => {
                print!("{}", raw);
                Ok(())
            }
            Err(PipelineError::ProbeOutput { raw_out, raw_err }) => {
                print!("{}", raw_out);
                eprint!("{}", raw_err);
                anyhow::bail!("Probe wrote diagnostics; the batch would be rejected")
            }
            Err(e) => Err(e.into()),
        }
    }
}
