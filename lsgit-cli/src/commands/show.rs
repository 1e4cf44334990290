//! Show command - list a directory with git status annotations

use std::path::PathBuf;

use clap::Args;
use lsgit_core::{report_failure, Config, ListingTarget, MemoryListing, PipelineError, Refresher};

/// Arguments for the show command
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Directory to list (defaults to current directory)
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

impl ShowArgs {
    /// Execute the show command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let dir = if self.dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            self.dir.clone()
        };
        let listing = MemoryListing::from_dir(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to list {}: {}", dir.display(), e))?;

        if verbose {
            tracing::info!(root = %listing.root().display(), rows = listing.rows().len(), "Listing loaded");
        }

        let refresher = Refresher::from_config(config);
        match refresher.run(&listing).await {
            Ok(report) => {
                if verbose {
                    tracing::info!(
                        records = report.records,
                        annotated = report.annotated,
                        "Annotations drawn"
                    );
                }
            }
            Err(e) => {
                report_failure(&listing.id(), &e);
                print_warning(&e);
            }
        }

        for line in listing.render_lines() {
            println!("{}", line);
        }

        Ok(())
    }
}

fn print_warning(error: &PipelineError) {
    eprintln!("Warning: {}", error);
    match error {
        PipelineError::ProbeOutput { raw_out, raw_err } => {
            if !raw_out.trim().is_empty() {
                eprintln!("  stdout:");
                for line in raw_out.lines() {
                    eprintln!("    {}", line);
                }
            }
            eprintln!("  stderr:");
            for line in raw_err.lines() {
                eprintln!("    {}", line);
            }
        }
        PipelineError::Parse { raw_text, .. } => {
            eprintln!("  probe output:");
            for line in raw_text.lines() {
                eprintln!("    {}", line);
            }
        }
        PipelineError::ProbeSpawn { .. } | PipelineError::RenderTargetGone { .. } => {}
    }
}
