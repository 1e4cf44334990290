//! The probe → build → render refresh chain

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::annotate::{AnnotationRenderer, ListingTarget};
use crate::config::Config;
use crate::error::PipelineError;
use crate::status::{self, ShellProbe, StatusProbe};

/// Outcome of a successful refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Records in the status table
    pub records: usize,
    /// Annotations drawn
    pub annotated: usize,
}

/// Runs refresh chains for listings
///
/// Chains for different refresh requests run concurrently; only their render
/// stages are serialised, so one render always finishes before the next one
/// sweeps.
#[derive(Clone)]
pub struct Refresher {
    probe: Arc<dyn StatusProbe>,
    renderer: Arc<AnnotationRenderer>,
    render_gate: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("renderer", &self.renderer)
            .field("probe", &"<StatusProbe>")
            .finish()
    }
}

impl Refresher {
    pub fn new(probe: Arc<dyn StatusProbe>, renderer: AnnotationRenderer) -> Self {
        Self {
            probe,
            renderer: Arc::new(renderer),
            render_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Shell probe and renderer built from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(ShellProbe::new(&config.probe)),
            AnnotationRenderer::new(config.annotation.clone()),
        )
    }

    pub fn renderer(&self) -> &AnnotationRenderer {
        &self.renderer
    }

    /// Run one chain to completion, stopping at the first failing stage
    pub async fn run(&self, target: &dyn ListingTarget) -> Result<RefreshReport, PipelineError> {
        let root = target.root();
        tracing::debug!(listing = %target.id(), root = %root.display(), "Refreshing annotations");

        let raw = self.probe.probe(&root).await?;
        let (table, widths) = status::build(raw, root.clone()).await?;

        let _gate = self.render_gate.lock().await;
        let annotated = self.renderer.render(target, &table, &widths).await?;

        Ok(RefreshReport {
            records: table.len(),
            annotated,
        })
    }

    /// Start a chain in the background
    ///
    /// Failures are reported through [`report_failure`] and never reach the
    /// caller. The returned handle may be dropped.
    ///
    /// Must be called from within a tokio runtime, since the chain is started
    /// with [`tokio::spawn`].
    pub fn refresh_annotations(&self, target: Arc<dyn ListingTarget>) -> JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            match refresher.run(target.as_ref()).await {
                Ok(report) => tracing::debug!(
                    listing = %target.id(),
                    records = report.records,
                    annotated = report.annotated,
                    "Refresh complete"
                ),
                Err(e) => report_failure(&target.id(), &e),
            }
        })
    }

    /// Remove every annotation this refresher has drawn on the target
    pub async fn clear(&self, target: &dyn ListingTarget) -> Result<usize, PipelineError> {
        let _gate = self.render_gate.lock().await;
        self.renderer.sweep(target)
    }
}

/// Terminal handler for a failed chain
pub fn report_failure(target: &str, error: &PipelineError) {
    match error {
        PipelineError::ProbeSpawn { reason } => {
            tracing::warn!(listing = %target, %reason, "Could not start git status probe");
        }
        PipelineError::ProbeOutput { raw_out, raw_err } => {
            tracing::warn!(
                listing = %target,
                stdout = %raw_out,
                stderr = %raw_err,
                "Git status probe reported errors"
            );
        }
        PipelineError::Parse { raw_text, reason } => {
            tracing::warn!(
                listing = %target,
                %reason,
                raw = %raw_text,
                "Could not parse git status probe output"
            );
        }
        PipelineError::RenderTargetGone { .. } => {
            tracing::debug!(listing = %target, "Listing closed before annotations were drawn");
        }
    }
}
