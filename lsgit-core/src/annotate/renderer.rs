//! Reconciles a status table against the rows of a listing

use unicode_width::UnicodeWidthStr;

use super::target::{Annotation, ListingTarget, OwnerTag, TargetGone};
use crate::config::AnnotationStyle;
use crate::error::PipelineError;
use crate::status::{path_key, DirectoryStatusRecord, Field, FieldWidths, StatusTable};

/// Draws one status annotation per listed git working tree
///
/// Every render sweeps the markers this renderer owns before reapplying, so
/// repeated renders converge on the same set of annotations.
#[derive(Debug, Clone)]
pub struct AnnotationRenderer {
    style: AnnotationStyle,
    owner: OwnerTag,
}

impl Default for AnnotationRenderer {
    fn default() -> Self {
        Self::new(AnnotationStyle::default())
    }
}

impl AnnotationRenderer {
    pub fn new(style: AnnotationStyle) -> Self {
        let owner = OwnerTag::new(style.owner.clone());
        Self { style, owner }
    }

    /// Tag carried by every annotation this renderer places
    pub fn owner(&self) -> &OwnerTag {
        &self.owner
    }

    /// Annotation text for a record, e.g. `"main  -origin-true   "`
    pub fn format(&self, record: &DirectoryStatusRecord, widths: &FieldWidths) -> String {
        let fields: Vec<String> = Field::ALL
            .iter()
            .map(|&field| {
                let value = record.field(field);
                if self.style.align {
                    pad(value, widths.get(field))
                } else {
                    value.to_string()
                }
            })
            .collect();

        let mut text = fields.join(&self.style.separator);
        text.push_str(&self.style.trailer);
        text
    }

    /// Remove every owned annotation on the visible rows
    ///
    /// Returns how many were removed. Safe to call when none exist.
    pub fn sweep(&self, target: &dyn ListingTarget) -> Result<usize, PipelineError> {
        let swept = self.sweep_rows(target).map_err(|_| gone(target))?;
        if swept > 0 {
            tracing::debug!(listing = %target.id(), swept, "Swept stale annotations");
        }
        Ok(swept)
    }

    fn sweep_rows(&self, target: &dyn ListingTarget) -> Result<usize, TargetGone> {
        let rows = target.visible_rows()?;
        let stale = target.owned_in(&self.owner, rows)?;
        for annotation in &stale {
            target.remove(annotation)?;
        }
        Ok(stale.len())
    }

    /// Sweep, then annotate every visible row that has a table entry
    ///
    /// Yields to the runtime between rows. If the target disappears part way
    /// through, whatever this pass placed is withdrawn and
    /// [`PipelineError::RenderTargetGone`] is returned. Returns the number of
    /// annotations placed.
    pub async fn render(
        &self,
        target: &dyn ListingTarget,
        table: &StatusTable,
        widths: &FieldWidths,
    ) -> Result<usize, PipelineError> {
        if !target.is_live() {
            return Err(gone(target));
        }

        self.sweep(target)?;
        let rows = target.visible_rows().map_err(|_| gone(target))?;

        let mut placed = Vec::new();
        for row in rows {
            let step = if target.is_live() {
                self.annotate_row(target, row, table, widths)
            } else {
                Err(TargetGone)
            };

            match step {
                Ok(Some(annotation)) => placed.push(annotation),
                Ok(None) => {}
                Err(TargetGone) => {
                    withdraw(target, &placed);
                    return Err(gone(target));
                }
            }

            tokio::task::yield_now().await;
        }

        tracing::debug!(listing = %target.id(), annotated = placed.len(), "Rendered annotations");
        Ok(placed.len())
    }

    fn annotate_row(
        &self,
        target: &dyn ListingTarget,
        row: usize,
        table: &StatusTable,
        widths: &FieldWidths,
    ) -> Result<Option<Annotation>, TargetGone> {
        let Some(path) = target.row_path(row)? else {
            return Ok(None);
        };
        let Some(record) = table.get(&path_key(&path)) else {
            return Ok(None);
        };

        let annotation = Annotation {
            row,
            column: target.content_start(row)?,
            text: self.format(record, widths),
            owner: self.owner.clone(),
        };
        target.place(annotation.clone())?;
        Ok(Some(annotation))
    }
}

fn gone(target: &dyn ListingTarget) -> PipelineError {
    PipelineError::RenderTargetGone { target: target.id() }
}

/// Best effort: a closed target normally drops its markers anyway
fn withdraw(target: &dyn ListingTarget, placed: &[Annotation]) {
    for annotation in placed {
        if target.remove(annotation).is_err() {
            break;
        }
    }
}

/// Right-pad to a display width
fn pad(value: &str, width: usize) -> String {
    let mut padded = value.to_string();
    let fill = width.saturating_sub(value.width());
    padded.extend(std::iter::repeat(' ').take(fill));
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{ListingRow, MemoryListing};
    use crate::status::parse_records;
    use std::ops::Range;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Listing that goes away after a fixed number of row lookups
    struct FlakyListing {
        inner: MemoryListing,
        lookups_left: AtomicUsize,
        gone: AtomicBool,
    }

    impl FlakyListing {
        fn new(inner: MemoryListing, lookups: usize) -> Self {
            Self {
                inner,
                lookups_left: AtomicUsize::new(lookups),
                gone: AtomicBool::new(false),
            }
        }
    }

    impl ListingTarget for FlakyListing {
        fn id(&self) -> String {
            self.inner.id()
        }

        fn root(&self) -> PathBuf {
            self.inner.root()
        }

        fn is_live(&self) -> bool {
            !self.gone.load(Ordering::SeqCst)
        }

        fn visible_rows(&self) -> Result<Range<usize>, TargetGone> {
            self.inner.visible_rows()
        }

        fn row_path(&self, row: usize) -> Result<Option<PathBuf>, TargetGone> {
            let left = self.lookups_left.load(Ordering::SeqCst);
            if left == 0 {
                self.gone.store(true, Ordering::SeqCst);
                return Err(TargetGone);
            }
            self.lookups_left.store(left - 1, Ordering::SeqCst);
            self.inner.row_path(row)
        }

        fn content_start(&self, row: usize) -> Result<usize, TargetGone> {
            self.inner.content_start(row)
        }

        fn place(&self, annotation: Annotation) -> Result<(), TargetGone> {
            self.inner.place(annotation)
        }

        fn owned_in(
            &self,
            owner: &OwnerTag,
            rows: Range<usize>,
        ) -> Result<Vec<Annotation>, TargetGone> {
            self.inner.owned_in(owner, rows)
        }

        fn remove(&self, annotation: &Annotation) -> Result<(), TargetGone> {
            self.inner.remove(annotation)
        }
    }

    const RECORDS: &str = r#"
{"path":"/repo/a","branch":"main","remote":"origin","ff":"true"}
{"path":"/repo/b","branch":"dev","remote":"origin","ff":"false"}
{"path":"/repo/d/","branch":"topic","remote":"upstream","ff":"missing"}
"#;

    fn listing() -> MemoryListing {
        MemoryListing::new(
            "/repo",
            "/repo",
            vec![
                ListingRow::header("  /repo:"),
                ListingRow::entry("..", "/"),
                ListingRow::entry("a", "/repo/a"),
                ListingRow::entry("b", "/repo/b"),
                ListingRow::entry("c", "/repo/c"),
                ListingRow::entry("d", "/repo/d"),
                ListingRow::entry("notes.txt", "/repo/notes.txt"),
            ],
        )
    }

    fn rows_with_annotations(listing: &MemoryListing) -> Vec<usize> {
        listing.annotations().iter().map(|a| a.row).collect()
    }

    #[test]
    fn test_format_pads_fields() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let renderer = AnnotationRenderer::default();

        assert_eq!(
            renderer.format(table.get("/repo/a").unwrap(), &widths),
            "main -origin  -true    "
        );
        assert_eq!(
            renderer.format(table.get("/repo/d").unwrap(), &widths),
            "topic-upstream-missing "
        );
    }

    #[test]
    fn test_format_unaligned() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let renderer = AnnotationRenderer::new(AnnotationStyle {
            align: false,
            separator: "/".to_string(),
            trailer: String::new(),
            ..AnnotationStyle::default()
        });
        assert_eq!(
            renderer.format(table.get("/repo/b").unwrap(), &widths),
            "dev/origin/false"
        );
    }

    #[test]
    fn test_format_pads_by_display_width() {
        let raw = r#"
{"path":"/r/a","branch":"機能","remote":"origin","ff":"true"}
{"path":"/r/b","branch":"fix","remote":"origin","ff":"true"}
"#;
        let (table, widths) = parse_records(raw).unwrap();
        let renderer = AnnotationRenderer::default();
        assert_eq!(renderer.format(table.get("/r/a").unwrap(), &widths), "機能-origin-true ");
        assert_eq!(renderer.format(table.get("/r/b").unwrap(), &widths), "fix -origin-true ");
    }

    #[tokio::test]
    async fn test_render_annotates_matching_rows_only() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let listing = listing();
        let renderer = AnnotationRenderer::default();

        let placed = renderer.render(&listing, &table, &widths).await.unwrap();

        assert_eq!(placed, 3);
        assert_eq!(rows_with_annotations(&listing), vec![2, 3, 5]);
        let annotations = listing.annotations();
        assert!(annotations.iter().all(|a| a.column == 2));
        assert!(annotations.iter().all(|a| a.owner == *renderer.owner()));
    }

    #[tokio::test]
    async fn test_missing_fast_forward_text() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let listing = listing();
        AnnotationRenderer::default()
            .render(&listing, &table, &widths)
            .await
            .unwrap();

        let d = listing
            .annotations()
            .into_iter()
            .find(|a| a.row == 5)
            .unwrap();
        assert!(d.text.ends_with("-missing "));
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let listing = listing();
        let renderer = AnnotationRenderer::default();

        renderer.render(&listing, &table, &widths).await.unwrap();
        let once = listing.annotations();
        renderer.render(&listing, &table, &widths).await.unwrap();
        assert_eq!(listing.annotations(), once);
    }

    #[tokio::test]
    async fn test_render_replaces_stale_annotations() {
        let listing = listing();
        let renderer = AnnotationRenderer::default();

        let (old, old_widths) = parse_records(RECORDS).unwrap();
        renderer.render(&listing, &old, &old_widths).await.unwrap();

        let (new, new_widths) =
            parse_records(r#"{"path":"/repo/c","branch":"main","remote":"origin","ff":"true"}"#)
                .unwrap();
        renderer.render(&listing, &new, &new_widths).await.unwrap();

        let annotations = listing.annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].row, 4);
        assert_eq!(annotations[0].text, "main-origin-true ");
    }

    #[tokio::test]
    async fn test_sweep_leaves_foreign_annotations() {
        let listing = listing();
        let foreign = Annotation {
            row: 2,
            column: 0,
            text: "*".to_string(),
            owner: OwnerTag::new("marks"),
        };
        listing.place(foreign.clone()).unwrap();

        let renderer = AnnotationRenderer::default();
        assert_eq!(renderer.sweep(&listing).unwrap(), 0);

        let (table, widths) = parse_records(RECORDS).unwrap();
        renderer.render(&listing, &table, &widths).await.unwrap();
        assert_eq!(renderer.sweep(&listing).unwrap(), 3);
        assert_eq!(listing.annotations(), vec![foreign]);
    }

    #[tokio::test]
    async fn test_sweep_only_touches_visible_rows() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let listing = listing();
        let renderer = AnnotationRenderer::default();
        renderer.render(&listing, &table, &widths).await.unwrap();

        listing.set_visible(0..3);
        assert_eq!(renderer.sweep(&listing).unwrap(), 1);
        assert_eq!(rows_with_annotations(&listing), vec![3, 5]);
    }

    #[tokio::test]
    async fn test_render_after_close() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let listing = listing();
        let renderer = AnnotationRenderer::default();
        renderer.render(&listing, &table, &widths).await.unwrap();

        listing.close();
        let result = renderer.render(&listing, &table, &widths).await;

        assert_eq!(
            result,
            Err(PipelineError::RenderTargetGone {
                target: "/repo".to_string()
            })
        );
        assert!(listing.annotations().is_empty());
    }

    #[tokio::test]
    async fn test_row_without_path_is_skipped() {
        let (table, widths) = parse_records(r#"{"path":"/","branch":"main"}"#).unwrap();
        let listing = MemoryListing::new(
            "t",
            "/",
            vec![ListingRow::header("  /:"), ListingRow::entry("..", PathBuf::from("/"))],
        );
        let placed = AnnotationRenderer::default()
            .render(&listing, &table, &widths)
            .await
            .unwrap();
        assert_eq!(placed, 1);
        assert_eq!(rows_with_annotations(&listing), vec![1]);
    }

    #[tokio::test]
    async fn test_listing_gone_mid_render_withdraws_placed_annotations() {
        let (table, widths) = parse_records(RECORDS).unwrap();
        let foreign = Annotation {
            row: 2,
            column: 0,
            text: "*".to_string(),
            owner: OwnerTag::new("marks"),
        };
        let inner = listing();
        inner.place(foreign.clone()).unwrap();
        // Rows 0 to 3 resolve, so a and b are annotated before row 4 fails.
        let flaky = FlakyListing::new(inner, 4);

        let result = AnnotationRenderer::default()
            .render(&flaky, &table, &widths)
            .await;

        assert_eq!(
            result,
            Err(PipelineError::RenderTargetGone {
                target: "/repo".to_string()
            })
        );
        assert_eq!(flaky.lookups_left.load(Ordering::SeqCst), 0);
        assert_eq!(flaky.inner.annotations(), vec![foreign]);
    }
}
