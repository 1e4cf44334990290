//! The narrow host interface annotations are drawn through

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

/// Identifies annotations placed by one renderer so they can be swept
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerTag(String);

impl OwnerTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A zero-width marker drawn at a row position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Row index within the listing
    pub row: usize,
    /// Column the marker is drawn before
    pub column: usize,
    /// Rendered text
    pub text: String,
    /// Renderer that placed the marker
    pub owner: OwnerTag,
}

/// The host listing was closed or invalidated
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("listing target is no longer available")]
pub struct TargetGone;

/// Capabilities a directory listing exposes to the annotation renderer
///
/// Every operation on rows or markers fails with [`TargetGone`] once the
/// listing has been closed.
pub trait ListingTarget: Send + Sync {
    /// Identity used in log messages
    fn id(&self) -> String;

    /// Directory whose contents the listing shows
    fn root(&self) -> PathBuf;

    /// Whether the listing is still open
    fn is_live(&self) -> bool;

    /// Rows currently displayed
    fn visible_rows(&self) -> Result<Range<usize>, TargetGone>;

    /// Filesystem path a row stands for, if any
    fn row_path(&self, row: usize) -> Result<Option<PathBuf>, TargetGone>;

    /// Column where the row's file name starts
    fn content_start(&self, row: usize) -> Result<usize, TargetGone>;

    /// Draw a marker; replaces a marker with the same row and owner
    fn place(&self, annotation: Annotation) -> Result<(), TargetGone>;

    /// Markers owned by `owner` on the given rows
    fn owned_in(&self, owner: &OwnerTag, rows: Range<usize>)
        -> Result<Vec<Annotation>, TargetGone>;

    /// Remove a previously placed marker; removing an absent marker is a no-op
    fn remove(&self, annotation: &Annotation) -> Result<(), TargetGone>;
}
