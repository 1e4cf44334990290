//! In-memory listing used by the CLI and in tests

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::target::{Annotation, ListingTarget, OwnerTag, TargetGone};
use crate::{Error, Result};

/// Columns reserved for mark flags before each file name
const ENTRY_INDENT: usize = 2;

/// One displayed line of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub text: String,
    pub path: Option<PathBuf>,
    pub content_start: usize,
}

impl ListingRow {
    /// A line that stands for no file, such as the directory header
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: None,
            content_start: 0,
        }
    }

    /// An indented file entry
    pub fn entry(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            text: format!("{}{}", " ".repeat(ENTRY_INDENT), name),
            path: Some(path.into()),
            content_start: ENTRY_INDENT,
        }
    }
}

/// A directory listing held in memory, with its own marker registry
#[derive(Debug)]
pub struct MemoryListing {
    id: String,
    root: PathBuf,
    rows: Vec<ListingRow>,
    visible: Mutex<Range<usize>>,
    live: AtomicBool,
    markers: Mutex<BTreeMap<(usize, OwnerTag), Annotation>>,
}

impl MemoryListing {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>, rows: Vec<ListingRow>) -> Self {
        let visible = 0..rows.len();
        Self {
            id: id.into(),
            root: root.into(),
            rows,
            visible: Mutex::new(visible),
            live: AtomicBool::new(true),
            markers: Mutex::new(BTreeMap::new()),
        }
    }

    /// List a directory the way a file browser would: a header, the parent
    /// entry, then every entry sorted by name with directories marked by `/`
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().canonicalize().map_err(Error::Io)?;
        if !root.is_dir() {
            return Err(Error::Other(format!("Not a directory: {}", root.display())));
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&root).map_err(Error::Io)? {
            let entry = entry.map_err(Error::Io)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push((name, is_dir));
        }
        entries.sort();

        let mut rows = vec![ListingRow::header(format!("  {}:", root.display()))];
        let parent = root.parent().unwrap_or(&root).to_path_buf();
        rows.push(ListingRow::entry("../", parent));
        for (name, is_dir) in entries {
            let label = if is_dir { format!("{}/", name) } else { name.clone() };
            rows.push(ListingRow::entry(&label, root.join(&name)));
        }

        Ok(Self::new(root.display().to_string(), root, rows))
    }

    pub fn rows(&self) -> &[ListingRow] {
        &self.rows
    }

    /// Restrict the rows reported as visible
    pub fn set_visible(&self, rows: Range<usize>) {
        let end = rows.end.min(self.rows.len());
        *lock(&self.visible) = rows.start.min(end)..end;
    }

    /// Invalidate the listing; its markers go with it
    pub fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
        lock(&self.markers).clear();
    }

    /// All markers, ordered by row then owner
    pub fn annotations(&self) -> Vec<Annotation> {
        lock(&self.markers).values().cloned().collect()
    }

    /// Row texts with markers drawn at their columns
    pub fn render_lines(&self) -> Vec<String> {
        let markers = lock(&self.markers);
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let mut line = row.text.clone();
                let on_row: Vec<&Annotation> = markers
                    .range((index, OwnerTag::new(""))..)
                    .take_while(|((r, _), _)| *r == index)
                    .map(|(_, a)| a)
                    .collect();
                // Later owners are inserted first so earlier ones end up leftmost.
                for annotation in on_row.into_iter().rev() {
                    let at = line
                        .char_indices()
                        .nth(annotation.column)
                        .map(|(i, _)| i)
                        .unwrap_or(line.len());
                    line.insert_str(at, &annotation.text);
                }
                line
            })
            .collect()
    }

    fn check_live(&self) -> std::result::Result<(), TargetGone> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TargetGone)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ListingTarget for MemoryListing {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn visible_rows(&self) -> std::result::Result<Range<usize>, TargetGone> {
        self.check_live()?;
        Ok(lock(&self.visible).clone())
    }

    fn row_path(&self, row: usize) -> std::result::Result<Option<PathBuf>, TargetGone> {
        self.check_live()?;
        Ok(self.rows.get(row).and_then(|r| r.path.clone()))
    }

    fn content_start(&self, row: usize) -> std::result::Result<usize, TargetGone> {
        self.check_live()?;
        Ok(self.rows.get(row).map_or(0, |r| r.content_start))
    }

    fn place(&self, annotation: Annotation) -> std::result::Result<(), TargetGone> {
        self.check_live()?;
        lock(&self.markers).insert((annotation.row, annotation.owner.clone()), annotation);
        Ok(())
    }

    fn owned_in(
        &self,
        owner: &OwnerTag,
        rows: Range<usize>,
    ) -> std::result::Result<Vec<Annotation>, TargetGone> {
        self.check_live()?;
        Ok(lock(&self.markers)
            .values()
            .filter(|a| a.owner == *owner && rows.contains(&a.row))
            .cloned()
            .collect())
    }

    fn remove(&self, annotation: &Annotation) -> std::result::Result<(), TargetGone> {
        self.check_live()?;
        lock(&self.markers).remove(&(annotation.row, annotation.owner.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(row: usize, owner: &str, text: &str) -> Annotation {
        Annotation {
            row,
            column: ENTRY_INDENT,
            text: text.to_string(),
            owner: OwnerTag::new(owner),
        }
    }

    #[test]
    fn test_from_dir_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repo")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let listing = MemoryListing::from_dir(dir.path()).unwrap();
        let root = dir.path().canonicalize().unwrap();
        let texts: Vec<&str> = listing.rows().iter().map(|r| r.text.as_str()).collect();

        assert_eq!(texts[1..], ["  ../", "  a.txt", "  repo/"]);
        assert_eq!(listing.rows()[0].path, None);
        assert_eq!(listing.rows()[3].path, Some(root.join("repo")));
        assert_eq!(listing.root(), root);
        assert_eq!(listing.visible_rows().unwrap(), 0..4);
    }

    #[test]
    fn test_from_dir_missing() {
        assert!(MemoryListing::from_dir("/nonexistent/path/12345").is_err());
    }

    #[test]
    fn test_place_replaces_same_owner() {
        let listing = MemoryListing::new("t", "/r", vec![ListingRow::entry("a", "/r/a")]);
        listing.place(marker(0, "lsgit", "old ")).unwrap();
        listing.place(marker(0, "lsgit", "new ")).unwrap();
        listing.place(marker(0, "other", "* ")).unwrap();

        let annotations = listing.annotations();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].text, "new ");
    }

    #[test]
    fn test_render_lines_inserts_at_column() {
        let listing = MemoryListing::new(
            "t",
            "/r",
            vec![ListingRow::header("  /r:"), ListingRow::entry("a/", "/r/a")],
        );
        listing.place(marker(1, "lsgit", "main-origin-true ")).unwrap();

        assert_eq!(listing.render_lines(), vec!["  /r:", "  main-origin-true a/"]);
    }

    #[test]
    fn test_closed_listing_rejects_operations() {
        let listing = MemoryListing::new("t", "/r", vec![ListingRow::entry("a", "/r/a")]);
        listing.place(marker(0, "lsgit", "x")).unwrap();
        listing.close();

        assert!(!listing.is_live());
        assert!(listing.annotations().is_empty());
        assert_eq!(listing.visible_rows(), Err(TargetGone));
        assert_eq!(listing.place(marker(0, "lsgit", "x")), Err(TargetGone));
        assert_eq!(listing.row_path(0), Err(TargetGone));
    }

    #[test]
    fn test_set_visible_is_clamped() {
        let listing = MemoryListing::new("t", "/r", vec![ListingRow::entry("a", "/r/a")]);
        listing.set_visible(0..10);
        assert_eq!(listing.visible_rows().unwrap(), 0..1);
    }
}
