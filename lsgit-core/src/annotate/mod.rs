//! Status annotations on the rows of a directory listing

mod memory;
mod renderer;
mod target;

pub use memory::{ListingRow, MemoryListing};
pub use renderer::AnnotationRenderer;
pub use target::{Annotation, ListingTarget, OwnerTag, TargetGone};
