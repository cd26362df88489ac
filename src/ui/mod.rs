/// User interface building blocks
///
/// Each submodule renders one area of the window from the
/// `GallerySession` state; none of them hold state of their own.

pub mod banner;
pub mod gallery;
pub mod progress;
pub mod search;
