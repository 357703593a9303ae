/// State management module
///
/// This module holds everything the pages remember between interactions:
/// - Picture Generator page: upload, scale selection, progress (generator.rs)
/// - Picture Gallery page: selection, zoom, focal point, comparison (gallery.rs)
/// - Shared data structures passed to and from background tasks (data.rs)

pub mod data;
pub mod gallery;
pub mod generator;
