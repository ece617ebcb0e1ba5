//! ScrollRegion trait - Host scroll surface abstraction
//!
//! Decouples the sync engine from whatever actually scrolls (a DOM node, a
//! terminal pane, a GPU widget). The engine only ever reads and writes the
//! horizontal offset and reads/attaches an identifier.

use std::sync::Arc;

/// Attribute under which generated identifiers are attached to a region.
pub const QUALIFIED_NAME: &str = "data-minimal-scroll-sync-id";

/// Horizontally scrollable region owned by the host.
///
/// All methods take `&self`: regions are shared between the host, the engine
/// and any binding, so implementations use interior mutability.
///
/// # Example
///
/// ```ignore
/// let region: SharedRegion = Arc::new(MockRegion::with_id("header"));
/// region.set_scroll_left(120.0);
/// assert_eq!(region.scroll_left(), 120.0);
/// ```
pub trait ScrollRegion: Send + Sync {
    /// Identifier assigned by the host itself, if any.
    ///
    /// An empty string counts as absent.
    fn native_id(&self) -> Option<String>;

    /// Read a named attribute.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Attach a named attribute for the rest of the region's lifetime.
    fn set_attribute(&self, name: &str, value: &str);

    /// Current horizontal scroll offset.
    fn scroll_left(&self) -> f64;

    /// Move the region to a horizontal scroll offset.
    fn set_scroll_left(&self, offset: f64);
}

/// Shared handle to a host region.
pub type SharedRegion = Arc<dyn ScrollRegion>;
