//! Mock region implementation
//!
//! Implements `ScrollRegion` entirely in memory.
//! Used for testing and for the offline simulation without a real host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use contracts::ScrollRegion;

/// In-memory scroll region
///
/// Stores its offset as raw `f64` bits and counts programmatic writes so tests
/// can tell "never written" apart from "written with the same value".
#[derive(Debug)]
pub struct MockRegion {
    native_id: Option<String>,
    attributes: Mutex<HashMap<String, String>>,
    offset_bits: AtomicU64,
    writes: AtomicU64,
}

impl MockRegion {
    /// Create a region with an optional native id
    pub fn new(native_id: Option<&str>) -> Self {
        Self {
            native_id: native_id.map(str::to_string),
            attributes: Mutex::new(HashMap::new()),
            offset_bits: AtomicU64::new(0f64.to_bits()),
            writes: AtomicU64::new(0),
        }
    }

    /// Region carrying a native id
    pub fn with_id(id: &str) -> Self {
        Self::new(Some(id))
    }

    /// Region with no identifier at all
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Simulate the user dragging the region to `offset`.
    ///
    /// Unlike `set_scroll_left` this is not counted as a programmatic write.
    pub fn scroll_to(&self, offset: f64) {
        self.offset_bits.store(offset.to_bits(), Ordering::Release);
    }

    /// Number of `set_scroll_left` calls received
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }
}

impl ScrollRegion for MockRegion {
    fn native_id(&self) -> Option<String> {
        self.native_id.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    fn scroll_left(&self) -> f64 {
        f64::from_bits(self.offset_bits.load(Ordering::Acquire))
    }

    fn set_scroll_left(&self, offset: f64) {
        self.offset_bits.store(offset.to_bits(), Ordering::Release);
        self.writes.fetch_add(1, Ordering::AcqRel);
    }
}
