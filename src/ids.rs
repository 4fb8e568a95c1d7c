//! Tile identifier sources.
//!
//! Merges and spawns need fresh ids. Instead of a hidden global counter the
//! engine takes an [`IdSource`] argument, so tests can use a deterministic
//! prefix and the player and AI boards can draw from separate sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::grid::TileId;

/// Anything able to hand out tile ids that are unique within one process run.
pub trait IdSource {
    fn next_id(&mut self) -> TileId;
}

impl<F> IdSource for F
where
    F: FnMut() -> TileId,
{
    #[inline]
    fn next_id(&mut self) -> TileId { self() }
}

/// Sources handed out by [`SequentialIds::new`] in this process.
static CLOCK_SOURCES: AtomicU64 = AtomicU64::new(0);

/// Monotonic counter behind a fixed prefix, e.g. `id_1700000000000_3_7`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    /// Prefix taken from the wall clock in milliseconds plus a process-wide
    /// source number, so two sources made in the same millisecond differ.
    pub fn new() -> Self {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let source = CLOCK_SOURCES.fetch_add(1, Ordering::Relaxed);
        Self::with_prefix(format!("id_{millis}_{source}"))
    }

    /// Deterministic ids (`<prefix>_1`, `<prefix>_2`, ...).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: 0 }
    }

    /// Number of ids handed out so far.
    #[inline]
    pub fn issued(&self) -> u64 { self.next }
}

impl Default for SequentialIds {
    fn default() -> Self { Self::new() }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> TileId {
        self.next += 1;
        TileId::new(format!("{}_{}", self.prefix, self.next))
    }
}
