//! Batch planning: partition the ordered page list into contiguous groups.
//!
//! For N pages and maximum batch size B this yields ⌈N/B⌉ groups, each of
//! size ≤ B, covering every page exactly once and preserving page order both
//! within and across groups. Zero pages yields zero batches; the orchestrator
//! treats that as a fatal error before planning, never as an empty success.

/// Partition `pages` into contiguous batches of at most `max_batch` elements.
pub fn plan_batches<T>(pages: &[T], max_batch: usize) -> Vec<&[T]> {
    pages.chunks(max_batch.max(1)).collect()
}
