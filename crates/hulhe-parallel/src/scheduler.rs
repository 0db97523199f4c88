use std::sync::atomic::{AtomicUsize, Ordering};

/// How work (deals-per-iteration, in this solver's case) is handed to
/// workers (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// Contiguous ranges assigned once, at iteration start.
    Static,
    /// A shared atomic counter hands out `chunk_size`-sized chunks.
    Dynamic { chunk_size: usize },
    /// Workers pull from a shared work-stealing iterator (`rayon`'s
    /// `into_par_iter`, which is work-stealing internally); exposed here as
    /// its own policy since it needs no explicit chunk plan.
    WorkStealing,
}

/// Split `total` units of work across `workers` ranges for
/// [`SchedulingPolicy::Static`].
pub fn static_partition(total: usize, workers: usize) -> Vec<std::ops::Range<usize>> {
    let workers = workers.max(1);
    let base = total / workers;
    let remainder = total % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// A shared counter doling out `chunk_size`-sized chunks for
/// [`SchedulingPolicy::Dynamic`]. Each call to [`next_chunk`] is one atomic
/// fetch-add; no two workers ever receive overlapping ranges.
pub struct DynamicChunks {
    total: usize,
    chunk_size: usize,
    cursor: AtomicUsize,
}

impl DynamicChunks {
    pub fn new(total: usize, chunk_size: usize) -> Self {
        Self {
            total,
            chunk_size: chunk_size.max(1),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim the next chunk, or `None` once all `total` units are spoken
    /// for.
    pub fn next_chunk(&self) -> Option<std::ops::Range<usize>> {
        let start = self.cursor.fetch_add(self.chunk_size, Ordering::Relaxed);
        if start >= self.total {
            return None;
        }
        Some(start..(start + self.chunk_size).min(self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_partition_covers_every_unit_exactly_once() {
        let ranges = static_partition(10, 3);
        let mut covered: Vec<usize> = ranges.iter().flat_map(|r| r.clone()).collect();
        covered.sort_unstable();
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn dynamic_chunks_exhaust_without_overlap() {
        let chunks = DynamicChunks::new(10, 3);
        let mut covered = Vec::new();
        while let Some(range) = chunks.next_chunk() {
            covered.extend(range);
        }
        covered.sort_unstable();
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
    }
}
