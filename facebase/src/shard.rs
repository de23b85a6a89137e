use std::ops::Range;

/// Splits `0..n` into `workers` contiguous index ranges.
///
/// Shard `i` covers `[i*n/workers, (i+1)*n/workers)`, so the shards are
/// disjoint and tile `0..n` exactly; integer-division remainders land in
/// the later shards. For `workers <= n` every shard is non-empty. A pure
/// function of its arguments, so one detection call always partitions a
/// given snapshot the same way.
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 || workers == 0 {
        return Vec::new();
    }
    (0..workers)
        .map(|i| (i * n / workers)..((i + 1) * n / workers))
        .collect()
}
