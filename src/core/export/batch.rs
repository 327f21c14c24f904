//! Chunked export planning
//!
//! Pages are exported in consecutive, fixed-size chunks: all exports in a
//! chunk run concurrently, and a chunk must finish entirely before the next
//! one starts. Chunking exists purely to stay inside the service's
//! concurrent-export quota; chunk boundaries are rate shaping, never a
//! property of the output.

use std::ops::Range;

/// Split `total` positions into consecutive chunks of size
/// `min(total, configured_limit)`
///
/// Boundaries are positional only; the content of a page never influences
/// which chunk it lands in. For any total `L` and limit `C` this yields
/// `ceil(L / C)` chunks.
pub fn chunk_plan(total: usize, configured_limit: usize) -> Vec<Range<usize>> {
    if total == 0 || configured_limit == 0 {
        return Vec::new();
    }

    let size = configured_limit.min(total);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}
