//! Delta planning: turning a size observation into bounded chunk reads.

/// A single bounded read of a pending delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkSpan {
    /// Absolute byte position to read from.
    pub offset: u64,
    /// Bytes requested; at most the configured chunk size.
    pub len: usize,
}

/// Detect if the file shrank by comparing its size with the consumed baseline.
pub(crate) fn detect_truncation(size: u64, consumed: u64) -> bool {
    size < consumed
}

/// Bytes waiting between the baseline and the observed size, if any.
pub(crate) fn pending_bytes(size: u64, consumed: u64) -> Option<u64> {
    if size <= consumed {
        None // Nothing new to read
    } else {
        Some(size - consumed)
    }
}

/// Split the pending delta `[consumed, size)` into spans of at most
/// `chunk_size` bytes: `ceil(delta / chunk_size)` spans, the last one short
/// when the delta is not an exact multiple.
pub(crate) fn chunk_spans(consumed: u64, size: u64, chunk_size: usize) -> Vec<ChunkSpan> {
    debug_assert!(chunk_size > 0);

    let Some(mut remaining) = pending_bytes(size, consumed) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    let mut offset = consumed;
    while remaining > 0 {
        let len = remaining.min(chunk_size as u64) as usize;
        spans.push(ChunkSpan { offset, len });
        offset += len as u64;
        remaining -= len as u64;
    }
    spans
}
