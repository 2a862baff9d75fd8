//! Shared numeric aliases for positions and identifiers.

/// Offset into the whole composed document space of one view generation.
///
/// A global position is only meaningful relative to the view that produced
/// it; reopening yields a new generation with its own positions.
pub type GlobalPosition = u64;

/// Offset of a document inside a single segment.
pub type LocalOffset = u64;

/// Externally assigned document identifier that survives reopen.
pub type StableId = u64;
