//! Format versioning constants for graph documents.
//!
//! Documents carry an integer `Version`. Anything newer than
//! [`GRAPH_FORMAT_VERSION`] is rejected; older documents load unchanged.

/// Current format version for serialized dialogue graphs.
/// Increment when the document layout changes.
pub const GRAPH_FORMAT_VERSION: i32 = 1;

/// Returns true if a document written with `version` can be loaded.
pub fn is_supported(version: i32) -> bool {
    version <= GRAPH_FORMAT_VERSION
}
