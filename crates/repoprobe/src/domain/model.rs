//! Domain models for repository state snapshots.

use serde::Serialize;

/// Point-in-time view of the enclosing git repository.
///
/// `branch_name` is always populated, degrading to `"not versioned"` when no
/// repository encloses the probed path. The remaining collections distinguish
/// "no data" (`None`, the source directory was missing or unlistable) from
/// "present but empty" (`Some` with an empty list); renderers omit `None`
/// fields entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSnapshot {
    pub branch_name: String,
    pub last_commit_message: Option<String>,
    pub heads: Option<Vec<String>>,
    pub remotes: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub versioned: bool,
}
