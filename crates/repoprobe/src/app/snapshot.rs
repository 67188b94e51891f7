//! Snapshot capture orchestration.

use std::path::Path;

use crate::domain::model::GitSnapshot;
use crate::infra::probe::GitStateProber;

/// Capture the repository state for `start`.
///
/// Never fails: each field degrades independently per the prober's rules, so
/// the worst case is a snapshot reporting "not versioned" with every optional
/// field absent.
pub fn capture(start: impl AsRef<Path>) -> GitSnapshot {
    let prober = GitStateProber::new(start.as_ref());
    GitSnapshot {
        branch_name: prober.branch_name(),
        last_commit_message: prober.last_commit_message(),
        heads: prober.heads(),
        remotes: prober.remotes(),
        tags: prober.tags(),
        versioned: prober.is_under_version_control(),
    }
}
