//! Read-only probing of on-disk git metadata.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Branch name reported when no enclosing repository exists.
pub const NOT_VERSIONED: &str = "not versioned";

/// Locates the nearest enclosing git repository and reads pieces of its
/// `.git` directory directly, without invoking the git binary.
///
/// Every accessor degrades to a default on filesystem errors; none of them
/// can fail. Nothing is cached between calls, so results always reflect the
/// filesystem at call time.
pub struct GitStateProber {
    start: PathBuf,
}

impl GitStateProber {
    /// Create a prober that walks upward from `start`.
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Nearest ancestor of the start path (the start path included) that
    /// contains a `.git` directory.
    ///
    /// Each candidate is canonicalized before the next step; the walk stops
    /// when the resolved parent equals the current directory, which only
    /// happens at the filesystem root. That comparison also bounds the loop
    /// in the presence of symlink cycles.
    pub fn locate_repository_root(&self) -> Option<PathBuf> {
        let mut current = match fs::canonicalize(&self.start) {
            Ok(path) => path,
            Err(err) => {
                debug!(start = %self.start.display(), error = %err, "start path not resolvable");
                return None;
            }
        };

        loop {
            if current.join(".git").is_dir() {
                return Some(current);
            }
            let parent = fs::canonicalize(current.join("..")).ok()?;
            if parent == current {
                debug!(start = %self.start.display(), "reached filesystem root without .git");
                return None;
            }
            current = parent;
        }
    }

    /// Symbolic name of the checked-out branch.
    ///
    /// Falls back to `(<hash7>…)` for a detached HEAD and to
    /// [`NOT_VERSIONED`] when there is no repository or HEAD is unreadable.
    pub fn branch_name(&self) -> String {
        let Some(root) = self.locate_repository_root() else {
            return NOT_VERSIONED.to_owned();
        };
        match fs::read_to_string(root.join(".git/HEAD")) {
            Ok(head) => branch_from_head(&head),
            Err(err) => {
                debug!(root = %root.display(), error = %err, "HEAD not readable");
                NOT_VERSIONED.to_owned()
            }
        }
    }

    /// Raw contents of `COMMIT_EDITMSG`, verbatim, if present and readable.
    pub fn last_commit_message(&self) -> Option<String> {
        let root = self.locate_repository_root()?;
        fs::read_to_string(root.join(".git/COMMIT_EDITMSG")).ok()
    }

    /// Local branch names under `refs/heads`, or `None` when the directory
    /// is missing or unlistable. An existing but empty directory yields an
    /// empty list, which callers must treat differently from `None`.
    pub fn heads(&self) -> Option<Vec<String>> {
        self.list_refs("heads")
    }

    /// Remote names under `refs/remotes` (top level only; remote
    /// sub-namespaces are not recursed into).
    pub fn remotes(&self) -> Option<Vec<String>> {
        self.list_refs("remotes")
    }

    /// Tag names under `refs/tags`. Unlike [`heads`](Self::heads), an empty
    /// set of tags is reported as `None`.
    pub fn tags(&self) -> Option<Vec<String>> {
        self.list_refs("tags").filter(|tags| !tags.is_empty())
    }

    /// True iff a repository root was located and its HEAD file is readable.
    pub fn is_under_version_control(&self) -> bool {
        self.locate_repository_root()
            .is_some_and(|root| fs::File::open(root.join(".git/HEAD")).is_ok())
    }

    fn list_refs(&self, namespace: &str) -> Option<Vec<String>> {
        let root = self.locate_repository_root()?;
        let dir = root.join(".git/refs").join(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "refs directory not listable");
                return None;
            }
        };

        // read_dir never yields the `.`/`..` pseudo-entries.
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Some(names)
    }
}

/// Resolve a branch name from raw HEAD contents.
fn branch_from_head(head: &str) -> String {
    if head.starts_with("ref:") {
        // e.g. "ref: refs/heads/main\n" -> "main"
        return match head.split('/').nth(2) {
            Some(name) => name.trim_end().to_owned(),
            None => NOT_VERSIONED.to_owned(),
        };
    }

    let short: String = head.trim_end().chars().take(7).collect();
    format!("({short}…)")
}

/// Convenience wrapper probing `start` without keeping the prober around.
pub fn repository_root_for(start: &Path) -> Option<PathBuf> {
    GitStateProber::new(start).locate_repository_root()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo(root: &Path, head: &str) {
        fs::create_dir_all(root.join(".git")).expect("create .git");
        fs::write(root.join(".git/HEAD"), head).expect("write HEAD");
    }

    #[test]
    fn missing_repository_degrades_to_not_versioned() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prober = GitStateProber::new(temp.path());

        assert_eq!(prober.locate_repository_root(), None);
        assert_eq!(prober.branch_name(), NOT_VERSIONED);
        assert_eq!(prober.last_commit_message(), None);
        assert_eq!(prober.heads(), None);
        assert_eq!(prober.remotes(), None);
        assert_eq!(prober.tags(), None);
        assert!(!prober.is_under_version_control());
    }

    #[test]
    fn symbolic_head_resolves_branch_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/feature-x\n");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.branch_name(), "feature-x");
        assert!(prober.is_under_version_control());
    }

    #[test]
    fn detached_head_reports_short_hash() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "a1b2c3d4e5f60718293a4b5c6d7e8f9012345678\n");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.branch_name(), "(a1b2c3d…)");
    }

    #[test]
    fn malformed_symbolic_head_degrades() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: broken\n");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.branch_name(), NOT_VERSIONED);
    }

    #[test]
    fn root_is_located_from_nested_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        let nested = temp.path().join("src/deep/module");
        fs::create_dir_all(&nested).expect("create nested dirs");

        let root = GitStateProber::new(&nested)
            .locate_repository_root()
            .expect("root found");
        assert_eq!(root, fs::canonicalize(temp.path()).expect("canonical root"));
    }

    #[test]
    fn heads_are_listed_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        fs::create_dir_all(temp.path().join(".git/refs/heads")).expect("refs/heads");
        fs::write(temp.path().join(".git/refs/heads/main"), "0".repeat(40)).expect("main");
        fs::write(temp.path().join(".git/refs/heads/dev"), "1".repeat(40)).expect("dev");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(
            prober.heads(),
            Some(vec!["dev".to_owned(), "main".to_owned()])
        );
    }

    #[test]
    fn empty_heads_directory_is_present_but_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        fs::create_dir_all(temp.path().join(".git/refs/heads")).expect("refs/heads");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.heads(), Some(Vec::new()));
    }

    #[test]
    fn missing_remotes_directory_is_absent_not_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        fs::create_dir_all(temp.path().join(".git/refs/heads")).expect("refs/heads");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.remotes(), None);
    }

    #[test]
    fn empty_tags_directory_is_absent() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        fs::create_dir_all(temp.path().join(".git/refs/tags")).expect("refs/tags");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.tags(), None);
    }

    #[test]
    fn commit_message_is_returned_verbatim() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        fs::write(temp.path().join(".git/COMMIT_EDITMSG"), "Fix bug\n").expect("message");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.last_commit_message().as_deref(), Some("Fix bug\n"));
    }

    #[test]
    fn accessors_are_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_repo(temp.path(), "ref: refs/heads/main\n");
        fs::create_dir_all(temp.path().join(".git/refs/heads")).expect("refs/heads");
        fs::write(temp.path().join(".git/refs/heads/main"), "0".repeat(40)).expect("main");

        let prober = GitStateProber::new(temp.path());
        assert_eq!(prober.branch_name(), prober.branch_name());
        assert_eq!(prober.heads(), prober.heads());
        assert_eq!(prober.tags(), prober.tags());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_ancestors_do_not_loop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let base = temp.path().join("base");
        fs::create_dir_all(&base).expect("base");
        std::os::unix::fs::symlink(&base, base.join("loop")).expect("symlink");

        // The chained symlink path resolves back onto `base` every step, so
        // the walk must still terminate at the filesystem root.
        let start = base.join("loop/loop/loop");
        assert_eq!(GitStateProber::new(&start).locate_repository_root(), None);

        init_repo(&base, "ref: refs/heads/main\n");
        let root = GitStateProber::new(&start)
            .locate_repository_root()
            .expect("root found through symlinks");
        assert_eq!(root, fs::canonicalize(&base).expect("canonical base"));
    }
}
