//! Execution backends.
//!
//! A [`Runner`] is the polymorphic execution target an interpreted script
//! drives: the local machine, a remote host over SSH, or a running
//! container. One Runner instance serves one script execution; it carries
//! no synchronization and must not be shared across concurrent executions.

mod local;
mod podman;
mod ssh;

pub use local::LocalRunner;
pub use podman::PodmanRunner;
pub use ssh::SshRunner;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{BoxfileError, Result};

/// Capability set of an execution target.
///
/// Both operations print human-readable progress lines to standard output
/// while they execute; operators watch these, nothing parses them.
pub trait Runner {
    /// Execute `command` on the target, as `user` when non-empty, with
    /// `vars` exported into the command's environment. Blocks until the
    /// spawned process exits; a nonzero exit is an error.
    fn run_command(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> Result<()>;

    /// Transfer everything matching `src_pattern` (resolved against the
    /// backend's base directory) to `dest` on the target. The base
    /// directory scopes sources only; `dest` is taken as-is on the target.
    ///
    /// For a directory source, `is_add` merges the directory's *contents*
    /// into `dest` (creating it if absent) while plain copy places the
    /// directory itself as a named entry. Either the whole matched set
    /// transfers or the instruction fails.
    fn copy_file(&self, src_pattern: &str, dest: &str, is_add: bool) -> Result<()>;

    /// Validate a USER target before switching to it. Backends without a
    /// reachable user database accept any name.
    fn verify_user(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// Resolve a source pattern against `base_dir` and expand glob wildcards.
///
/// Errors if the pattern is malformed, a match cannot be read, or nothing
/// matches at all.
pub(crate) fn resolve_sources(base_dir: &Path, src_pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = base_dir.join(src_pattern);
    let pattern = full_pattern.to_string_lossy();

    let mut matches = Vec::new();
    for entry in glob::glob(&pattern)
        .map_err(|e| BoxfileError::Runner(format!("invalid glob pattern '{}': {}", pattern, e)))?
    {
        let path = entry
            .map_err(|e| BoxfileError::Runner(format!("error reading glob match: {}", e)))?;
        matches.push(path);
    }

    if matches.is_empty() {
        return Err(BoxfileError::Runner(format!(
            "no matches found for pattern: {}",
            pattern
        )));
    }

    Ok(matches)
}
