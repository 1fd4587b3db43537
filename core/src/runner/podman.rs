//! Container-exec backend.
//!
//! Shells into a running container through `podman exec` and transfers
//! files with `podman cp`. The podman binary (or a drop-in compatible
//! tool) does the actual work; a remote connection can be selected with
//! podman's own `--connection` mechanism.
//!
//! Narrower transfer contract than the other backends: `podman cp` applies
//! its own directory semantics, so COPY and ADD of a directory behave
//! identically here and the `is_add` merge distinction is not honored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{BoxfileError, Result};
use crate::runner::{resolve_sources, Runner};

/// Executes instructions inside a running container.
pub struct PodmanRunner {
    base_dir: PathBuf,
    container: String,
    connection: Option<String>,
    binary: PathBuf,
}

impl PodmanRunner {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        container: impl Into<String>,
        connection: Option<String>,
        binary: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            container: container.into(),
            connection,
            binary: binary.into(),
        }
    }

    /// Start a podman invocation, routed through `--connection` when one is
    /// configured.
    fn podman(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(connection) = &self.connection {
            cmd.arg(format!("--connection={}", connection));
        }
        cmd
    }

    /// Argument list for `podman exec`: optional user override, then the
    /// command with its variable prefix under a single `sh -c`.
    fn exec_args(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> Vec<String> {
        let mut shell_command = command.to_string();
        if !vars.is_empty() {
            let mut keys: Vec<&String> = vars.keys().collect();
            keys.sort();
            let prefix: String = keys
                .iter()
                .map(|k| format!("{}={} ", k, vars[k.as_str()]))
                .collect();
            shell_command = format!("{}{}", prefix, shell_command);
        }

        let mut args = vec!["exec".to_string()];
        if !user.is_empty() {
            args.extend(["--user".to_string(), user.to_string()]);
        }
        args.extend([
            self.container.clone(),
            "sh".to_string(),
            "-c".to_string(),
            shell_command,
        ]);
        args
    }
}

impl Runner for PodmanRunner {
    fn run_command(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> Result<()> {
        let args = self.exec_args(command, user, vars);

        println!("Executing command in container: {}", args.join(" "));
        let status = self.podman().args(&args).status().map_err(|e| {
            BoxfileError::Runner(format!(
                "failed to invoke {}: {}",
                self.binary.display(),
                e
            ))
        })?;

        if !status.success() {
            return Err(BoxfileError::Runner(format!(
                "command '{}' in container {} exited with code {}",
                command,
                self.container,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }

    fn copy_file(&self, src_pattern: &str, dest: &str, _is_add: bool) -> Result<()> {
        let matches = resolve_sources(&self.base_dir, src_pattern)?;

        for src in matches {
            println!("Copying file to container: {}", src.display());
            let status = self
                .podman()
                .arg("cp")
                .arg(&src)
                .arg(format!("{}:{}", self.container, dest))
                .status()
                .map_err(|e| {
                    BoxfileError::Runner(format!(
                        "failed to invoke {}: {}",
                        self.binary.display(),
                        e
                    ))
                })?;

            if !status.success() {
                return Err(BoxfileError::Runner(format!(
                    "copying {} into container {} failed",
                    src.display(),
                    self.container
                )));
            }
        }
        Ok(())
    }
}
