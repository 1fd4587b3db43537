//! Local execution backend.
//!
//! Runs commands as shell subprocesses on the invoking machine and copies
//! files with the system `cp` so permissions, ownership and timestamps
//! survive the transfer.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{BoxfileError, Result};
use crate::runner::{resolve_sources, Runner};

/// Executes instructions on the local machine.
pub struct LocalRunner {
    /// Root against which COPY/ADD source patterns are resolved.
    pub base_dir: PathBuf,
}

impl LocalRunner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Runner for LocalRunner {
    fn run_command(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> Result<()> {
        let mut cmd = if user.is_empty() {
            let mut c = Command::new("bash");
            c.args(["-c", command]);
            c
        } else {
            let mut c = Command::new("sudo");
            c.args(["-u", user, "bash", "-c", command]);
            c
        };

        // Parent environment is inherited; script variables extend it.
        for (key, value) in vars {
            cmd.env(key, value);
        }

        println!("Executing command: {}", command);
        let status = cmd.status().map_err(|e| {
            BoxfileError::Runner(format!("failed to execute command '{}': {}", command, e))
        })?;

        if !status.success() {
            return Err(BoxfileError::Runner(match status.code() {
                Some(code) => format!("command '{}' exited with code {}", command, code),
                None => format!("command '{}' terminated by signal", command),
            }));
        }
        Ok(())
    }

    fn copy_file(&self, src_pattern: &str, dest: &str, is_add: bool) -> Result<()> {
        let matches = resolve_sources(&self.base_dir, src_pattern)?;

        for src in matches {
            let metadata = std::fs::metadata(&src).map_err(|e| {
                BoxfileError::Runner(format!("cannot stat source {}: {}", src.display(), e))
            })?;

            let status = if metadata.is_dir() {
                if is_add {
                    std::fs::create_dir_all(dest).map_err(|e| {
                        BoxfileError::Runner(format!(
                            "cannot create destination {}: {}",
                            dest, e
                        ))
                    })?;
                    // cp -a preserves permissions, ownership and timestamps;
                    // the shell expands the contents glob.
                    Command::new("bash")
                        .arg("-c")
                        .arg(format!("cp -a {}/* {}/", src.display(), dest))
                        .status()
                } else {
                    Command::new("cp").arg("-a").arg(&src).arg(dest).status()
                }
            } else {
                Command::new("cp").arg("-p").arg(&src).arg(dest).status()
            };

            let status = status.map_err(|e| {
                BoxfileError::Runner(format!("failed to copy {}: {}", src.display(), e))
            })?;
            if !status.success() {
                return Err(BoxfileError::Runner(format!(
                    "copying {} to {} failed",
                    src.display(),
                    dest
                )));
            }

            if is_add {
                println!("Added contents of {} to {}", src.display(), dest);
            } else {
                println!("Copied {} to {}", src.display(), dest);
            }
        }
        Ok(())
    }

    fn verify_user(&self, name: &str) -> Result<()> {
        if user_exists(name) {
            Ok(())
        } else {
            Err(BoxfileError::Lookup(format!(
                "unknown user: {}",
                name
            )))
        }
    }
}

/// Check the local user database for an account name.
fn user_exists(name: &str) -> bool {
    let Ok(cname) = CString::new(name) else {
        return false;
    };
    // Safety: getpwnam takes a valid NUL-terminated string; the returned
    // pointer is only tested for NULL, never dereferenced. Interpretation
    // is single-threaded, so the shared static buffer is not contended.
    unsafe { !libc::getpwnam(cname.as_ptr()).is_null() }
}
