//! Remote-shell execution backend.
//!
//! Tunnels RUN over an `ssh` invocation and COPY/ADD over `scp`. The ssh
//! and scp binaries are treated as black boxes; this backend only assembles
//! their argument lists. Host identity verification is disabled
//! (`StrictHostKeyChecking=no`): targets are freshly provisioned machines
//! whose keys are not yet known, so pinning would make every first contact
//! fail.
//!
//! Because the remote side cannot expand local glob patterns, every
//! transfer is two-phase: matches resolve locally, each match is uploaded
//! into a unique remote temporary directory, and a follow-up remote command
//! merges it into the final destination. The temporary directory is removed
//! on success; on failure it may be left behind.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use uuid::Uuid;

use crate::error::{BoxfileError, Result};
use crate::runner::{resolve_sources, Runner};

/// Executes instructions on a remote host over SSH.
pub struct SshRunner {
    base_dir: PathBuf,
    host: String,
    user: String,
    port: Option<u16>,
    key_path: Option<PathBuf>,
    password: Option<String>,
}

impl SshRunner {
    /// Build an SSH runner.
    ///
    /// Password authentication is relayed through `sshpass`; if a password
    /// is supplied and the helper is not on PATH, this is a configuration
    /// error raised here, before any command runs.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        host: impl Into<String>,
        user: impl Into<String>,
        port: Option<u16>,
        key_path: Option<PathBuf>,
        password: Option<String>,
    ) -> Result<Self> {
        if password.is_some() && !helper_on_path("sshpass") {
            return Err(BoxfileError::Config(
                "sshpass is not installed; it is required for password authentication"
                    .to_string(),
            ));
        }

        Ok(Self {
            base_dir: base_dir.into(),
            host: host.into(),
            user: user.into(),
            port,
            key_path,
            password,
        })
    }

    /// Assemble the invocation prefix for `program` (ssh or scp): optional
    /// sshpass relay, port, identity file, and host-key options.
    ///
    /// ssh and scp disagree on the port flag (`-p` vs `-P`), so the caller
    /// supplies it.
    fn base_args(&self, program: &str, port_flag: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(password) = &self.password {
            args.extend([
                "sshpass".to_string(),
                "-p".to_string(),
                password.clone(),
            ]);
        }
        args.push(program.to_string());

        if let Some(port) = self.port {
            args.extend([port_flag.to_string(), port.to_string()]);
        }
        if let Some(key) = &self.key_path {
            args.extend(["-i".to_string(), key.to_string_lossy().into_owned()]);
        }
        args.extend(["-o".to_string(), "StrictHostKeyChecking=no".to_string()]);

        args
    }

    /// Build the command string executed on the remote side: variable
    /// prefix, then optional sudo wrapping.
    fn build_remote_command(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> String {
        let mut remote = command.to_string();

        if !vars.is_empty() {
            let mut keys: Vec<&String> = vars.keys().collect();
            keys.sort();
            let prefix: String = keys
                .iter()
                .map(|k| format!("{}={} ", k, vars[k.as_str()]))
                .collect();
            remote = format!("{}{}", prefix, remote);
        }

        if !user.is_empty() {
            remote = format!(
                "sudo -u {} bash -c '{}'",
                user,
                remote.replace('\'', r#"'"'"'"#)
            );
        }

        remote
    }

    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn spawn_checked(&self, args: &[String], what: &str) -> Result<()> {
        let status = Command::new(&args[0])
            .args(&args[1..])
            .status()
            .map_err(|e| BoxfileError::Runner(format!("failed to invoke {}: {}", what, e)))?;

        if !status.success() {
            return Err(BoxfileError::Runner(format!(
                "{} exited with code {}",
                what,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

impl Runner for SshRunner {
    fn run_command(
        &self,
        command: &str,
        user: &str,
        vars: &HashMap<String, String>,
    ) -> Result<()> {
        let remote_command = self.build_remote_command(command, user, vars);

        let mut args = self.base_args("ssh", "-p");
        args.push(self.target());
        args.push(remote_command.clone());

        println!("Executing remote command: {}", remote_command);
        self.spawn_checked(&args, &format!("remote command '{}'", command))
    }

    fn copy_file(&self, src_pattern: &str, dest: &str, is_add: bool) -> Result<()> {
        let matches = resolve_sources(&self.base_dir, src_pattern)?;

        for src in matches {
            let metadata = std::fs::metadata(&src).map_err(|e| {
                BoxfileError::Runner(format!("cannot stat source {}: {}", src.display(), e))
            })?;

            // Fresh temporary directory per transfer; no session state is
            // shared between calls.
            let remote_tmp = format!("/tmp/boxfile-copy-{}", Uuid::new_v4());
            self.run_command(&format!("mkdir -p {}", remote_tmp), "", &HashMap::new())?;

            let mut scp_args = self.base_args("scp", "-P");
            scp_args.extend([
                "-p".to_string(),
                "-r".to_string(),
                src.to_string_lossy().into_owned(),
                format!("{}:{}/", self.target(), remote_tmp),
            ]);
            self.spawn_checked(&scp_args, &format!("upload of {}", src.display()))?;

            let src_base = src
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| src.to_string_lossy().into_owned());
            let remote_src = format!("{}/{}", remote_tmp, src_base);

            let merge_command = if metadata.is_dir() && is_add {
                format!(
                    "mkdir -p {dest} && cp -a {remote_src}/* {dest}/ && rm -rf {remote_tmp}"
                )
            } else {
                format!(
                    "mkdir -p $(dirname {dest}) && cp -a {remote_src} {dest} && rm -rf {remote_tmp}"
                )
            };
            self.run_command(&merge_command, "", &HashMap::new())?;

            if is_add {
                println!(
                    "Added contents of {} to {} on {} (preserving attributes)",
                    src.display(),
                    dest,
                    self.host
                );
            } else {
                println!(
                    "Copied {} to {} on {} (preserving attributes)",
                    src.display(),
                    dest,
                    self.host
                );
            }
        }
        Ok(())
    }
}

/// Check whether an executable is reachable via PATH.
fn helper_on_path(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}
