//! Command-line surface and argument helpers.

use std::path::PathBuf;

use clap::Parser;

/// Run Dockerfile-style provisioning scripts locally, over SSH, or inside
/// a running container.
#[derive(Parser)]
#[command(name = "boxfile", version, about)]
pub struct Cli {
    /// Path to the script to execute
    #[arg(short = 'f', long = "file", default_value = "Boxfile")]
    pub file: PathBuf,

    /// Read the script from standard input instead of a file
    #[arg(long)]
    pub stdin: bool,

    /// Base directory for COPY/ADD sources (defaults to the script's
    /// directory, or the current directory with --stdin)
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Execute on a remote host over SSH ([user@]host)
    #[arg(short = 'H', long, conflicts_with = "container")]
    pub host: Option<String>,

    /// SSH user (defaults to the invoking user)
    #[arg(short, long, requires = "host")]
    pub user: Option<String>,

    /// SSH port
    #[arg(long, requires = "host")]
    pub port: Option<u16>,

    /// Path to an SSH private key
    #[arg(short, long, requires = "host")]
    pub key: Option<PathBuf>,

    /// SSH password
    #[arg(long, requires = "host")]
    pub password: Option<String>,

    /// Prompt for the SSH password (hidden echo)
    #[arg(long, requires = "host", conflicts_with = "password")]
    pub ask_password: bool,

    /// Execute inside a running container
    #[arg(short = 'n', long)]
    pub container: Option<String>,

    /// Podman connection name
    #[arg(long, requires = "container")]
    pub connection: Option<String>,

    /// Path to the podman binary
    #[arg(long, default_value = "podman")]
    pub podman_binary: PathBuf,

    /// Predefine an ARG (KEY=VALUE, repeatable)
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,
}

impl Cli {
    /// Base directory for source patterns: explicit --context, otherwise
    /// the script's parent directory (current directory for --stdin).
    pub fn execution_context(&self) -> PathBuf {
        if let Some(context) = &self.context {
            return context.clone();
        }
        if self.stdin {
            return PathBuf::from(".");
        }
        match self.file.canonicalize() {
            Ok(abs) => abs
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            Err(_) => PathBuf::from("."),
        }
    }
}

/// Parse a `KEY=VALUE` predefined-ARG flag. The value may be quoted.
pub fn parse_arg_value(arg: &str) -> Result<(String, String), String> {
    let Some((key, value)) = arg.split_once('=') else {
        return Err(format!("invalid ARG format, expected KEY=VALUE: {}", arg));
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(format!("invalid ARG format, empty key: {}", arg));
    }
    let value = value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    Ok((key, value))
}

/// Split a `user@host` target; `None` when there is no user part.
pub fn parse_user_host(target: &str) -> Option<(String, String)> {
    let (user, host) = target.split_once('@')?;
    if user.is_empty() || host.is_empty() {
        return None;
    }
    Some((user.to_string(), host.to_string()))
}
