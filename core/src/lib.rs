//! Boxfile Core - Script Interpretation and Execution Backends
//!
//! This crate provides the Boxfile interpreter: the instruction reader,
//! variable expander, and the Runner abstraction with its local, SSH and
//! container backends. The CLI layer constructs a Runner and hands it to
//! [`run_script`]; everything else happens here.

pub mod error;
pub mod expand;
pub mod instruction;
pub mod interpreter;
pub mod reader;
pub mod runner;

// Re-export commonly used types
pub use error::{BoxfileError, Result};
pub use instruction::Instruction;
pub use interpreter::{run_from_reader, run_script};
pub use runner::{LocalRunner, PodmanRunner, Runner, SshRunner};

/// Boxfile version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
