//! Instruction interpreter.
//!
//! Walks the logical instructions of a script one at a time, maintaining the
//! execution context (current user and variable mapping), resolving ARG
//! precedence, and dispatching RUN/COPY/ADD to the active [`Runner`].
//!
//! Interpretation is strictly sequential: each Runner call must return
//! before the next logical line is read, and the first error aborts the
//! script. Instructions already executed are not rolled back.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use crate::expand::expand;
use crate::instruction::Instruction;
use crate::reader::InstructionReader;
use crate::runner::Runner;

/// Mutable state threaded through one script execution.
///
/// Created when interpretation starts and discarded when it ends; never
/// shared across script executions.
pub struct ExecutionContext {
    /// Active user for RUN instructions; empty means no user switch.
    current_user: String,
    /// Accumulated ARG/ENV variables. Later writes overwrite, keys are
    /// never removed.
    vars: HashMap<String, String>,
}

impl ExecutionContext {
    /// Seed the variable mapping with built-in ARGs, then the
    /// caller-supplied predefined ARGs.
    fn new(predefined_args: &HashMap<String, String>) -> Self {
        let mut vars = HashMap::new();

        // Built-in ARGs, available to every script.
        vars.insert("BUILDKIT_SYNTAX".to_string(), String::new());
        vars.insert(
            "BUILD_DATE".to_string(),
            format!("\"{}\"", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")),
        );

        for (key, value) in predefined_args {
            vars.insert(key.clone(), value.clone());
            println!("Using predefined ARG {}={}", key, value);
        }

        Self {
            current_user: String::new(),
            vars,
        }
    }
}

/// Execute the script at `path` against `runner`.
///
/// `predefined_args` take precedence over script ARG defaults and the
/// process environment. Returns on the first failing instruction; a
/// failure to open the script is reported before any instruction runs.
pub fn run_script(
    path: &Path,
    runner: &dyn Runner,
    predefined_args: &HashMap<String, String>,
) -> Result<()> {
    let file = File::open(path)?;
    run_from_reader(BufReader::new(file), runner, predefined_args)
}

/// Execute a script read from `input` against `runner`.
///
/// Same contract as [`run_script`]; used directly when the script arrives
/// on standard input.
pub fn run_from_reader(
    input: impl BufRead,
    runner: &dyn Runner,
    predefined_args: &HashMap<String, String>,
) -> Result<()> {
    let mut ctx = ExecutionContext::new(predefined_args);

    for logical_line in InstructionReader::new(input) {
        let instruction = Instruction::parse(&logical_line?)?;
        execute(&instruction, &mut ctx, runner, predefined_args)?;
    }

    Ok(())
}

/// Execute a single instruction, updating `ctx` and calling `runner` for
/// RUN/COPY/ADD.
fn execute(
    instruction: &Instruction,
    ctx: &mut ExecutionContext,
    runner: &dyn Runner,
    predefined_args: &HashMap<String, String>,
) -> Result<()> {
    match instruction {
        Instruction::From { image } => {
            println!("Ignoring instruction: FROM {}", image);
        }

        Instruction::Arg { name, default } => {
            // Precedence: command line > script default > process
            // environment > unset (empty). The chosen value is fixed at
            // this point; later variable changes never re-resolve it.
            if let Some(value) = predefined_args.get(name) {
                ctx.vars.insert(name.clone(), value.clone());
                println!("Using command line ARG {}={}", name, value);
            } else if let Some(default) = default {
                let value = expand(default, &ctx.vars);
                println!("Using script default ARG {}={}", name, value);
                ctx.vars.insert(name.clone(), value);
            } else {
                match std::env::var(name) {
                    Ok(value) if !value.is_empty() => {
                        println!("Using environment ARG {}={}", name, value);
                        ctx.vars.insert(name.clone(), value);
                    }
                    _ => {
                        println!("ARG {} has no value set", name);
                        ctx.vars.insert(name.clone(), String::new());
                    }
                }
            }
        }

        Instruction::Env { key, value } => {
            // Expanded against the mapping as it exists now, not
            // retroactively re-expanded by later assignments.
            let value = expand(value, &ctx.vars);
            println!("Set ENV {}={}", key, value);
            ctx.vars.insert(key.clone(), value);
        }

        Instruction::User { name } => {
            let name = expand(name, &ctx.vars);
            println!("Switching to user: {}", name);
            if !name.is_empty() {
                runner.verify_user(&name)?;
            }
            ctx.current_user = name;
        }

        Instruction::Run { command } => {
            let command = expand(command, &ctx.vars);
            runner.run_command(&command, &ctx.current_user, &ctx.vars)?;
        }

        Instruction::Copy { src, dest, is_add } => {
            let src = expand(src, &ctx.vars);
            let dest = expand(dest, &ctx.vars);
            runner.copy_file(&src, &dest, *is_add)?;
        }

        Instruction::Unsupported { line } => {
            tracing::warn!(line = line.as_str(), "unsupported instruction, skipping");
        }
    }

    Ok(())
}
