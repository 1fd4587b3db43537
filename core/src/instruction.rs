//! Instruction classification.
//!
//! Parses a single logical line into an [`Instruction`]. Only the script's
//! directive structure is validated here; variable expansion and ARG
//! precedence are the interpreter's concern.

use crate::error::{BoxfileError, Result};

/// A single script instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `FROM <image>` (acknowledged and ignored)
    From { image: String },
    /// `ARG <name>[=<default>]`
    Arg {
        name: String,
        default: Option<String>,
    },
    /// `ENV <key>=<value>`
    Env { key: String, value: String },
    /// `USER <name>`
    User { name: String },
    /// `RUN <shell command>`
    Run { command: String },
    /// `COPY <src-pattern> <dest>` or `ADD <src-pattern> <dest>`
    Copy {
        src: String,
        dest: String,
        is_add: bool,
    },
    /// Anything else (logged and skipped)
    Unsupported { line: String },
}

impl Instruction {
    /// Classify one logical line by its leading keyword.
    pub fn parse(line: &str) -> Result<Instruction> {
        let (keyword, rest) = split_first_word(line);

        match keyword.to_uppercase().as_str() {
            "FROM" => Ok(Instruction::From {
                image: rest.to_string(),
            }),
            "ARG" => parse_arg(rest),
            "ENV" => parse_env(rest),
            "USER" => Ok(Instruction::User {
                name: rest.to_string(),
            }),
            "RUN" => Ok(Instruction::Run {
                command: rest.to_string(),
            }),
            "COPY" => parse_copy(rest, false),
            "ADD" => parse_copy(rest, true),
            _ => Ok(Instruction::Unsupported {
                line: line.to_string(),
            }),
        }
    }
}

/// Split a string into the first word and the rest.
fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

fn parse_arg(rest: &str) -> Result<Instruction> {
    let (name, default) = match rest.split_once('=') {
        Some((name, default)) => (name.trim(), Some(unquote(default))),
        None => (rest.trim(), None),
    };

    if name.is_empty() {
        return Err(BoxfileError::Parse(format!(
            "ARG requires a name: 'ARG {}'",
            rest
        )));
    }

    Ok(Instruction::Arg {
        name: name.to_string(),
        default,
    })
}

fn parse_env(rest: &str) -> Result<Instruction> {
    let Some((key, value)) = rest.split_once('=') else {
        return Err(BoxfileError::Parse(format!(
            "invalid ENV instruction (expected key=value): 'ENV {}'",
            rest
        )));
    };

    Ok(Instruction::Env {
        key: key.to_string(),
        value: unquote(value),
    })
}

fn parse_copy(rest: &str, is_add: bool) -> Result<Instruction> {
    let keyword = if is_add { "ADD" } else { "COPY" };
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(BoxfileError::Parse(format!(
            "invalid {} instruction (requires exactly 2 arguments): '{} {}'",
            keyword, keyword, rest
        )));
    }

    Ok(Instruction::Copy {
        src: parts[0].to_string(),
        dest: parts[1].to_string(),
        is_add,
    })
}

/// Remove surrounding quote characters (`"` or `'`) from a value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    s.trim_matches(|c| c == '"' || c == '\'').to_string()
}
