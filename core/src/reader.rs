//! Instruction reader.
//!
//! Turns raw script text into a lazy sequence of logical instruction lines:
//! physical lines are trimmed, comments and blank lines dropped, and
//! backslash-terminated lines joined with their continuations. A single
//! forward scan; the iterator is not restartable.

use std::io::BufRead;

use crate::error::{BoxfileError, Result};

/// Continuation-joining state.
enum ReadState {
    /// Ready for the next logical line.
    AwaitingLine,
    /// A previous physical line ended with `\`; joining until one does not.
    Accumulating(String),
}

/// Iterator over the logical instruction lines of a script.
///
/// Yields one item per logical line after comment/blank stripping and
/// continuation joining. If the input ends while a continuation is still
/// open, the final item is a [`BoxfileError::Parse`] and the iterator is
/// exhausted afterwards.
pub struct InstructionReader<R: BufRead> {
    input: std::io::Lines<R>,
    state: ReadState,
    done: bool,
}

impl<R: BufRead> InstructionReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            input: reader.lines(),
            state: ReadState::AwaitingLine,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for InstructionReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.input.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    if matches!(self.state, ReadState::Accumulating(_)) {
                        return Some(Err(BoxfileError::Parse(
                            "unterminated line continuation at end of script".to_string(),
                        )));
                    }
                    return None;
                }
            };

            let line = line.trim();

            // Comments and blank lines are dropped in either state: they are
            // never joined into an open continuation.
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match &mut self.state {
                ReadState::AwaitingLine => {
                    if let Some(stripped) = line.strip_suffix('\\') {
                        let mut buf = stripped.trim_end().to_string();
                        buf.push(' ');
                        self.state = ReadState::Accumulating(buf);
                    } else {
                        return Some(Ok(line.to_string()));
                    }
                }
                ReadState::Accumulating(buf) => {
                    if let Some(stripped) = line.strip_suffix('\\') {
                        buf.push_str(stripped.trim_end());
                        buf.push(' ');
                    } else {
                        buf.push_str(line);
                        let assembled = std::mem::take(buf);
                        self.state = ReadState::AwaitingLine;
                        return Some(Ok(assembled));
                    }
                }
            }
        }
    }
}
