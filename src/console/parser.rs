//! Command line parser
//!
//! Simple split on whitespace, at most `MAX_ARGS` tokens including the
//! command name.

use heapless::Vec;

use crate::config::MAX_ARGS;

/// Arguments kept after the command name
pub const MAX_PARAMS: usize = MAX_ARGS - 1;

/// Parsed command
#[derive(Debug, Clone)]
pub struct ParsedCommand<'a> {
    /// The command name (first token)
    pub command: &'a str,
    /// Remaining tokens, in order
    pub args: Vec<&'a str, MAX_PARAMS>,
    /// Tokens beyond `MAX_ARGS` were dropped
    pub truncated: bool,
}

impl<'a> ParsedCommand<'a> {
    /// Create empty command
    pub const fn empty() -> Self {
        Self {
            command: "",
            args: Vec::new(),
            truncated: false,
        }
    }

    /// Get argument by index (0-based, command name excluded)
    pub fn arg(&self, idx: usize) -> Option<&'a str> {
        self.args.get(idx).copied()
    }

    /// Token count including the command name
    pub fn argc(&self) -> usize {
        if self.command.is_empty() {
            0
        } else {
            1 + self.args.len()
        }
    }
}

/// Parse a command line into command and arguments
pub fn parse_line(line: &str) -> ParsedCommand<'_> {
    let mut parts = line.split_whitespace();

    let Some(command) = parts.next() else {
        return ParsedCommand::empty();
    };

    let mut args = Vec::new();
    let mut truncated = false;
    for arg in parts {
        if args.push(arg).is_err() {
            truncated = true;
            break;
        }
    }

    ParsedCommand {
        command,
        args,
        truncated,
    }
}
