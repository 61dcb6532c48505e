//! Command table and dispatch
//!
//! Handlers run synchronously on the console context and may block.

use core::fmt::Write;

use heapless::Vec;

use super::parser::{parse_line, ParsedCommand};
use super::ConsoleError;
use crate::config::MAX_COMMANDS;
use crate::diag_warn;

/// Command handler signature
pub type Handler<C> = fn(&mut C, &Invocation<'_, '_, C>, &mut dyn Write) -> Result<(), ConsoleError>;

/// Command descriptor
pub struct CommandEntry<C> {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: Handler<C>,
}

impl<C> Clone for CommandEntry<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CommandEntry<C> {}

/// What a handler sees of the call: its arguments and the command table
pub struct Invocation<'a, 'l, C> {
    parsed: &'a ParsedCommand<'l>,
    commands: &'a [CommandEntry<C>],
}

impl<'a, 'l, C> Invocation<'a, 'l, C> {
    /// Command name as typed
    pub fn name(&self) -> &'l str {
        self.parsed.command
    }

    /// Argument by index (0-based, command name excluded)
    pub fn arg(&self, idx: usize) -> Option<&'l str> {
        self.parsed.arg(idx)
    }

    /// All arguments after the command name
    pub fn args(&self) -> &[&'l str] {
        &self.parsed.args
    }

    /// Token count including the command name
    pub fn argc(&self) -> usize {
        self.parsed.argc()
    }

    /// Registered commands, in registration order
    pub fn commands(&self) -> &'a [CommandEntry<C>] {
        self.commands
    }
}

/// Fixed-capacity command table
pub struct Dispatcher<C, const N: usize = MAX_COMMANDS> {
    table: Vec<CommandEntry<C>, N>,
}

impl<C, const N: usize> Dispatcher<C, N> {
    /// Create empty table
    pub const fn new() -> Self {
        Self { table: Vec::new() }
    }

    /// Add one command
    pub fn register(&mut self, entry: CommandEntry<C>) -> Result<(), ConsoleError> {
        self.table.push(entry).map_err(|_| {
            diag_warn!("command table full, '{}' not registered", entry.name);
            ConsoleError::TableFull
        })
    }

    /// Add commands in order, stopping at the first that does not fit
    pub fn register_all(&mut self, entries: &[CommandEntry<C>]) -> Result<(), ConsoleError> {
        entries.iter().try_for_each(|entry| self.register(*entry))
    }

    /// Registered commands
    pub fn commands(&self) -> &[CommandEntry<C>] {
        &self.table
    }

    /// Look up a command by exact name; first match wins
    pub fn find(&self, name: &str) -> Option<&CommandEntry<C>> {
        self.table.iter().find(|c| c.name == name)
    }

    /// Command names, for listing
    pub fn command_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|c| c.name)
    }

    /// Parse and execute one line
    pub fn dispatch(&self, ctx: &mut C, line: &str, out: &mut dyn Write) -> Result<(), ConsoleError> {
        let cmd = parse_line(line);
        if cmd.truncated {
            diag_warn!("'{}': arguments past {} dropped", cmd.command, cmd.argc());
        }
        self.execute(ctx, &cmd, out)
    }

    /// Execute a parsed command
    pub fn execute(
        &self,
        ctx: &mut C,
        cmd: &ParsedCommand<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ConsoleError> {
        if cmd.command.is_empty() {
            return Ok(()); // Empty line, do nothing
        }

        let entry = self.find(cmd.command).ok_or(ConsoleError::UnknownCommand)?;

        let invocation = Invocation {
            parsed: cmd,
            commands: &self.table,
        };
        (entry.handler)(ctx, &invocation, out)
    }
}

impl<C, const N: usize> Default for Dispatcher<C, N> {
    fn default() -> Self {
        Self::new()
    }
}
