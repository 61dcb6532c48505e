//! Main console struct integrating all components

use core::fmt::Write;

use super::{ConsoleError, Dispatcher, History, LineBuffer};
use crate::config::MAX_COMMANDS;

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Prompt printed after every submitted line
pub const PROMPT: &str = "> ";

/// Erase one echoed character
const RUBOUT: &str = "\x08 \x08";

const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;
const BS: u8 = 0x08;

/// Escape sequence state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeState {
    Normal,
    /// Got ESC
    SawEsc,
    /// Got ESC [
    SawBracket,
}

/// Console session: line editor, history and command table
///
/// One instance per console context; `C` is the context every handler
/// receives.
pub struct Console<C, const N: usize = MAX_COMMANDS> {
    line: LineBuffer,
    history: History,
    dispatcher: Dispatcher<C, N>,
    escape_state: EscapeState,
}

impl<C, const N: usize> Console<C, N> {
    /// Create console around a populated command table
    pub fn new(dispatcher: Dispatcher<C, N>) -> Self {
        Self {
            line: LineBuffer::new(),
            history: History::new(),
            dispatcher,
            escape_state: EscapeState::Normal,
        }
    }

    /// Process a single input byte
    ///
    /// Returns Some(result) if a non-empty line was dispatched, None otherwise.
    /// Errors are already reported on `out`.
    pub fn process_byte(
        &mut self,
        byte: u8,
        ctx: &mut C,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        match self.escape_state {
            EscapeState::Normal => self.process_normal(byte, ctx, out),
            EscapeState::SawEsc => {
                self.escape_state = if byte == b'[' {
                    EscapeState::SawBracket
                } else {
                    EscapeState::Normal
                };
                None
            }
            EscapeState::SawBracket => {
                self.escape_state = EscapeState::Normal;
                if byte == b'A' {
                    self.handle_up(out); // Up arrow
                }
                None
            }
        }
    }

    fn process_normal(
        &mut self,
        byte: u8,
        ctx: &mut C,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        match byte {
            // Enter
            b'\r' | b'\n' => self.submit(ctx, out),

            // Backspace
            DEL | BS => {
                if self.line.backspace() {
                    let _ = write!(out, "{}", RUBOUT);
                }
                None
            }

            // Escape
            ESC => {
                self.escape_state = EscapeState::SawEsc;
                None
            }

            // Printable character; dropped without echo once the line is full
            0x20..=0x7E => {
                if self.line.push(byte).is_ok() {
                    let _ = out.write_char(byte as char);
                }
                None
            }

            _ => None,
        }
    }

    fn submit(&mut self, ctx: &mut C, out: &mut dyn Write) -> Option<Result<(), ConsoleError>> {
        let _ = write!(out, "\r\n");
        self.history.reset_nav();

        let result = if self.line.is_empty() {
            None
        } else {
            let line = self.line.as_str();
            self.history.push(line);

            let result = self.dispatcher.dispatch(ctx, line, out);
            if let Err(e) = result {
                let _ = write!(out, "{}\r\n", e);
            }
            Some(result)
        };

        self.line.clear();
        self.print_prompt(out);
        result
    }

    fn handle_up(&mut self, out: &mut dyn Write) {
        // Clear displayed line
        let shown = self.line.len();
        let Some(prev) = self.history.get_prev() else {
            return;
        };

        for _ in 0..shown {
            let _ = write!(out, "{}", RUBOUT);
        }

        // Set and display new line
        self.line.set(prev);
        let _ = write!(out, "{}", self.line.as_str());
    }

    /// Line currently being edited
    pub fn line(&self) -> &str {
        self.line.as_str()
    }

    /// Submitted-line history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Command table
    pub fn dispatcher(&self) -> &Dispatcher<C, N> {
        &self.dispatcher
    }

    /// Current escape sequence state
    pub fn escape_state(&self) -> EscapeState {
        self.escape_state
    }

    /// Print the prompt
    pub fn print_prompt(&self, out: &mut dyn Write) {
        let _ = write!(out, "{}", PROMPT);
    }

    /// Print welcome banner
    pub fn print_banner(&self, out: &mut dyn Write) {
        let _ = write!(out, "\r\n{}\r\n", VERSION);
        let _ = write!(out, "Type 'help' for commands.\r\n");
        self.print_prompt(out);
    }
}
