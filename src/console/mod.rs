//! Serial console for diagnostics and calibration
//!
//! Polled from the main loop - no dedicated task.
//! Zero heap allocation - all static buffers.

pub mod commands;
#[allow(clippy::module_inception)]
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod line_buffer;
pub mod parser;
pub mod receiver;

pub use commands::{builtin_commands, register_builtins, Station};
pub use console::{Console, EscapeState, PROMPT, VERSION};
pub use dispatcher::{CommandEntry, Dispatcher, Handler, Invocation};
pub use error::ConsoleError;
pub use history::History;
pub use line_buffer::LineBuffer;
pub use parser::{parse_line, ParsedCommand};
pub use receiver::{RingBufferReceiver, RxRing};
