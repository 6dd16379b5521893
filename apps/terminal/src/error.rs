//! Terminal error type.

use regi_register::RegisterError;
use thiserror::Error;

pub type TerminalResult<T> = Result<T, TerminalError>;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error("Unknown command: {0} (type `help`)")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    MissingArgument(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
