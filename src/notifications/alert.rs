use std::io::{self, Write};

use thiserror::Error;

use super::Event;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("alert blocked")]
    Blocked,

    #[error("cannot play alert: {0}")]
    Io(#[from] io::Error),
}

/// Audible signal for an inbound notification. Best effort: callers log
/// failures and carry on.
pub trait Alert: Send + Sync {
    fn ring(&self, event: &Event) -> Result<(), AlertError>;
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Alert for TerminalBell {
    fn ring(&self, _: &Event) -> Result<(), AlertError> {
        let mut out = io::stdout().lock();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}
