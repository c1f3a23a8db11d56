//! Stdin/stdout-backed terminal device.
//!
//! [`Terminal`] is the CPU's default, concrete I/O backend: it builds the
//! three-port table spec's data model requires, binding data-in to one
//! blocking byte read from standard input and data-out to one byte
//! written to standard output. The CPU core never depends on this
//! concrete behavior — only on the [`octavm_cpu::PortTable`] shape — so a
//! test harness is free to build its own table instead.

#![warn(missing_docs)]

use std::io::{Read, Write};

use octavm_cpu::{Port, PortTable};

/// The default terminal device, backed by the process's stdin/stdout.
///
/// Stateless: every port it builds only ever touches the global
/// `stdin()`/`stdout()` handles, so the returned [`PortTable`] carries no
/// borrow back into `Terminal` itself and can outlive it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

impl Terminal {
    /// Create a new terminal device.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the CPU-facing port table for this terminal.
    ///
    /// Control (`0x00`) is a no-op stub, matching the reference terminal.
    /// Data-in (`0x01`) blocks on one byte from stdin; on EOF or a read
    /// error it logs a warning and yields `0x00` rather than panicking,
    /// since a port's read side cannot itself fail. Data-out (`0x02`)
    /// writes and flushes one byte to stdout, logging a warning on
    /// failure instead of propagating it, for the same reason.
    #[must_use]
    pub fn port_table(&self) -> PortTable<'static> {
        PortTable::new(Port::stub(), Self::data_in_port(), Self::data_out_port())
    }

    fn data_in_port() -> Port<'static> {
        Port::read_only(|| {
            let mut byte = [0u8; 1];
            match std::io::stdin().lock().read_exact(&mut byte) {
                Ok(()) => byte[0],
                Err(err) => {
                    log::warn!("terminal data-in read failed, returning 0x00: {err}");
                    0x00
                }
            }
        })
    }

    fn data_out_port() -> Port<'static> {
        Port::write_only(|value| {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = stdout.write_all(&[value]).and_then(|()| stdout.flush()) {
                log::warn!("terminal data-out write failed: {err}");
            }
        })
    }
}
