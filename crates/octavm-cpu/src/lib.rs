//! Fetch/decode/execute core for the octavm 8-bit virtual machine.
//!
//! [`Cpu`] owns the register file and drives execution; it borrows its RAM
//! and its I/O [`PortTable`] from the caller so the core stays agnostic of
//! where those live (an in-memory array in a test, a [`octavm-terminal`]
//! device in a CLI binary, or a GUI frontend's own buffers).

#![warn(missing_docs)]

mod cpu;
mod error;
mod flags;
mod ports;

pub use cpu::{Cpu, MEMORY_SIZE};
pub use error::{CpuError, Result};
pub use flags::Flags;
pub use ports::{Port, PortTable};
