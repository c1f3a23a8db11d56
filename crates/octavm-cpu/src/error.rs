//! CPU error types.

/// Errors a [`crate::Cpu`] can raise while executing a program.
///
/// Every variant is fatal to the current [`crate::Cpu::run`] call — none
/// are caught and retried inside the core; a caller sees a single
/// diagnostic and whatever side effects already reached RAM or the ports
/// before the fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CpuError {
    /// An opcode byte with no entry in [`octavm_isa::opcode_info`].
    #[error("unknown opcode 0x{opcode:02X} at PC=0x{pc:02X}")]
    UnknownOpcode {
        /// The offending opcode byte.
        opcode: u8,
        /// The program counter at the start of the faulting instruction.
        pc: u8,
    },

    /// A register id byte with no entry in the CPU's id table.
    #[error("unknown register id 0x{id:02X} (fetched at ROM offset 0x{offset:02X})")]
    UnknownRegister {
        /// The offending register id byte.
        id: u8,
        /// The ROM offset the id byte was fetched from.
        offset: u8,
    },

    /// A RAM access at an address outside `0..MEMORY_SIZE`.
    #[error("address 0x{address:02X} is outside RAM (valid range 0x00-0x{max:02X})")]
    MemoryOutOfRange {
        /// The offending address.
        address: u8,
        /// The highest valid address (`MEMORY_SIZE - 1`).
        max: u8,
    },

    /// `DIV` or `MOD` with a zero divisor.
    #[error("division by zero")]
    DivideByZero,

    /// `PUSH` attempted while `SP` is already `0x00`.
    #[error("stack overflow: SP is already 0x00")]
    StackOverflow,

    /// `POP` attempted while `SP` is already `0xFF`.
    #[error("stack underflow: SP is already 0xFF")]
    StackUnderflow,

    /// `IN`/`OUT` addressed a port outside the populated table.
    #[error("unknown port 0x{port:02X}")]
    UnknownPort {
        /// The offending port address.
        port: u8,
    },

    /// `IN` hit a non-readable port, or `OUT` hit a non-writable one.
    #[error("port 0x{port:02X} does not support {direction}")]
    PortDirectionMismatch {
        /// The offending port address.
        port: u8,
        /// The unsupported direction, e.g. `"reads"` or `"writes"`.
        direction: &'static str,
    },
}

/// Result type for fallible CPU operations.
pub type Result<T> = std::result::Result<T, CpuError>;
