//! Static decoder: turns a raw octavm program image into an assembly
//! listing, instruction by instruction, using the same opcode table the
//! CPU dispatches through.
//!
//! The decoder never executes anything; it is a pure function over a byte
//! slice, with no notion of registers, RAM, or running state beyond the
//! text it renders.

#![warn(missing_docs)]

use octavm_isa::Operand;

/// Errors raised while decoding a program image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// An opcode byte with no entry in the shared opcode table.
    #[error("Couldn't decode instruction 0x{opcode:02X} at byte 0x{offset:02X}")]
    UnknownOpcode {
        /// The offending opcode byte.
        opcode: u8,
        /// The byte offset the opcode was read from.
        offset: u8,
    },

    /// A register-operand byte with no entry in the register id table.
    #[error("Couldn't decode register 0x{id:02X} at byte 0x{offset:02X}")]
    UnknownRegister {
        /// The offending register id byte.
        id: u8,
        /// The byte offset the id was read from.
        offset: u8,
    },

    /// The input ended mid-instruction, before all of an opcode's
    /// operands could be read.
    #[error("unexpected end of input decoding {mnemonic} at byte 0x{offset:02X}")]
    UnexpectedEnd {
        /// The mnemonic being decoded when input ran out.
        mnemonic: &'static str,
        /// The byte offset the opcode was read from.
        offset: u8,
    },
}

/// Decode a raw program image into a newline-separated assembly listing.
///
/// One line per instruction, no trailing newline. Register operands
/// render through the decoder's id→name table (which additionally
/// recognizes the legacy `I0 = 0x10` name the CPU itself never accepts).
/// Immediate operands render as `0x` followed by two uppercase hex
/// digits.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownOpcode`] or [`DecodeError::UnknownRegister`]
/// at the first byte that doesn't resolve, naming the offending byte and
/// its offset — matching the source decompiler's diagnostic wording.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut lines = Vec::new();
    let mut index: usize = 0;

    while index < bytes.len() {
        let opcode = bytes[index];
        let info = octavm_isa::opcode_info(opcode).ok_or(DecodeError::UnknownOpcode {
            opcode,
            offset: index as u8,
        })?;

        let mut rendered = String::from(info.mnemonic);
        if !info.is_empty() {
            rendered.push(' ');
        }

        for (operand_pos, operand) in info.operands.iter().enumerate() {
            let byte_offset = index + 1 + operand_pos;
            let byte = *bytes.get(byte_offset).ok_or(DecodeError::UnexpectedEnd {
                mnemonic: info.mnemonic,
                offset: index as u8,
            })?;

            match operand {
                Operand::Reg => {
                    let name =
                        octavm_isa::register_name_with_legacy(byte).ok_or(
                            DecodeError::UnknownRegister {
                                id: byte,
                                offset: byte_offset as u8,
                            },
                        )?;
                    rendered.push_str(name);
                }
                Operand::Imm => {
                    rendered.push_str(&format!("0x{byte:02X}"));
                }
            }

            if operand_pos + 1 < info.operands.len() {
                rendered.push_str(", ");
            }
        }

        lines.push(rendered);
        index += info.len();
    }

    Ok(lines.join("\n"))
}
