//! `decode` is a left-inverse of any faithful encoder built from the same
//! opcode table (spec §8, property 6): encode a random well-formed
//! instruction stream through the shared table, then check that
//! decoding it reproduces the exact mnemonic text the encoder intended.

use octavm_decoder::decode;
use octavm_isa::{opcode_info, Operand};
use proptest::prelude::*;

/// Opcodes with an entry in the shared table, used as the universe a
/// random well-formed program is assembled from.
const KNOWN_OPCODES: &[u8] = &[
    0x00, 0x01, 0x02, 0x03, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A,
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x30, 0x31, 0x40, 0x41, 0x42, 0x43, 0x44, 0x50,
    0x51, 0xFF,
];

/// Register ids the CPU itself recognizes (decoder accepts these too).
const KNOWN_REGISTER_IDS: &[u8] = &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xFD, 0xFE, 0xFF];

fn opcode_strategy() -> impl Strategy<Value = u8> {
    prop::sample::select(KNOWN_OPCODES)
}

fn register_id_strategy() -> impl Strategy<Value = u8> {
    prop::sample::select(KNOWN_REGISTER_IDS)
}

/// Encode one random instruction (opcode + well-formed operands) and the
/// exact text `decode` should produce for it.
fn encoded_instruction() -> impl Strategy<Value = (Vec<u8>, String)> {
    opcode_strategy().prop_flat_map(|opcode| {
        let info = opcode_info(opcode).expect("opcode_strategy only yields known opcodes");
        let operand_strategies: Vec<_> = info
            .operands
            .iter()
            .map(|operand| match operand {
                Operand::Reg => register_id_strategy().boxed(),
                Operand::Imm => any::<u8>().boxed(),
            })
            .collect();

        operand_strategies.prop_map(move |operand_bytes| {
            let mut bytes = vec![opcode];
            bytes.extend_from_slice(&operand_bytes);

            let mut text = String::from(info.mnemonic);
            if !info.operands.is_empty() {
                text.push(' ');
            }
            let rendered: Vec<String> = info
                .operands
                .iter()
                .zip(operand_bytes.iter())
                .map(|(operand, &byte)| match operand {
                    Operand::Reg => octavm_isa::register_name(byte).unwrap().to_string(),
                    Operand::Imm => format!("0x{byte:02X}"),
                })
                .collect();
            text.push_str(&rendered.join(", "));

            (bytes, text)
        })
    })
}

proptest! {
    #[test]
    fn decode_reproduces_the_text_the_encoder_intended(
        instructions in prop::collection::vec(encoded_instruction(), 0..16),
    ) {
        let mut program = Vec::new();
        let mut expected_lines = Vec::new();
        for (bytes, text) in instructions {
            program.extend_from_slice(&bytes);
            expected_lines.push(text);
        }

        let listing = decode(&program).unwrap();
        prop_assert_eq!(listing, expected_lines.join("\n"));
    }
}
