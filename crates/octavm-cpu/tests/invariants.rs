//! Property-based tests for the invariants spec's §8 states explicitly:
//! arithmetic modulo 256 with faithful carry, `CMP`'s restriction to
//! carry/zero, and push/pop LIFO symmetry.

use octavm_cpu::{Cpu, Flags, Port, PortTable, MEMORY_SIZE};
use proptest::prelude::*;

fn cpu_with_stub_ports(ram: &mut [u8]) -> Cpu<'_, 'static> {
    let ports = PortTable::new(Port::stub(), Port::read_only(|| 0), Port::write_only(|_| {}));
    Cpu::new(ram, ports)
}

proptest! {
    /// ADD: result is always the mathematical sum modulo 256, and carry
    /// faithfully reports whether the unreduced sum overflowed a byte.
    #[test]
    fn add_result_and_carry_match_the_math(a in any::<u8>(), b in any::<u8>()) {
        let mut ram = [0u8; MEMORY_SIZE];
        let mut cpu = cpu_with_stub_ports(&mut ram);
        cpu.r[0] = a;
        cpu.r[1] = b;
        cpu.run(&[0x10, 0x00, 0x01, 0xFF]).unwrap();

        let sum = u16::from(a) + u16::from(b);
        prop_assert_eq!(cpu.r[0], (sum % 256) as u8);
        prop_assert_eq!(cpu.flags.contains(Flags::CARRY), sum >= 256);
    }

    /// MUL: same contract as ADD, over the product instead of the sum.
    #[test]
    fn mul_result_and_carry_match_the_math(a in any::<u8>(), b in any::<u8>()) {
        let mut ram = [0u8; MEMORY_SIZE];
        let mut cpu = cpu_with_stub_ports(&mut ram);
        cpu.r[0] = a;
        cpu.r[1] = b;
        cpu.run(&[0x12, 0x00, 0x01, 0xFF]).unwrap();

        let product = u16::from(a) * u16::from(b);
        prop_assert_eq!(cpu.r[0], (product % 256) as u8);
        prop_assert_eq!(cpu.flags.contains(Flags::CARRY), product >= 256);
    }

    /// CMP only ever touches carry and zero; every other `FR` bit must
    /// survive untouched regardless of operand values.
    #[test]
    fn cmp_preserves_reserved_bits_for_any_operands(
        dst in any::<u8>(),
        src in any::<u8>(),
        reserved in any::<u8>(),
    ) {
        let mut ram = [0u8; MEMORY_SIZE];
        let mut cpu = cpu_with_stub_ports(&mut ram);
        let reserved_bits = reserved & !0b0000_0011;
        cpu.flags = Flags::from_byte(reserved_bits | 0b0000_0011);
        cpu.r[0] = dst;
        cpu.r[1] = src;
        cpu.run(&[0x20, 0x00, 0x01, 0xFF]).unwrap();

        prop_assert_eq!(cpu.flags.to_byte() & !0b0000_0011, reserved_bits);
        prop_assert_eq!(cpu.flags.contains(Flags::CARRY), dst < src);
        prop_assert_eq!(cpu.flags.contains(Flags::ZERO), dst == src);
    }

    /// Any balanced sequence of pushes returns `SP` to its starting value
    /// and pops the same values back out in LIFO order.
    #[test]
    fn balanced_push_pop_is_lifo(values in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut ram = [0u8; MEMORY_SIZE];
        let mut cpu = cpu_with_stub_ports(&mut ram);
        let start_sp = cpu.sp;

        for &value in &values {
            cpu.push(value).unwrap();
        }
        for &value in values.iter().rev() {
            prop_assert_eq!(cpu.pop().unwrap(), value);
        }
        prop_assert_eq!(cpu.sp, start_sp);
    }

    /// Every RAM address a `STOR` handler actually writes is in range;
    /// addresses outside the RAM view are rejected before any write
    /// reaches the buffer (RAM stays all-zero on a rejected store).
    #[test]
    fn out_of_range_stor_never_writes(addr in any::<u8>()) {
        let mut ram = [0u8; 16];
        let mut cpu = cpu_with_stub_ports(&mut ram);
        cpu.r[0] = addr;
        cpu.r[1] = 0xAB;
        let result = cpu.run(&[0x03, 0x00, 0x01, 0xFF]);

        if (addr as usize) < 16 {
            prop_assert!(result.is_ok());
            prop_assert_eq!(ram[addr as usize], 0xAB);
        } else {
            prop_assert!(result.is_err());
            prop_assert!(ram.iter().all(|&cell| cell == 0));
        }
    }
}
