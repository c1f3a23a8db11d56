//! The CPU: fetch/decode/execute loop, registers, stack, and port dispatch.

use octavm_isa::{self, RegisterSlot};

use crate::error::{CpuError, Result};
use crate::flags::Flags;
use crate::ports::PortTable;

/// Size of the RAM array and of a loaded ROM image.
pub const MEMORY_SIZE: usize = octavm_isa::MEMORY_SIZE;

/// The octavm CPU.
///
/// Borrows its RAM and its port table from the caller for the duration of
/// [`Cpu::run`] (and, since both are ordinary borrows, for as long after
/// construction as the caller likes). Each `run` call loads a fresh
/// program into the ROM view and resets `PC` to zero; registers and RAM
/// otherwise persist across calls exactly as the caller left them.
pub struct Cpu<'ram, 'port> {
    /// General-purpose registers `R0..=R7`.
    pub r: [u8; 8],
    /// Flag register `FR`.
    pub flags: Flags,
    /// Stack pointer `SP`.
    pub sp: u8,
    /// Program counter `PC`.
    pub pc: u8,
    /// Whether the fetch/execute loop is still running.
    pub running: bool,
    ram: &'ram mut [u8],
    rom: [u8; MEMORY_SIZE],
    ports: PortTable<'port>,
}

impl<'ram, 'port> Cpu<'ram, 'port> {
    /// Bind a new CPU to externally owned RAM and a port table.
    ///
    /// Registers reset to their boot values: every general register and
    /// `FR` are zero, `SP = 0xFF`, `PC = 0x00`.
    pub fn new(ram: &'ram mut [u8], ports: PortTable<'port>) -> Self {
        Self {
            r: [0; 8],
            flags: Flags::empty(),
            sp: 0xFF,
            pc: 0x00,
            running: false,
            ram,
            rom: [octavm_isa::HALT_OPCODE; MEMORY_SIZE],
            ports,
        }
    }

    /// Load `program` into ROM and run until `HALT` or a fault.
    ///
    /// `PC` resets to `0x00` at the start of every call. The program is
    /// copied into a fixed `MEMORY_SIZE`-byte ROM view; any unused tail is
    /// padded with `HALT` (`0xFF`) so that falling off the end of a
    /// program halts rather than faults. Programs longer than
    /// `MEMORY_SIZE` are truncated to the bytes the ROM view can address
    /// — per spec, this is a platform limit, not a parse error.
    pub fn run(&mut self, program: &[u8]) -> Result<()> {
        self.rom = [octavm_isa::HALT_OPCODE; MEMORY_SIZE];
        let loaded = program.len().min(MEMORY_SIZE);
        self.rom[..loaded].copy_from_slice(&program[..loaded]);
        if program.len() > MEMORY_SIZE {
            log::warn!(
                "program is {} bytes, truncating to {MEMORY_SIZE}-byte ROM",
                program.len()
            );
        }
        log::debug!(
            "run: loaded {loaded} bytes, {} padding bytes",
            MEMORY_SIZE - loaded
        );

        self.pc = 0x00;
        self.running = true;
        while self.running {
            self.step()?;
        }
        Ok(())
    }

    /// Fetch, decode and execute exactly one instruction.
    fn step(&mut self) -> Result<()> {
        let fault_pc = self.pc;
        let opcode = self.fetch_byte();
        log::trace!("fetch 0x{opcode:02X} at PC=0x{fault_pc:02X}");

        if octavm_isa::opcode_info(opcode).is_none() {
            return Err(CpuError::UnknownOpcode {
                opcode,
                pc: fault_pc,
            });
        }

        match opcode {
            0x00 => self.op_mov(),
            0x01 => self.op_set(),
            0x02 => self.op_load(),
            0x03 => self.op_stor(),
            0x10 => self.op_add(),
            0x11 => self.op_sub(),
            0x12 => self.op_mul(),
            0x13 => self.op_div(),
            0x14 => self.op_mod(),
            0x15 => self.op_or(),
            0x16 => self.op_and(),
            0x17 => self.op_xor(),
            0x18 => self.op_not(),
            0x19 => self.op_shl(),
            0x1A => self.op_shr(),
            0x20 => self.op_cmp(),
            0x21 => self.op_branch(Flags::ZERO, true),
            0x22 => self.op_branch(Flags::ZERO, false),
            0x23 => self.op_branch(Flags::CARRY, true),
            0x24 => self.op_branch(Flags::CARRY, false),
            0x25 => self.op_jbe(),
            0x26 => self.op_ja(),
            0x30 => self.op_push(),
            0x31 => self.op_pop(),
            0x40 => self.op_jmp(),
            0x41 => self.op_jmpr(),
            0x42 => self.op_call(),
            0x43 => self.op_calr(),
            0x44 => self.op_ret(),
            0x50 => self.op_in(),
            0x51 => self.op_out(),
            octavm_isa::HALT_OPCODE => {
                self.running = false;
                Ok(())
            }
            unhandled => Err(CpuError::UnknownOpcode {
                opcode: unhandled,
                pc: fault_pc,
            }),
        }
    }

    // ========================================================================
    // Fetch helpers
    // ========================================================================

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.rom[self.pc as usize];
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// Fetch a register id byte, returning it alongside the ROM offset it
    /// was read from (for `UnknownRegister` diagnostics).
    fn fetch_register_id(&mut self) -> (u8, u8) {
        let offset = self.pc;
        let id = self.fetch_byte();
        (id, offset)
    }

    // ========================================================================
    // Register access
    // ========================================================================

    fn register_value(&self, id: u8, offset: u8) -> Result<u8> {
        log::trace!("read register 0x{id:02X}");
        match octavm_isa::register_slot(id) {
            Some(RegisterSlot::General(index)) => Ok(self.r[index]),
            Some(RegisterSlot::Flags) => Ok(self.flags.to_byte()),
            Some(RegisterSlot::StackPointer) => Ok(self.sp),
            Some(RegisterSlot::ProgramCounter) => Ok(self.pc),
            None => Err(CpuError::UnknownRegister { id, offset }),
        }
    }

    fn set_register(&mut self, id: u8, offset: u8, value: u8) -> Result<()> {
        log::trace!("write register 0x{id:02X} = 0x{value:02X}");
        match octavm_isa::register_slot(id) {
            Some(RegisterSlot::General(index)) => self.r[index] = value,
            Some(RegisterSlot::Flags) => self.flags = Flags::from_byte(value),
            Some(RegisterSlot::StackPointer) => self.sp = value,
            Some(RegisterSlot::ProgramCounter) => self.pc = value,
            None => return Err(CpuError::UnknownRegister { id, offset }),
        }
        Ok(())
    }

    // ========================================================================
    // RAM access
    // ========================================================================

    fn validate_address(&self, address: u8) -> Result<()> {
        if (address as usize) < self.ram.len() {
            Ok(())
        } else {
            Err(CpuError::MemoryOutOfRange {
                address,
                max: (self.ram.len() - 1) as u8,
            })
        }
    }

    fn read_ram(&self, address: u8) -> Result<u8> {
        self.validate_address(address)?;
        Ok(self.ram[address as usize])
    }

    fn write_ram(&mut self, address: u8, value: u8) -> Result<()> {
        self.validate_address(address)?;
        self.ram[address as usize] = value;
        Ok(())
    }

    // ========================================================================
    // Stack discipline
    // ========================================================================

    /// Push one byte onto the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::StackOverflow`] if `SP` is already `0x00`.
    pub fn push(&mut self, value: u8) -> Result<()> {
        if self.sp == 0x00 {
            return Err(CpuError::StackOverflow);
        }
        self.sp = self.sp.wrapping_sub(1);
        self.write_ram(self.sp, value)?;
        log::trace!("push 0x{value:02X}, SP=0x{:02X}", self.sp);
        Ok(())
    }

    /// Pop one byte off the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::StackUnderflow`] if `SP` is already `0xFF`.
    pub fn pop(&mut self) -> Result<u8> {
        if self.sp == 0xFF {
            return Err(CpuError::StackUnderflow);
        }
        let value = self.read_ram(self.sp)?;
        self.sp = self.sp.wrapping_add(1);
        log::trace!("pop 0x{value:02X}, SP=0x{:02X}", self.sp);
        Ok(value)
    }

    fn jump_by(&mut self, offset: u8) {
        let from = self.pc;
        self.pc = self.pc.wrapping_add(offset);
        log::debug!("jump +0x{offset:02X}: PC 0x{from:02X} -> 0x{:02X}", self.pc);
    }

    // ========================================================================
    // Instruction handlers
    // ========================================================================

    fn op_mov(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let value = self.register_value(src, src_off)?;
        self.set_register(dst, dst_off, value)
    }

    fn op_set(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let imm = self.fetch_byte();
        self.set_register(dst, dst_off, imm)
    }

    fn op_load(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let address = self.register_value(src, src_off)?;
        let value = self.read_ram(address)?;
        self.set_register(dst, dst_off, value)
    }

    fn op_stor(&mut self) -> Result<()> {
        let (dst_addr_reg, dst_off) = self.fetch_register_id();
        let (src_val_reg, src_off) = self.fetch_register_id();
        let address = self.register_value(dst_addr_reg, dst_off)?;
        let value = self.register_value(src_val_reg, src_off)?;
        self.write_ram(address, value)
    }

    fn op_add(&mut self) -> Result<()> {
        self.flags.set_flag(Flags::CARRY, false);
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = u16::from(self.register_value(src, src_off)?);
        let b = u16::from(self.register_value(dst, dst_off)?);
        let sum = a + b;
        if sum >= 256 {
            self.flags.set_flag(Flags::CARRY, true);
        }
        self.set_register(dst, dst_off, (sum % 256) as u8)
    }

    /// `SUB`'s carry path intentionally does not two's-complement-wrap:
    /// on underflow the destination becomes `256 - old_dst`, not
    /// `256 + (dst - src)`. This is the original's literal behavior and
    /// is pinned by its test suite (`R0=0x01, R1=0x02` -> `R0=0xFF`).
    fn op_sub(&mut self) -> Result<()> {
        self.flags.set_flag(Flags::CARRY, false);
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = i16::from(self.register_value(src, src_off)?);
        let b = i16::from(self.register_value(dst, dst_off)?);
        let result = b - a;
        let stored = if result < 0 {
            self.flags.set_flag(Flags::CARRY, true);
            (256 - b) as u8
        } else {
            result as u8
        };
        self.set_register(dst, dst_off, stored)
    }

    fn op_mul(&mut self) -> Result<()> {
        self.flags.set_flag(Flags::CARRY, false);
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = u16::from(self.register_value(src, src_off)?);
        let b = u16::from(self.register_value(dst, dst_off)?);
        let product = a * b;
        if product >= 256 {
            self.flags.set_flag(Flags::CARRY, true);
        }
        self.set_register(dst, dst_off, (product % 256) as u8)
    }

    fn op_div(&mut self) -> Result<()> {
        self.flags.set_flag(Flags::CARRY, false);
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = self.register_value(src, src_off)?;
        let b = self.register_value(dst, dst_off)?;
        if a == 0 {
            return Err(CpuError::DivideByZero);
        }
        self.set_register(dst, dst_off, b / a)
    }

    /// Unlike `DIV`, `MOD` does not clear carry before executing —
    /// preserved verbatim from the original, which leaves carry untouched.
    fn op_mod(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = self.register_value(src, src_off)?;
        let b = self.register_value(dst, dst_off)?;
        if a == 0 {
            return Err(CpuError::DivideByZero);
        }
        self.set_register(dst, dst_off, b % a)
    }

    fn op_or(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = self.register_value(src, src_off)?;
        let b = self.register_value(dst, dst_off)?;
        self.set_register(dst, dst_off, b | a)
    }

    fn op_and(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = self.register_value(src, src_off)?;
        let b = self.register_value(dst, dst_off)?;
        self.set_register(dst, dst_off, b & a)
    }

    fn op_xor(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let a = self.register_value(src, src_off)?;
        let b = self.register_value(dst, dst_off)?;
        self.set_register(dst, dst_off, b ^ a)
    }

    fn op_not(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let value = self.register_value(dst, dst_off)?;
        self.set_register(dst, dst_off, !value)
    }

    /// Carry is only ever *set* here, on a high pre-shift bit — never
    /// cleared when the bit is zero. Matches the original, which skips
    /// the unconditional clear that `ADD`/`SUB`/`MUL`/`CMP` all do.
    fn op_shl(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let value = self.register_value(dst, dst_off)?;
        if value & 0x80 != 0 {
            self.flags.set_flag(Flags::CARRY, true);
        }
        self.set_register(dst, dst_off, value << 1)
    }

    fn op_shr(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let value = self.register_value(dst, dst_off)?;
        self.set_register(dst, dst_off, value >> 1)
    }

    fn op_cmp(&mut self) -> Result<()> {
        self.flags.set_flag(Flags::CARRY, false);
        self.flags.set_flag(Flags::ZERO, false);
        let (dst, dst_off) = self.fetch_register_id();
        let (src, src_off) = self.fetch_register_id();
        let b = i16::from(self.register_value(dst, dst_off)?);
        let a = i16::from(self.register_value(src, src_off)?);
        if b < a {
            self.flags.set_flag(Flags::CARRY, true);
        } else if b == a {
            self.flags.set_flag(Flags::ZERO, true);
        }
        Ok(())
    }

    /// Shared handler for the four single-flag conditional jumps
    /// (`JZ`/`JNZ`/`JC`/`JNC`): jump when `flag`'s presence matches
    /// `jump_when_set`.
    fn op_branch(&mut self, flag: Flags, jump_when_set: bool) -> Result<()> {
        let offset = self.fetch_byte();
        if self.flags.contains(flag) == jump_when_set {
            self.jump_by(offset);
        }
        Ok(())
    }

    fn op_jbe(&mut self) -> Result<()> {
        let offset = self.fetch_byte();
        if self.flags.contains(Flags::CARRY) || self.flags.contains(Flags::ZERO) {
            self.jump_by(offset);
        }
        Ok(())
    }

    /// `JA` jumps when carry is set *and* zero is clear — an unusual
    /// "jump if above" (a conventional one is carry clear and zero
    /// clear). Preserved verbatim from the original.
    fn op_ja(&mut self) -> Result<()> {
        let offset = self.fetch_byte();
        if self.flags.contains(Flags::CARRY) && !self.flags.contains(Flags::ZERO) {
            self.jump_by(offset);
        }
        Ok(())
    }

    fn op_push(&mut self) -> Result<()> {
        let (src, src_off) = self.fetch_register_id();
        let value = self.register_value(src, src_off)?;
        self.push(value)
    }

    fn op_pop(&mut self) -> Result<()> {
        let (dst, dst_off) = self.fetch_register_id();
        let value = self.pop()?;
        self.set_register(dst, dst_off, value)
    }

    fn op_jmp(&mut self) -> Result<()> {
        let offset = self.fetch_byte();
        self.jump_by(offset);
        Ok(())
    }

    fn op_jmpr(&mut self) -> Result<()> {
        let (src, src_off) = self.fetch_register_id();
        self.pc = self.register_value(src, src_off)?;
        Ok(())
    }

    fn op_call(&mut self) -> Result<()> {
        let offset = self.fetch_byte();
        self.push(self.pc)?;
        self.jump_by(offset);
        Ok(())
    }

    fn op_calr(&mut self) -> Result<()> {
        let (src, src_off) = self.fetch_register_id();
        let target = self.register_value(src, src_off)?;
        self.push(self.pc)?;
        self.pc = target;
        Ok(())
    }

    fn op_ret(&mut self) -> Result<()> {
        self.pc = self.pop()?;
        Ok(())
    }

    fn op_in(&mut self) -> Result<()> {
        let port = self.fetch_byte();
        let value = self.ports.read(port)?;
        let (dst, dst_off) = self.fetch_register_id();
        self.set_register(dst, dst_off, value)
    }

    fn op_out(&mut self) -> Result<()> {
        let port = self.fetch_byte();
        let (src, src_off) = self.fetch_register_id();
        let value = self.register_value(src, src_off)?;
        self.ports.write(port, value)
    }
}
