//! MOS 6502 CPU core implementation
//!
//! This module provides a reusable 6502 interpreter that can be used by any
//! system (NES, Atari 2600, Apple II, etc.) by implementing the
//! [`Memory6502`] trait. The variant modelled here is the NES flavor of the
//! chip: decimal mode exists as a status bit but never affects arithmetic.
//!
//! Dispatch is table-driven: every opcode maps to a row carrying its
//! mnemonic, addressing mode, base cycle cost and page-cross behavior.
//! The undocumented opcodes that test ROMs rely on (LAX, SAX, the
//! read-modify-write combos, the NOP variants) have rows of their own.

use thiserror::Error;

/// Memory interface trait for the 6502 CPU
///
/// Systems using the 6502 must implement this trait to provide memory
/// access. Accesses are fallible: a bus may refuse addresses it does not
/// emulate, and the CPU propagates that refusal out of [`Cpu6502::step`].
pub trait Memory6502 {
    /// Error produced by the backing bus.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a byte from memory at the given address
    fn read(&self, addr: u16) -> Result<u8, Self::Error>;

    /// Write a byte to memory at the given address
    fn write(&mut self, addr: u16, val: u8) -> Result<(), Self::Error>;
}

/// Fatal interpreter errors surfaced by [`Cpu6502::step`].
///
/// Registers, PC and the cycle counter stay consistent and inspectable at
/// the point of failure.
#[derive(Debug, Error)]
pub enum CpuError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The fetched byte has no implemented handler.
    #[error("unknown opcode {opcode:#04X} at {pc:#06X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    /// The bus refused a read or write.
    #[error(transparent)]
    Memory(#[from] E),
}

// Status register bits (NV-BDIZC).
pub const FLAG_CARRY: u8 = 0x01;
pub const FLAG_ZERO: u8 = 0x02;
pub const FLAG_INTERRUPT: u8 = 0x04;
pub const FLAG_DECIMAL: u8 = 0x08;
pub const FLAG_BREAK: u8 = 0x10;
pub const FLAG_UNUSED: u8 = 0x20;
pub const FLAG_OVERFLOW: u8 = 0x40;
pub const FLAG_NEGATIVE: u8 = 0x80;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Addressing modes of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `(d,X)`
    IndexedIndirect,
    /// `(d),Y`
    IndirectIndexed,
    /// `($nnnn)`, used by JMP only; the high pointer byte wraps within the
    /// pointer's page (hardware bug).
    Indirect,
    Relative,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }
}

/// Result of resolving an addressing mode for one instruction.
///
/// `addr` is 0 for implied/accumulator modes; `page_crossed` reports
/// whether indexing moved the effective address into a different 256-byte
/// page than its base, the condition for the one-cycle read penalty.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolution {
    pub addr: u16,
    pub page_crossed: bool,
}

/// Instruction mnemonics, documented and undocumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
    // Undocumented
    Dcp, Isb, Lax, Rla, Rra, Sax, Slo, Sre,
}

impl Mnemonic {
    #[rustfmt::skip]
    pub const fn name(self) -> &'static str {
        match self {
            Mnemonic::Adc => "ADC", Mnemonic::And => "AND", Mnemonic::Asl => "ASL",
            Mnemonic::Bcc => "BCC", Mnemonic::Bcs => "BCS", Mnemonic::Beq => "BEQ",
            Mnemonic::Bit => "BIT", Mnemonic::Bmi => "BMI", Mnemonic::Bne => "BNE",
            Mnemonic::Bpl => "BPL", Mnemonic::Brk => "BRK", Mnemonic::Bvc => "BVC",
            Mnemonic::Bvs => "BVS", Mnemonic::Clc => "CLC", Mnemonic::Cld => "CLD",
            Mnemonic::Cli => "CLI", Mnemonic::Clv => "CLV", Mnemonic::Cmp => "CMP",
            Mnemonic::Cpx => "CPX", Mnemonic::Cpy => "CPY", Mnemonic::Dec => "DEC",
            Mnemonic::Dex => "DEX", Mnemonic::Dey => "DEY", Mnemonic::Eor => "EOR",
            Mnemonic::Inc => "INC", Mnemonic::Inx => "INX", Mnemonic::Iny => "INY",
            Mnemonic::Jmp => "JMP", Mnemonic::Jsr => "JSR", Mnemonic::Lda => "LDA",
            Mnemonic::Ldx => "LDX", Mnemonic::Ldy => "LDY", Mnemonic::Lsr => "LSR",
            Mnemonic::Nop => "NOP", Mnemonic::Ora => "ORA", Mnemonic::Pha => "PHA",
            Mnemonic::Php => "PHP", Mnemonic::Pla => "PLA", Mnemonic::Plp => "PLP",
            Mnemonic::Rol => "ROL", Mnemonic::Ror => "ROR", Mnemonic::Rti => "RTI",
            Mnemonic::Rts => "RTS", Mnemonic::Sbc => "SBC", Mnemonic::Sec => "SEC",
            Mnemonic::Sed => "SED", Mnemonic::Sei => "SEI", Mnemonic::Sta => "STA",
            Mnemonic::Stx => "STX", Mnemonic::Sty => "STY", Mnemonic::Tax => "TAX",
            Mnemonic::Tay => "TAY", Mnemonic::Tsx => "TSX", Mnemonic::Txa => "TXA",
            Mnemonic::Txs => "TXS", Mnemonic::Tya => "TYA",
            Mnemonic::Dcp => "DCP", Mnemonic::Isb => "ISB", Mnemonic::Lax => "LAX",
            Mnemonic::Rla => "RLA", Mnemonic::Rra => "RRA", Mnemonic::Sax => "SAX",
            Mnemonic::Slo => "SLO", Mnemonic::Sre => "SRE",
        }
    }
}

/// One row of the dispatch table.
///
/// `cycles` is the base cost. Rows with `page_penalty` bill one extra cycle
/// when indexing crosses a page; store and read-modify-write rows instead
/// carry the worst case in `cycles` directly, which is what the hardware
/// does.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub cycles: u8,
    pub page_penalty: bool,
    pub undocumented: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Option<Opcode> {
    Some(Opcode { mnemonic, mode, cycles, page_penalty: false, undocumented: false })
}

const fn op_x(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Option<Opcode> {
    Some(Opcode { mnemonic, mode, cycles, page_penalty: true, undocumented: false })
}

const fn ill(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Option<Opcode> {
    Some(Opcode { mnemonic, mode, cycles, page_penalty: false, undocumented: true })
}

const fn ill_x(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> Option<Opcode> {
    Some(Opcode { mnemonic, mode, cycles, page_penalty: true, undocumented: true })
}

static OPCODES: [Option<Opcode>; 256] = opcode_table();

const fn opcode_table() -> [Option<Opcode>; 256] {
    use AddressingMode as Am;
    use Mnemonic as Mn;

    let mut t: [Option<Opcode>; 256] = [None; 256];

    // Loads
    t[0xA9] = op(Mn::Lda, Am::Immediate, 2);
    t[0xA5] = op(Mn::Lda, Am::ZeroPage, 3);
    t[0xB5] = op(Mn::Lda, Am::ZeroPageX, 4);
    t[0xAD] = op(Mn::Lda, Am::Absolute, 4);
    t[0xBD] = op_x(Mn::Lda, Am::AbsoluteX, 4);
    t[0xB9] = op_x(Mn::Lda, Am::AbsoluteY, 4);
    t[0xA1] = op(Mn::Lda, Am::IndexedIndirect, 6);
    t[0xB1] = op_x(Mn::Lda, Am::IndirectIndexed, 5);
    t[0xA2] = op(Mn::Ldx, Am::Immediate, 2);
    t[0xA6] = op(Mn::Ldx, Am::ZeroPage, 3);
    t[0xB6] = op(Mn::Ldx, Am::ZeroPageY, 4);
    t[0xAE] = op(Mn::Ldx, Am::Absolute, 4);
    t[0xBE] = op_x(Mn::Ldx, Am::AbsoluteY, 4);
    t[0xA0] = op(Mn::Ldy, Am::Immediate, 2);
    t[0xA4] = op(Mn::Ldy, Am::ZeroPage, 3);
    t[0xB4] = op(Mn::Ldy, Am::ZeroPageX, 4);
    t[0xAC] = op(Mn::Ldy, Am::Absolute, 4);
    t[0xBC] = op_x(Mn::Ldy, Am::AbsoluteX, 4);

    // Stores: indexed forms always pay the crossing cycle, so it is baked
    // into the base cost.
    t[0x85] = op(Mn::Sta, Am::ZeroPage, 3);
    t[0x95] = op(Mn::Sta, Am::ZeroPageX, 4);
    t[0x8D] = op(Mn::Sta, Am::Absolute, 4);
    t[0x9D] = op(Mn::Sta, Am::AbsoluteX, 5);
    t[0x99] = op(Mn::Sta, Am::AbsoluteY, 5);
    t[0x81] = op(Mn::Sta, Am::IndexedIndirect, 6);
    t[0x91] = op(Mn::Sta, Am::IndirectIndexed, 6);
    t[0x86] = op(Mn::Stx, Am::ZeroPage, 3);
    t[0x96] = op(Mn::Stx, Am::ZeroPageY, 4);
    t[0x8E] = op(Mn::Stx, Am::Absolute, 4);
    t[0x84] = op(Mn::Sty, Am::ZeroPage, 3);
    t[0x94] = op(Mn::Sty, Am::ZeroPageX, 4);
    t[0x8C] = op(Mn::Sty, Am::Absolute, 4);

    // Register transfers
    t[0xAA] = op(Mn::Tax, Am::Implied, 2);
    t[0xA8] = op(Mn::Tay, Am::Implied, 2);
    t[0x8A] = op(Mn::Txa, Am::Implied, 2);
    t[0x98] = op(Mn::Tya, Am::Implied, 2);
    t[0xBA] = op(Mn::Tsx, Am::Implied, 2);
    t[0x9A] = op(Mn::Txs, Am::Implied, 2);

    // Arithmetic
    t[0x69] = op(Mn::Adc, Am::Immediate, 2);
    t[0x65] = op(Mn::Adc, Am::ZeroPage, 3);
    t[0x75] = op(Mn::Adc, Am::ZeroPageX, 4);
    t[0x6D] = op(Mn::Adc, Am::Absolute, 4);
    t[0x7D] = op_x(Mn::Adc, Am::AbsoluteX, 4);
    t[0x79] = op_x(Mn::Adc, Am::AbsoluteY, 4);
    t[0x61] = op(Mn::Adc, Am::IndexedIndirect, 6);
    t[0x71] = op_x(Mn::Adc, Am::IndirectIndexed, 5);
    t[0xE9] = op(Mn::Sbc, Am::Immediate, 2);
    t[0xE5] = op(Mn::Sbc, Am::ZeroPage, 3);
    t[0xF5] = op(Mn::Sbc, Am::ZeroPageX, 4);
    t[0xED] = op(Mn::Sbc, Am::Absolute, 4);
    t[0xFD] = op_x(Mn::Sbc, Am::AbsoluteX, 4);
    t[0xF9] = op_x(Mn::Sbc, Am::AbsoluteY, 4);
    t[0xE1] = op(Mn::Sbc, Am::IndexedIndirect, 6);
    t[0xF1] = op_x(Mn::Sbc, Am::IndirectIndexed, 5);

    // Logical
    t[0x29] = op(Mn::And, Am::Immediate, 2);
    t[0x25] = op(Mn::And, Am::ZeroPage, 3);
    t[0x35] = op(Mn::And, Am::ZeroPageX, 4);
    t[0x2D] = op(Mn::And, Am::Absolute, 4);
    t[0x3D] = op_x(Mn::And, Am::AbsoluteX, 4);
    t[0x39] = op_x(Mn::And, Am::AbsoluteY, 4);
    t[0x21] = op(Mn::And, Am::IndexedIndirect, 6);
    t[0x31] = op_x(Mn::And, Am::IndirectIndexed, 5);
    t[0x09] = op(Mn::Ora, Am::Immediate, 2);
    t[0x05] = op(Mn::Ora, Am::ZeroPage, 3);
    t[0x15] = op(Mn::Ora, Am::ZeroPageX, 4);
    t[0x0D] = op(Mn::Ora, Am::Absolute, 4);
    t[0x1D] = op_x(Mn::Ora, Am::AbsoluteX, 4);
    t[0x19] = op_x(Mn::Ora, Am::AbsoluteY, 4);
    t[0x01] = op(Mn::Ora, Am::IndexedIndirect, 6);
    t[0x11] = op_x(Mn::Ora, Am::IndirectIndexed, 5);
    t[0x49] = op(Mn::Eor, Am::Immediate, 2);
    t[0x45] = op(Mn::Eor, Am::ZeroPage, 3);
    t[0x55] = op(Mn::Eor, Am::ZeroPageX, 4);
    t[0x4D] = op(Mn::Eor, Am::Absolute, 4);
    t[0x5D] = op_x(Mn::Eor, Am::AbsoluteX, 4);
    t[0x59] = op_x(Mn::Eor, Am::AbsoluteY, 4);
    t[0x41] = op(Mn::Eor, Am::IndexedIndirect, 6);
    t[0x51] = op_x(Mn::Eor, Am::IndirectIndexed, 5);
    t[0x24] = op(Mn::Bit, Am::ZeroPage, 3);
    t[0x2C] = op(Mn::Bit, Am::Absolute, 4);

    // Shifts and rotates
    t[0x0A] = op(Mn::Asl, Am::Accumulator, 2);
    t[0x06] = op(Mn::Asl, Am::ZeroPage, 5);
    t[0x16] = op(Mn::Asl, Am::ZeroPageX, 6);
    t[0x0E] = op(Mn::Asl, Am::Absolute, 6);
    t[0x1E] = op(Mn::Asl, Am::AbsoluteX, 7);
    t[0x4A] = op(Mn::Lsr, Am::Accumulator, 2);
    t[0x46] = op(Mn::Lsr, Am::ZeroPage, 5);
    t[0x56] = op(Mn::Lsr, Am::ZeroPageX, 6);
    t[0x4E] = op(Mn::Lsr, Am::Absolute, 6);
    t[0x5E] = op(Mn::Lsr, Am::AbsoluteX, 7);
    t[0x2A] = op(Mn::Rol, Am::Accumulator, 2);
    t[0x26] = op(Mn::Rol, Am::ZeroPage, 5);
    t[0x36] = op(Mn::Rol, Am::ZeroPageX, 6);
    t[0x2E] = op(Mn::Rol, Am::Absolute, 6);
    t[0x3E] = op(Mn::Rol, Am::AbsoluteX, 7);
    t[0x6A] = op(Mn::Ror, Am::Accumulator, 2);
    t[0x66] = op(Mn::Ror, Am::ZeroPage, 5);
    t[0x76] = op(Mn::Ror, Am::ZeroPageX, 6);
    t[0x6E] = op(Mn::Ror, Am::Absolute, 6);
    t[0x7E] = op(Mn::Ror, Am::AbsoluteX, 7);

    // Compares
    t[0xC9] = op(Mn::Cmp, Am::Immediate, 2);
    t[0xC5] = op(Mn::Cmp, Am::ZeroPage, 3);
    t[0xD5] = op(Mn::Cmp, Am::ZeroPageX, 4);
    t[0xCD] = op(Mn::Cmp, Am::Absolute, 4);
    t[0xDD] = op_x(Mn::Cmp, Am::AbsoluteX, 4);
    t[0xD9] = op_x(Mn::Cmp, Am::AbsoluteY, 4);
    t[0xC1] = op(Mn::Cmp, Am::IndexedIndirect, 6);
    t[0xD1] = op_x(Mn::Cmp, Am::IndirectIndexed, 5);
    t[0xE0] = op(Mn::Cpx, Am::Immediate, 2);
    t[0xE4] = op(Mn::Cpx, Am::ZeroPage, 3);
    t[0xEC] = op(Mn::Cpx, Am::Absolute, 4);
    t[0xC0] = op(Mn::Cpy, Am::Immediate, 2);
    t[0xC4] = op(Mn::Cpy, Am::ZeroPage, 3);
    t[0xCC] = op(Mn::Cpy, Am::Absolute, 4);

    // Increments and decrements
    t[0xE6] = op(Mn::Inc, Am::ZeroPage, 5);
    t[0xF6] = op(Mn::Inc, Am::ZeroPageX, 6);
    t[0xEE] = op(Mn::Inc, Am::Absolute, 6);
    t[0xFE] = op(Mn::Inc, Am::AbsoluteX, 7);
    t[0xC6] = op(Mn::Dec, Am::ZeroPage, 5);
    t[0xD6] = op(Mn::Dec, Am::ZeroPageX, 6);
    t[0xCE] = op(Mn::Dec, Am::Absolute, 6);
    t[0xDE] = op(Mn::Dec, Am::AbsoluteX, 7);
    t[0xE8] = op(Mn::Inx, Am::Implied, 2);
    t[0xC8] = op(Mn::Iny, Am::Implied, 2);
    t[0xCA] = op(Mn::Dex, Am::Implied, 2);
    t[0x88] = op(Mn::Dey, Am::Implied, 2);

    // Branches (base 2; taken/page penalties applied by the handler)
    t[0x90] = op(Mn::Bcc, Am::Relative, 2);
    t[0xB0] = op(Mn::Bcs, Am::Relative, 2);
    t[0xF0] = op(Mn::Beq, Am::Relative, 2);
    t[0xD0] = op(Mn::Bne, Am::Relative, 2);
    t[0x10] = op(Mn::Bpl, Am::Relative, 2);
    t[0x30] = op(Mn::Bmi, Am::Relative, 2);
    t[0x50] = op(Mn::Bvc, Am::Relative, 2);
    t[0x70] = op(Mn::Bvs, Am::Relative, 2);

    // Jumps and subroutines
    t[0x4C] = op(Mn::Jmp, Am::Absolute, 3);
    t[0x6C] = op(Mn::Jmp, Am::Indirect, 5);
    t[0x20] = op(Mn::Jsr, Am::Absolute, 6);
    t[0x60] = op(Mn::Rts, Am::Implied, 6);
    t[0x40] = op(Mn::Rti, Am::Implied, 6);
    t[0x00] = op(Mn::Brk, Am::Implied, 7);

    // Stack
    t[0x48] = op(Mn::Pha, Am::Implied, 3);
    t[0x08] = op(Mn::Php, Am::Implied, 3);
    t[0x68] = op(Mn::Pla, Am::Implied, 4);
    t[0x28] = op(Mn::Plp, Am::Implied, 4);

    // Flag operations
    t[0x18] = op(Mn::Clc, Am::Implied, 2);
    t[0x38] = op(Mn::Sec, Am::Implied, 2);
    t[0x58] = op(Mn::Cli, Am::Implied, 2);
    t[0x78] = op(Mn::Sei, Am::Implied, 2);
    t[0xB8] = op(Mn::Clv, Am::Implied, 2);
    t[0xD8] = op(Mn::Cld, Am::Implied, 2);
    t[0xF8] = op(Mn::Sed, Am::Implied, 2);

    // NOP, documented and otherwise
    t[0xEA] = op(Mn::Nop, Am::Implied, 2);
    t[0x1A] = ill(Mn::Nop, Am::Implied, 2);
    t[0x3A] = ill(Mn::Nop, Am::Implied, 2);
    t[0x5A] = ill(Mn::Nop, Am::Implied, 2);
    t[0x7A] = ill(Mn::Nop, Am::Implied, 2);
    t[0xDA] = ill(Mn::Nop, Am::Implied, 2);
    t[0xFA] = ill(Mn::Nop, Am::Implied, 2);
    t[0x80] = ill(Mn::Nop, Am::Immediate, 2);
    t[0x82] = ill(Mn::Nop, Am::Immediate, 2);
    t[0x89] = ill(Mn::Nop, Am::Immediate, 2);
    t[0xC2] = ill(Mn::Nop, Am::Immediate, 2);
    t[0xE2] = ill(Mn::Nop, Am::Immediate, 2);
    t[0x04] = ill(Mn::Nop, Am::ZeroPage, 3);
    t[0x44] = ill(Mn::Nop, Am::ZeroPage, 3);
    t[0x64] = ill(Mn::Nop, Am::ZeroPage, 3);
    t[0x14] = ill(Mn::Nop, Am::ZeroPageX, 4);
    t[0x34] = ill(Mn::Nop, Am::ZeroPageX, 4);
    t[0x54] = ill(Mn::Nop, Am::ZeroPageX, 4);
    t[0x74] = ill(Mn::Nop, Am::ZeroPageX, 4);
    t[0xD4] = ill(Mn::Nop, Am::ZeroPageX, 4);
    t[0xF4] = ill(Mn::Nop, Am::ZeroPageX, 4);
    t[0x0C] = ill(Mn::Nop, Am::Absolute, 4);
    t[0x1C] = ill_x(Mn::Nop, Am::AbsoluteX, 4);
    t[0x3C] = ill_x(Mn::Nop, Am::AbsoluteX, 4);
    t[0x5C] = ill_x(Mn::Nop, Am::AbsoluteX, 4);
    t[0x7C] = ill_x(Mn::Nop, Am::AbsoluteX, 4);
    t[0xDC] = ill_x(Mn::Nop, Am::AbsoluteX, 4);
    t[0xFC] = ill_x(Mn::Nop, Am::AbsoluteX, 4);

    // Undocumented loads/stores
    t[0xA7] = ill(Mn::Lax, Am::ZeroPage, 3);
    t[0xB7] = ill(Mn::Lax, Am::ZeroPageY, 4);
    t[0xAF] = ill(Mn::Lax, Am::Absolute, 4);
    t[0xBF] = ill_x(Mn::Lax, Am::AbsoluteY, 4);
    t[0xA3] = ill(Mn::Lax, Am::IndexedIndirect, 6);
    t[0xB3] = ill_x(Mn::Lax, Am::IndirectIndexed, 5);
    t[0x87] = ill(Mn::Sax, Am::ZeroPage, 3);
    t[0x97] = ill(Mn::Sax, Am::ZeroPageY, 4);
    t[0x8F] = ill(Mn::Sax, Am::Absolute, 4);
    t[0x83] = ill(Mn::Sax, Am::IndexedIndirect, 6);
    t[0xEB] = ill(Mn::Sbc, Am::Immediate, 2);

    // Undocumented read-modify-write combos. Like the documented RMW rows
    // these never take a conditional penalty; the indexed forms carry it.
    t[0xC7] = ill(Mn::Dcp, Am::ZeroPage, 5);
    t[0xD7] = ill(Mn::Dcp, Am::ZeroPageX, 6);
    t[0xCF] = ill(Mn::Dcp, Am::Absolute, 6);
    t[0xDF] = ill(Mn::Dcp, Am::AbsoluteX, 7);
    t[0xDB] = ill(Mn::Dcp, Am::AbsoluteY, 7);
    t[0xC3] = ill(Mn::Dcp, Am::IndexedIndirect, 8);
    t[0xD3] = ill(Mn::Dcp, Am::IndirectIndexed, 8);
    t[0xE7] = ill(Mn::Isb, Am::ZeroPage, 5);
    t[0xF7] = ill(Mn::Isb, Am::ZeroPageX, 6);
    t[0xEF] = ill(Mn::Isb, Am::Absolute, 6);
    t[0xFF] = ill(Mn::Isb, Am::AbsoluteX, 7);
    t[0xFB] = ill(Mn::Isb, Am::AbsoluteY, 7);
    t[0xE3] = ill(Mn::Isb, Am::IndexedIndirect, 8);
    t[0xF3] = ill(Mn::Isb, Am::IndirectIndexed, 8);
    t[0x07] = ill(Mn::Slo, Am::ZeroPage, 5);
    t[0x17] = ill(Mn::Slo, Am::ZeroPageX, 6);
    t[0x0F] = ill(Mn::Slo, Am::Absolute, 6);
    t[0x1F] = ill(Mn::Slo, Am::AbsoluteX, 7);
    t[0x1B] = ill(Mn::Slo, Am::AbsoluteY, 7);
    t[0x03] = ill(Mn::Slo, Am::IndexedIndirect, 8);
    t[0x13] = ill(Mn::Slo, Am::IndirectIndexed, 8);
    t[0x27] = ill(Mn::Rla, Am::ZeroPage, 5);
    t[0x37] = ill(Mn::Rla, Am::ZeroPageX, 6);
    t[0x2F] = ill(Mn::Rla, Am::Absolute, 6);
    t[0x3F] = ill(Mn::Rla, Am::AbsoluteX, 7);
    t[0x3B] = ill(Mn::Rla, Am::AbsoluteY, 7);
    t[0x23] = ill(Mn::Rla, Am::IndexedIndirect, 8);
    t[0x33] = ill(Mn::Rla, Am::IndirectIndexed, 8);
    t[0x47] = ill(Mn::Sre, Am::ZeroPage, 5);
    t[0x57] = ill(Mn::Sre, Am::ZeroPageX, 6);
    t[0x4F] = ill(Mn::Sre, Am::Absolute, 6);
    t[0x5F] = ill(Mn::Sre, Am::AbsoluteX, 7);
    t[0x5B] = ill(Mn::Sre, Am::AbsoluteY, 7);
    t[0x43] = ill(Mn::Sre, Am::IndexedIndirect, 8);
    t[0x53] = ill(Mn::Sre, Am::IndirectIndexed, 8);
    t[0x67] = ill(Mn::Rra, Am::ZeroPage, 5);
    t[0x77] = ill(Mn::Rra, Am::ZeroPageX, 6);
    t[0x6F] = ill(Mn::Rra, Am::Absolute, 6);
    t[0x7F] = ill(Mn::Rra, Am::AbsoluteX, 7);
    t[0x7B] = ill(Mn::Rra, Am::AbsoluteY, 7);
    t[0x63] = ill(Mn::Rra, Am::IndexedIndirect, 8);
    t[0x73] = ill(Mn::Rra, Am::IndirectIndexed, 8);

    t
}

/// Look up the dispatch row for an opcode byte, if one exists.
pub fn opcode_info(op: u8) -> Option<Opcode> {
    OPCODES[op as usize]
}

#[inline]
fn page(addr: u16) -> u16 {
    addr & 0xFF00
}

/// MOS 6502 CPU state and execution engine
///
/// This is a generic, reusable 6502 CPU implementation that works with any
/// system through the [`Memory6502`] trait.
#[derive(Debug)]
pub struct Cpu6502<M: Memory6502> {
    /// Accumulator register
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (points to 0x0100 + sp)
    pub sp: u8,
    /// Status register (NV-BDIZC)
    pub status: u8,
    /// Program counter
    pub pc: u16,
    /// Total cycles executed
    pub cycles: u64,
    /// Memory interface
    pub memory: M,
    /// NMI in progress flag
    in_nmi: bool,
}

impl<M: Memory6502> Cpu6502<M> {
    /// Create a new 6502 CPU with the given memory interface.
    ///
    /// Power-on state: PC at $0000, SP at $FD, status $24 (interrupt
    /// disable plus the always-on bit 5).
    pub fn new(memory: M) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            status: FLAG_INTERRUPT | FLAG_UNUSED,
            pc: 0x0000,
            cycles: 0,
            memory,
            in_nmi: false,
        }
    }

    /// Reset the CPU to initial state (preserves memory)
    pub fn reset(&mut self) -> Result<(), M::Error> {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = FLAG_INTERRUPT | FLAG_UNUSED;
        self.cycles = 0;
        self.in_nmi = false;

        // On real hardware, RESET loads the vector at $FFFC-$FFFD.
        self.pc = self.read_u16(RESET_VECTOR)?;
        Ok(())
    }

    /// Check if currently executing an NMI handler
    pub fn is_in_nmi(&self) -> bool {
        self.in_nmi
    }

    /// Read a byte from memory
    #[inline]
    fn read(&self, addr: u16) -> Result<u8, M::Error> {
        self.memory.read(addr)
    }

    /// Write a byte to memory
    #[inline]
    fn write(&mut self, addr: u16, val: u8) -> Result<(), M::Error> {
        self.memory.write(addr, val)
    }

    /// Little-endian 16-bit read: low byte at `addr`, high at `addr + 1`.
    fn read_u16(&self, addr: u16) -> Result<u16, M::Error> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    /// 16-bit read through a zero-page pointer; the pointer wraps within
    /// the zero page, so a $FF pointer takes its high byte from $00.
    fn read_u16_zero_page(&self, zp: u8) -> Result<u16, M::Error> {
        let lo = self.read(zp as u16)? as u16;
        let hi = self.read(zp.wrapping_add(1) as u16)? as u16;
        Ok((hi << 8) | lo)
    }

    /// 16-bit pointer read for JMP (indirect) with the 6502 page-wrapping
    /// bug: a pointer at $xxFF fetches its high byte from $xx00.
    fn read_u16_page_wrapped(&self, addr: u16) -> Result<u16, M::Error> {
        let lo = self.read(addr)? as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read(hi_addr)? as u16;
        Ok((hi << 8) | lo)
    }

    #[inline]
    fn fetch_u8(&mut self) -> Result<u8, M::Error> {
        let v = self.read(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(v)
    }

    #[inline]
    fn fetch_u16(&mut self) -> Result<u16, M::Error> {
        let lo = self.fetch_u8()? as u16;
        let hi = self.fetch_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    #[inline]
    fn push_u8(&mut self, v: u8) -> Result<(), M::Error> {
        let addr = 0x0100u16.wrapping_add(self.sp as u16);
        self.write(addr, v)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    #[inline]
    fn pop_u8(&mut self) -> Result<u8, M::Error> {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100u16.wrapping_add(self.sp as u16);
        self.read(addr)
    }

    /// Push high byte first, then low, so a later pop (low then high)
    /// restores the word.
    #[inline]
    fn push_u16(&mut self, v: u16) -> Result<(), M::Error> {
        self.push_u8((v >> 8) as u8)?;
        self.push_u8((v & 0xFF) as u8)
    }

    #[inline]
    fn pop_u16(&mut self) -> Result<u16, M::Error> {
        let lo = self.pop_u8()? as u16;
        let hi = self.pop_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    /// Trigger a Non-Maskable Interrupt (NMI)
    pub fn trigger_nmi(&mut self) -> Result<(), M::Error> {
        // Avoid nested NMIs in this simplified model.
        if self.in_nmi {
            return Ok(());
        }
        self.in_nmi = true;
        self.push_u16(self.pc)?;
        self.push_u8((self.status & !FLAG_BREAK) | FLAG_UNUSED)?;
        self.status |= FLAG_INTERRUPT;
        self.pc = self.read_u16(NMI_VECTOR)?;
        self.cycles = self.cycles.wrapping_add(7);
        Ok(())
    }

    /// Trigger a maskable IRQ (interrupt request)
    pub fn trigger_irq(&mut self) -> Result<(), M::Error> {
        // Respect the I flag: if set, ignore maskable IRQs.
        if self.status & FLAG_INTERRUPT != 0 {
            return Ok(());
        }
        self.push_u16(self.pc)?;
        self.push_u8((self.status & !FLAG_BREAK) | FLAG_UNUSED)?;
        self.status |= FLAG_INTERRUPT;
        self.pc = self.read_u16(IRQ_VECTOR)?;
        self.cycles = self.cycles.wrapping_add(7);
        Ok(())
    }

    #[inline]
    fn flag(&self, mask: u8) -> bool {
        self.status & mask != 0
    }

    #[inline]
    fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    fn set_zero_and_negative(&mut self, v: u8) {
        self.set_flag(FLAG_ZERO, v == 0);
        self.set_flag(FLAG_NEGATIVE, v & 0x80 != 0);
    }

    /// Resolve an addressing mode: consume operand bytes, compute the
    /// effective address and note whether indexing crossed a page.
    fn resolve(&mut self, mode: AddressingMode) -> Result<AddressResolution, M::Error> {
        use AddressingMode::*;

        let flat = |addr: u16| AddressResolution { addr, page_crossed: false };

        let res = match mode {
            Implied | Accumulator => flat(0),
            Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                flat(addr)
            }
            ZeroPage => flat(self.fetch_u8()? as u16),
            ZeroPageX => flat(self.fetch_u8()?.wrapping_add(self.x) as u16),
            ZeroPageY => flat(self.fetch_u8()?.wrapping_add(self.y) as u16),
            Absolute => flat(self.fetch_u16()?),
            AbsoluteX => {
                let base = self.fetch_u16()?;
                let addr = base.wrapping_add(self.x as u16);
                AddressResolution { addr, page_crossed: page(base) != page(addr) }
            }
            AbsoluteY => {
                let base = self.fetch_u16()?;
                let addr = base.wrapping_add(self.y as u16);
                AddressResolution { addr, page_crossed: page(base) != page(addr) }
            }
            IndexedIndirect => {
                let zp = self.fetch_u8()?.wrapping_add(self.x);
                flat(self.read_u16_zero_page(zp)?)
            }
            IndirectIndexed => {
                let zp = self.fetch_u8()?;
                let base = self.read_u16_zero_page(zp)?;
                let addr = base.wrapping_add(self.y as u16);
                AddressResolution { addr, page_crossed: page(base) != page(addr) }
            }
            Indirect => {
                let ptr = self.fetch_u16()?;
                flat(self.read_u16_page_wrapped(ptr)?)
            }
            Relative => {
                let offset = self.fetch_u8()? as i8;
                let base = self.pc;
                let addr = base.wrapping_add(offset as u16);
                AddressResolution { addr, page_crossed: page(base) != page(addr) }
            }
        };
        Ok(res)
    }

    /// Operand read for instructions that work on either the accumulator
    /// or a memory byte (shifts and rotates).
    #[inline]
    fn read_operand(&self, mode: AddressingMode, addr: u16) -> Result<u8, M::Error> {
        if mode == AddressingMode::Accumulator {
            Ok(self.a)
        } else {
            self.read(addr)
        }
    }

    #[inline]
    fn write_operand(&mut self, mode: AddressingMode, addr: u16, v: u8) -> Result<(), M::Error> {
        if mode == AddressingMode::Accumulator {
            self.a = v;
            Ok(())
        } else {
            self.write(addr, v)
        }
    }

    /// A = A + M + C with carry/overflow/zero/negative updates. SBC is ADC
    /// of the one's complement, which yields the documented borrow and
    /// overflow behavior.
    fn adc_value(&mut self, val: u8) {
        let carry_in = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + val as u16 + carry_in;
        let result = sum as u8;
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        // overflow: operands agree in sign, result does not
        self.set_flag(FLAG_OVERFLOW, (!(self.a ^ val) & (self.a ^ result)) & 0x80 != 0);
        self.a = result;
        self.set_zero_and_negative(result);
    }

    fn compare(&mut self, reg: u8, val: u8) {
        self.set_flag(FLAG_CARRY, reg >= val);
        self.set_zero_and_negative(reg.wrapping_sub(val));
    }

    /// Take a resolved branch: +1 cycle, +1 more when the target sits on a
    /// different page than the instruction's end.
    fn take_branch(&mut self, res: &AddressResolution) -> u32 {
        self.pc = res.addr;
        if res.page_crossed {
            2
        } else {
            1
        }
    }

    /// Execute one instruction and return cycles used.
    pub fn step(&mut self) -> Result<u32, CpuError<M::Error>> {
        let op_pc = self.pc;
        let op = self.fetch_u8()?;
        let entry =
            OPCODES[op as usize].ok_or(CpuError::UnknownOpcode { opcode: op, pc: op_pc })?;

        let res = self.resolve(entry.mode)?;
        let mut cycles = entry.cycles as u32;
        if entry.page_penalty && res.page_crossed {
            cycles += 1;
        }

        use Mnemonic::*;
        match entry.mnemonic {
            Lda => {
                let v = self.read(res.addr)?;
                self.a = v;
                self.set_zero_and_negative(v);
            }
            Ldx => {
                let v = self.read(res.addr)?;
                self.x = v;
                self.set_zero_and_negative(v);
            }
            Ldy => {
                let v = self.read(res.addr)?;
                self.y = v;
                self.set_zero_and_negative(v);
            }
            Sta => self.write(res.addr, self.a)?,
            Stx => self.write(res.addr, self.x)?,
            Sty => self.write(res.addr, self.y)?,
            Tax => {
                self.x = self.a;
                self.set_zero_and_negative(self.x);
            }
            Tay => {
                self.y = self.a;
                self.set_zero_and_negative(self.y);
            }
            Txa => {
                self.a = self.x;
                self.set_zero_and_negative(self.a);
            }
            Tya => {
                self.a = self.y;
                self.set_zero_and_negative(self.a);
            }
            Tsx => {
                self.x = self.sp;
                self.set_zero_and_negative(self.x);
            }
            // TXS is the one transfer that leaves the flags alone.
            Txs => self.sp = self.x,
            Adc => {
                let v = self.read(res.addr)?;
                self.adc_value(v);
            }
            Sbc => {
                let v = self.read(res.addr)?;
                self.adc_value(v ^ 0xFF);
            }
            And => {
                let v = self.read(res.addr)?;
                self.a &= v;
                self.set_zero_and_negative(self.a);
            }
            Ora => {
                let v = self.read(res.addr)?;
                self.a |= v;
                self.set_zero_and_negative(self.a);
            }
            Eor => {
                let v = self.read(res.addr)?;
                self.a ^= v;
                self.set_zero_and_negative(self.a);
            }
            Bit => {
                let v = self.read(res.addr)?;
                self.set_flag(FLAG_ZERO, self.a & v == 0);
                self.set_flag(FLAG_OVERFLOW, v & 0x40 != 0);
                self.set_flag(FLAG_NEGATIVE, v & 0x80 != 0);
            }
            Asl => {
                let v = self.read_operand(entry.mode, res.addr)?;
                let out = v << 1;
                self.set_flag(FLAG_CARRY, v & 0x80 != 0);
                self.write_operand(entry.mode, res.addr, out)?;
                self.set_zero_and_negative(out);
            }
            Lsr => {
                let v = self.read_operand(entry.mode, res.addr)?;
                let out = v >> 1;
                self.set_flag(FLAG_CARRY, v & 0x01 != 0);
                self.write_operand(entry.mode, res.addr, out)?;
                self.set_zero_and_negative(out);
            }
            Rol => {
                let v = self.read_operand(entry.mode, res.addr)?;
                let out = (v << 1) | (self.status & FLAG_CARRY);
                self.set_flag(FLAG_CARRY, v & 0x80 != 0);
                self.write_operand(entry.mode, res.addr, out)?;
                self.set_zero_and_negative(out);
            }
            Ror => {
                let v = self.read_operand(entry.mode, res.addr)?;
                let out = (v >> 1) | ((self.status & FLAG_CARRY) << 7);
                self.set_flag(FLAG_CARRY, v & 0x01 != 0);
                self.write_operand(entry.mode, res.addr, out)?;
                self.set_zero_and_negative(out);
            }
            Cmp => {
                let v = self.read(res.addr)?;
                self.compare(self.a, v);
            }
            Cpx => {
                let v = self.read(res.addr)?;
                self.compare(self.x, v);
            }
            Cpy => {
                let v = self.read(res.addr)?;
                self.compare(self.y, v);
            }
            Inc => {
                let v = self.read(res.addr)?.wrapping_add(1);
                self.write(res.addr, v)?;
                self.set_zero_and_negative(v);
            }
            Dec => {
                let v = self.read(res.addr)?.wrapping_sub(1);
                self.write(res.addr, v)?;
                self.set_zero_and_negative(v);
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zero_and_negative(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zero_and_negative(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zero_and_negative(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zero_and_negative(self.y);
            }
            Bcc => {
                if !self.flag(FLAG_CARRY) {
                    cycles += self.take_branch(&res);
                }
            }
            Bcs => {
                if self.flag(FLAG_CARRY) {
                    cycles += self.take_branch(&res);
                }
            }
            Bne => {
                if !self.flag(FLAG_ZERO) {
                    cycles += self.take_branch(&res);
                }
            }
            Beq => {
                if self.flag(FLAG_ZERO) {
                    cycles += self.take_branch(&res);
                }
            }
            Bpl => {
                if !self.flag(FLAG_NEGATIVE) {
                    cycles += self.take_branch(&res);
                }
            }
            Bmi => {
                if self.flag(FLAG_NEGATIVE) {
                    cycles += self.take_branch(&res);
                }
            }
            Bvc => {
                if !self.flag(FLAG_OVERFLOW) {
                    cycles += self.take_branch(&res);
                }
            }
            Bvs => {
                if self.flag(FLAG_OVERFLOW) {
                    cycles += self.take_branch(&res);
                }
            }
            Jmp => self.pc = res.addr,
            Jsr => {
                // Push the address of the last byte of the JSR itself.
                let ret = self.pc.wrapping_sub(1);
                self.push_u16(ret)?;
                self.pc = res.addr;
            }
            Rts => {
                let ret = self.pop_u16()?;
                self.pc = ret.wrapping_add(1);
            }
            Rti => {
                // Unlike RTS there is no +1: the pushed PC is exact.
                let s = self.pop_u8()?;
                self.status = (s | FLAG_UNUSED) & !FLAG_BREAK;
                self.pc = self.pop_u16()?;
                self.in_nmi = false;
            }
            Brk => {
                // Two-byte instruction: the byte after the opcode is padding.
                let ret = self.pc.wrapping_add(1);
                self.push_u16(ret)?;
                self.push_u8(self.status | FLAG_BREAK | FLAG_UNUSED)?;
                self.status |= FLAG_INTERRUPT;
                self.pc = self.read_u16(IRQ_VECTOR)?;
            }
            Pha => self.push_u8(self.a)?,
            Php => self.push_u8(self.status | FLAG_BREAK | FLAG_UNUSED)?,
            Pla => {
                let v = self.pop_u8()?;
                self.a = v;
                self.set_zero_and_negative(v);
            }
            Plp => {
                let s = self.pop_u8()?;
                self.status = (s | FLAG_UNUSED) & !FLAG_BREAK;
            }
            Clc => self.set_flag(FLAG_CARRY, false),
            Sec => self.set_flag(FLAG_CARRY, true),
            Cli => self.set_flag(FLAG_INTERRUPT, false),
            Sei => self.set_flag(FLAG_INTERRUPT, true),
            Clv => self.set_flag(FLAG_OVERFLOW, false),
            Cld => self.set_flag(FLAG_DECIMAL, false),
            Sed => self.set_flag(FLAG_DECIMAL, true),
            Nop => {
                // The undocumented forms perform (and discard) a real read.
                if entry.mode != AddressingMode::Implied {
                    let _ = self.read(res.addr)?;
                }
            }
            Lax => {
                let v = self.read(res.addr)?;
                self.a = v;
                self.x = v;
                self.set_zero_and_negative(v);
            }
            Sax => self.write(res.addr, self.a & self.x)?,
            Dcp => {
                let v = self.read(res.addr)?.wrapping_sub(1);
                self.write(res.addr, v)?;
                self.compare(self.a, v);
            }
            Isb => {
                let v = self.read(res.addr)?.wrapping_add(1);
                self.write(res.addr, v)?;
                self.adc_value(v ^ 0xFF);
            }
            Slo => {
                let v = self.read(res.addr)?;
                let out = v << 1;
                self.set_flag(FLAG_CARRY, v & 0x80 != 0);
                self.write(res.addr, out)?;
                self.a |= out;
                self.set_zero_and_negative(self.a);
            }
            Sre => {
                let v = self.read(res.addr)?;
                let out = v >> 1;
                self.set_flag(FLAG_CARRY, v & 0x01 != 0);
                self.write(res.addr, out)?;
                self.a ^= out;
                self.set_zero_and_negative(self.a);
            }
            Rla => {
                let v = self.read(res.addr)?;
                let out = (v << 1) | (self.status & FLAG_CARRY);
                self.set_flag(FLAG_CARRY, v & 0x80 != 0);
                self.write(res.addr, out)?;
                self.a &= out;
                self.set_zero_and_negative(self.a);
            }
            Rra => {
                let v = self.read(res.addr)?;
                let out = (v >> 1) | ((self.status & FLAG_CARRY) << 7);
                self.set_flag(FLAG_CARRY, v & 0x01 != 0);
                self.write(res.addr, out)?;
                self.adc_value(out);
            }
        }

        self.cycles = self.cycles.wrapping_add(cycles as u64);
        Ok(cycles)
    }

    /// Render the trace line for the instruction at the current PC without
    /// executing it.
    ///
    /// Fixed columns: four-hex PC, the opcode and up to two operand bytes,
    /// a `*` marker for undocumented opcodes, the disassembly, then
    /// `A: X: Y: P: SP:` and `CYC`, where CYC is the PPU dot column
    /// `(cycles * 3) mod 341` right-justified to three digits.
    pub fn trace_line(&self) -> Result<String, M::Error> {
        let pc = self.pc;
        let op = self.read(pc)?;

        let (operands, marker, disasm) = match OPCODES[op as usize] {
            None => (String::new(), ' ', "???".to_string()),
            Some(entry) => {
                let len = entry.mode.operand_len();
                let b1 = if len >= 1 { self.read(pc.wrapping_add(1))? } else { 0 };
                let b2 = if len >= 2 { self.read(pc.wrapping_add(2))? } else { 0 };
                let word = ((b2 as u16) << 8) | b1 as u16;
                let operands = match len {
                    0 => String::new(),
                    1 => format!("{:02X}", b1),
                    _ => format!("{:02X} {:02X}", b1, b2),
                };
                let marker = if entry.undocumented { '*' } else { ' ' };
                let name = entry.mnemonic.name();
                use AddressingMode::*;
                let disasm = match entry.mode {
                    Implied => name.to_string(),
                    Accumulator => format!("{} A", name),
                    Immediate => format!("{} #${:02X}", name, b1),
                    ZeroPage => format!("{} ${:02X}", name, b1),
                    ZeroPageX => format!("{} ${:02X},X", name, b1),
                    ZeroPageY => format!("{} ${:02X},Y", name, b1),
                    Absolute => format!("{} ${:04X}", name, word),
                    AbsoluteX => format!("{} ${:04X},X", name, word),
                    AbsoluteY => format!("{} ${:04X},Y", name, word),
                    IndexedIndirect => format!("{} (${:02X},X)", name, b1),
                    IndirectIndexed => format!("{} (${:02X}),Y", name, b1),
                    Indirect => format!("{} (${:04X})", name, word),
                    Relative => {
                        let target = pc.wrapping_add(2).wrapping_add(b1 as i8 as u16);
                        format!("{} ${:04X}", name, target)
                    }
                };
                (operands, marker, disasm)
            }
        };

        Ok(format!(
            "{:04X}  {:02X} {:<6}{}{:<31} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{:>3}",
            pc,
            op,
            operands,
            marker,
            disasm,
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            (self.cycles * 3) % 341,
        ))
    }
}

/// Simple array-based memory implementation for testing
#[derive(Debug)]
pub struct ArrayMemory {
    pub data: [u8; 0x10000],
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self { data: [0; 0x10000] }
    }

    /// Load a program into memory and set reset vector
    pub fn load_program(&mut self, offset: u16, data: &[u8]) {
        let off = offset as usize;
        self.data[off..off + data.len()].copy_from_slice(data);
        self.data[RESET_VECTOR as usize] = (offset & 0xFF) as u8;
        self.data[RESET_VECTOR as usize + 1] = (offset >> 8) as u8;
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory6502 for ArrayMemory {
    type Error = std::convert::Infallible;

    fn read(&self, addr: u16) -> Result<u8, Self::Error> {
        Ok(self.data[addr as usize])
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), Self::Error> {
        self.data[addr as usize] = val;
        Ok(())
    }
}
