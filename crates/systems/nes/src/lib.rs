//! NES system wiring for the shared 6502 core.
//!
//! [`Nes`] owns a [`Cpu6502`] driving a [`MemoryBus`], which in turn owns
//! the cartridge and its mapper. The embedding caller decides how long to
//! step; a fatal bus or decode error stops the loop with the machine state
//! left inspectable.

pub mod bus;
pub mod cartridge;
pub mod mappers;

use bus::{BusError, MemoryBus};
use cartridge::{Cartridge, CartridgeError};
use fami_core::cpu_6502::{Cpu6502, CpuError, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
use thiserror::Error;

/// Any failure the NES system can surface to an embedding caller.
#[derive(Debug, Error)]
pub enum NesError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Cpu(#[from] CpuError<BusError>),
}

/// The wired-up machine: CPU plus bus plus cartridge.
#[derive(Debug)]
pub struct Nes {
    cpu: Cpu6502<MemoryBus>,
}

impl Nes {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cpu: Cpu6502::new(MemoryBus::new(cart)),
        }
    }

    /// Parse an iNES image and wire it up.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, NesError> {
        Ok(Self::new(Cartridge::from_bytes(data)?))
    }

    /// Restore power-on register state and load the reset vector.
    pub fn reset(&mut self) -> Result<(), NesError> {
        self.cpu.reset()?;
        Ok(())
    }

    /// Execute one instruction; returns the cycles it consumed.
    pub fn step(&mut self) -> Result<u32, NesError> {
        Ok(self.cpu.step()?)
    }

    /// Trace line for the next instruction (see the core for the format).
    pub fn trace_line(&self) -> Result<String, NesError> {
        Ok(self.cpu.trace_line()?)
    }

    pub fn pc(&self) -> u16 {
        self.cpu.pc
    }

    /// Override the PC, e.g. to enter a test ROM's automation entry point.
    pub fn set_pc(&mut self, pc: u16) {
        self.cpu.pc = pc;
    }

    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    pub fn cpu(&self) -> &Cpu6502<MemoryBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu6502<MemoryBus> {
        &mut self.cpu
    }

    pub fn bus(&self) -> &MemoryBus {
        &self.cpu.memory
    }

    /// Return debug information useful for inspecting execution state.
    pub fn debug_state(&self) -> serde_json::Value {
        let bus = self.bus();
        let read_vector = |addr: u16| bus.read_word(addr).unwrap_or(0);
        serde_json::json!({
            "pc": self.cpu.pc,
            "a": self.cpu.a,
            "x": self.cpu.x,
            "y": self.cpu.y,
            "sp": self.cpu.sp,
            "p": self.cpu.status,
            "cycles": self.cpu.cycles,
            "mapper": bus.mapper().mapper_number(),
            "prg_banks": bus.cartridge().prg_rom_banks.len(),
            "vectors": {
                "nmi": read_vector(NMI_VECTOR),
                "reset": read_vector(RESET_VECTOR),
                "irq": read_vector(IRQ_VECTOR),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Mirroring, PRG_BANK_SIZE};

    /// One-bank cartridge with `program` at $C000 and the reset vector
    /// pointing there. The single bank appears in both windows.
    fn nes_with_program(program: &[u8]) -> Nes {
        let mut bank = [0u8; PRG_BANK_SIZE];
        bank[..program.len()].copy_from_slice(program);
        bank[0x3FFC] = 0x00;
        bank[0x3FFD] = 0xC0;
        let cart = Cartridge {
            prg_rom_banks: vec![bank],
            chr_rom_banks: vec![],
            prg_ram_banks: 1,
            mapper: 0,
            mirroring: Mirroring::Horizontal,
            battery_backed_ram: false,
            trainer: false,
        };
        let mut nes = Nes::new(cart);
        nes.reset().unwrap();
        nes
    }

    #[test]
    fn reset_loads_the_vector() {
        let nes = nes_with_program(&[0xEA]);
        assert_eq!(nes.pc(), 0xC000);
        assert_eq!(nes.cycles(), 0);
    }

    #[test]
    fn executes_a_program_against_ram() {
        // LDA #$42 ; STA $10 ; LDA $10
        let mut nes = nes_with_program(&[0xA9, 0x42, 0x85, 0x10, 0xA5, 0x10]);
        nes.step().unwrap();
        nes.step().unwrap();
        nes.step().unwrap();
        assert_eq!(nes.cpu().a, 0x42);
        assert_eq!(nes.bus().read_byte(0x0010).unwrap(), 0x42);
        assert_eq!(nes.cycles(), 8);
    }

    #[test]
    fn first_trace_line_matches_reference_format() {
        let mut nes = nes_with_program(&[0x4C, 0xF5, 0xC5]);
        assert_eq!(
            nes.trace_line().unwrap(),
            "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:  0"
        );
        nes.step().unwrap();
        assert_eq!(nes.pc(), 0xC5F5);
        // Second line reflects the three cycles (nine PPU dots) spent.
        assert!(nes.trace_line().unwrap().ends_with("CYC:  9"));
    }

    #[test]
    fn ppu_register_read_halts_with_bus_error() {
        // LDA $2002
        let mut nes = nes_with_program(&[0xAD, 0x02, 0x20]);
        match nes.step() {
            Err(NesError::Cpu(CpuError::Memory(BusError::UnsupportedRead(region)))) => {
                assert_eq!(region, bus::Region::Ppu);
            }
            other => panic!("expected an unsupported-read failure, got {:?}", other.err()),
        }
        // The machine state stays inspectable after the fault.
        assert_eq!(nes.cpu().sp, 0xFD);
    }

    #[test]
    fn apu_writes_are_dropped_not_fatal() {
        // STA $4015
        let mut nes = nes_with_program(&[0xA9, 0x0F, 0x8D, 0x15, 0x40]);
        nes.step().unwrap();
        nes.step().unwrap();
        assert_eq!(nes.pc(), 0xC005);
    }

    #[test]
    fn debug_state_reports_vectors() {
        let nes = nes_with_program(&[0xEA]);
        let state = nes.debug_state();
        assert_eq!(state["vectors"]["reset"], 0xC000);
        assert_eq!(state["mapper"], 0);
        assert_eq!(state["prg_banks"], 1);
    }
}
