//! CPU-visible memory bus.
//!
//! Routes reads and writes across the 2 KiB internal RAM (mirrored through
//! $1FFF), the PPU/APU/controller register ranges (sentinel traps — those
//! components live outside this core), and the cartridge address space,
//! which is delegated to the installed mapper.

use crate::cartridge::{Cartridge, PRG_RAM_BANK_SIZE};
use crate::mappers::Mapper;
use fami_core::cpu_6502::Memory6502;
use fami_core::logging::{log, LogCategory, LogLevel};
use std::fmt;
use thiserror::Error;

/// Internal RAM is 2 KiB, mirrored four times below $2000.
pub const RAM_SIZE: usize = 0x800;

/// Register spaces this core does not emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ppu,
    PpuDma,
    Apu,
    Controller,
    Expansion,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Ppu => "PPU",
            Region::PpuDma => "PPU DMA",
            Region::Apu => "APU",
            Region::Controller => "controller",
            Region::Expansion => "IO/expansion",
        };
        f.write_str(name)
    }
}

/// Bus access failures. Both are fatal to the step loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("unsupported read from {0} register space")]
    UnsupportedRead(Region),
    #[error("unhandled write of {value:#04X} to {addr:#06X}")]
    UnhandledWrite { addr: u16, value: u8 },
}

/// The bus owns RAM, PRG RAM, the cartridge and its mapper. `lower_bank`
/// and `upper_bank` are the PRG windows at $8000 and $C000; the mapper
/// initializes them and rewrites them on bank-switch writes.
#[derive(Debug)]
pub struct MemoryBus {
    ram: [u8; RAM_SIZE],
    prg_ram: Vec<u8>,
    pub lower_bank: u16,
    pub upper_bank: u16,
    cart: Cartridge,
    mapper: Mapper,
}

impl MemoryBus {
    pub fn new(cart: Cartridge) -> Self {
        let mapper = Mapper::from_cart(&cart);
        let lower_bank = mapper.initial_lower_bank(&cart);
        let upper_bank = mapper.initial_upper_bank(&cart);
        let prg_ram = vec![0; cart.prg_ram_banks as usize * PRG_RAM_BANK_SIZE];
        Self {
            ram: [0; RAM_SIZE],
            prg_ram,
            lower_bank,
            upper_bank,
            cart,
            mapper,
        }
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub(crate) fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    pub fn read_byte(&self, addr: u16) -> Result<u8, BusError> {
        match addr {
            0x0000..=0x1FFF => Ok(self.ram[addr as usize & 0x07FF]),
            0x2000..=0x3FFF => Err(BusError::UnsupportedRead(Region::Ppu)),
            0x4014 => Err(BusError::UnsupportedRead(Region::PpuDma)),
            0x4016 | 0x4017 => Err(BusError::UnsupportedRead(Region::Controller)),
            0x4000..=0x4015 => Err(BusError::UnsupportedRead(Region::Apu)),
            0x4018..=0x5FFF => Err(BusError::UnsupportedRead(Region::Expansion)),
            0x6000..=0xFFFF => Ok(self.mapper.read_byte(self, addr)),
        }
    }

    /// Little-endian 16-bit read: low byte at `addr`, high at `addr + 1`.
    pub fn read_word(&self, addr: u16) -> Result<u16, BusError> {
        let lo = self.read_byte(addr)? as u16;
        let hi = self.read_byte(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        match addr {
            0x0000..=0x1FFF => {
                self.ram[addr as usize & 0x07FF] = value;
                Ok(())
            }
            0x4000..=0x4015 => {
                // APU and IO stubs: accept and drop.
                log(LogCategory::Stubs, LogLevel::Debug, || {
                    format!("dropped write of {value:#04X} to {addr:#06X}")
                });
                Ok(())
            }
            0x8000..=0xFFFF => {
                let MemoryBus { mapper, cart, lower_bank, upper_bank, .. } = self;
                mapper.write_byte(cart, lower_bank, upper_bank, addr, value);
                Ok(())
            }
            _ => Err(BusError::UnhandledWrite { addr, value }),
        }
    }
}

impl Memory6502 for MemoryBus {
    type Error = BusError;

    fn read(&self, addr: u16) -> Result<u8, BusError> {
        self.read_byte(addr)
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), BusError> {
        self.write_byte(addr, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Mirroring, PRG_BANK_SIZE};

    fn test_bus() -> MemoryBus {
        let cart = Cartridge {
            prg_rom_banks: vec![[0x42; PRG_BANK_SIZE]],
            chr_rom_banks: vec![],
            prg_ram_banks: 1,
            mapper: 0,
            mirroring: Mirroring::Horizontal,
            battery_backed_ram: false,
            trainer: false,
        };
        MemoryBus::new(cart)
    }

    #[test]
    fn ram_is_mirrored_below_2000() {
        let mut bus = test_bus();
        bus.write_byte(0x0005, 0xAB).unwrap();
        for base in [0x0000u16, 0x0800, 0x1000, 0x1800] {
            assert_eq!(bus.read_byte(base + 5).unwrap(), 0xAB);
        }
        // Writes through a mirror land in the same cell.
        bus.write_byte(0x1805, 0xCD).unwrap();
        assert_eq!(bus.read_byte(0x0005).unwrap(), 0xCD);
    }

    #[test]
    fn read_word_is_little_endian() {
        let mut bus = test_bus();
        bus.write_byte(0x0010, 0x34).unwrap();
        bus.write_byte(0x0011, 0x12).unwrap();
        assert_eq!(bus.read_word(0x0010).unwrap(), 0x1234);
    }

    #[test]
    fn stub_regions_refuse_reads() {
        let bus = test_bus();
        assert_eq!(bus.read_byte(0x2002), Err(BusError::UnsupportedRead(Region::Ppu)));
        assert_eq!(bus.read_byte(0x3FFF), Err(BusError::UnsupportedRead(Region::Ppu)));
        assert_eq!(bus.read_byte(0x4000), Err(BusError::UnsupportedRead(Region::Apu)));
        assert_eq!(bus.read_byte(0x4015), Err(BusError::UnsupportedRead(Region::Apu)));
        assert_eq!(bus.read_byte(0x4014), Err(BusError::UnsupportedRead(Region::PpuDma)));
        assert_eq!(bus.read_byte(0x4016), Err(BusError::UnsupportedRead(Region::Controller)));
        assert_eq!(bus.read_byte(0x4017), Err(BusError::UnsupportedRead(Region::Controller)));
        assert_eq!(bus.read_byte(0x5000), Err(BusError::UnsupportedRead(Region::Expansion)));
    }

    #[test]
    fn apu_and_io_writes_are_dropped() {
        let mut bus = test_bus();
        assert!(bus.write_byte(0x4000, 0xFF).is_ok());
        assert!(bus.write_byte(0x4014, 0x02).is_ok());
        assert!(bus.write_byte(0x4015, 0x0F).is_ok());
    }

    #[test]
    fn other_writes_are_unhandled() {
        let mut bus = test_bus();
        assert_eq!(
            bus.write_byte(0x2000, 0x80),
            Err(BusError::UnhandledWrite { addr: 0x2000, value: 0x80 })
        );
        assert_eq!(
            bus.write_byte(0x4016, 0x01),
            Err(BusError::UnhandledWrite { addr: 0x4016, value: 0x01 })
        );
        assert_eq!(
            bus.write_byte(0x6000, 0x01),
            Err(BusError::UnhandledWrite { addr: 0x6000, value: 0x01 })
        );
    }

    #[test]
    fn cartridge_space_reads_go_through_the_mapper() {
        let bus = test_bus();
        assert_eq!(bus.read_byte(0x8000).unwrap(), 0x42);
        assert_eq!(bus.read_byte(0xFFFF).unwrap(), 0x42);
        // PRG RAM window reads back as zero-initialized.
        assert_eq!(bus.read_byte(0x6000).unwrap(), 0x00);
    }

    #[test]
    fn prg_writes_reach_the_mapper_and_nrom_ignores_them() {
        let mut bus = test_bus();
        assert!(bus.write_byte(0x8000, 0x01).is_ok());
        assert_eq!(bus.read_byte(0x8000).unwrap(), 0x42);
        assert_eq!((bus.lower_bank, bus.upper_bank), (0, 0));
    }
}
