//! NROM (mapper 0) - basic mapper with no banking.
//!
//! The lower window at $8000-$BFFF shows the first PRG bank and the upper
//! window at $C000-$FFFF shows the last; on a one-bank cartridge both
//! windows show bank 0 (NROM-128 mirroring). $6000-$7FFF answers from
//! PRG RAM. There are no registers, so writes are ignored.

use crate::bus::MemoryBus;
use crate::cartridge::Cartridge;
use fami_core::logging::{log, LogCategory, LogLevel};

#[derive(Debug, Default)]
pub struct Nrom;

impl Nrom {
    pub fn new() -> Self {
        Nrom
    }

    pub fn initial_lower_bank(&self, _cart: &Cartridge) -> u16 {
        0
    }

    pub fn initial_upper_bank(&self, cart: &Cartridge) -> u16 {
        (cart.prg_rom_banks.len() as u16).saturating_sub(1)
    }

    pub fn read_byte(&self, bus: &MemoryBus, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                let ram = bus.prg_ram();
                if ram.is_empty() {
                    0
                } else {
                    ram[(addr as usize - 0x6000) % ram.len()]
                }
            }
            0x8000..=0xBFFF => {
                let bank = &bus.cartridge().prg_rom_banks[bus.lower_bank as usize];
                bank[addr as usize - 0x8000]
            }
            // Only $6000-$FFFF is delegated to mappers, so everything else
            // is the upper window.
            _ => {
                let bank = &bus.cartridge().prg_rom_banks[bus.upper_bank as usize];
                bank[addr as usize - 0xC000]
            }
        }
    }

    pub fn write_byte(
        &mut self,
        _cart: &Cartridge,
        _lower_bank: &mut u16,
        _upper_bank: &mut u16,
        addr: u16,
        value: u8,
    ) {
        // No bank-switch registers on NROM.
        log(LogCategory::Mapper, LogLevel::Debug, || {
            format!("NROM ignoring write of {value:#04X} to {addr:#06X}")
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Mirroring, PRG_BANK_SIZE};

    fn cart_with_banks(banks: Vec<[u8; PRG_BANK_SIZE]>) -> Cartridge {
        Cartridge {
            prg_rom_banks: banks,
            chr_rom_banks: vec![],
            prg_ram_banks: 1,
            mapper: 0,
            mirroring: Mirroring::Horizontal,
            battery_backed_ram: false,
            trainer: false,
        }
    }

    #[test]
    fn one_bank_cartridge_mirrors_both_windows() {
        let cart = cart_with_banks(vec![[0x42; PRG_BANK_SIZE]]);
        let nrom = Nrom::new();
        assert_eq!(nrom.initial_lower_bank(&cart), 0);
        assert_eq!(nrom.initial_upper_bank(&cart), 0);

        let bus = MemoryBus::new(cart);
        assert_eq!(bus.read_byte(0x8000).unwrap(), 0x42);
        assert_eq!(bus.read_byte(0xC000).unwrap(), 0x42);
    }

    #[test]
    fn two_bank_cartridge_splits_the_windows() {
        let mut first = [0u8; PRG_BANK_SIZE];
        let mut last = [0u8; PRG_BANK_SIZE];
        first[0] = 0x11;
        first[PRG_BANK_SIZE - 1] = 0x12;
        last[0] = 0x22;
        last[PRG_BANK_SIZE - 1] = 0x23;

        let cart = cart_with_banks(vec![first, last]);
        let nrom = Nrom::new();
        assert_eq!(nrom.initial_lower_bank(&cart), 0);
        assert_eq!(nrom.initial_upper_bank(&cart), 1);

        let bus = MemoryBus::new(cart);
        assert_eq!(bus.read_byte(0x8000).unwrap(), 0x11);
        assert_eq!(bus.read_byte(0xBFFF).unwrap(), 0x12);
        assert_eq!(bus.read_byte(0xC000).unwrap(), 0x22);
        assert_eq!(bus.read_byte(0xFFFF).unwrap(), 0x23);
    }

    #[test]
    fn many_bank_cartridge_maps_first_and_last() {
        let mut banks = vec![[0u8; PRG_BANK_SIZE]; 4];
        banks[0][0] = 0xA0;
        banks[3][0] = 0xA3;
        let cart = cart_with_banks(banks);
        let nrom = Nrom::new();
        assert_eq!(nrom.initial_upper_bank(&cart), 3);

        let bus = MemoryBus::new(cart);
        assert_eq!(bus.read_byte(0x8000).unwrap(), 0xA0);
        assert_eq!(bus.read_byte(0xC000).unwrap(), 0xA3);
    }

    #[test]
    fn writes_do_not_switch_banks() {
        let cart = cart_with_banks(vec![[0x42; PRG_BANK_SIZE], [0x43; PRG_BANK_SIZE]]);
        let mut bus = MemoryBus::new(cart);
        bus.write_byte(0x8000, 0x01).unwrap();
        bus.write_byte(0xFFFF, 0xFF).unwrap();
        assert_eq!((bus.lower_bank, bus.upper_bank), (0, 1));
        assert_eq!(bus.read_byte(0x8000).unwrap(), 0x42);
        assert_eq!(bus.read_byte(0xC000).unwrap(), 0x43);
    }
}
