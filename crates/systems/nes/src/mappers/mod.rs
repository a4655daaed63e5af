//! NES mapper implementations
//!
//! A mapper answers cartridge-space reads with bank-relative lookups and
//! consumes bank-switch writes. The capability set is four operations:
//! the two initial bank windows, a read, and a write that may rewrite the
//! bus's bank indices. Mappers are pluggable; the core ships NROM.

mod nrom;

pub use nrom::Nrom;

use crate::bus::MemoryBus;
use crate::cartridge::Cartridge;
use fami_core::logging::{log, LogCategory, LogLevel};

/// Unified mapper enum that dispatches to specific implementations
#[derive(Debug)]
pub enum Mapper {
    Nrom(Nrom),
}

impl Mapper {
    /// Create a mapper from a cartridge's declared mapper id.
    pub fn from_cart(cart: &Cartridge) -> Self {
        match cart.mapper {
            0 => Mapper::Nrom(Nrom::new()),
            other => {
                log(LogCategory::Mapper, LogLevel::Warn, || {
                    format!("unsupported mapper {other}, falling back to NROM")
                });
                Mapper::Nrom(Nrom::new())
            }
        }
    }

    /// PRG bank initially visible in the $8000-$BFFF window.
    pub fn initial_lower_bank(&self, cart: &Cartridge) -> u16 {
        match self {
            Mapper::Nrom(m) => m.initial_lower_bank(cart),
        }
    }

    /// PRG bank initially visible in the $C000-$FFFF window.
    pub fn initial_upper_bank(&self, cart: &Cartridge) -> u16 {
        match self {
            Mapper::Nrom(m) => m.initial_upper_bank(cart),
        }
    }

    /// Read from the cartridge address space ($6000-$FFFF).
    pub fn read_byte(&self, bus: &MemoryBus, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.read_byte(bus, addr),
        }
    }

    /// Write into the cartridge address space ($8000-$FFFF). Mappers with
    /// bank-switch registers rewrite the window indices here.
    pub fn write_byte(
        &mut self,
        cart: &Cartridge,
        lower_bank: &mut u16,
        upper_bank: &mut u16,
        addr: u16,
        value: u8,
    ) {
        match self {
            Mapper::Nrom(m) => m.write_byte(cart, lower_bank, upper_bank, addr, value),
        }
    }

    /// Get mapper number
    pub fn mapper_number(&self) -> u8 {
        match self {
            Mapper::Nrom(_) => 0,
        }
    }
}
