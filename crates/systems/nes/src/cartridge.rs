//! iNES cartridge model, parser and serializer.

use fami_core::logging::{log, LogCategory, LogLevel};
use thiserror::Error;

/// PRG-ROM banks are 16 KiB.
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR-ROM banks are 8 KiB.
pub const CHR_BANK_SIZE: usize = 8 * 1024;
/// PRG-RAM banks are 8 KiB.
pub const PRG_RAM_BANK_SIZE: usize = 8 * 1024;

const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A]; // "NES\x1A"
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;

/// Nametable mirroring declared by the cartridge (consumed by the PPU,
/// which is outside this core; carried here because the header declares it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Cartridge parsing failures. Both are recoverable at the embedding layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("invalid iNES header: {0}")]
    InvalidHeader(&'static str),
    #[error("invalid iNES payload: {0}")]
    InvalidPayload(&'static str),
}

/// An iNES cartridge image, split into its fixed-size banks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    pub prg_rom_banks: Vec<[u8; PRG_BANK_SIZE]>,
    pub chr_rom_banks: Vec<[u8; CHR_BANK_SIZE]>,
    /// Always at least one: a header declaring zero means one bank.
    pub prg_ram_banks: u8,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub battery_backed_ram: bool,
    pub trainer: bool,
}

impl Cartridge {
    /// Parse an iNES image from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::InvalidHeader("shorter than 16 bytes"));
        }
        let header = &data[0..HEADER_LEN];

        if header[0..4] != MAGIC {
            return Err(CartridgeError::InvalidHeader("missing NES magic"));
        }

        let prg_count = header[4] as usize;
        let chr_count = header[5] as usize;
        if prg_count == 0 {
            return Err(CartridgeError::InvalidHeader("zero PRG-ROM banks"));
        }

        let mapper = (header[6] >> 4) | (header[7] & 0xF0);
        let four_screen = header[6] & 0x08 != 0;
        let trainer = header[6] & 0x04 != 0;
        let battery_backed_ram = header[6] & 0x02 != 0;
        let vertical = header[6] & 0x01 != 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if vertical {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // Zero declared PRG-RAM banks means one bank.
        let prg_ram_banks = if header[8] == 0 { 1 } else { header[8] };

        let mut offset = HEADER_LEN;
        if trainer {
            if data.len() < offset + TRAINER_LEN {
                return Err(CartridgeError::InvalidPayload("truncated trainer"));
            }
            offset += TRAINER_LEN;
        }

        let mut prg_rom_banks = Vec::with_capacity(prg_count);
        for _ in 0..prg_count {
            if data.len() < offset + PRG_BANK_SIZE {
                return Err(CartridgeError::InvalidPayload("truncated PRG-ROM"));
            }
            let mut bank = [0u8; PRG_BANK_SIZE];
            bank.copy_from_slice(&data[offset..offset + PRG_BANK_SIZE]);
            prg_rom_banks.push(bank);
            offset += PRG_BANK_SIZE;
        }

        let mut chr_rom_banks = Vec::with_capacity(chr_count);
        for _ in 0..chr_count {
            if data.len() < offset + CHR_BANK_SIZE {
                return Err(CartridgeError::InvalidPayload("truncated CHR-ROM"));
            }
            let mut bank = [0u8; CHR_BANK_SIZE];
            bank.copy_from_slice(&data[offset..offset + CHR_BANK_SIZE]);
            chr_rom_banks.push(bank);
            offset += CHR_BANK_SIZE;
        }

        let cart = Self {
            prg_rom_banks,
            chr_rom_banks,
            prg_ram_banks,
            mapper,
            mirroring,
            battery_backed_ram,
            trainer,
        };

        log(LogCategory::Cartridge, LogLevel::Info, || {
            format!(
                "loaded cartridge: mapper {} ({} KB PRG, {} KB CHR, {:?})",
                cart.mapper,
                cart.prg_rom_banks.len() * PRG_BANK_SIZE / 1024,
                cart.chr_rom_banks.len() * CHR_BANK_SIZE / 1024,
                cart.mirroring,
            )
        });

        Ok(cart)
    }

    /// Serialize back to the iNES format. Parsing the result yields a
    /// cartridge equal to `self` (the trainer payload itself is not kept,
    /// so a declared trainer serializes as 512 zero bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut flag6 = (self.mapper & 0x0F) << 4;
        match self.mirroring {
            Mirroring::Horizontal => {}
            Mirroring::Vertical => flag6 |= 0x01,
            Mirroring::FourScreen => flag6 |= 0x08,
        }
        if self.trainer {
            flag6 |= 0x04;
        }
        if self.battery_backed_ram {
            flag6 |= 0x02;
        }

        let mut out = Vec::with_capacity(
            HEADER_LEN
                + if self.trainer { TRAINER_LEN } else { 0 }
                + self.prg_rom_banks.len() * PRG_BANK_SIZE
                + self.chr_rom_banks.len() * CHR_BANK_SIZE,
        );
        out.extend_from_slice(&MAGIC);
        out.push(self.prg_rom_banks.len() as u8);
        out.push(self.chr_rom_banks.len() as u8);
        out.push(flag6);
        out.push(self.mapper & 0xF0);
        out.push(self.prg_ram_banks);
        out.extend_from_slice(&[0u8; 7]); // reserved
        if self.trainer {
            out.extend_from_slice(&[0u8; TRAINER_LEN]);
        }
        for bank in &self.prg_rom_banks {
            out.extend_from_slice(bank);
        }
        for bank in &self.chr_rom_banks {
            out.extend_from_slice(bank);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_banks: usize, chr_banks: usize, flag6: u8, flag7: u8, prg_ram: u8) -> Vec<u8> {
        let mut data = vec![
            0x4E, 0x45, 0x53, 0x1A,
            prg_banks as u8,
            chr_banks as u8,
            flag6,
            flag7,
            prg_ram,
        ];
        data.resize(HEADER_LEN, 0);
        let trainer = flag6 & 0x04 != 0;
        if trainer {
            data.resize(data.len() + TRAINER_LEN, 0xEE);
        }
        data.resize(data.len() + prg_banks * PRG_BANK_SIZE + chr_banks * CHR_BANK_SIZE, 0);
        data
    }

    #[test]
    fn parses_header_fields() {
        let cart = Cartridge::from_bytes(&image(2, 1, 0x13, 0x40, 2)).unwrap();
        assert_eq!(cart.prg_rom_banks.len(), 2);
        assert_eq!(cart.chr_rom_banks.len(), 1);
        assert_eq!(cart.mapper, 0x41); // low nibble from flag6, high from flag7
        assert_eq!(cart.mirroring, Mirroring::Vertical);
        assert!(cart.battery_backed_ram);
        assert!(!cart.trainer);
        assert_eq!(cart.prg_ram_banks, 2);
    }

    #[test]
    fn four_screen_wins_over_vertical() {
        let cart = Cartridge::from_bytes(&image(1, 0, 0x09, 0, 0)).unwrap();
        assert_eq!(cart.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn zero_prg_ram_banks_reports_one() {
        let cart = Cartridge::from_bytes(&image(1, 0, 0, 0, 0)).unwrap();
        assert_eq!(cart.prg_ram_banks, 1);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = image(1, 0, 0, 0, 0);
        data[0] = b'X';
        assert_eq!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidHeader("missing NES magic"))
        );
    }

    #[test]
    fn rejects_short_header() {
        assert!(matches!(
            Cartridge::from_bytes(&[0x4E, 0x45, 0x53]),
            Err(CartridgeError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_zero_prg_banks() {
        assert!(matches!(
            Cartridge::from_bytes(&image(0, 0, 0, 0, 0)),
            Err(CartridgeError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut data = image(2, 1, 0, 0, 0);
        data.truncate(HEADER_LEN + PRG_BANK_SIZE + 100);
        assert_eq!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidPayload("truncated PRG-ROM"))
        );

        let mut data = image(1, 1, 0, 0, 0);
        data.truncate(HEADER_LEN + PRG_BANK_SIZE + 100);
        assert_eq!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidPayload("truncated CHR-ROM"))
        );
    }

    #[test]
    fn trainer_is_skipped_in_payload() {
        let mut data = image(1, 0, 0x04, 0, 0);
        // First PRG byte sits right after the 512-byte trainer.
        data[HEADER_LEN + TRAINER_LEN] = 0x42;
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert!(cart.trainer);
        assert_eq!(cart.prg_rom_banks[0][0], 0x42);
    }

    #[test]
    fn rejects_truncated_trainer() {
        let mut data = image(1, 0, 0x04, 0, 0);
        data.truncate(HEADER_LEN + 100);
        assert_eq!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidPayload("truncated trainer"))
        );
    }

    #[test]
    fn serialize_parse_round_trip() {
        let mut data = image(2, 1, 0x17, 0x10, 3);
        data[HEADER_LEN + TRAINER_LEN] = 0xAA; // first PRG byte
        let cart = Cartridge::from_bytes(&data).unwrap();
        let reparsed = Cartridge::from_bytes(&cart.to_bytes()).unwrap();
        assert_eq!(cart, reparsed);
    }
}
