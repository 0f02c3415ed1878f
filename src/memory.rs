use crate::error::{Error, Result};
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the 4K of addressable memory.
pub trait MemoryMap {
    /// write unknown len of data into memory at a particular address
    fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<usize> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        self.write(buf.as_slice(), addr)?;
        Ok(len)
    }

    /// write a chunk of bytes into "RAM", refusing anything that would run
    /// off the end
    fn write(&mut self, data: &[u8], addr: u16) -> Result<()> {
        let max_size = self.size().saturating_sub(addr as usize);
        if data.len() > max_size {
            return Err(Error::RomTooLarge {
                size: data.len(),
                max_size,
            });
        }
        self.get_rw_slice(addr, data.len()).copy_from_slice(data);
        Ok(())
    }

    /// read one byte; addresses wrap at 12 bits
    fn get_byte(&self, addr: u16) -> u8 {
        self.get_ro_slice(addr & ADDR_MASK, 1)[0]
    }

    /// write one byte; addresses wrap at 12 bits
    fn set_byte(&mut self, addr: u16, value: u8) {
        self.get_rw_slice(addr & ADDR_MASK, 1)[0] = value;
    }

    /// get a big-endian two-byte word (an instruction)
    fn get_word(&self, addr: u16) -> u16 {
        let hi = self.get_byte(addr) as u16;
        let lo = self.get_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    fn size(&self) -> usize;

    /// get a r/w slice of the underlying memory (heap)
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory (heap)
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the hex-digit glyphs live
pub const CHIP8_FONT_ADDR: u16 = 0x000;

/// bytes per font glyph
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// bytes per row of a hex dump
pub const HEX_ROW_BYTES: usize = 16;

const ADDR_MASK: u16 = 0x0FFF;

/// Defines the CHIP-8 memory map as most modern interpreters lay it out:
///   0x0000-0x004f  font (16 glyphs, 5 bytes each)
///   0x0050-0x01ff  unused (interpreter area on the COSMAC VIP)
///   0x0200-0x0fff  program
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
        };
        mm.get_rw_slice(CHIP8_FONT_ADDR, CHIP8_FONT.len())
            .copy_from_slice(&CHIP8_FONT);
        mm
    }

    /// load a CHIP-8 program at 0x200, returning its length
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        self.write_any(reader, CHIP8_PROGRAM_ADDR)
    }

    /// the largest program that fits
    pub fn max_program_size(&self) -> usize {
        self.size() - CHIP8_PROGRAM_ADDR as usize
    }

    /// address of the glyph for the low nibble of `digit`
    pub fn font_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + (digit & 0x0f) as u16 * CHIP8_FONT_GLYPH_BYTES
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// which hex dump row holds `addr`
pub fn hex_row_of(addr: u16) -> usize {
    (addr & ADDR_MASK) as usize / HEX_ROW_BYTES
}

/// render memory as `0x0200 00 E0 ...` rows, sixteen bytes to a row
pub fn hex_rows(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(HEX_ROW_BYTES)
        .enumerate()
        .map(|(row, chunk)| {
            let mut line = format!("0x{:04X}", row * HEX_ROW_BYTES);
            for b in chunk {
                line.push_str(&format!(" {:02X}", b));
            }
            line
        })
        .collect()
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new();
        // NB. memory is zeroed from 0x50 because before that we bake in the font
        assert!(m.bytes[0x50..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_font_at_zero() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.get_ro_slice(0, 5), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(Chip8MemoryMap::font_addr(0xA), 50);
        assert_eq!(Chip8MemoryMap::font_addr(0x1F), 75);
    }

    #[test]
    fn test_write_any_leaves_font_alone() -> Result<()> {
        let mut m = Chip8MemoryMap::new();
        // a sprite dropped just past the font
        let mut glyph: &[u8] = &[0x3C, 0x42, 0x42, 0x3C];
        assert_eq!(m.write_any(&mut glyph, 0x050)?, 4);
        assert_eq!(m.get_ro_slice(0x04b, 9), [0xF0, 0x80, 0xF0, 0x80, 0x80, 0x3C, 0x42, 0x42, 0x3C]);
        assert_eq!(m.get_byte(0x054), 0);
        Ok(())
    }

    #[test]
    fn test_read_word() -> Result<()> {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0x200)?;
        assert_eq!(m.get_word(0x204), 0x0405);
        Ok(())
    }

    #[test]
    fn test_word_wraps_at_top_of_memory() {
        let mut m = Chip8MemoryMap::new();
        m.set_byte(0xfff, 0x12);
        assert_eq!(m.get_word(0xfff), 0x12f0);
    }

    #[test]
    fn test_write_too_much_rejected() {
        let mut dst = Chip8MemoryMap::new();
        let mut src: &[u8] = &[0; 8];
        match dst.write_any(&mut src, 4089) {
            Err(Error::RomTooLarge { size, max_size }) => {
                assert_eq!(size, 8);
                assert_eq!(max_size, 7);
            }
            other => panic!("expected RomTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_program_lands_after_interpreter_area() -> Result<()> {
        let mut m = Chip8MemoryMap::new();
        // V0 = 0x0A; I = glyph for V0
        let mut rom: &[u8] = &[0x60, 0x0A, 0xF0, 0x29];
        assert_eq!(m.load_program(&mut rom)?, 4);
        assert_eq!(m.get_word(CHIP8_PROGRAM_ADDR), 0x600A);
        assert_eq!(m.get_word(CHIP8_PROGRAM_ADDR + 2), 0xF029);
        assert!(m.as_slice()[0x050..0x200].iter().all(|b| *b == 0));
        Ok(())
    }

    #[test]
    fn test_program_exactly_fills_memory() -> Result<()> {
        let mut dst = Chip8MemoryMap::new();
        let rom = vec![0xaa; dst.max_program_size()];
        dst.load_program(&mut rom.as_slice())?;
        assert_eq!(dst.get_byte(0xfff), 0xaa);
        let too_big = vec![0xaa; dst.max_program_size() + 1];
        assert!(dst.load_program(&mut too_big.as_slice()).is_err());
        Ok(())
    }

    #[test]
    fn test_hex_rows() {
        let m = Chip8MemoryMap::new();
        let rows = hex_rows(m.as_slice());
        assert_eq!(rows.len(), 256);
        assert!(rows[0].starts_with("0x0000 F0 90 90 90 F0 20"));
        assert!(rows[0x20].starts_with("0x0200 00 00"));
        assert_eq!(hex_row_of(0x202), 0x20);
    }
}
