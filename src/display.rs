/// pixels across
pub const DISPLAY_WIDTH: usize = 64;
/// pixels down
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// Monochrome 64x32 frame buffer, one byte (0 or 1) per pixel, row major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Box<[u8]>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: vec![0u8; DISPLAY_PIXELS].into_boxed_slice(),
        }
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = 0);
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// XOR an 8-pixel wide sprite onto the buffer with its top left corner
    /// at (x, y), one sprite byte per row, most significant bit leftmost.
    ///
    /// Coordinates do not wrap: pixels landing right of or below the screen
    /// are dropped. Returns true if any lit pixel was switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            let py = y + row;
            if py >= DISPLAY_HEIGHT {
                break;
            }
            for col in 0..8 {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let px = x + col;
                if px >= DISPLAY_WIDTH {
                    break;
                }
                let idx = py * DISPLAY_WIDTH + px;
                let Some(pixel) = self.pixels.get_mut(idx) else {
                    continue;
                };
                if *pixel == 1 {
                    collision = true;
                }
                *pixel ^= 1;
            }
        }
        collision
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLYPH_ZERO: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

    fn lit(fb: &FrameBuffer) -> usize {
        fb.as_slice().iter().filter(|p| **p == 1).count()
    }

    #[test]
    fn test_new_is_blank() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.as_slice().len(), 2048);
        assert_eq!(lit(&fb), 0);
    }

    #[test]
    fn test_draw_sets_pixels_msb_first() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(10, 3, &[0b1000_0001]));
        assert_eq!(fb.pixel(10, 3), 1);
        assert_eq!(fb.pixel(11, 3), 0);
        assert_eq!(fb.pixel(17, 3), 1);
        assert_eq!(lit(&fb), 2);
    }

    #[test]
    fn test_draw_twice_restores_and_collides() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(4, 4, &GLYPH_ZERO));
        assert_eq!(lit(&fb), 14);
        assert!(fb.draw_sprite(4, 4, &GLYPH_ZERO));
        assert_eq!(fb, FrameBuffer::new());
    }

    #[test]
    fn test_collision_is_sticky_for_whole_sprite() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0x80]);
        // first row collides, second row draws onto blank pixels
        assert!(fb.draw_sprite(0, 0, &[0x80, 0x80]));
        assert_eq!(fb.pixel(0, 0), 0);
        assert_eq!(fb.pixel(0, 1), 1);
    }

    #[test]
    fn test_draw_clips_right_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(60, 0, &[0xFF]);
        assert_eq!(lit(&fb), 4);
        // nothing spills onto the start of the next row
        assert_eq!(fb.pixel(0, 1), 0);
    }

    #[test]
    fn test_draw_clips_bottom_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 30, &[0xFF; 5]);
        assert_eq!(lit(&fb), 16);
    }

    #[test]
    fn test_draw_fully_off_screen_is_harmless() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(255, 255, &[0xFF; 15]));
        assert_eq!(lit(&fb), 0);
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &GLYPH_ZERO);
        fb.clear();
        assert_eq!(lit(&fb), 0);
    }
}
