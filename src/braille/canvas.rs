/// First codepoint of the Unicode Braille Patterns block (no dots raised)
pub const BRAILLE_BLANK: char = '\u{2800}';

/// Dot bit for each (x, y) position inside a 2x4 braille cell
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Braille Unicode canvas for terminal graphics.
/// Each character cell holds a 2x4 grid of dots, so a canvas of
/// `width x height` characters has `width*2 x height*4` pixels.
#[derive(Clone)]
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Width in pixels
    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    /// Height in pixels
    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    /// Raise the dot at pixel (x, y); out of range pixels are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Set a pixel using signed coordinates (negative values are off canvas)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = (x / 2, y / 4);
        cx < self.width && cy < self.height && self.cells[cy * self.width + cx] & DOT_BITS[x % 2][y % 4] != 0
    }

    /// Number of raised dots on the whole canvas
    pub fn dot_count(&self) -> u32 {
        self.cells.iter().map(|b| b.count_ones()).sum()
    }

    /// One character row of the canvas
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(BRAILLE_BLANK as u32 + b as u32).unwrap_or(' '))
            .collect()
    }

    /// All rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }
}

impl std::fmt::Display for BrailleCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.to_string(), "⠁");
        assert!(canvas.is_set(0, 0));
        assert!(!canvas.is_set(1, 0));
    }

    #[test]
    fn test_full_cell() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.to_string(), "⣿");
        assert_eq!(canvas.dot_count(), 8);
    }

    #[test]
    fn test_diagonal_two_rows() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.set_pixel(0, 0);
        canvas.set_pixel(1, 1);
        canvas.set_pixel(2, 6);
        canvas.set_pixel(3, 7);
        // (0,0)+(1,1) = 0x11 in the first cell, (0,2)+(1,3) = 0x84 in the last
        assert_eq!(canvas.to_string(), "⠑⠀\n⠀⢄");
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(4, 0);
        canvas.set_pixel_signed(-1, 2);
        assert_eq!(canvas.dot_count(), 0);
        assert_eq!(canvas.pixel_width(), 4);
        assert_eq!(canvas.pixel_height(), 4);
    }
}
