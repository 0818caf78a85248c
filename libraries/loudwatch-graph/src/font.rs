//! 5x7 bitmap font
//!
//! Covers what the graph writes: digits, signs, the unit and gauge labels and
//! `INF`/`NAN` for non-finite readings. Input is uppercased before lookup;
//! anything else renders as blank space. A font size of 10 draws each font
//! pixel as a 1x1 square.

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

const GLYPH_ROWS: usize = 7;
const GLYPH_COLUMNS: usize = 5;
/// Glyph plus one column of spacing
const ADVANCE_COLUMNS: f32 = 6.0;

fn glyph(ch: char) -> [u8; GLYPH_ROWS] {
    match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '|' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10011, 0b10001, 0b10001, 0b01110],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        _ => [0; GLYPH_ROWS],
    }
}

/// Size of one font pixel
fn pixel_size(font_size: f64) -> f32 {
    (font_size / 10.0) as f32
}

/// Cap height in whole pixels
pub fn font_height(font_size: f64) -> i32 {
    (f64::from(pixel_size(font_size)) * GLYPH_ROWS as f64).ceil() as i32
}

/// Advance width of `text` in pixels
pub fn text_width(text: &str, font_size: f64) -> f32 {
    let count = text.chars().count();
    if count == 0 {
        return 0.0;
    }
    // No spacing after the last glyph
    let columns = count as f32 * ADVANCE_COLUMNS - 1.0;
    columns * pixel_size(font_size)
}

/// Draw `text` with its top-left corner at `(x, y)`
pub fn draw_text(pixmap: &mut Pixmap, text: &str, x: f32, y: f32, font_size: f64, paint: &Paint) {
    let pixel = pixel_size(font_size);
    let mut path = PathBuilder::new();

    for (index, ch) in text.chars().enumerate() {
        let origin_x = x + index as f32 * ADVANCE_COLUMNS * pixel;
        for (row, bits) in glyph(ch.to_ascii_uppercase()).iter().enumerate() {
            for column in 0..GLYPH_COLUMNS {
                if (bits >> (GLYPH_COLUMNS - 1 - column)) & 1 == 1 {
                    if let Some(rect) = Rect::from_xywh(
                        origin_x + column as f32 * pixel,
                        y + row as f32 * pixel,
                        pixel,
                        pixel,
                    ) {
                        path.push_rect(rect);
                    }
                }
            }
        }
    }

    if let Some(path) = path.finish() {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_at_size_ten() {
        assert_eq!(font_height(10.0), 7);
        assert_eq!(text_width("M", 10.0), 5.0);
        assert_eq!(text_width("TP", 10.0), 11.0);
        assert_eq!(text_width("", 10.0), 0.0);
    }

    #[test]
    fn test_default_sizes() {
        assert_eq!(font_height(12.0), 9);
        assert_eq!(font_height(8.0), 6);
    }

    #[test]
    fn test_header_characters_have_glyphs() {
        let header = "TARGET: -23 LUFS | M: +0.00 LU | S: -INF LU | I: NAN LU | LRA: 1.5 LU0123456789";
        for ch in header.chars().filter(|ch| *ch != ' ') {
            assert_ne!(glyph(ch), [0; GLYPH_ROWS], "no glyph for {:?}", ch);
        }
    }

    #[test]
    fn test_draws_inside_glyph_box() {
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = false;

        draw_text(&mut pixmap, "I", 2.0, 3.0, 10.0, &paint);

        // Top bar of the I spans columns 2..7 on row 3
        assert_eq!(pixmap.pixel(2, 3).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(6, 3).unwrap().alpha(), 255);
        // Stem in the middle column, nothing beside it
        assert_eq!(pixmap.pixel(4, 6).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(3, 6).unwrap().alpha(), 0);
        // Outside the box
        assert_eq!(pixmap.pixel(2, 10).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(7, 3).unwrap().alpha(), 0);
    }

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(glyph('i'.to_ascii_uppercase()), glyph('I'));
    }
}
