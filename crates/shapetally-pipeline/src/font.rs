//! Minimal single-stroke font for shape labels.
//!
//! Glyphs are polylines on a 4x6 unit grid (y grows downward, baseline
//! at y = 6) and are rendered as scaled line segments, so labels need no
//! font file. Only uppercase letters used by the label vocabulary are
//! defined; other characters render as blank advances. Lowercase input
//! is drawn with the uppercase glyph.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

type Stroke = &'static [(u8, u8)];

/// Glyph cell width in font units.
const GLYPH_WIDTH: u32 = 4;
/// Glyph cell height in font units.
const GLYPH_HEIGHT: u32 = 6;
/// Gap between glyphs in font units.
const GLYPH_GAP: u32 = 2;

/// Rendering parameters for label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Pixels per font unit.
    pub scale: u32,
    /// Stroke width in pixels.
    pub thickness: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            scale: 4,
            thickness: 2,
        }
    }
}

impl TextStyle {
    /// Width and height in pixels of `text` rendered in this style.
    #[must_use]
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let count = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        if count == 0 {
            return (0, 0);
        }
        let units = count
            .saturating_mul(GLYPH_WIDTH + GLYPH_GAP)
            .saturating_sub(GLYPH_GAP);
        (
            units.saturating_mul(self.scale) + self.thickness,
            GLYPH_HEIGHT * self.scale + self.thickness,
        )
    }
}

fn glyph(c: char) -> &'static [Stroke] {
    match c.to_ascii_uppercase() {
        'A' => &[&[(0, 6), (2, 0), (4, 6)], &[(1, 3), (3, 3)]],
        'C' => &[&[(4, 1), (3, 0), (1, 0), (0, 1), (0, 5), (1, 6), (3, 6), (4, 5)]],
        'D' => &[&[(0, 0), (0, 6), (3, 6), (4, 5), (4, 1), (3, 0), (0, 0)]],
        'E' => &[&[(4, 0), (0, 0), (0, 6), (4, 6)], &[(0, 3), (3, 3)]],
        'G' => &[&[
            (4, 1),
            (3, 0),
            (1, 0),
            (0, 1),
            (0, 5),
            (1, 6),
            (3, 6),
            (4, 5),
            (4, 3),
            (2, 3),
        ]],
        'H' => &[&[(0, 0), (0, 6)], &[(4, 0), (4, 6)], &[(0, 3), (4, 3)]],
        'I' => &[&[(1, 0), (3, 0)], &[(2, 0), (2, 6)], &[(1, 6), (3, 6)]],
        'L' => &[&[(0, 0), (0, 6), (4, 6)]],
        'N' => &[&[(0, 6), (0, 0), (4, 6), (4, 0)]],
        'O' => &[&[
            (1, 0),
            (3, 0),
            (4, 1),
            (4, 5),
            (3, 6),
            (1, 6),
            (0, 5),
            (0, 1),
            (1, 0),
        ]],
        'P' => &[&[(0, 6), (0, 0), (3, 0), (4, 1), (4, 2), (3, 3), (0, 3)]],
        'Q' => &[
            &[
                (1, 0),
                (3, 0),
                (4, 1),
                (4, 5),
                (3, 6),
                (1, 6),
                (0, 5),
                (0, 1),
                (1, 0),
            ],
            &[(2, 4), (4, 6)],
        ],
        'R' => &[
            &[(0, 6), (0, 0), (3, 0), (4, 1), (4, 2), (3, 3), (0, 3)],
            &[(2, 3), (4, 6)],
        ],
        'S' => &[&[
            (4, 1),
            (3, 0),
            (1, 0),
            (0, 1),
            (0, 2),
            (1, 3),
            (3, 3),
            (4, 4),
            (4, 5),
            (3, 6),
            (1, 6),
            (0, 5),
        ]],
        'T' => &[&[(0, 0), (4, 0)], &[(2, 0), (2, 6)]],
        'U' => &[&[(0, 0), (0, 5), (1, 6), (3, 6), (4, 5), (4, 0)]],
        _ => &[],
    }
}

/// Draw `text` with its top-left corner at `(x, y)`.
///
/// Strokes falling outside the canvas are clipped.
#[allow(clippy::cast_precision_loss)]
pub fn draw_text_mut(
    canvas: &mut RgbImage,
    text: &str,
    x: i32,
    y: i32,
    style: TextStyle,
    color: Rgb<u8>,
) {
    let scale = style.scale as f32;
    let advance = ((GLYPH_WIDTH + GLYPH_GAP) * style.scale) as f32;

    for (i, c) in text.chars().enumerate() {
        let origin_x = x as f32 + i as f32 * advance;
        let origin_y = y as f32;
        for stroke in glyph(c) {
            for pair in stroke.windows(2) {
                let (ax, ay) = pair[0];
                let (bx, by) = pair[1];
                let start = (
                    f32::from(ax).mul_add(scale, origin_x),
                    f32::from(ay).mul_add(scale, origin_y),
                );
                let end = (
                    f32::from(bx).mul_add(scale, origin_x),
                    f32::from(by).mul_add(scale, origin_y),
                );
                draw_thick_segment(canvas, start, end, style.thickness, color);
            }
        }
    }
}

/// Draw a segment `thickness` pixels wide by stamping offset copies.
#[allow(clippy::cast_precision_loss)]
pub fn draw_thick_segment(
    canvas: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    thickness: u32,
    color: Rgb<u8>,
) {
    for dy in 0..thickness.max(1) {
        for dx in 0..thickness.max(1) {
            let (ox, oy) = (dx as f32, dy as f32);
            draw_line_segment_mut(
                canvas,
                (start.0 + ox, start.1 + oy),
                (end.0 + ox, end.1 + oy),
                color,
            );
        }
    }
}
