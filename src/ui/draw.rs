//! Software drawing for generated surface textures.
//!
//! Shapes are filled per pixel inside their bounding box; text uses a
//! built-in 5x7 bitmap font scaled by whole pixels. Coordinates are texture
//! pixels with row 0 at the top.

use image::{Rgba, RgbaImage};

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Glyph cell width including the one-column gap.
pub const GLYPH_ADVANCE: u32 = 6;

pub fn rgb(hex: u32) -> Rgba<u8> {
    Rgba([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255])
}

pub fn fill(image: &mut RgbaImage, color: Rgba<u8>) {
    for pixel in image.pixels_mut() {
        *pixel = color;
    }
}

pub fn fill_rect(image: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
    for_each_in_box(image, x, y, x + width, y + height, |_, _| true, color);
}

pub fn fill_circle(image: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let r2 = radius * radius;
    for_each_in_box(
        image,
        cx - radius,
        cy - radius,
        cx + radius,
        cy + radius,
        |px, py| (px - cx).powi(2) + (py - cy).powi(2) <= r2,
        color,
    );
}

/// Ring of `width` pixels centered on the circle of `radius`.
pub fn stroke_circle(
    image: &mut RgbaImage,
    cx: f32,
    cy: f32,
    radius: f32,
    width: f32,
    color: Rgba<u8>,
) {
    let inner = (radius - width * 0.5).max(0.0);
    let outer = radius + width * 0.5;
    let (inner2, outer2) = (inner * inner, outer * outer);
    for_each_in_box(
        image,
        cx - outer,
        cy - outer,
        cx + outer,
        cy + outer,
        |px, py| {
            let d2 = (px - cx).powi(2) + (py - cy).powi(2);
            d2 >= inner2 && d2 <= outer2
        },
        color,
    );
}

pub fn fill_triangle(image: &mut RgbaImage, points: [(f32, f32); 3], color: Rgba<u8>) {
    let [a, b, c] = points;
    let edge = |p: (f32, f32), q: (f32, f32), x: f32, y: f32| (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0);
    let area = edge(a, b, c.0, c.1);
    if area == 0.0 {
        return;
    }
    let min_x = a.0.min(b.0).min(c.0);
    let min_y = a.1.min(b.1).min(c.1);
    let max_x = a.0.max(b.0).max(c.0);
    let max_y = a.1.max(b.1).max(c.1);
    for_each_in_box(
        image,
        min_x,
        min_y,
        max_x,
        max_y,
        |px, py| {
            let w0 = edge(b, c, px, py) * area.signum();
            let w1 = edge(c, a, px, py) * area.signum();
            let w2 = edge(a, b, px, py) * area.signum();
            w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
        },
        color,
    );
}

/// Paints pixels whose centers lie in the box and pass `inside`.
fn for_each_in_box(
    image: &mut RgbaImage,
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
    inside: impl Fn(f32, f32) -> bool,
    color: Rgba<u8>,
) {
    let (width, height) = image.dimensions();
    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(width);
    let y1 = (max_y.ceil().max(0.0) as u32).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            if px >= min_x && px <= max_x && py >= min_y && py <= max_y && inside(px, py) {
                image.put_pixel(x, y, color);
            }
        }
    }
}

// ========================================================================
// Bitmap text
// ========================================================================

/// Rows top to bottom, bit 4 is the leftmost column. Lowercase letters use
/// the uppercase glyph; unknown characters draw as '?'.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (chars * GLYPH_ADVANCE - 1) * scale
}

/// Largest scale not above `preferred` at which `text` fits in `max_width`.
pub fn fit_scale(text: &str, preferred: u32, max_width: u32) -> u32 {
    let mut scale = preferred.max(1);
    while scale > 1 && text_width(text, scale) > max_width {
        scale -= 1;
    }
    scale
}

/// One line of text centered on `(cx, cy)`.
pub fn draw_text_line(image: &mut RgbaImage, text: &str, cx: f32, cy: f32, scale: u32, color: Rgba<u8>) {
    let scale_f = scale as f32;
    let left = cx - text_width(text, scale) as f32 * 0.5;
    let top = cy - (GLYPH_HEIGHT * scale) as f32 * 0.5;
    for (index, c) in text.chars().enumerate() {
        let origin_x = left + (index as u32 * GLYPH_ADVANCE * scale) as f32;
        for (row, bits) in glyph(c).iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - column)) != 0 {
                    fill_rect(
                        image,
                        origin_x + column as f32 * scale_f,
                        top + row as f32 * scale_f,
                        scale_f,
                        scale_f,
                        color,
                    );
                }
            }
        }
    }
}

/// Splits on explicit newlines, then greedily packs words into lines of at
/// most `max_chars`. A single longer word gets a line of its own.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate_len = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
            if candidate_len > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph pixel size at a 2048px canvas.
    pub scale: u32,
    pub color: Rgba<u8>,
    pub background: Rgba<u8>,
    /// Horizontal margin at a 2048px canvas.
    pub padding: u32,
}

impl TextStyle {
    /// Dark ink on paper, used for the clipboard notes.
    pub fn paper() -> Self {
        Self {
            scale: 12,
            color: rgb(0x2f2b1d),
            background: rgb(0xf5f0e1),
            padding: 240,
        }
    }
}

/// Square texture with `text` wrapped and centered both ways.
pub fn render_text_texture(text: &str, size: u32, style: &TextStyle) -> RgbaImage {
    let size = size.max(1);
    let ratio = size as f32 / 2048.0;
    let scale = ((style.scale as f32 * ratio).round() as u32).max(1);
    let padding = (style.padding as f32 * ratio) as u32;
    let mut image = RgbaImage::from_pixel(size, size, style.background);

    let max_width = size.saturating_sub(padding * 2).max(GLYPH_ADVANCE * scale);
    let max_chars = ((max_width / scale + 1) / GLYPH_ADVANCE).max(1) as usize;
    let lines = wrap_text(text, max_chars);
    let line_height = (GLYPH_HEIGHT * scale) as f32 * 1.7;
    let total = lines.len() as f32 * line_height;
    let start_y = (size as f32 - total) * 0.5 + line_height * 0.5;
    for (index, line) in lines.iter().enumerate() {
        draw_text_line(
            &mut image,
            line,
            size as f32 * 0.5,
            start_y + index as f32 * line_height,
            scale,
            style.color,
        );
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_newlines_and_width() {
        let lines = wrap_text("Project Notes\n- Polish 3D workspace now", 12);
        assert_eq!(lines, vec!["Project", "Notes", "- Polish 3D", "workspace", "now"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("extraordinarily", 4), vec!["extraordinarily"]);
    }

    #[test]
    fn fit_scale_shrinks_long_titles() {
        assert_eq!(text_width("AB", 2), 22);
        assert_eq!(fit_scale("AB", 10, 1000), 10);
        let scale = fit_scale("Deftones - My Own Summer", 14, 1900);
        assert!(text_width("Deftones - My Own Summer", scale) <= 1900);
        assert!(scale < 14);
    }

    #[test]
    fn shapes_paint_inside_only() {
        let mut image = RgbaImage::from_pixel(64, 64, rgb(0x000000));
        let white = rgb(0xffffff);
        fill_circle(&mut image, 32.0, 32.0, 10.0, white);
        assert_eq!(*image.get_pixel(32, 32), white);
        assert_eq!(*image.get_pixel(2, 2), rgb(0x000000));

        stroke_circle(&mut image, 32.0, 32.0, 20.0, 2.0, rgb(0xff0000));
        assert_eq!(*image.get_pixel(32, 12), rgb(0xff0000));
        assert_eq!(*image.get_pixel(32, 32), white);

        fill_triangle(&mut image, [(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], white);
        assert_eq!(*image.get_pixel(1, 1), white);
        assert_eq!(*image.get_pixel(7, 7), rgb(0x000000));
    }

    #[test]
    fn shapes_clip_at_image_edges() {
        let mut image = RgbaImage::from_pixel(16, 16, rgb(0x000000));
        fill_circle(&mut image, -4.0, 20.0, 10.0, rgb(0xffffff));
        fill_rect(&mut image, 10.0, 10.0, 100.0, 100.0, rgb(0x00ff00));
        assert_eq!(*image.get_pixel(15, 15), rgb(0x00ff00));
    }

    #[test]
    fn text_texture_has_ink_near_center() {
        let image = render_text_texture("HELLO", 256, &TextStyle::paper());
        let paper = TextStyle::paper().background;
        let inked = image.pixels().filter(|pixel| **pixel != paper).count();
        assert!(inked > 0);
        assert_eq!(*image.get_pixel(0, 0), paper);
    }
}
