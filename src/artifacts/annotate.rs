//! Pixel-level drawing for debug artifacts.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

use crate::geometry::ScreenSize;
use crate::ocr::RecognizedText;

const MARKER: Rgba<u8> = Rgba([255, 0, 0, 255]);
const LABEL_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 230]);
const MARKER_THICKNESS: u32 = 4;

/// Draws a red box and label for every recognized region.
///
/// Bounds are in screen points; they are scaled onto the bitmap, which is
/// larger than the screen on Retina displays. Labels use an ASCII bitmap
/// font, so other scripts render as `?`.
pub fn annotate(image: &RgbaImage, texts: &[RecognizedText], screen: ScreenSize) -> RgbaImage {
    let mut out = image.clone();
    if texts.is_empty() || screen.width <= 0.0 || screen.height <= 0.0 {
        return out;
    }

    let sx = f64::from(out.width()) / screen.width;
    let sy = f64::from(out.height()) / screen.height;
    let label_scale = ((sy.round() as u32).max(1)) * 2;

    for text in texts {
        let rect = text.bounds.scaled(sx, sy);
        let x = rect.x.max(0.0).round() as u32;
        let y = rect.y.max(0.0).round() as u32;
        let w = rect.width.max(0.0).round() as u32;
        let h = rect.height.max(0.0).round() as u32;
        draw_rect_outline(&mut out, x, y, w, h, MARKER, MARKER_THICKNESS);

        let label_h = (8 * label_scale) as i32;
        let label_y = (y as i32 - label_h - 2).max(0);
        let label_w = (text.text.chars().count() as u32 * 8 * label_scale) as i32;
        fill_rect(&mut out, x as i32, label_y, label_w, label_h, LABEL_BACKGROUND);
        draw_bitmap_text(&mut out, x as i32, label_y, &text.text, MARKER, label_scale);
    }

    out
}

pub(crate) fn draw_rect_outline(
    img: &mut RgbaImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    color: Rgba<u8>,
    thickness: u32,
) {
    if w == 0 || h == 0 || img.width() == 0 || img.height() == 0 {
        return;
    }
    let max_x = img.width() - 1;
    let max_y = img.height() - 1;

    let x0 = x.min(max_x);
    let y0 = y.min(max_y);
    let x1 = x.saturating_add(w - 1).min(max_x);
    let y1 = y.saturating_add(h - 1).min(max_y);

    for t in 0..thickness.max(1) {
        let tx0 = x0.saturating_sub(t);
        let ty0 = y0.saturating_sub(t);
        let tx1 = (x1 + t).min(max_x);
        let ty1 = (y1 + t).min(max_y);

        for xx in tx0..=tx1 {
            img.put_pixel(xx, ty0, color);
            img.put_pixel(xx, ty1, color);
        }
        for yy in ty0..=ty1 {
            img.put_pixel(tx0, yy, color);
            img.put_pixel(tx1, yy, color);
        }
    }
}

/// Fills `w`x`h` at (`x`, `y`), clipped to the image, alpha-blended.
pub(crate) fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = x.saturating_add(w).min(img.width() as i32);
    let y_end = y.saturating_add(h).min(img.height() as i32);

    for yy in y_start..y_end {
        for xx in x_start..x_end {
            let dst = *img.get_pixel(xx as u32, yy as u32);
            img.put_pixel(xx as u32, yy as u32, blend_pixel(dst, color));
        }
    }
}

pub(crate) fn draw_bitmap_text(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
    scale: u32,
) {
    let scale_i = scale.max(1) as i32;
    let mut cursor_x = x;
    let mut cursor_y = y;
    for ch in text.chars() {
        if ch == '\n' {
            cursor_x = x;
            cursor_y += 8 * scale_i;
            continue;
        }
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8 * scale_i;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = cursor_y + row_idx as i32 * scale_i;
                fill_rect(img, px, py, scale_i, scale_i, color);
            }
        }
        cursor_x += 8 * scale_i;
    }
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| {
        (f64::from(d) * inv + f64::from(s) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let out_a = (f64::from(dst[3]) + f64::from(src[3]) * inv)
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_annotate_scales_screen_rects_onto_retina_bitmap() {
        let image = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        let texts = vec![RecognizedText::new("OK", Rect::new(20.0, 20.0, 10.0, 10.0), 0.9)];

        let out = annotate(&image, &texts, ScreenSize::new(100.0, 50.0));

        // screen (20, 20) lands on bitmap (40, 40)
        assert_eq!(out.get_pixel(40, 40), &MARKER);
        assert_eq!(out.get_pixel(59, 59), &MARKER);
        assert_eq!(out.get_pixel(50, 50), &Rgba([0, 0, 0, 255]));
        // source image untouched
        assert_eq!(image.get_pixel(40, 40), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_annotate_without_texts_is_a_copy() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        let out = annotate(&image, &[], ScreenSize::new(8.0, 8.0));
        assert_eq!(out, image);
    }

    #[test]
    fn test_outline_clips_at_edges() {
        let mut image = RgbaImage::new(10, 10);
        draw_rect_outline(&mut image, 8, 8, 50, 50, MARKER, 3);
        assert_eq!(image.get_pixel(9, 9), &MARKER);
    }

    #[test]
    fn test_fill_rect_blends_alpha() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        fill_rect(&mut image, -5, -5, 6, 6, Rgba([255, 255, 255, 0]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));

        fill_rect(&mut image, 0, 0, 1, 1, Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }
}
