use image::{Rgba, RgbaImage};

use crate::artifacts::annotate::{draw_bitmap_text, fill_rect};

const BANNER: &str = "PLACEHOLDER CAPTURE - NOT A REAL SCREENSHOT";
const BODY: &str = "OCR TEST\nOK\nSTART\nCONTINUE\n\nScreen capture failed.\nGrant Screen Recording permission.";

/// Renders the synthetic frame used when capture fails in diagnostic mode.
///
/// The banner keeps the frame recognizable in saved artifacts.
pub fn render(width: u32, height: u32) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    let scale = (height / 180).max(1);
    fill_rect(
        &mut image,
        0,
        0,
        width as i32,
        (12 * scale) as i32,
        Rgba([220, 40, 40, 255]),
    );
    draw_bitmap_text(
        &mut image,
        (2 * scale) as i32,
        (2 * scale) as i32,
        BANNER,
        Rgba([255, 255, 255, 255]),
        scale,
    );
    draw_bitmap_text(
        &mut image,
        100.min(width as i32 / 10),
        (24 * scale) as i32,
        BODY,
        Rgba([0, 0, 0, 255]),
        scale,
    );

    image
}
