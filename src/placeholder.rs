//! Local stand-in composite used when the image provider is unavailable.
//!
//! Layout is fixed: title banner on top, the reference photo on the left,
//! top and bottom garments stacked on the right, the theme in a footer.
//! Labels use a built-in 5x7 bitmap font so output depends only on inputs.

use image::{Rgba, RgbaImage};

use crate::error::Result;
use crate::image_processing::{decode_image, encode_png, fill_rect, paste_fitted};

pub const CANVAS_WIDTH: u32 = 768;
pub const CANVAS_HEIGHT: u32 = 1024;
const MARGIN: u32 = 16;
const BANNER_HEIGHT: u32 = 72;
const FOOTER_HEIGHT: u32 = 48;
const CAPTION_HEIGHT: u32 = 32;
const LEFT_PANEL_WIDTH: u32 = 448;

const TITLE_SCALE: u32 = 4;
const LABEL_SCALE: u32 = 2;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

const BACKGROUND: Rgba<u8> = Rgba([236, 233, 228, 255]);
const PANEL: Rgba<u8> = Rgba([250, 249, 247, 255]);
const BANNER: Rgba<u8> = Rgba([38, 41, 51, 255]);
const CAPTION: Rgba<u8> = Rgba([70, 74, 86, 255]);
const LIGHT_TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DARK_TEXT: Rgba<u8> = Rgba([38, 41, 51, 255]);

const TITLE: &str = "TRY-ON PREVIEW";

struct Panel {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    label: &'static str,
}

fn panels() -> [Panel; 3] {
    let content_top = BANNER_HEIGHT + MARGIN;
    let content_height = CANVAS_HEIGHT - FOOTER_HEIGHT - MARGIN - content_top;
    let right_x = MARGIN * 2 + LEFT_PANEL_WIDTH;
    let right_width = CANVAS_WIDTH - right_x - MARGIN;
    let right_height = (content_height - MARGIN) / 2;
    [
        Panel {
            x: MARGIN,
            y: content_top,
            width: LEFT_PANEL_WIDTH,
            height: content_height,
            label: "REFERENCE",
        },
        Panel {
            x: right_x,
            y: content_top,
            width: right_width,
            height: right_height,
            label: "TOP",
        },
        Panel {
            x: right_x,
            y: content_top + right_height + MARGIN,
            width: right_width,
            height: right_height,
            label: "BOTTOM",
        },
    ]
}

/// Compose the reference, top and bottom images into a labeled PNG.
/// Identical inputs always produce identical bytes.
pub fn render(reference: &[u8], top: &[u8], bottom: &[u8], theme: &str) -> Result<Vec<u8>> {
    let sources = [decode_image(reference)?, decode_image(top)?, decode_image(bottom)?];
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);

    fill_rect(&mut canvas, 0, 0, CANVAS_WIDTH, BANNER_HEIGHT, BANNER);
    draw_text_centered(
        &mut canvas,
        TITLE,
        0,
        CANVAS_WIDTH,
        (BANNER_HEIGHT - GLYPH_HEIGHT * TITLE_SCALE) / 2,
        TITLE_SCALE,
        LIGHT_TEXT,
    );

    for (panel, source) in panels().iter().zip(sources.iter()) {
        let image_height = panel.height - CAPTION_HEIGHT;
        fill_rect(&mut canvas, panel.x, panel.y, panel.width, image_height, PANEL);
        paste_fitted(&mut canvas, source, panel.x, panel.y, panel.width, image_height);

        let caption_y = panel.y + image_height;
        fill_rect(&mut canvas, panel.x, caption_y, panel.width, CAPTION_HEIGHT, CAPTION);
        draw_text_centered(
            &mut canvas,
            panel.label,
            panel.x,
            panel.width,
            caption_y + (CAPTION_HEIGHT - GLYPH_HEIGHT * LABEL_SCALE) / 2,
            LABEL_SCALE,
            LIGHT_TEXT,
        );
    }

    let theme = theme.trim();
    if !theme.is_empty() {
        let footer_y = CANVAS_HEIGHT - FOOTER_HEIGHT;
        let max_chars = ((CANVAS_WIDTH - MARGIN * 2) / advance(LABEL_SCALE)) as usize;
        let line: String = format!("THEME: {}", theme.to_uppercase())
            .chars()
            .take(max_chars)
            .collect();
        draw_text_centered(
            &mut canvas,
            &line,
            0,
            CANVAS_WIDTH,
            footer_y + (FOOTER_HEIGHT - GLYPH_HEIGHT * LABEL_SCALE) / 2,
            LABEL_SCALE,
            DARK_TEXT,
        );
    }

    encode_png(&canvas)
}

fn advance(scale: u32) -> u32 {
    (GLYPH_WIDTH + 1) * scale
}

fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    count * advance(scale) - scale
}

fn draw_text_centered(
    canvas: &mut RgbaImage,
    text: &str,
    region_x: u32,
    region_width: u32,
    y: u32,
    scale: u32,
    color: Rgba<u8>,
) {
    let width = text_width(text, scale);
    let x = region_x + region_width.saturating_sub(width) / 2;
    draw_text(canvas, text, x, y, scale, color);
}

fn draw_text(canvas: &mut RgbaImage, text: &str, x: u32, y: u32, scale: u32, color: Rgba<u8>) {
    for (index, ch) in text.chars().enumerate() {
        let origin_x = x + index as u32 * advance(scale);
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                fill_rect(
                    canvas,
                    origin_x + col * scale,
                    y + row as u32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }
}

fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
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
        ' ' => [0; 7],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}
