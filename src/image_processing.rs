use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};

use crate::error::{Result, TryOnError};

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|err| TryOnError::Image(format!("decode image failed: {err}")))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| TryOnError::Image(format!("encode png failed: {err}")))?;
    Ok(output)
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
}

/// Re-encode anything that is not already PNG so artifacts match their name.
pub fn ensure_png(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if is_png(&bytes) {
        return Ok(bytes);
    }
    encode_png(&decode_image(&bytes)?.to_rgba8())
}

/// Largest size with the source aspect ratio that fits inside `max_w` x `max_h`.
pub fn fit_dimensions(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let (w, h, mw, mh) = (width as u64, height as u64, max_w as u64, max_h as u64);
    if w * mh <= h * mw {
        let fitted = (w * mh / h).max(1) as u32;
        (fitted.min(max_w), max_h)
    } else {
        let fitted = (h * mw / w).max(1) as u32;
        (max_w, fitted.min(max_h))
    }
}

/// Scale `source` to fit the region and center it there.
pub fn paste_fitted(canvas: &mut RgbaImage, source: &DynamicImage, x: u32, y: u32, w: u32, h: u32) {
    let (fit_w, fit_h) = fit_dimensions(source.width(), source.height(), w, h);
    if fit_w == 0 || fit_h == 0 {
        return;
    }
    let scaled = imageops::resize(&source.to_rgba8(), fit_w, fit_h, imageops::FilterType::Triangle);
    let offset_x = x + (w - fit_w) / 2;
    let offset_y = y + (h - fit_h) / 2;
    imageops::overlay(canvas, &scaled, offset_x as i64, offset_y as i64);
}

pub fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = (x + w).min(canvas.width());
    let y_end = (y + h).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_dimensions_keeps_aspect_ratio() {
        assert_eq!(fit_dimensions(200, 100, 100, 100), (100, 50));
        assert_eq!(fit_dimensions(100, 200, 100, 100), (50, 100));
        assert_eq!(fit_dimensions(10, 10, 300, 200), (200, 200));
        assert_eq!(fit_dimensions(0, 10, 300, 200), (0, 0));
    }

    #[test]
    fn test_ensure_png_converts_other_formats() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let mut bmp = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bmp), ImageFormat::Bmp)
            .unwrap();
        assert!(!is_png(&bmp));
        let png = ensure_png(bmp).unwrap();
        assert!(is_png(&png));
        assert_eq!(decode_image(&png).unwrap().width(), 4);
    }

    #[test]
    fn test_ensure_png_rejects_garbage() {
        assert!(matches!(ensure_png(b"nope".to_vec()), Err(TryOnError::Image(_))));
    }
}
