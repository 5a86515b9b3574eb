//! Renders caption text onto a photo, meme style: upper-case bold letters,
//! white with a black outline, top text along the top edge and bottom text
//! along the bottom edge.

mod font;

use ab_glyph::{point, Font, FontRef, PxScale, ScaleFont};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, Luma, RgbaImage};

/// JPEG quality of rendered captions.
pub const JPEG_QUALITY: u8 = 90;

/// Captions never shrink below this size, even if they overflow a third of
/// the image.
const MIN_FONT_PX: f32 = 8.0;

const FILL: [u8; 3] = [255, 255, 255];
const OUTLINE: [u8; 3] = [0, 0, 0];

#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("caption font has no glyph for {0:?}")]
    MissingGlyphs(String),
    #[error("caption font is unusable: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}

/// Draw `top` and `bottom` onto the image in `bytes` and return it as JPEG.
///
/// Accepts any format the `image` crate can sniff (JPEG, PNG, WebP). Blank
/// text draws nothing. Text with characters the caption font cannot draw is
/// rejected rather than drawn with holes.
pub fn render(bytes: &[u8], top: &str, bottom: &str) -> Result<Vec<u8>, CaptionError> {
    let mut canvas = image::load_from_memory(bytes)
        .map_err(CaptionError::Decode)?
        .to_rgba8();

    let font = font::load()?;
    let top = top.to_uppercase();
    let bottom = bottom.to_uppercase();
    let missing = font::missing_glyphs(&font, &format!("{top}{bottom}"));
    if !missing.is_empty() {
        return Err(CaptionError::MissingGlyphs(missing));
    }

    let (width, height) = canvas.dimensions();
    let mut fill = GrayImage::new(width, height);
    let top_px = draw_block(&font, &mut fill, &top, Edge::Top);
    let bottom_px = draw_block(&font, &mut fill, &bottom, Edge::Bottom);

    if let Some(px) = top_px.into_iter().chain(bottom_px).reduce(f32::max) {
        let outline = dilate(&fill, outline_radius(px));
        composite(&mut canvas, &outline, OUTLINE);
        composite(&mut canvas, &fill, FILL);
    }

    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(CaptionError::Encode)?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Bottom,
}

#[derive(Debug, PartialEq)]
struct Layout {
    px: f32,
    lines: Vec<String>,
}

fn margin(dimension: u32) -> u32 {
    (dimension / 25).max(1)
}

fn outline_radius(px: f32) -> u32 {
    (px / 10.0).round().max(2.0) as u32
}

fn text_width<F: Font>(font: &F, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(previous) = previous {
            width += scaled.kern(previous, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn line_height<F: Font>(font: &F, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    scaled.height() + scaled.line_gap()
}

/// Pick the largest size at which the wrapped text takes at most a third of
/// the image height. Starts from lines about a sixth of the height tall.
fn layout<F: Font>(font: &F, text: &str, width: u32, height: u32) -> Option<Layout> {
    let text = text.trim();
    if text.is_empty() || width == 0 || height == 0 {
        return None;
    }

    let usable_width = width.saturating_sub(2 * margin(width)).max(1) as f32;
    let max_block_height = (height / 3).max(1) as f32;
    let mut px = (height as f32 / 6.0).max(MIN_FONT_PX);

    loop {
        let scale = PxScale::from(px);
        let lines = wrap(text, usable_width, |s| text_width(font, scale, s));
        let block_height = lines.len() as f32 * line_height(font, scale);
        if px <= MIN_FONT_PX || block_height <= max_block_height {
            return Some(Layout { px, lines });
        }
        px = (px * 0.9).max(MIN_FONT_PX);
    }
}

/// Greedy word wrap to `max_width` as measured by `measure`; words wider
/// than a line are broken between characters.
fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for piece in split_to_fit(word, max_width, &measure) {
            if current.is_empty() {
                current = piece;
                continue;
            }
            let candidate = format!("{current} {piece}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, piece));
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_to_fit(word: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    if measure(word) <= max_width {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if piece.chars().count() > 1 && measure(&piece) > max_width {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Rasterize `text` into `mask` as glyph coverage. Returns the font size
/// used, or `None` when there was nothing to draw.
fn draw_block(font: &FontRef<'_>, mask: &mut GrayImage, text: &str, edge: Edge) -> Option<f32> {
    let (width, height) = mask.dimensions();
    let layout = layout(font, text, width, height)?;

    let scale = PxScale::from(layout.px);
    let ascent = font.as_scaled(scale).ascent();
    let line_height = line_height(font, scale);
    let block_height = line_height * layout.lines.len() as f32;
    let margin = margin(height) as f32;
    let block_top = match edge {
        Edge::Top => margin,
        Edge::Bottom => height as f32 - margin - block_height,
    };

    for (i, line) in layout.lines.iter().enumerate() {
        let x = (width as f32 - text_width(font, scale, line)) / 2.0;
        let baseline = block_top + i as f32 * line_height + ascent;
        draw_line(font, scale, mask, line, x, baseline);
    }
    Some(layout.px)
}

fn draw_line(
    font: &FontRef<'_>,
    scale: PxScale,
    mask: &mut GrayImage,
    line: &str,
    x: f32,
    baseline: f32,
) {
    let scaled = font.as_scaled(scale);
    let mut caret = x;
    let mut previous = None;

    for c in line.chars() {
        let id = scaled.glyph_id(c);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        // Spaces have no outline.
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            raise(mask, px, py, value);
        });
    }
}

fn raise(mask: &mut GrayImage, x: i64, y: i64, value: u8) {
    let (width, height) = mask.dimensions();
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return;
    }
    let Luma([current]) = mask.get_pixel_mut(x as u32, y as u32);
    *current = (*current).max(value);
}

/// Grow every covered pixel of `mask` into a disc of `radius`.
fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    let r = radius as i64;

    for (x, y, Luma([value])) in mask.enumerate_pixels() {
        if *value == 0 {
            continue;
        }
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    raise(&mut out, x as i64 + dx, y as i64 + dy, *value);
                }
            }
        }
    }
    out
}

/// Blend `color` over `canvas` using `mask` as alpha.
fn composite(canvas: &mut RgbaImage, mask: &GrayImage, color: [u8; 3]) {
    for (x, y, Luma([alpha])) in mask.enumerate_pixels() {
        if *alpha == 0 {
            continue;
        }
        let a = *alpha as f32 / 255.0;
        let pixel = canvas.get_pixel_mut(x, y);
        for (channel, target) in pixel.0.iter_mut().zip(color) {
            *channel = (*channel as f32 * (1.0 - a) + target as f32 * a).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn gray_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn luma_range(img: &RgbImage, rows: std::ops::Range<u32>) -> (u8, u8) {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for y in rows {
            for x in 0..img.width() {
                let Rgb([r, g, b]) = *img.get_pixel(x, y);
                let luma = ((r as u32 + g as u32 + b as u32) / 3) as u8;
                min = min.min(luma);
                max = max.max(luma);
            }
        }
        (min, max)
    }

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        assert_eq!(wrap("one two three", 7.0, chars), vec!["one two", "three"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap("abcdefgh", 3.0, chars), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        assert_eq!(wrap("  a   b  ", 10.0, chars), vec!["a b"]);
        assert!(wrap("   ", 10.0, chars).is_empty());
    }

    #[test]
    fn test_layout_skips_blank_text() {
        let font = font::load().unwrap();
        assert_eq!(layout(&font, "  ", 100, 100), None);
    }

    #[test]
    fn test_layout_shrinks_long_text() {
        let font = font::load().unwrap();
        let short = layout(&font, "HI", 600, 600).unwrap();
        let long = layout(
            &font,
            "THIS CAPTION IS MUCH MUCH LONGER THAN THE SHORT ONE AND NEEDS TO WRAP",
            600,
            600,
        )
        .unwrap();
        assert!(long.px < short.px);
        assert!(long.lines.len() > 1);
        let block = long.lines.len() as f32 * line_height(&font, PxScale::from(long.px));
        assert!(block <= 200.0);
    }

    #[test]
    fn test_dilate_grows_disc() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, Luma([255]));
        let grown = dilate(&mask, 2);
        assert_eq!(grown.get_pixel(4, 2).0[0], 255);
        assert_eq!(grown.get_pixel(6, 4).0[0], 255);
        assert_eq!(grown.get_pixel(6, 6).0[0], 0);
        assert_eq!(grown.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_render_draws_top_text_only() {
        let rendered = render(&gray_png(240, 120), "hi", "").unwrap();
        let img = image::load_from_memory(&rendered).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (240, 120));

        let (top_min, top_max) = luma_range(&img, 0..40);
        assert!(top_max > 200, "expected white fill, max luma {top_max}");
        assert!(top_min < 60, "expected black outline, min luma {top_min}");

        let (bottom_min, bottom_max) = luma_range(&img, 90..120);
        assert!(bottom_min > 100 && bottom_max < 156);
    }

    #[test]
    fn test_render_draws_bottom_text() {
        let rendered = render(&gray_png(240, 120), "", "yo").unwrap();
        let img = image::load_from_memory(&rendered).unwrap().to_rgb8();
        let (_, bottom_max) = luma_range(&img, 80..120);
        assert!(bottom_max > 200);
        let (top_min, top_max) = luma_range(&img, 0..30);
        assert!(top_min > 100 && top_max < 156);
    }

    #[test]
    fn test_render_draws_cyrillic_and_accents() {
        for caption in ["привет", "¡ñandú!"] {
            let rendered = render(&gray_png(240, 120), caption, "").unwrap();
            let img = image::load_from_memory(&rendered).unwrap().to_rgb8();
            let (top_min, top_max) = luma_range(&img, 0..40);
            assert!(top_max > 200, "{caption}: max luma {top_max}");
            assert!(top_min < 60, "{caption}: min luma {top_min}");
        }
    }

    #[test]
    fn test_render_rejects_text_without_glyphs() {
        let err = render(&gray_png(240, 120), "猫", "").unwrap_err();
        assert!(matches!(err, CaptionError::MissingGlyphs(ref missing) if missing == "猫"));

        let err = render(&gray_png(240, 120), "cat", "ねこ").unwrap_err();
        assert!(matches!(err, CaptionError::MissingGlyphs(ref missing) if missing == "ねこ"));
    }

    #[test]
    fn test_render_outputs_jpeg() {
        let rendered = render(&gray_png(16, 16), "a", "b").unwrap();
        assert_eq!(image::guess_format(&rendered).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_render_rejects_garbage() {
        let err = render(b"definitely not an image", "a", "b").unwrap_err();
        assert!(matches!(err, CaptionError::Decode(_)));
    }
}
