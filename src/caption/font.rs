//! The caption typeface: DejaVu Sans Bold, bundled with the crate
//! (`assets/fonts`, Bitstream Vera license). Covers Latin, Greek and
//! Cyrillic; no CJK.

use ab_glyph::{Font, FontRef, InvalidFont};

static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

pub fn load() -> Result<FontRef<'static>, InvalidFont> {
    FontRef::try_from_slice(DEJAVU_SANS_BOLD)
}

/// Characters of `text` the font cannot draw, in order of first
/// appearance. Whitespace is never reported.
pub fn missing_glyphs(font: &impl Font, text: &str) -> String {
    let mut missing = String::new();
    for c in text.chars() {
        if c.is_whitespace() || missing.contains(c) {
            continue;
        }
        if font.glyph_id(c).0 == 0 {
            missing.push(c);
        }
    }
    missing
}
