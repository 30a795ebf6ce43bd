//! WCAG relative luminance and contrast ratio.

use super::style::{ComputedStyle, Rgba};

pub const AA_NORMAL: f64 = 4.5;
pub const AA_LARGE: f64 = 3.0;
pub const AAA_NORMAL: f64 = 7.0;
pub const AAA_LARGE: f64 = 4.5;

fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn relative_luminance(color: Rgba) -> f64 {
    let [r, g, b] = color.channels().map(linearize);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Always >= 1.0; order of arguments does not matter.
pub fn contrast_ratio(a: Rgba, b: Rgba) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// 18pt and up, or 14pt and up at weight 700+.
pub fn is_large_text(style: &ComputedStyle) -> bool {
    let pt = style.font_size_pt();
    pt >= 18.0 || (pt >= 14.0 && style.font_weight >= 700)
}

pub fn required_aa(large: bool) -> f64 {
    if large {
        AA_LARGE
    } else {
        AA_NORMAL
    }
}

pub fn required_aaa(large: bool) -> f64 {
    if large {
        AAA_LARGE
    } else {
        AAA_NORMAL
    }
}
