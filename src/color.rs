//! Color parsing and color-space conversions
//!
//! Tokens are normalized to an sRGB triple once, at parse time. CIELAB
//! coordinates are derived on demand through `palette` (D65 white point,
//! standard sRGB linearization), and mapped back with gamut clamping.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use palette::{white_point::D65, FromColor, Hsl, Lab, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::{GroupingError, Result};

/// A coordinate in the active color space (RGB channels or L*, a*, b*)
pub type Point = [f64; 3];

/// A parsed color: the original token plus its normalized RGB triple.
///
/// Equality and hashing only look at the RGB triple, so `"#fff"` and
/// `"white"` are the same color. Other spellings seen for the same triple are
/// kept as aliases.
#[derive(Debug, Clone)]
pub struct Color {
    token: String,
    rgb: [u8; 3],
    aliases: Vec<String>,
}

impl Color {
    /// Parse a hex (`#rgb`, `#rrggbb`), named, `rgb(...)` or `hsl(...)` token
    pub fn parse(token: &str) -> Result<Self> {
        let normalized = token.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(GroupingError::parse(token, "empty token"));
        }

        let rgb = if let Some(digits) = normalized.strip_prefix('#') {
            parse_hex(token, digits)?
        } else if let Some(args) = functional_args(&normalized, "rgb") {
            parse_rgb_args(token, args)?
        } else if let Some(args) = functional_args(&normalized, "hsl") {
            parse_hsl_args(token, args)?
        } else if let Some(named) = palette::named::from_str(&normalized) {
            [named.red, named.green, named.blue]
        } else {
            return Err(GroupingError::parse(token, "not a recognized color"));
        };

        Ok(Self {
            token: token.trim().to_string(),
            rgb,
            aliases: Vec::new(),
        })
    }

    /// Build a color directly from RGB channels; the token is the canonical hex
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            token: rgb_to_hex(rgb),
            rgb,
            aliases: Vec::new(),
        }
    }

    /// The token this color was parsed from
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Additional spellings of this color, in the order they were first seen
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Record another spelling; case-insensitive duplicates are ignored
    pub fn add_alias(&mut self, token: &str) {
        let token = token.trim();
        if self.tokens().any(|known| known.eq_ignore_ascii_case(token)) {
            return;
        }
        self.aliases.push(token.to_string());
    }

    /// The primary token followed by every alias
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.token.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// RGB channels as a floating point coordinate
    pub fn rgb_point(&self) -> Point {
        [
            f64::from(self.rgb[0]),
            f64::from(self.rgb[1]),
            f64::from(self.rgb[2]),
        ]
    }

    /// CIELAB coordinates under D65
    pub fn to_lab(&self) -> Point {
        rgb_to_lab(self.rgb)
    }

    /// The displayable color nearest to a CIELAB coordinate
    pub fn from_lab(lab: Point) -> Self {
        Self::from_rgb(lab_to_rgb(lab))
    }

    /// Canonical lowercase `#rrggbb`
    pub fn hex(&self) -> String {
        rgb_to_hex(self.rgb)
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.rgb == other.rgb
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rgb.hash(state);
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl FromStr for Color {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The coordinate space a metric and its centroids operate in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Rgb,
    Lab,
}

impl ColorSpace {
    /// Coordinates of `color` in this space
    pub fn project(self, color: &Color) -> Point {
        match self {
            ColorSpace::Rgb => color.rgb_point(),
            ColorSpace::Lab => color.to_lab(),
        }
    }

    /// Map a point of this space back to the nearest displayable RGB triple
    pub fn to_rgb(self, point: Point) -> [u8; 3] {
        match self {
            ColorSpace::Rgb => point.map(round_channel),
            ColorSpace::Lab => lab_to_rgb(point),
        }
    }
}

/// sRGB -> CIEXYZ -> CIELAB with the D65 reference white
pub fn rgb_to_lab(rgb: [u8; 3]) -> Point {
    let srgb: Srgb<f64> = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format();
    let lab: Lab<D65, f64> = Lab::from_color(srgb);
    [lab.l, lab.a, lab.b]
}

/// CIELAB -> sRGB, clamped to the sRGB gamut and rounded to integer channels
pub fn lab_to_rgb(lab: Point) -> [u8; 3] {
    let srgb: Srgb<f64> = Srgb::from_color(Lab::<D65, f64>::new(lab[0], lab[1], lab[2]));
    [srgb.red, srgb.green, srgb.blue].map(|c| round_channel(c.clamp(0.0, 1.0) * 255.0))
}

/// Lowercase `#rrggbb` for an integer triple
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Lowercase `#rrggbb` for a floating point RGB coordinate, rounding each channel
pub fn to_hex(rgb: Point) -> String {
    rgb_to_hex(rgb.map(round_channel))
}

/// WCAG relative luminance of an RGB coordinate (channels in 0-255)
pub fn relative_luminance(rgb: Point) -> f64 {
    let linear = rgb.map(|channel| {
        let c = channel.clamp(0.0, 255.0) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * linear[0] + 0.7152 * linear[1] + 0.0722 * linear[2]
}

/// WCAG contrast ratio, from 1.0 (identical luminance) to 21.0 (black on white)
pub fn contrast_ratio(a: Point, b: Point) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

fn round_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

fn functional_args<'a>(token: &'a str, name: &str) -> Option<&'a str> {
    token
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn split_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_hex(token: &str, digits: &str) -> Result<[u8; 3]> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GroupingError::parse(token, "invalid hex digit"));
    }

    let expanded = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => digits.to_string(),
        n => {
            return Err(GroupingError::parse(
                token,
                format!("expected 3 or 6 hex digits, got {}", n),
            ))
        }
    };

    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16)
            .map_err(|e| GroupingError::parse(token, e.to_string()))?;
    }
    Ok(rgb)
}

fn parse_number(token: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .map_err(|_| GroupingError::parse(token, format!("invalid number '{}'", raw)))?;
    if !value.is_finite() {
        return Err(GroupingError::parse(token, format!("non-finite number '{}'", raw)));
    }
    Ok(value)
}

fn parse_rgb_args(token: &str, args: &str) -> Result<[u8; 3]> {
    let parts = split_args(args);
    if parts.len() != 3 {
        return Err(GroupingError::parse(token, "rgb() takes exactly three channels"));
    }

    let mut rgb = [0u8; 3];
    for (channel, part) in rgb.iter_mut().zip(parts) {
        let value = match part.strip_suffix('%') {
            Some(percent) => parse_number(token, percent)? / 100.0 * 255.0,
            None => parse_number(token, part)?,
        };
        *channel = round_channel(value);
    }
    Ok(rgb)
}

fn parse_hsl_args(token: &str, args: &str) -> Result<[u8; 3]> {
    let parts = split_args(args);
    if parts.len() != 3 {
        return Err(GroupingError::parse(token, "hsl() takes exactly three components"));
    }

    let hue = parse_number(token, parts[0].trim_end_matches("deg"))?;
    let mut fractions = [0.0f64; 2];
    for (fraction, part) in fractions.iter_mut().zip(&parts[1..]) {
        let percent = part
            .strip_suffix('%')
            .ok_or_else(|| GroupingError::parse(token, "saturation and lightness must be percentages"))?;
        *fraction = (parse_number(token, percent)? / 100.0).clamp(0.0, 1.0);
    }

    let hsl = Hsl::<palette::encoding::Srgb, f64>::new(hue, fractions[0], fractions[1]);
    let srgb: Srgb<f64> = Srgb::from_color(hsl);
    Ok([srgb.red, srgb.green, srgb.blue].map(|c| round_channel(c.clamp(0.0, 1.0) * 255.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Color::parse("#ff0000").unwrap().rgb(), [255, 0, 0]);
        assert_eq!(Color::parse("#F00").unwrap().rgb(), [255, 0, 0]);
        assert_eq!(Color::parse("  #0a0B0c ").unwrap().rgb(), [10, 11, 12]);
    }

    #[test]
    fn test_parse_named_and_functional() {
        assert_eq!(Color::parse("white").unwrap().rgb(), [255, 255, 255]);
        assert_eq!(Color::parse("Teal").unwrap().rgb(), [0, 128, 128]);
        assert_eq!(Color::parse("rgb(1, 2, 3)").unwrap().rgb(), [1, 2, 3]);
        assert_eq!(Color::parse("rgb(100%, 0%, 50%)").unwrap().rgb(), [255, 0, 128]);
        assert_eq!(Color::parse("rgb(300 -4 12.4)").unwrap().rgb(), [255, 0, 12]);
        assert_eq!(Color::parse("hsl(0, 100%, 50%)").unwrap().rgb(), [255, 0, 0]);
        assert_eq!(Color::parse("hsl(120deg, 100%, 50%)").unwrap().rgb(), [0, 255, 0]);
    }

    #[test]
    fn test_parse_rejects_non_colors() {
        for token in [
            "",
            "url(#gradient)",
            "none",
            "currentColor",
            "transparent",
            "#ffff",
            "#gggggg",
            "rgba(1, 2, 3, 0.5)",
            "rgb(1, 2)",
            "hsl(10, 20, 30)",
        ] {
            let result = Color::parse(token);
            assert!(
                matches!(result, Err(GroupingError::Parse { .. })),
                "{:?} should not parse",
                token
            );
        }
    }

    #[test]
    fn test_equality_ignores_token() {
        let short = Color::parse("#fff").unwrap();
        let named = Color::parse("white").unwrap();
        assert_eq!(short, named);
        assert_eq!(short.token(), "#fff");
        assert_eq!(named.token(), "white");

        let mut set = std::collections::HashSet::new();
        set.insert(short);
        assert!(!set.insert(named));
    }

    #[test]
    fn test_aliases_skip_repeated_spellings() {
        let mut white = Color::parse("#fff").unwrap();
        white.add_alias("white");
        white.add_alias(" WHITE ");
        white.add_alias("#FFF");
        white.add_alias("rgb(255, 255, 255)");

        assert_eq!(white.aliases(), ["white", "rgb(255, 255, 255)"]);
        assert_eq!(
            white.tokens().collect::<Vec<_>>(),
            vec!["#fff", "white", "rgb(255, 255, 255)"]
        );
    }

    #[test]
    fn test_lab_black_and_white() {
        let black = Color::from_rgb([0, 0, 0]).to_lab();
        assert!(black.iter().all(|v| v.abs() < 1e-6 && v.is_finite()));

        let white = Color::from_rgb([255, 255, 255]).to_lab();
        assert!((white[0] - 100.0).abs() < 0.01);
        assert!(white[1].abs() < 0.01);
        assert!(white[2].abs() < 0.01);
    }

    #[test]
    fn test_lab_reference_red() {
        let red = Color::from_rgb([255, 0, 0]).to_lab();
        assert!((red[0] - 53.24).abs() < 0.1);
        assert!((red[1] - 80.09).abs() < 0.2);
        assert!((red[2] - 67.20).abs() < 0.2);
    }

    #[test]
    fn test_lab_hex_round_trip() {
        for token in ["#ff0000", "#123456", "#fe0101", "#00ff7f", "#808080", "#000000", "#ffffff"] {
            let color = Color::parse(token).unwrap();
            let lab = color.to_lab();
            let back = ColorSpace::Lab.to_rgb(lab);
            assert_eq!(rgb_to_hex(back), token);
            assert_eq!(Color::from_lab(lab), color);

            let again = Color::parse(&rgb_to_hex(back)).unwrap().to_lab();
            for (x, y) in lab.iter().zip(again.iter()) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_to_hex_rounds_and_clamps() {
        assert_eq!(to_hex([254.6, 0.4, 127.5]), "#ff0080");
        assert_eq!(to_hex([300.0, -20.0, f64::NAN]), "#ff0000");
    }

    #[test]
    fn test_contrast_ratio() {
        let black = [0.0, 0.0, 0.0];
        let white = [255.0, 255.0, 255.0];
        assert!((contrast_ratio(black, white) - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(white, black) - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(white, white) - 1.0).abs() < 1e-12);
    }
}
