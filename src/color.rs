//! Color primitives and conversions.
//!
//! Everything downstream of the API boundary works in 8-bit RGB; HSV and hex
//! inputs are converted here at the edge.

use crate::error::LightError;

/// All pixels off.
pub const BLACK: Color = Color::new(0, 0, 0);

/// Canonical triple for the Available status.
pub const AVAILABLE: Color = Color::new(0, 144, 0);
/// Canonical triple for the Busy status.
pub const BUSY: Color = Color::new(179, 0, 0);
/// Canonical triple for the Away status.
pub const AWAY: Color = Color::new(255, 191, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert from integer HSV: hue in degrees (0-360), saturation and
    /// value in percent (0-100). Channels are rounded, not truncated.
    pub fn from_hsv(hue: u16, saturation: u8, value: u8) -> Self {
        let h = f32::from(hue % 360) / 60.0;
        let s = f32::from(saturation.min(100)) / 100.0;
        let v = f32::from(value.min(100)) / 100.0;

        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        Self {
            r: (r * 255.0).round() as u8,
            g: (g * 255.0).round() as u8,
            b: (b * 255.0).round() as u8,
        }
    }

    /// Parse an `RRGGBB` or `#RRGGBB` hex string.
    pub fn from_hex(s: &str) -> Result<Self, LightError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LightError::InvalidFormat(s.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| LightError::InvalidFormat(s.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Lowercase `rrggbb` without the `#`, the inverse of [`Color::from_hex`].
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 100, 255, 255, 255)] // white
    #[case(0, 100, 100, 255, 0, 0)] // red
    #[case(120, 100, 100, 0, 255, 0)] // green
    #[case(240, 100, 100, 0, 0, 255)] // blue
    #[case(45, 100, 100, 255, 191, 0)] // the Away yellow
    #[case(0, 0, 0, 0, 0, 0)] // black
    fn test_from_hsv(
        #[case] h: u16,
        #[case] s: u8,
        #[case] v: u8,
        #[case] r: u8,
        #[case] g: u8,
        #[case] b: u8,
    ) {
        assert_eq!(Color::from_hsv(h, s, v), Color::new(r, g, b));
    }

    #[test]
    fn from_hsv_wraps_at_360() {
        assert_eq!(Color::from_hsv(360, 100, 100), Color::from_hsv(0, 100, 100));
        assert_eq!(Color::from_hsv(480, 100, 100), Color::from_hsv(120, 100, 100));
    }

    #[test]
    fn from_hsv_rounds_instead_of_truncating() {
        // hue 45 puts green at 191.25; truncation would give 191 too, so use
        // hue 105 where green is 255 and red is 63.75 -> 64.
        assert_eq!(Color::from_hsv(105, 100, 100), Color::new(64, 255, 0));
    }

    #[rstest]
    #[case("009000", 0, 144, 0)]
    #[case("#009000", 0, 144, 0)]
    #[case("b30000", 179, 0, 0)]
    #[case("#FFBF00", 255, 191, 0)]
    #[case("000000", 0, 0, 0)]
    #[case("ffffff", 255, 255, 255)]
    fn test_from_hex(#[case] input: &str, #[case] r: u8, #[case] g: u8, #[case] b: u8) {
        assert_eq!(Color::from_hex(input).unwrap(), Color::new(r, g, b));
    }

    #[rstest]
    #[case("")]
    #[case("fff")]
    #[case("#fff")]
    #[case("aabbccdd")]
    #[case("#aabbccdd")]
    #[case("zzzzzz")]
    #[case("##aabb")]
    fn test_from_hex_rejects_bad_input(#[case] input: &str) {
        assert!(matches!(
            Color::from_hex(input),
            Err(LightError::InvalidFormat(_))
        ));
    }

    #[rstest]
    #[case(Color::new(0, 144, 0))]
    #[case(Color::new(179, 0, 0))]
    #[case(Color::new(255, 191, 0))]
    #[case(Color::new(0, 0, 0))]
    #[case(Color::new(255, 255, 255))]
    #[case(Color::new(1, 2, 3))]
    fn test_hex_round_trip(#[case] color: Color) {
        assert_eq!(Color::from_hex(&color.to_hex()).unwrap(), color);
    }

    #[test]
    fn to_hex_is_lowercase_without_prefix() {
        assert_eq!(Color::new(255, 191, 0).to_hex(), "ffbf00");
    }
}
