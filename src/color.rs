use palette::Srgb;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("hex color must be 6 characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex digits in {0:?}")]
    InvalidDigits(String),
}

/// One palette swatch: a sampled color and how many grid samples hit it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorEntry {
    pub hex: String,
    pub rgb: Srgb<u8>,
    pub count: u64,
}

impl ColorEntry {
    pub(crate) fn first_seen(rgb: Srgb<u8>) -> Self {
        Self {
            hex: hex_code(rgb),
            rgb,
            count: 1,
        }
    }

    /// Text shown under a swatch, e.g. `rgb(255, 0, 0)`.
    pub fn rgb_string(&self) -> String {
        format!("rgb({}, {}, {})", self.rgb.red, self.rgb.green, self.rgb.blue)
    }
}

/// `#RRGGBB`, uppercase.
pub fn hex_code(c: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
}

/// Parse `#RRGGBB` or `RRGGBB` (either case) back into a color.
pub fn parse_hex(s: &str) -> Result<Srgb<u8>, ColorError> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(ColorError::InvalidLength(hex.len()));
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(|| ColorError::InvalidDigits(s.to_string()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_uppercase_and_zero_padded() {
        assert_eq!(hex_code(Srgb::new(255, 0, 10)), "#FF000A");
        assert_eq!(hex_code(Srgb::new(0, 0, 0)), "#000000");
        assert_eq!(hex_code(Srgb::new(171, 205, 239)), "#ABCDEF");
    }

    #[test]
    fn parse_accepts_both_cases_and_optional_hash() {
        assert_eq!(parse_hex("#abcdef").unwrap(), Srgb::new(171, 205, 239));
        assert_eq!(parse_hex("ABCDEF").unwrap(), Srgb::new(171, 205, 239));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_hex("#FFF"), Err(ColorError::InvalidLength(3)));
        assert!(matches!(parse_hex("#GG0000"), Err(ColorError::InvalidDigits(_))));
        // multi-byte chars must not panic on slicing
        assert!(parse_hex("#é0000").is_err());
    }

    #[test]
    fn hex_round_trips_every_channel_value() {
        for v in 0..=255u8 {
            let c = Srgb::new(v, 255 - v, v / 3);
            assert_eq!(parse_hex(&hex_code(c)).unwrap(), c);
        }
    }

    #[test]
    fn rgb_string_matches_swatch_caption() {
        let entry = ColorEntry::first_seen(Srgb::new(12, 34, 56));
        assert_eq!(entry.rgb_string(), "rgb(12, 34, 56)");
        assert_eq!(entry.hex, "#0C2238");
        assert_eq!(entry.count, 1);
    }
}
