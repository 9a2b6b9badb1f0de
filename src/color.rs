use crate::LoadError;
use std::str::FromStr;

/// An RGBA color.
///
/// The default color is fully transparent black, which is also what an absent color attribute yields.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Constructs a color from its four channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse an optional attribute value, yielding the transparent default when it's absent.
    pub(crate) fn parse_or_default(value: Option<&str>) -> Result<Self, LoadError> {
        value.map_or(Ok(Self::default()), str::parse)
    }
}

impl FromStr for Color {
    type Err = LoadError;

    /// Parses `#RRGGBB` or `#AARRGGBB`, with the leading `#` optional.
    ///
    /// The six digit form is fully opaque.
    fn from_str(s: &str) -> Result<Self, LoadError> {
        let digits = s.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LoadError::malformed("color", s));
        }
        // All ASCII at this point, so byte slicing can't split a character
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        let parsed = match digits.len() {
            6 => channel(0).and_then(|r| Ok(Color::new(r, channel(2)?, channel(4)?, 0xFF))),
            8 => channel(0).and_then(|a| Ok(Color::new(channel(2)?, channel(4)?, channel(6)?, a))),
            _ => return Err(LoadError::malformed("color", s)),
        };
        parsed.map_err(|_| LoadError::malformed("color", s))
    }
}
