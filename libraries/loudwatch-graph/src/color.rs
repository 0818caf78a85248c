//! Colors packed as `0xAARRGGBB`
//!
//! The same packing other video elements use for their color properties:
//! alpha in the most significant byte, then red, green, blue.

use crate::error::GraphError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A packed ARGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgbColor(u32);

impl ArgbColor {
    pub const fn new(argb: u32) -> Self {
        Self(argb)
    }

    pub const fn from_components(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self(u32::from_be_bytes([alpha, red, green, blue]))
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// `(alpha, red, green, blue)`
    pub const fn components(self) -> (u8, u8, u8, u8) {
        let [alpha, red, green, blue] = self.0.to_be_bytes();
        (alpha, red, green, blue)
    }

    pub const fn alpha(self) -> u8 {
        self.components().0
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        let (alpha, red, green, blue) = self.components();
        tiny_skia::Color::from_rgba8(red, green, blue, alpha)
    }
}

impl From<u32> for ArgbColor {
    fn from(argb: u32) -> Self {
        Self(argb)
    }
}

impl fmt::Display for ArgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl FromStr for ArgbColor {
    type Err = GraphError;

    /// Accepts `0xAARRGGBB`, `#AARRGGBB` or a decimal integer
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .or_else(|| trimmed.strip_prefix('#'))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => trimmed.parse::<u32>(),
        };
        parsed
            .map(Self)
            .map_err(|e| GraphError::InvalidSettings(format!("invalid color {:?}: {}", s, e)))
    }
}

impl Serialize for ArgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for ArgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ArgbColorVisitor)
    }
}

struct ArgbColorVisitor;

impl<'de> Visitor<'de> for ArgbColorVisitor {
    type Value = ArgbColor;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an ARGB color as integer or \"0xAARRGGBB\" string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ArgbColor, E> {
        u32::try_from(value)
            .map(ArgbColor)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ArgbColor, E> {
        u32::try_from(value)
            .map(ArgbColor)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ArgbColor, E> {
        value.parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_are_big_endian_argb() {
        let color = ArgbColor::new(0x4CFF_8001);
        assert_eq!(color.components(), (0x4C, 0xFF, 0x80, 0x01));
        assert_eq!(ArgbColor::from_components(0x4C, 0xFF, 0x80, 0x01), color);
        assert_eq!(color.alpha(), 0x4C);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!("0xFF00CC00".parse::<ArgbColor>().unwrap().value(), 0xFF00_CC00);
        assert_eq!("#99000000".parse::<ArgbColor>().unwrap().value(), 0x9900_0000);
        assert_eq!("4278190080".parse::<ArgbColor>().unwrap().value(), 0xFF00_0000);
        assert!("green".parse::<ArgbColor>().is_err());
        assert!("0x1FF00CC00".parse::<ArgbColor>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let color = ArgbColor::new(0x0000_00FF);
        assert_eq!(color.to_string(), "0x000000FF");
        assert_eq!(color.to_string().parse::<ArgbColor>().unwrap(), color);
    }

    #[test]
    fn test_deserialize_integer_or_string() {
        let from_int: ArgbColor = serde_json::from_str("4278255360").unwrap();
        let from_str: ArgbColor = serde_json::from_str("\"0xFF00FF00\"").unwrap();
        assert_eq!(from_int, from_str);
        assert!(serde_json::from_str::<ArgbColor>("-1").is_err());
        assert_eq!(serde_json::to_string(&from_int).unwrap(), "4278255360");
    }

    #[test]
    fn test_to_skia() {
        let color = ArgbColor::new(0xFF00_0000).to_skia();
        assert_eq!(color.alpha(), 1.0);
        assert_eq!(color.red(), 0.0);
    }
}
