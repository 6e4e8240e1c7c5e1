//! Aspect-ratio hints for the interactive crop UI.
//!
//! The ratio only shapes the rectangle the UI proposes; the crop itself
//! always follows the four insets.

use crate::core::error::AspectRatioError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ratio presets offered by the UI dropdown.
pub const RATIO_PRESETS: [&str; 8] = ["1:1", "4:3", "3:4", "16:9", "9:16", "2:3", "3:2", "21:9"];

/// Width divided by height; always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio(1.0);

    /// Parse `"W:H"`, `"W/H"` or a bare decimal such as `"1.5"`.
    pub fn parse_strict(text: &str) -> Result<Self, AspectRatioError> {
        let normalized = text.trim().replace('/', ":");
        let malformed = || AspectRatioError::Malformed(text.to_string());

        let parts: Vec<&str> = normalized.split(':').map(str::trim).collect();
        let value = match parts.as_slice() {
            [single] => single.parse::<f64>().map_err(|_| malformed())?,
            [w, h] => {
                let w = w.parse::<f64>().map_err(|_| malformed())?;
                let h = h.parse::<f64>().map_err(|_| malformed())?;
                w / h
            }
            _ => return Err(malformed()),
        };

        if !value.is_finite() || value <= 0.0 {
            return Err(AspectRatioError::OutOfRange(text.to_string()));
        }
        Ok(Self(value))
    }

    /// Parse leniently: anything unusable falls back to 1:1.
    pub fn parse(text: &str) -> Self {
        Self::parse_strict(text).unwrap_or_else(|err| {
            log::warn!("{}; falling back to 1:1", err);
            Self::SQUARE
        })
    }

    /// Width divided by height.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether `text` is one of the dropdown presets.
    pub fn is_preset(text: &str) -> bool {
        RATIO_PRESETS.contains(&text.trim())
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_pairs() {
        assert_relative_eq!(AspectRatio::parse_strict("16:9").unwrap().value(), 16.0 / 9.0);
        assert_relative_eq!(AspectRatio::parse_strict("3/2").unwrap().value(), 1.5);
        assert_relative_eq!(AspectRatio::parse_strict(" 4 : 3 ").unwrap().value(), 4.0 / 3.0);
    }

    #[test]
    fn test_parse_decimal() {
        assert_relative_eq!(AspectRatio::parse_strict("2.35").unwrap().value(), 2.35);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            AspectRatio::parse_strict("wide"),
            Err(AspectRatioError::Malformed(_))
        ));
        assert!(matches!(
            AspectRatio::parse_strict("1:2:3"),
            Err(AspectRatioError::Malformed(_))
        ));
        assert!(matches!(
            AspectRatio::parse_strict("16:0"),
            Err(AspectRatioError::OutOfRange(_))
        ));
        assert!(matches!(
            AspectRatio::parse_strict("-1"),
            Err(AspectRatioError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_lenient_parse_falls_back_to_square() {
        assert_eq!(AspectRatio::parse(""), AspectRatio::SQUARE);
        assert_eq!(AspectRatio::parse("Custom"), AspectRatio::SQUARE);
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio(9.0 / 16.0));
    }

    #[test]
    fn test_every_preset_parses() {
        for preset in RATIO_PRESETS {
            assert!(AspectRatio::parse_strict(preset).is_ok(), "{}", preset);
            assert!(AspectRatio::is_preset(preset));
        }
        assert!(!AspectRatio::is_preset("5:4"));
    }
}
