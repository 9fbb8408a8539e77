//! Canonical aspect ratios.
//!
//! Callers speak this vocabulary; each adapter translates it into its own
//! (pixel sizes, named presets or raw ratio strings) and rejects what it
//! cannot express.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::GenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    /// 1:1
    #[default]
    Square,
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    /// 4:3
    Classic,
    /// 3:4
    ClassicPortrait,
    /// 3:2
    Photo,
    /// 2:3
    PhotoPortrait,
    /// 21:9
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 8] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Classic,
        AspectRatio::ClassicPortrait,
        AspectRatio::Photo,
        AspectRatio::PhotoPortrait,
        AspectRatio::Ultrawide,
    ];

    /// Ratio in `W:H` notation
    pub fn as_ratio(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Classic => "4:3",
            AspectRatio::ClassicPortrait => "3:4",
            AspectRatio::Photo => "3:2",
            AspectRatio::PhotoPortrait => "2:3",
            AspectRatio::Ultrawide => "21:9",
        }
    }

    pub fn is_portrait(&self) -> bool {
        matches!(
            self,
            AspectRatio::Portrait | AspectRatio::ClassicPortrait | AspectRatio::PhotoPortrait
        )
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ratio())
    }
}

impl FromStr for AspectRatio {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.trim().to_lowercase().split_whitespace().collect();
        match normalized.as_str() {
            "1:1" | "square" => Ok(AspectRatio::Square),
            "16:9" | "landscape" => Ok(AspectRatio::Landscape),
            "9:16" | "portrait" => Ok(AspectRatio::Portrait),
            "4:3" => Ok(AspectRatio::Classic),
            "3:4" => Ok(AspectRatio::ClassicPortrait),
            "3:2" => Ok(AspectRatio::Photo),
            "2:3" => Ok(AspectRatio::PhotoPortrait),
            "21:9" => Ok(AspectRatio::Ultrawide),
            _ => Err(GenError::unsupported("aspect_ratio", s)),
        }
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = GenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.as_ratio().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCode;

    #[test]
    fn test_parse_ratios_and_aliases() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert_eq!(" 9 : 16 ".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!("Square".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!("21:9".parse::<AspectRatio>().unwrap(), AspectRatio::Ultrawide);
    }

    #[test]
    fn test_parse_rejects_unknown_ratio() {
        let err = "7:5".parse::<AspectRatio>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedParameter);
    }

    #[test]
    fn test_display_matches_parse() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.to_string().parse::<AspectRatio>().unwrap(), ratio);
        }
    }

    #[test]
    fn test_serde_uses_ratio_strings() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Classic).unwrap(),
            "\"4:3\""
        );
        let parsed: AspectRatio = serde_json::from_str("\"3:2\"").unwrap();
        assert_eq!(parsed, AspectRatio::Photo);
        assert!(serde_json::from_str::<AspectRatio>("\"5:1\"").is_err());
    }
}
