//! Target engine versions
//!
//! The engine's script syntax drifted between releases (filter names, the
//! output-mask switch, log wording). Emitters branch on the version carried
//! by the script they write into.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeshScriptError;

/// MeshLab release a script is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EngineVersion {
    #[serde(rename = "1.3.3")]
    V1_3_3,
    #[serde(rename = "1.3.4BETA")]
    V1_3_4Beta,
    #[serde(rename = "2016.12")]
    V2016_12,
}

impl EngineVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_3_3 => "1.3.3",
            Self::V1_3_4Beta => "1.3.4BETA",
            Self::V2016_12 => "2016.12",
        }
    }

    /// Command-line switch that introduces an output mask
    ///
    /// 1.3.4BETA renamed `-om` to `-m`.
    pub fn output_mask_flag(&self) -> &'static str {
        if *self < Self::V1_3_4Beta {
            "-om"
        } else {
            "-m"
        }
    }

    /// Whitespace-token index of the value on the engine's surface-area log line
    pub fn surface_area_token(&self) -> usize {
        match self {
            Self::V1_3_4Beta => 3,
            _ => 4,
        }
    }
}

impl Default for EngineVersion {
    fn default() -> Self {
        Self::V2016_12
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EngineVersion {
    type Err = MeshScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1.3.3" => Ok(Self::V1_3_3),
            "1.3.4BETA" | "1.3.4" => Ok(Self::V1_3_4Beta),
            "2016.12" => Ok(Self::V2016_12),
            other => Err(MeshScriptError::Config(format!(
                "unknown engine version '{}' (expected 1.3.3, 1.3.4BETA or 2016.12)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering_and_mask_flag() {
        assert!(EngineVersion::V1_3_3 < EngineVersion::V1_3_4Beta);
        assert!(EngineVersion::V1_3_4Beta < EngineVersion::V2016_12);
        assert_eq!(EngineVersion::V1_3_3.output_mask_flag(), "-om");
        assert_eq!(EngineVersion::V1_3_4Beta.output_mask_flag(), "-m");
        assert_eq!(EngineVersion::V2016_12.output_mask_flag(), "-m");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "1.3.4beta".parse::<EngineVersion>().unwrap(),
            EngineVersion::V1_3_4Beta
        );
        assert_eq!(
            "2016.12".parse::<EngineVersion>().unwrap(),
            EngineVersion::V2016_12
        );
        assert!("2020.07".parse::<EngineVersion>().is_err());
    }
}
