//! Domain types shared across the service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Polar hemisphere covered by a sea-ice extent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Both hemispheres, in the order refresh cycles visit them.
    pub const ALL: [Hemisphere; 2] = [Hemisphere::North, Hemisphere::South];

    /// Wire name used in upstream URLs and API paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hemisphere::North => "north",
            Hemisphere::South => "south",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "arctic" => Ok(Hemisphere::North),
            "south" | "antarctic" => Ok(Hemisphere::South),
            other => Err(Error::InvalidHemisphere(other.to_string())),
        }
    }
}

/// A single dated sea-ice extent observation. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtentReading {
    pub hemisphere: Hemisphere,
    pub date: NaiveDate,
    /// Ice-covered area in square kilometers.
    pub extent_km2: f64,
    /// Departure from the day-of-year climatology, when the index reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_km2: Option<f64>,
}

/// Classified views over one hemisphere's record.
///
/// All three views are derived from the same upstream fetch, so `latest`,
/// `monthly`, and `historical` always describe the same cycle. The cache
/// replaces the whole value on refresh.
#[derive(Debug, Clone, Serialize)]
pub struct HemisphereStatus {
    pub hemisphere: Hemisphere,
    /// Most recent valid reading.
    pub latest: ExtentReading,
    /// Trailing 30 days of daily readings, chronological. The final entry
    /// is always `latest`.
    pub monthly: Vec<ExtentReading>,
    /// Full record, chronological.
    pub historical: Vec<ExtentReading>,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hemisphere_parses_wire_names() {
        assert_eq!("north".parse::<Hemisphere>().expect("parse"), Hemisphere::North);
        assert_eq!("south".parse::<Hemisphere>().expect("parse"), Hemisphere::South);
        assert_eq!(" South ".parse::<Hemisphere>().expect("parse"), Hemisphere::South);
    }

    #[test]
    fn test_hemisphere_parses_common_aliases() {
        assert_eq!("arctic".parse::<Hemisphere>().expect("parse"), Hemisphere::North);
        assert_eq!("Antarctic".parse::<Hemisphere>().expect("parse"), Hemisphere::South);
    }

    #[test]
    fn test_hemisphere_rejects_unknown_values() {
        let err = "east".parse::<Hemisphere>().expect_err("should be rejected");
        assert!(matches!(err, Error::InvalidHemisphere(ref s) if s == "east"));
    }

    #[test]
    fn test_hemisphere_display_matches_wire_name() {
        assert_eq!(Hemisphere::North.to_string(), "north");
        assert_eq!(Hemisphere::South.to_string(), "south");
    }
}
