use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Opportunity band. Variants are declared from the weakest band up, so the
/// derived ordering follows the score: `Tier::Low < Tier::Prime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Low,
    Moderate,
    Strong,
    Prime,
}

impl Tier {
    /// Display order used by legends and charts: best band first.
    pub const ALL: [Tier; 4] = [Tier::Prime, Tier::Strong, Tier::Moderate, Tier::Low];

    /// Ordinal level, 4 being the top band.
    pub fn level(self) -> u8 {
        match self {
            Tier::Low => 1,
            Tier::Moderate => 2,
            Tier::Strong => 3,
            Tier::Prime => 4,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Tier::Low),
            2 => Some(Tier::Moderate),
            3 => Some(Tier::Strong),
            4 => Some(Tier::Prime),
            _ => None,
        }
    }

    /// Label as written in the data files' `MARKET_TIER` property.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Prime => "Tier 1 - Prime",
            Tier::Strong => "Tier 2 - Strong",
            Tier::Moderate => "Tier 3 - Moderate",
            Tier::Low => "Tier 4 - Low",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Tier::Prime => "prime",
            Tier::Strong => "strong",
            Tier::Moderate => "moderate",
            Tier::Low => "low",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Tier::Prime => "#2E7D32",
            Tier::Strong => "#1976D2",
            Tier::Moderate => "#F57C00",
            Tier::Low => "#757575",
        }
    }

    /// Accepts an ordinal level (`"4"`), a short name (`"prime"`) or a full
    /// label (`"Tier 1 - Prime"`), case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(level) = value.parse::<u8>() {
            return Tier::from_level(level);
        }
        Tier::ALL.into_iter().find(|tier| {
            value.eq_ignore_ascii_case(tier.label()) || value.eq_ignore_ascii_case(tier.short_name())
        })
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Lower bounds (inclusive) of the three upper bands. Anything below
/// `moderate` is `Tier::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub prime: f64,
    pub strong: f64,
    pub moderate: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            prime: 70.0,
            strong: 50.0,
            moderate: 30.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, score: f64) -> Tier {
        if score >= self.prime {
            Tier::Prime
        } else if score >= self.strong {
            Tier::Strong
        } else if score >= self.moderate {
            Tier::Moderate
        } else {
            Tier::Low
        }
    }

    /// Colour of the band a raw score falls in, for the "colour by score" map mode.
    pub fn score_color(&self, score: f64) -> &'static str {
        self.classify(score).color()
    }

    /// Legend text for a band, e.g. `Tier 2 - Strong (50-69)`.
    pub fn legend_label(&self, tier: Tier) -> String {
        match tier {
            Tier::Prime => format!("{} ({}+)", tier.label(), self.prime),
            Tier::Strong => format!("{} ({}-{})", tier.label(), self.strong, self.prime - 1.0),
            Tier::Moderate => format!("{} ({}-{})", tier.label(), self.moderate, self.strong - 1.0),
            Tier::Low => format!("{} (<{})", tier.label(), self.moderate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_bands() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.classify(75.3), Tier::Prime);
        assert_eq!(thresholds.classify(70.0), Tier::Prime);
        assert_eq!(thresholds.classify(69.9), Tier::Strong);
        assert_eq!(thresholds.classify(50.0), Tier::Strong);
        assert_eq!(thresholds.classify(30.0), Tier::Moderate);
        assert_eq!(thresholds.classify(29.99), Tier::Low);
        assert_eq!(thresholds.classify(0.0), Tier::Low);
    }

    #[test]
    fn test_parse_accepts_levels_names_and_labels() {
        assert_eq!(Tier::parse("4"), Some(Tier::Prime));
        assert_eq!(Tier::parse("1"), Some(Tier::Low));
        assert_eq!(Tier::parse("prime"), Some(Tier::Prime));
        assert_eq!(Tier::parse("Tier 1 - Prime"), Some(Tier::Prime));
        assert_eq!(Tier::parse(" tier 3 - moderate "), Some(Tier::Moderate));
        assert_eq!(Tier::parse("5"), None);
        assert_eq!(Tier::parse("platinum"), None);
    }

    #[test]
    fn test_ordering_follows_level() {
        assert!(Tier::Prime > Tier::Strong);
        assert!(Tier::Strong > Tier::Moderate);
        assert!(Tier::Moderate > Tier::Low);
        for tier in Tier::ALL {
            assert_eq!(Tier::from_level(tier.level()), Some(tier));
        }
    }

    #[test]
    fn test_legend_labels() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.legend_label(Tier::Prime), "Tier 1 - Prime (70+)");
        assert_eq!(thresholds.legend_label(Tier::Strong), "Tier 2 - Strong (50-69)");
        assert_eq!(thresholds.legend_label(Tier::Low), "Tier 4 - Low (<30)");
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Tier::Prime).unwrap();
        assert_eq!(json, "\"Tier 1 - Prime\"");
    }
}
