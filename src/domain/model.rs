use crate::domain::geometry::{Boundary, BoundingBox};
use crate::domain::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MunicipalityType {
    City,
    Village,
}

impl MunicipalityType {
    pub const ALL: [MunicipalityType; 2] = [MunicipalityType::City, MunicipalityType::Village];

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("city") {
            Some(MunicipalityType::City)
        } else if value.eq_ignore_ascii_case("village") {
            Some(MunicipalityType::Village)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MunicipalityType::City => "city",
            MunicipalityType::Village => "village",
        }
    }
}

impl fmt::Display for MunicipalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Municipality {
    pub name: String,
    /// Canonical spelling taken from the matching county record.
    pub county: String,
    pub kind: MunicipalityType,
    pub population: u64,
    pub median_income: Option<f64>,
    /// Market Potential Index.
    pub index_score: Option<f64>,
    pub opportunity_score: f64,
    pub opportunity_rank: u32,
    pub market_size: Option<f64>,
    pub tier: Tier,
    pub lifemode: Option<String>,
    pub boundary: Boundary,
}

impl Municipality {
    pub fn bbox(&self) -> BoundingBox {
        self.boundary.bbox()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountyStats {
    pub municipality_count: usize,
    pub population: u64,
    pub market_size: f64,
    pub mean_score: Option<f64>,
    pub mean_index: Option<f64>,
}

impl CountyStats {
    /// Sums and means over the given members; means are `None` when there is nothing to average.
    pub fn from_members<'a>(members: impl IntoIterator<Item = &'a Municipality>) -> Self {
        let mut stats = CountyStats::default();
        let mut score_sum = 0.0;
        let mut index_sum = 0.0;
        let mut index_count = 0usize;

        for m in members {
            stats.municipality_count += 1;
            stats.population += m.population;
            stats.market_size += m.market_size.unwrap_or(0.0);
            score_sum += m.opportunity_score;
            if let Some(index) = m.index_score {
                index_sum += index;
                index_count += 1;
            }
        }

        if stats.municipality_count > 0 {
            stats.mean_score = Some(score_sum / stats.municipality_count as f64);
        }
        if index_count > 0 {
            stats.mean_index = Some(index_sum / index_count as f64);
        }
        stats
    }
}

#[derive(Debug, Clone)]
pub struct County {
    pub name: String,
    pub boundary: Boundary,
    pub stats: CountyStats,
}

/// Normalised form under which county names are compared: trimmed, Unicode lowercase.
pub fn county_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl County {
    pub fn matches(&self, name: &str) -> bool {
        county_key(&self.name) == county_key(name)
    }
}

/// Everything read at startup. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub municipalities: Vec<Municipality>,
    pub counties: Vec<County>,
    pub cities: Vec<Municipality>,
    pub villages: Vec<Municipality>,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn county(&self, name: &str) -> Option<&County> {
        self.counties.iter().find(|c| c.matches(name))
    }

    /// Distinct county names referenced by municipalities, sorted.
    pub fn county_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.municipalities.iter().map(|m| m.county.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn top_ranked(&self) -> Option<&Municipality> {
        self.municipalities.iter().min_by_key(|m| m.opportunity_rank)
    }

    pub fn total_population(&self) -> u64 {
        self.municipalities.iter().map(|m| m.population).sum()
    }
}
