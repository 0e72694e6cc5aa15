//! Filter selection and application.
//!
//! A selection has three dimensions (county, tier, type). A record passes when
//! it matches every non-empty dimension; an empty dimension places no
//! restriction. Unrecognised raw values are dropped with a [`FilterError`] so
//! a bad value never narrows the result to nothing.

use crate::domain::model::{Dataset, Municipality, MunicipalityType};
use crate::domain::tier::Tier;
use crate::utils::error::FilterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw, untrusted filter values as they arrive from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub counties: Vec<String>,
    #[serde(default)]
    pub tiers: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl FilterRequest {
    /// Builds a request from comma-separated parameter values.
    pub fn from_delimited(counties: Option<&str>, tiers: Option<&str>, types: Option<&str>) -> Self {
        Self {
            counties: split_values(counties),
            tiers: split_values(tiers),
            types: split_values(types),
        }
    }
}

fn split_values(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub counties: BTreeSet<String>,
    pub tiers: BTreeSet<Tier>,
    pub types: BTreeSet<MunicipalityType>,
}

/// A typed selection plus the raw values that were dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFilter {
    pub selection: FilterSelection,
    pub ignored: Vec<FilterError>,
}

impl FilterSelection {
    /// Resolves raw values against the loaded data. Counties are matched
    /// case-insensitively and stored in the dataset's spelling.
    pub fn resolve(request: &FilterRequest, dataset: &Dataset) -> ResolvedFilter {
        let mut resolved = ResolvedFilter::default();

        for raw in &request.counties {
            match dataset.county(raw) {
                Some(county) => {
                    resolved.selection.counties.insert(county.name.clone());
                }
                None => resolved.ignored.push(FilterError::UnknownCounty(raw.clone())),
            }
        }

        for raw in &request.tiers {
            match Tier::parse(raw) {
                Some(tier) => {
                    resolved.selection.tiers.insert(tier);
                }
                None => resolved.ignored.push(FilterError::UnknownTier(raw.clone())),
            }
        }

        for raw in &request.types {
            if raw.trim().eq_ignore_ascii_case("both") {
                resolved.selection.types.extend(MunicipalityType::ALL);
                continue;
            }
            match MunicipalityType::parse(raw) {
                Some(kind) => {
                    resolved.selection.types.insert(kind);
                }
                None => resolved.ignored.push(FilterError::UnknownType(raw.clone())),
            }
        }

        for error in &resolved.ignored {
            tracing::warn!("Ignoring {} filter value '{}': {}", error.dimension(), error.value(), error);
        }

        resolved
    }

    pub fn is_unrestricted(&self) -> bool {
        self.counties.is_empty() && self.tiers.is_empty() && self.types.is_empty()
    }

    pub fn matches(&self, record: &Municipality) -> bool {
        (self.counties.is_empty() || self.counties.contains(&record.county))
            && (self.tiers.is_empty() || self.tiers.contains(&record.tier))
            && (self.types.is_empty() || self.types.contains(&record.kind))
    }

    /// Matching records in input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a Municipality>
    where
        I: IntoIterator<Item = &'a Municipality>,
    {
        records.into_iter().filter(|m| self.matches(m)).collect()
    }
}

/// The values a user can pick from.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub counties: Vec<String>,
    pub tiers: Vec<TierOption>,
    pub types: Vec<MunicipalityType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierOption {
    pub level: u8,
    pub label: &'static str,
    pub color: &'static str,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            counties: dataset.county_names(),
            tiers: Tier::ALL
                .into_iter()
                .map(|tier| TierOption {
                    level: tier.level(),
                    label: tier.label(),
                    color: tier.color(),
                })
                .collect(),
            types: MunicipalityType::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Boundary;
    use crate::domain::model::{County, CountyStats};
    use crate::domain::tier::TierThresholds;
    use serde_json::json;

    fn boundary() -> Boundary {
        Boundary::from_geojson(json!({
            "type": "Polygon",
            "coordinates": [[[-73.9, 40.9], [-73.8, 40.9], [-73.8, 41.0], [-73.9, 40.9]]]
        }))
        .unwrap()
    }

    fn record(name: &str, county: &str, kind: MunicipalityType, score: f64, rank: u32) -> Municipality {
        Municipality {
            name: name.to_string(),
            county: county.to_string(),
            kind,
            population: 1000,
            median_income: None,
            index_score: None,
            opportunity_score: score,
            opportunity_rank: rank,
            market_size: None,
            tier: TierThresholds::default().classify(score),
            lifemode: None,
            boundary: boundary(),
        }
    }

    fn dataset() -> Dataset {
        let counties = ["Westchester", "Albany", "Dutchess"]
            .into_iter()
            .map(|name| County {
                name: name.to_string(),
                boundary: boundary(),
                stats: CountyStats::default(),
            })
            .collect();

        Dataset {
            municipalities: vec![
                record("Yonkers", "Westchester", MunicipalityType::City, 75.3, 1),
                record("Scarsdale", "Westchester", MunicipalityType::Village, 44.0, 4),
                record("Albany", "Albany", MunicipalityType::City, 58.2, 2),
                record("Millbrook", "Dutchess", MunicipalityType::Village, 22.5, 5),
                record("Poughkeepsie", "Dutchess", MunicipalityType::City, 51.0, 3),
            ],
            counties,
            cities: vec![],
            villages: vec![],
            loaded_at: chrono::Utc::now(),
        }
    }

    fn names(records: &[&Municipality]) -> Vec<String> {
        records.iter().map(|m| m.name.clone()).collect()
    }

    #[test]
    fn test_empty_selection_returns_everything() {
        let data = dataset();
        let resolved = FilterSelection::resolve(&FilterRequest::default(), &data);

        assert!(resolved.selection.is_unrestricted());
        assert_eq!(resolved.selection.apply(&data.municipalities).len(), 5);
    }

    #[test]
    fn test_dimensions_combine_with_and() {
        let data = dataset();
        let request = FilterRequest::from_delimited(Some("Westchester,Dutchess"), None, Some("city"));
        let resolved = FilterSelection::resolve(&request, &data);

        let filtered = resolved.selection.apply(&data.municipalities);
        assert_eq!(names(&filtered), vec!["Yonkers", "Poughkeepsie"]);
        assert!(resolved.ignored.is_empty());
    }

    #[test]
    fn test_unknown_county_is_ignored() {
        let data = dataset();
        let request = FilterRequest::from_delimited(Some("Nowhere County"), None, None);
        let resolved = FilterSelection::resolve(&request, &data);

        assert!(resolved.selection.counties.is_empty());
        assert_eq!(resolved.ignored, vec![FilterError::UnknownCounty("Nowhere County".to_string())]);
        assert_eq!(resolved.selection.apply(&data.municipalities).len(), 5);
    }

    #[test]
    fn test_unknown_value_does_not_drop_valid_siblings() {
        let data = dataset();
        let request = FilterRequest::from_delimited(Some("albany, Nowhere County"), Some("4,platinum"), Some("hamlet"));
        let resolved = FilterSelection::resolve(&request, &data);

        assert_eq!(resolved.selection.counties.iter().collect::<Vec<_>>(), vec!["Albany"]);
        assert_eq!(resolved.selection.tiers.iter().copied().collect::<Vec<_>>(), vec![Tier::Prime]);
        assert!(resolved.selection.types.is_empty());
        assert_eq!(resolved.ignored.len(), 3);
        assert!(resolved.selection.apply(&data.municipalities).is_empty());
    }

    #[test]
    fn test_both_types_is_unrestricted_on_type() {
        let data = dataset();
        let both = FilterSelection::resolve(&FilterRequest::from_delimited(None, None, Some("both")), &data);
        let none = FilterSelection::resolve(&FilterRequest::default(), &data);

        assert_eq!(
            both.selection.apply(&data.municipalities).len(),
            none.selection.apply(&data.municipalities).len()
        );
    }

    #[test]
    fn test_tier_filter_by_level_and_label() {
        let data = dataset();
        let by_level = FilterSelection::resolve(&FilterRequest::from_delimited(None, Some("4"), None), &data);
        let by_label = FilterSelection::resolve(&FilterRequest::from_delimited(None, Some("Tier 1 - Prime"), None), &data);

        assert_eq!(names(&by_level.selection.apply(&data.municipalities)), vec!["Yonkers"]);
        assert_eq!(by_level.selection, by_label.selection);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let data = dataset();
        let request = FilterRequest::from_delimited(None, Some("strong,prime"), None);
        let selection = FilterSelection::resolve(&request, &data).selection;

        let once = selection.apply(&data.municipalities);
        let twice = selection.apply(once.iter().copied());
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn test_options_list_sorted_counties() {
        let options = FilterOptions::from_dataset(&dataset());
        assert_eq!(options.counties, vec!["Albany", "Dutchess", "Westchester"]);
        assert_eq!(options.tiers.len(), 4);
        assert_eq!(options.tiers[0].label, "Tier 1 - Prime");
        assert_eq!(options.tiers[0].level, 4);
    }
}
