//! Property-based tests for the filter layer and tier classification.

use chrono::Utc;
use hv_market_dash::core::filter::{FilterRequest, FilterSelection};
use hv_market_dash::domain::geometry::Boundary;
use hv_market_dash::domain::model::{County, CountyStats, Dataset, Municipality, MunicipalityType};
use hv_market_dash::domain::tier::{Tier, TierThresholds};
use proptest::prelude::*;
use serde_json::json;

const COUNTIES: [&str; 4] = ["Westchester", "Albany", "Nassau", "Dutchess"];

fn boundary() -> Boundary {
    Boundary::from_geojson(json!({
        "type": "Polygon",
        "coordinates": [[[-73.9, 41.0], [-73.8, 41.0], [-73.8, 41.1], [-73.9, 41.0]]]
    }))
    .unwrap()
}

fn municipality() -> impl Strategy<Value = (usize, bool, u64, f64)> {
    (0..COUNTIES.len(), any::<bool>(), 100u64..300_000, 0.0f64..100.0)
}

fn dataset(rows: Vec<(usize, bool, u64, f64)>) -> Dataset {
    let thresholds = TierThresholds::default();
    let municipalities: Vec<Municipality> = rows
        .into_iter()
        .enumerate()
        .map(|(i, (county, is_city, population, score))| Municipality {
            name: format!("Place {}", i),
            county: COUNTIES[county].to_string(),
            kind: if is_city { MunicipalityType::City } else { MunicipalityType::Village },
            population,
            median_income: None,
            index_score: None,
            opportunity_score: score,
            opportunity_rank: i as u32 + 1,
            market_size: None,
            tier: thresholds.classify(score),
            lifemode: None,
            boundary: boundary(),
        })
        .collect();

    let counties = COUNTIES
        .iter()
        .map(|name| County {
            name: name.to_string(),
            boundary: boundary(),
            stats: CountyStats::from_members(municipalities.iter().filter(|m| m.county == *name)),
        })
        .collect();

    Dataset {
        municipalities,
        counties,
        cities: Vec::new(),
        villages: Vec::new(),
        loaded_at: Utc::now(),
    }
}

/// Raw values as a user could type them, including unknown ones.
fn raw_request() -> impl Strategy<Value = FilterRequest> {
    let county = prop_oneof![
        Just("Westchester".to_string()),
        Just("albany".to_string()),
        Just("NASSAU".to_string()),
        Just("Dutchess".to_string()),
        Just("Nowhere County".to_string()),
    ];
    let tier = prop_oneof![
        (1u8..=4).prop_map(|l| l.to_string()),
        Just("prime".to_string()),
        Just("Tier 3 - Moderate".to_string()),
        Just("9".to_string()),
        Just("platinum".to_string()),
    ];
    let kind = prop_oneof![
        Just("city".to_string()),
        Just("Village".to_string()),
        Just("both".to_string()),
        Just("hamlet".to_string()),
    ];

    (
        prop::collection::vec(county, 0..3),
        prop::collection::vec(tier, 0..3),
        prop::collection::vec(kind, 0..2),
    )
        .prop_map(|(counties, tiers, types)| FilterRequest { counties, tiers, types })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn filtered_records_satisfy_every_restricted_dimension(
        rows in prop::collection::vec(municipality(), 0..40),
        request in raw_request()
    ) {
        let data = dataset(rows);
        let resolved = FilterSelection::resolve(&request, &data);
        let selection = &resolved.selection;
        let filtered = selection.apply(&data.municipalities);

        prop_assert!(filtered.len() <= data.municipalities.len());
        for record in &filtered {
            prop_assert!(selection.counties.is_empty() || selection.counties.contains(&record.county));
            prop_assert!(selection.tiers.is_empty() || selection.tiers.contains(&record.tier));
            prop_assert!(selection.types.is_empty() || selection.types.contains(&record.kind));
        }

        let excluded = data.municipalities.len() - filtered.len();
        let rejected = data.municipalities.iter().filter(|m| !selection.matches(m)).count();
        prop_assert_eq!(excluded, rejected);
    }

    #[test]
    fn filtering_is_idempotent(
        rows in prop::collection::vec(municipality(), 0..40),
        request in raw_request()
    ) {
        let data = dataset(rows);
        let selection = FilterSelection::resolve(&request, &data).selection;

        let once = selection.apply(&data.municipalities);
        let twice = selection.apply(once.iter().copied());
        let once_names: Vec<&str> = once.iter().map(|m| m.name.as_str()).collect();
        let twice_names: Vec<&str> = twice.iter().map(|m| m.name.as_str()).collect();
        prop_assert_eq!(once_names, twice_names);
    }

    #[test]
    fn unknown_values_only_leave_the_selection_unrestricted(
        rows in prop::collection::vec(municipality(), 0..40),
        count in 1usize..4
    ) {
        let data = dataset(rows);
        let request = FilterRequest {
            counties: vec!["Nowhere County".to_string(); count],
            tiers: vec!["platinum".to_string()],
            types: vec!["hamlet".to_string()],
        };

        let resolved = FilterSelection::resolve(&request, &data);
        prop_assert!(resolved.selection.is_unrestricted());
        prop_assert_eq!(resolved.ignored.len(), count + 2);
        prop_assert_eq!(resolved.selection.apply(&data.municipalities).len(), data.municipalities.len());
    }

    #[test]
    fn tier_classification_is_monotonic(a in 0.0f64..100.0, b in 0.0f64..100.0) {
        let thresholds = TierThresholds::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(thresholds.classify(low) <= thresholds.classify(high));
    }

    #[test]
    fn tier_levels_round_trip_through_parse(level in 1u8..=4) {
        let tier = Tier::from_level(level).unwrap();
        prop_assert_eq!(Tier::parse(&level.to_string()), Some(tier));
        prop_assert_eq!(Tier::parse(tier.label()), Some(tier));
    }

    #[test]
    fn county_stats_cover_the_whole_population(rows in prop::collection::vec(municipality(), 0..40)) {
        let data = dataset(rows);
        let from_counties: u64 = data.counties.iter().map(|c| c.stats.population).sum();
        prop_assert_eq!(from_counties, data.total_population());

        let members: usize = data.counties.iter().map(|c| c.stats.municipality_count).sum();
        prop_assert_eq!(members, data.municipalities.len());
    }
}
