use crate::domain::model::{Municipality, MunicipalityType};
use crate::domain::tier::Tier;
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOP_N_DEFAULT: usize = 20;
pub const TOP_N_MIN: usize = 10;
pub const TOP_N_MAX: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCount {
    pub tier: Tier,
    pub level: u8,
    pub color: &'static str,
    pub count: usize,
    pub population: u64,
}

/// Count and population per tier, best tier first. All four tiers are present.
pub fn tier_distribution(records: &[&Municipality]) -> Vec<TierCount> {
    Tier::ALL
        .into_iter()
        .map(|tier| {
            let members = records.iter().filter(|m| m.tier == tier);
            let (count, population) = members.fold((0, 0), |(c, p), m| (c + 1, p + m.population));
            TierCount {
                tier,
                level: tier.level(),
                color: tier.color(),
                count,
                population,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyBar {
    pub county: String,
    pub market_size: f64,
    pub population: u64,
    pub mean_score: f64,
}

/// Per-county totals over the given records, smallest market first.
pub fn county_comparison(records: &[&Municipality]) -> Vec<CountyBar> {
    let mut groups: BTreeMap<&str, (f64, u64, f64, usize)> = BTreeMap::new();
    for m in records {
        let entry = groups.entry(m.county.as_str()).or_insert((0.0, 0, 0.0, 0));
        entry.0 += m.market_size.unwrap_or(0.0);
        entry.1 += m.population;
        entry.2 += m.opportunity_score;
        entry.3 += 1;
    }

    let mut bars: Vec<CountyBar> = groups
        .into_iter()
        .map(|(county, (market_size, population, score_sum, count))| CountyBar {
            county: county.to_string(),
            market_size,
            population,
            mean_score: score_sum / count as f64,
        })
        .collect();
    bars.sort_by(|a, b| a.market_size.total_cmp(&b.market_size).then_with(|| a.county.cmp(&b.county)));
    bars
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub name: String,
    pub county: String,
    pub population: u64,
    pub opportunity_score: f64,
    pub market_size: Option<f64>,
    pub tier: Tier,
    pub color: &'static str,
    pub median_income: Option<f64>,
    pub index_score: Option<f64>,
}

/// Population against opportunity score, one point per record.
pub fn population_vs_score(records: &[&Municipality]) -> Vec<ScatterPoint> {
    records
        .iter()
        .map(|m| ScatterPoint {
            name: m.name.clone(),
            county: m.county.clone(),
            population: m.population,
            opportunity_score: m.opportunity_score,
            market_size: m.market_size,
            tier: m.tier,
            color: m.tier.color(),
            median_income: m.median_income,
            index_score: m.index_score,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub name: String,
    pub county: String,
    pub kind: MunicipalityType,
    pub population: u64,
    pub median_income: Option<f64>,
    pub opportunity_score: f64,
    pub tier: Tier,
    pub color: &'static str,
}

impl From<&Municipality> for RankedEntry {
    fn from(m: &Municipality) -> Self {
        Self {
            rank: m.opportunity_rank,
            name: m.name.clone(),
            county: m.county.clone(),
            kind: m.kind,
            population: m.population,
            median_income: m.median_income,
            opportunity_score: m.opportunity_score,
            tier: m.tier,
            color: m.tier.color(),
        }
    }
}

/// The `n` best-ranked records, rank 1 first.
pub fn top_by_rank(records: &[&Municipality], n: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<&Municipality> = records.to_vec();
    ranked.sort_by(|a, b| a.opportunity_rank.cmp(&b.opportunity_rank).then_with(|| a.name.cmp(&b.name)));
    ranked.into_iter().take(n).map(RankedEntry::from).collect()
}

pub fn clamp_top_n(requested: Option<usize>) -> usize {
    requested.unwrap_or(TOP_N_DEFAULT).clamp(TOP_N_MIN, TOP_N_MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub municipalities: usize,
    pub population: u64,
    /// `None` for an empty selection.
    pub mean_score: Option<f64>,
}

pub fn summarize(records: &[&Municipality]) -> Summary {
    let population = records.iter().map(|m| m.population).sum();
    let mean_score = if records.is_empty() {
        None
    } else {
        Some(records.iter().map(|m| m.opportunity_score).sum::<f64>() / records.len() as f64)
    };
    Summary {
        municipalities: records.len(),
        population,
        mean_score,
    }
}

/// Everything the analytics tab draws, computed over one record set.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub tiers: Vec<TierCount>,
    pub counties: Vec<CountyBar>,
    pub scatter: Vec<ScatterPoint>,
}

impl ChartSet {
    pub fn build(records: &[&Municipality]) -> Self {
        Self {
            tiers: tier_distribution(records),
            counties: county_comparison(records),
            scatter: population_vs_score(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Boundary;
    use crate::domain::tier::TierThresholds;
    use serde_json::json;

    fn record(name: &str, county: &str, population: u64, score: f64, rank: u32, market_size: f64) -> Municipality {
        Municipality {
            name: name.to_string(),
            county: county.to_string(),
            kind: MunicipalityType::City,
            population,
            median_income: Some(60000.0),
            index_score: Some(90.0),
            opportunity_score: score,
            opportunity_rank: rank,
            market_size: Some(market_size),
            tier: TierThresholds::default().classify(score),
            lifemode: None,
            boundary: Boundary::from_geojson(json!({
                "type": "Polygon",
                "coordinates": [[[-73.9, 40.9], [-73.8, 40.9], [-73.8, 41.0], [-73.9, 40.9]]]
            }))
            .unwrap(),
        }
    }

    fn sample() -> Vec<Municipality> {
        vec![
            record("Yonkers", "Westchester", 211513, 75.3, 1, 18000.0),
            record("New Rochelle", "Westchester", 79726, 48.0, 4, 9000.0),
            record("Albany", "Albany", 99224, 58.2, 2, 8000.0),
            record("Cohoes", "Albany", 18147, 22.0, 6, 1200.0),
            record("Nassau", "Rensselaer", 1100, 51.4, 3, 300.0),
        ]
    }

    #[test]
    fn test_tier_distribution_covers_all_tiers() {
        let data = sample();
        let refs: Vec<&Municipality> = data.iter().collect();
        let tiers = tier_distribution(&refs);

        assert_eq!(tiers.len(), 4);
        assert_eq!(tiers[0].tier, Tier::Prime);
        assert_eq!(tiers[0].count, 1);
        assert_eq!(tiers[0].population, 211513);
        assert_eq!(tiers[1].count, 2);
        assert_eq!(tiers[2].count, 1);
        assert_eq!(tiers[3].count, 1);
        assert_eq!(tiers.iter().map(|t| t.count).sum::<usize>(), data.len());
    }

    #[test]
    fn test_county_comparison_sorted_by_market_size() {
        let data = sample();
        let refs: Vec<&Municipality> = data.iter().collect();
        let bars = county_comparison(&refs);

        let order: Vec<&str> = bars.iter().map(|b| b.county.as_str()).collect();
        assert_eq!(order, vec!["Rensselaer", "Albany", "Westchester"]);

        let westchester = &bars[2];
        assert_eq!(westchester.market_size, 27000.0);
        assert_eq!(westchester.population, 211513 + 79726);
        assert!((westchester.mean_score - 61.65).abs() < 1e-9);
    }

    #[test]
    fn test_top_by_rank_orders_and_truncates() {
        let data = sample();
        let refs: Vec<&Municipality> = data.iter().collect();
        let top = top_by_rank(&refs, 3);

        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Yonkers", "Albany", "Nassau"]);
        assert_eq!(top_by_rank(&refs, 50).len(), 5);
    }

    #[test]
    fn test_clamp_top_n() {
        assert_eq!(clamp_top_n(None), 20);
        assert_eq!(clamp_top_n(Some(3)), 10);
        assert_eq!(clamp_top_n(Some(25)), 25);
        assert_eq!(clamp_top_n(Some(500)), 30);
    }

    #[test]
    fn test_summarize() {
        let data = sample();
        let refs: Vec<&Municipality> = data.iter().take(2).collect();
        let summary = summarize(&refs);

        assert_eq!(summary.municipalities, 2);
        assert_eq!(summary.population, 211513 + 79726);
        assert!((summary.mean_score.unwrap() - 61.65).abs() < 1e-9);

        assert_eq!(summarize(&[]).mean_score, None);
    }

    #[test]
    fn test_scatter_has_one_point_per_record() {
        let data = sample();
        let refs: Vec<&Municipality> = data.iter().collect();
        let chart = ChartSet::build(&refs);

        assert_eq!(chart.scatter.len(), 5);
        assert_eq!(chart.scatter[0].population, 211513);
        assert_eq!(chart.scatter[0].opportunity_score, 75.3);
    }
}
