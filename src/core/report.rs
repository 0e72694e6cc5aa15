use crate::domain::model::Dataset;
use crate::domain::ports::Storage;
use crate::domain::tier::Tier;
use serde::Serialize;
use std::sync::Arc;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// The embedded PDF report, read once at startup.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub source: String,
    pub download_name: String,
    bytes: Arc<[u8]>,
}

impl ReportDocument {
    /// Returns `None` when the file is absent or is not a PDF; the dashboard
    /// then shows [`ExecutiveSummary`] instead.
    pub async fn locate<S: Storage>(storage: &S, path: Option<&str>, download_name: &str) -> Option<Self> {
        let path = path?;
        let source = storage.describe(path);

        if !storage.exists(path).await {
            tracing::warn!("Report {} not found, serving the generated summary instead", source);
            return None;
        }

        let bytes = match storage.read_file(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Could not read report {}: {}", source, e);
                return None;
            }
        };

        if !bytes.starts_with(PDF_MAGIC) {
            tracing::warn!("Report {} is not a PDF document, ignoring it", source);
            return None;
        }

        tracing::info!("Report {} loaded ({} bytes)", source, bytes.len());
        Some(Self {
            source,
            download_name: download_name.to_string(),
            bytes: bytes.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub top_municipality: Option<String>,
    pub top_score: Option<f64>,
    pub leading_county: Option<String>,
    pub leading_county_market_size: Option<f64>,
    pub municipality_count: usize,
    pub county_count: usize,
    /// Combined population of the two best tiers.
    pub upper_tier_population: u64,
    pub methodology: &'static [(&'static str, u8)],
}

pub const METHODOLOGY: &[(&str, u8)] = &[
    ("LifeMode psychographic groups", 30),
    ("Educational attainment", 25),
    ("Female population aged 35-64", 25),
    ("Household income $75K+", 20),
];

impl ExecutiveSummary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let top = dataset.top_ranked();
        let leading = dataset
            .counties
            .iter()
            .filter(|c| c.stats.municipality_count > 0)
            .max_by(|a, b| a.stats.market_size.total_cmp(&b.stats.market_size));

        Self {
            top_municipality: top.map(|m| m.name.clone()),
            top_score: top.map(|m| m.opportunity_score),
            leading_county: leading.map(|c| c.name.clone()),
            leading_county_market_size: leading.map(|c| c.stats.market_size),
            municipality_count: dataset.municipalities.len(),
            county_count: dataset.counties.len(),
            upper_tier_population: dataset
                .municipalities
                .iter()
                .filter(|m| m.tier >= Tier::Strong)
                .map(|m| m.population)
                .sum(),
            methodology: METHODOLOGY,
        }
    }
}
