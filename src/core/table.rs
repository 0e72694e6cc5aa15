use crate::domain::model::Municipality;
use crate::utils::error::{DashboardError, Result};
use crate::utils::format::{currency, one_decimal, thousands, title_case};
use serde::{Deserialize, Serialize};

pub const DISPLAY_COLUMNS: [&str; 10] = [
    "Rank",
    "Name",
    "Type",
    "County",
    "Population",
    "Median Income",
    "Market Index",
    "Opportunity Score",
    "Tier",
    "LifeMode",
];

/// A table row with every cell already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub rank: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub county: String,
    pub population: String,
    pub median_income: String,
    pub market_index: String,
    pub opportunity_score: String,
    pub tier: String,
    pub lifemode: String,
}

impl From<&Municipality> for TableRow {
    fn from(m: &Municipality) -> Self {
        Self {
            rank: format!("#{}", m.opportunity_rank),
            name: m.name.clone(),
            kind: title_case(m.kind.as_str()),
            county: m.county.clone(),
            population: thousands(m.population as f64),
            median_income: m.median_income.map(currency).unwrap_or_default(),
            market_index: m.index_score.map(one_decimal).unwrap_or_default(),
            opportunity_score: one_decimal(m.opportunity_score),
            tier: m.tier.label().to_string(),
            lifemode: m.lifemode.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub columns: &'static [&'static str],
    pub rows: Vec<TableRow>,
}

fn by_rank<'a>(records: &[&'a Municipality]) -> Vec<&'a Municipality> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.opportunity_rank.cmp(&b.opportunity_rank).then_with(|| a.name.cmp(&b.name)));
    sorted
}

/// Display rows sorted by rank.
pub fn build_table(records: &[&Municipality]) -> TableView {
    TableView {
        columns: &DISPLAY_COLUMNS,
        rows: by_rank(records).into_iter().map(TableRow::from).collect(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" => Some(ExportFormat::Tsv),
            _ => None,
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Tsv => "text/tab-separated-values",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }
}

/// Raw attribute values for export. Geometry is never exported.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    #[serde(rename = "NAME")]
    name: &'a str,
    #[serde(rename = "COUNTY")]
    county: &'a str,
    #[serde(rename = "TYPE")]
    kind: &'static str,
    #[serde(rename = "POPULATION")]
    population: u64,
    #[serde(rename = "MEDIAN_INCOME")]
    median_income: Option<f64>,
    #[serde(rename = "ACUP_INDEX")]
    index_score: Option<f64>,
    #[serde(rename = "OPPORTUNITY_SCORE")]
    opportunity_score: f64,
    #[serde(rename = "OPPORTUNITY_RANK")]
    opportunity_rank: u32,
    #[serde(rename = "MARKET_SIZE")]
    market_size: Option<f64>,
    #[serde(rename = "MARKET_TIER")]
    tier: &'static str,
    #[serde(rename = "LIFEMODE")]
    lifemode: Option<&'a str>,
}

impl<'a> From<&'a Municipality> for ExportRecord<'a> {
    fn from(m: &'a Municipality) -> Self {
        Self {
            name: &m.name,
            county: &m.county,
            kind: m.kind.as_str(),
            population: m.population,
            median_income: m.median_income,
            index_score: m.index_score,
            opportunity_score: m.opportunity_score,
            opportunity_rank: m.opportunity_rank,
            market_size: m.market_size,
            tier: m.tier.label(),
            lifemode: m.lifemode.as_deref(),
        }
    }
}

/// Delimited text with a header row, in the order given.
pub fn export_delimited(records: &[&Municipality], format: ExportFormat) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .from_writer(Vec::new());

    if records.is_empty() {
        // serde-driven headers are only written with the first record
        writer.write_record([
            "NAME",
            "COUNTY",
            "TYPE",
            "POPULATION",
            "MEDIAN_INCOME",
            "ACUP_INDEX",
            "OPPORTUNITY_SCORE",
            "OPPORTUNITY_RANK",
            "MARKET_SIZE",
            "MARKET_TIER",
            "LIFEMODE",
        ])?;
    }
    for record in records {
        writer.serialize(ExportRecord::from(*record))?;
    }

    let bytes = writer.into_inner().map_err(|e| DashboardError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| DashboardError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Export file name with the extension matching the format.
pub fn export_file_name(configured: &str, format: ExportFormat) -> String {
    let stem = std::path::Path::new(configured)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    format!("{}.{}", stem, format.extension())
}
