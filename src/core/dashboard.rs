use crate::config::cli::LocalStorage;
use crate::config::toml_config::DashboardConfig;
use crate::core::charts::{self, ChartSet, RankedEntry, Summary, TierCount};
use crate::core::filter::{FilterOptions, FilterRequest, FilterSelection, ResolvedFilter};
use crate::core::loader::DatasetLoader;
use crate::core::map::{self, ColorBy, MapView};
use crate::core::report::{ExecutiveSummary, ReportDocument};
use crate::core::table::{self, ExportFormat, TableView};
use crate::domain::model::{Dataset, Municipality};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::domain::tier::TierThresholds;
use crate::utils::error::{FilterError, Result};
use serde::Serialize;

const TOP_IN_SELECTION: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredFilter {
    pub dimension: &'static str,
    pub value: String,
    pub reason: String,
}

impl From<&FilterError> for IgnoredFilter {
    fn from(e: &FilterError) -> Self {
        Self {
            dimension: e.dimension(),
            value: e.value().to_string(),
            reason: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub overall: Summary,
    pub filtered: Summary,
    pub top_in_selection: Vec<RankedEntry>,
    pub top_pick: Option<RankedEntry>,
    pub tier_cards: Vec<TierCount>,
    pub ignored: Vec<IgnoredFilter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartsView {
    pub overall: ChartSet,
    pub filtered: ChartSet,
    pub ignored: Vec<IgnoredFilter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilteredMap {
    #[serde(flatten)]
    pub map: MapView,
    pub showing: usize,
    pub ignored: Vec<IgnoredFilter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilteredTable {
    #[serde(flatten)]
    pub table: TableView,
    pub ignored: Vec<IgnoredFilter>,
}

/// Loaded data plus the per-request filter and render entry points.
/// Every method re-runs the full filter for its request.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Dataset,
    thresholds: TierThresholds,
    report: Option<ReportDocument>,
    config: DashboardConfig,
}

impl Dashboard {
    /// Startup: load every data file from the configured directory. Any `LoadError` is fatal.
    pub async fn load(config: DashboardConfig) -> Result<Self> {
        let storage = LocalStorage::new(config.data_dir());
        Self::load_from(storage, config).await
    }

    pub async fn load_from<S: Storage>(storage: S, config: DashboardConfig) -> Result<Self> {
        let loader = DatasetLoader::new(storage, config.tier_thresholds());
        let dataset = loader.load(&config).await?;
        let report =
            ReportDocument::locate(loader.storage(), config.report_file(), &config.export.report_file_name).await;
        Ok(Self::new(dataset, report, config))
    }

    pub fn new(dataset: Dataset, report: Option<ReportDocument>, config: DashboardConfig) -> Self {
        Self {
            thresholds: config.tier_thresholds(),
            dataset,
            report,
            config,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn report(&self) -> Option<&ReportDocument> {
        self.report.as_ref()
    }

    pub fn resolve(&self, request: &FilterRequest) -> ResolvedFilter {
        FilterSelection::resolve(request, &self.dataset)
    }

    fn all(&self) -> Vec<&Municipality> {
        self.dataset.municipalities.iter().collect()
    }

    fn select(&self, request: &FilterRequest) -> (FilterSelection, Vec<IgnoredFilter>) {
        let resolved = self.resolve(request);
        let ignored = resolved.ignored.iter().map(IgnoredFilter::from).collect();
        (resolved.selection, ignored)
    }

    fn filtered(&self, request: &FilterRequest) -> (Vec<&Municipality>, Vec<IgnoredFilter>) {
        let (selection, ignored) = self.select(request);
        (self.apply(&selection), ignored)
    }

    fn apply(&self, selection: &FilterSelection) -> Vec<&Municipality> {
        let records = selection.apply(&self.dataset.municipalities);
        tracing::debug!(
            "Filter {:?} matched {} of {} municipalities",
            selection,
            records.len(),
            self.dataset.municipalities.len()
        );
        records
    }

    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_dataset(&self.dataset)
    }

    pub fn summary(&self, request: &FilterRequest) -> SummaryView {
        let all = self.all();
        let (records, ignored) = self.filtered(request);

        SummaryView {
            overall: charts::summarize(&all),
            filtered: charts::summarize(&records),
            top_in_selection: charts::top_by_rank(&records, TOP_IN_SELECTION),
            top_pick: self.dataset.top_ranked().map(RankedEntry::from),
            tier_cards: charts::tier_distribution(&all),
            ignored,
        }
    }

    /// Map view of the selection. The city and village overlays get the same filter.
    pub fn map(&self, request: &FilterRequest, color_by: ColorBy) -> FilteredMap {
        let (selection, ignored) = self.select(request);
        let records = self.apply(&selection);
        let cities = selection.apply(&self.dataset.cities);
        let villages = selection.apply(&self.dataset.villages);
        FilteredMap {
            map: map::build_map_view(&records, &self.dataset.counties, color_by, &self.thresholds)
                .with_overlays(&cities, &villages),
            showing: records.len(),
            ignored,
        }
    }

    pub fn charts(&self, request: &FilterRequest) -> ChartsView {
        let all = self.all();
        let (records, ignored) = self.filtered(request);
        ChartsView {
            overall: ChartSet::build(&all),
            filtered: ChartSet::build(&records),
            ignored,
        }
    }

    /// Best-ranked municipalities over the whole dataset.
    pub fn top_opportunities(&self, n: Option<usize>) -> Vec<RankedEntry> {
        charts::top_by_rank(&self.all(), charts::clamp_top_n(n))
    }

    pub fn table(&self, request: &FilterRequest) -> FilteredTable {
        let (records, ignored) = self.filtered(request);
        FilteredTable {
            table: table::build_table(&records),
            ignored,
        }
    }

    /// Delimited export of the filtered records in table (rank) order, with its download file name.
    pub fn export(&self, request: &FilterRequest, format: ExportFormat) -> Result<(String, String)> {
        let (records, _) = self.filtered(request);
        let mut ordered = records;
        ordered.sort_by(|a, b| a.opportunity_rank.cmp(&b.opportunity_rank).then_with(|| a.name.cmp(&b.name)));

        let body = table::export_delimited(&ordered, format)?;
        let file_name = table::export_file_name(&self.config.export.file_name, format);
        tracing::info!("Exported {} rows as {}", ordered.len(), file_name);
        Ok((file_name, body))
    }

    pub fn executive_summary(&self) -> ExecutiveSummary {
        ExecutiveSummary::from_dataset(&self.dataset)
    }
}
