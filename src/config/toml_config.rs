use crate::domain::ports::ConfigProvider;
use crate::domain::tier::TierThresholds;
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dashboard: DashboardInfo,
    pub data: DataConfig,
    pub tiers: TierThresholds,
    pub server: ServerConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardInfo {
    pub title: String,
    pub caption: String,
}

impl Default for DashboardInfo {
    fn default() -> Self {
        Self {
            title: "Hudson Valley Acupuncture Market Analysis".to_string(),
            caption: "Interactive Dashboard • NYC to Albany Corridor".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: String,
    pub municipalities: String,
    pub counties: String,
    pub cities: String,
    pub villages: String,
    /// PDF report; the dashboard falls back to a generated summary when it is absent.
    pub report: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            municipalities: "municipalities.geojson".to_string(),
            counties: "counties.geojson".to_string(),
            cities: "cities.geojson".to_string(),
            villages: "villages.geojson".to_string(),
            report: Some("Hudson_Valley_Acupuncture_Market_Analysis_Report_docx.pdf".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
    pub report_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "hudson_valley_acupuncture_analysis.csv".to_string(),
            report_file_name: "Hudson_Valley_Acupuncture_Market_Analysis.pdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl DashboardConfig {
    /// Reads and parses a TOML file, substituting `${VAR}` references first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DashboardError::MissingConfigError {
                field: path.as_ref().display().to_string(),
            },
            _ => DashboardError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DashboardError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashboardError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("dashboard.title", &self.dashboard.title)?;
        validation::validate_path("data.dir", &self.data.dir)?;

        let geojson_files = [
            self.data.municipalities.as_str(),
            self.data.counties.as_str(),
            self.data.cities.as_str(),
            self.data.villages.as_str(),
        ];
        for file in geojson_files {
            validation::validate_path("data", file)?;
        }
        validation::validate_file_extensions("data", &geojson_files, &["geojson", "json"])?;

        if let Some(report) = &self.data.report {
            validation::validate_path("data.report", report)?;
            validation::validate_file_extensions("data.report", &[report.as_str()], &["pdf"])?;
        }

        for (field, value) in [
            ("tiers.prime", self.tiers.prime),
            ("tiers.strong", self.tiers.strong),
            ("tiers.moderate", self.tiers.moderate),
        ] {
            validation::validate_range(field, value, 0.0, 100.0)?;
        }
        validation::validate_strictly_descending(
            "tiers",
            &[self.tiers.prime, self.tiers.strong, self.tiers.moderate],
        )?;

        validation::validate_host("server.host", &self.server.host)?;
        validation::validate_positive_number("server.port", usize::from(self.server.port), 1)?;

        validation::validate_non_empty_string("export.file_name", &self.export.file_name)?;
        validation::validate_file_extensions("export.file_name", &[self.export.file_name.as_str()], &["csv", "tsv"])?;
        validation::validate_non_empty_string("export.report_file_name", &self.export.report_file_name)?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ConfigProvider for DashboardConfig {
    fn data_dir(&self) -> &str {
        &self.data.dir
    }

    fn municipalities_file(&self) -> &str {
        &self.data.municipalities
    }

    fn counties_file(&self) -> &str {
        &self.data.counties
    }

    fn cities_file(&self) -> &str {
        &self.data.cities
    }

    fn villages_file(&self) -> &str {
        &self.data.villages
    }

    fn report_file(&self) -> Option<&str> {
        self.data.report.as_deref()
    }

    fn tier_thresholds(&self) -> TierThresholds {
        self.tiers
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
