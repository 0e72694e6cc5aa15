use thiserror::Error;

/// Failures while reading the static data files. Always fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Data file not found: {path}")]
    FileNotFound { path: String },

    #[error("Malformed data file {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("{path}: feature #{feature} is missing required field {field}")]
    MissingField {
        path: String,
        feature: usize,
        field: String,
    },

    #[error("{path}: feature #{feature} has invalid {field}: {reason}")]
    InvalidField {
        path: String,
        feature: usize,
        field: String,
        reason: String,
    },

    #[error("Municipality '{municipality}' references unknown county '{county}'")]
    UnresolvedCounty {
        municipality: String,
        county: String,
    },

    #[error("County '{name}' appears more than once in {path}")]
    DuplicateCounty { path: String, name: String },

    #[error("Data file {path} contains no features")]
    Empty { path: String },
}

/// An unrecognised filter value. Recovered by dropping the value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown county: {0}")]
    UnknownCounty(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown municipality type: {0}")]
    UnknownType(String),
}

impl FilterError {
    pub fn value(&self) -> &str {
        match self {
            FilterError::UnknownCounty(v) | FilterError::UnknownTier(v) | FilterError::UnknownType(v) => v,
        }
    }

    pub fn dimension(&self) -> &'static str {
        match self {
            FilterError::UnknownCounty(_) => "county",
            FilterError::UnknownTier(_) => "tier",
            FilterError::UnknownType(_) => "type",
        }
    }
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Filter,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashboardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashboardError::ConfigError { .. }
            | DashboardError::ConfigValidationError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DashboardError::Load(_) | DashboardError::SerializationError(_) => ErrorCategory::Data,
            DashboardError::Filter(_) => ErrorCategory::Filter,
            DashboardError::CsvError(_) | DashboardError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Filter => ErrorSeverity::Low,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DashboardError::Load(LoadError::FileNotFound { path }) => {
                format!("Check that {} exists or point --data-dir at the data folder", path)
            }
            DashboardError::Load(LoadError::UnresolvedCounty { county, .. }) => {
                format!("Add '{}' to the counties file or fix the COUNTY property", county)
            }
            DashboardError::Load(_) => {
                "Regenerate the data files; they must be GeoJSON FeatureCollections with the expected properties".to_string()
            }
            DashboardError::Filter(e) => format!("Remove the {} filter value '{}'", e.dimension(), e.value()),
            DashboardError::ConfigError { .. }
            | DashboardError::ConfigValidationError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::MissingConfigError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            DashboardError::SerializationError(_) => "Check that the data files are valid JSON".to_string(),
            DashboardError::CsvError(_) | DashboardError::IoError(_) => {
                "Check file permissions and available disk space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Could not load dashboard data: {}", self),
            ErrorCategory::Filter => format!("Ignored filter value: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
