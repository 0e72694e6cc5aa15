use crate::domain::tier::TierThresholds;
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// Human-readable location of `path`, used in error messages.
    fn describe(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn municipalities_file(&self) -> &str;
    fn counties_file(&self) -> &str;
    fn cities_file(&self) -> &str;
    fn villages_file(&self) -> &str;
    fn report_file(&self) -> Option<&str>;
    fn tier_thresholds(&self) -> TierThresholds;
}
