use crate::domain::ports::Storage;
use crate::utils::error::{DashboardError, LoadError, Result};
use std::path::{Path, PathBuf};

/// Reads data files relative to a base directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        match tokio::fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DashboardError::Load(LoadError::FileNotFound {
                path: full_path.display().to_string(),
            })),
            Err(e) => Err(DashboardError::IoError(e)),
        }
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.full_path(path)).await.unwrap_or(false)
    }

    fn describe(&self, path: &str) -> String {
        self.full_path(path).display().to_string()
    }
}
