pub mod charts;
pub mod dashboard;
pub mod filter;
pub mod loader;
pub mod map;
pub mod report;
pub mod table;

pub use crate::domain::model::{County, Dataset, Municipality, MunicipalityType};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
