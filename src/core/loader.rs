use crate::domain::geometry::Boundary;
use crate::domain::model::{county_key, County, CountyStats, Dataset, Municipality, MunicipalityType};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::domain::tier::{Tier, TierThresholds};
use crate::utils::error::{LoadError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

/// Reads the boundary files once and turns them into validated records.
pub struct DatasetLoader<S: Storage> {
    storage: S,
    thresholds: TierThresholds,
}

impl<S: Storage> DatasetLoader<S> {
    pub fn new(storage: S, thresholds: TierThresholds) -> Self {
        Self { storage, thresholds }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn load<C: ConfigProvider>(&self, config: &C) -> Result<Dataset> {
        tracing::info!("Loading dashboard data from {}", config.data_dir());

        let county_path = config.counties_file();
        let county_features = self.read_collection(county_path).await?;
        let mut counties = self.parse_counties(county_path, county_features)?;
        tracing::debug!("Loaded {} counties", counties.len());

        let municipalities = self.load_layer(config.municipalities_file(), &counties).await?;
        let cities = self.load_layer(config.cities_file(), &counties).await?;
        let villages = self.load_layer(config.villages_file(), &counties).await?;

        for county in &mut counties {
            county.stats = CountyStats::from_members(municipalities.iter().filter(|m| m.county == county.name));
        }

        tracing::info!(
            "Loaded {} municipalities across {} counties ({} city and {} village overlay features)",
            municipalities.len(),
            counties.len(),
            cities.len(),
            villages.len()
        );

        Ok(Dataset {
            municipalities,
            counties,
            cities,
            villages,
            loaded_at: chrono::Utc::now(),
        })
    }

    async fn load_layer(&self, path: &str, counties: &[County]) -> Result<Vec<Municipality>> {
        let features = self.read_collection(path).await?;
        let mut records = self.parse_municipalities(path, features, counties)?;
        assign_missing_ranks(path, &mut records);
        tracing::debug!("Loaded {} features from {}", records.len(), path);
        Ok(records)
    }

    async fn read_collection(&self, path: &str) -> Result<Vec<Feature>> {
        let location = self.storage.describe(path);
        let bytes = self.storage.read_file(path).await?;

        let collection: FeatureCollection = serde_json::from_slice(&bytes).map_err(|e| LoadError::Malformed {
            path: location.clone(),
            message: e.to_string(),
        })?;

        if collection.kind != "FeatureCollection" {
            return Err(LoadError::Malformed {
                path: location,
                message: format!("expected a FeatureCollection, found {}", collection.kind),
            }
            .into());
        }
        if collection.features.is_empty() {
            return Err(LoadError::Empty { path: location }.into());
        }

        Ok(collection.features)
    }

    fn parse_counties(&self, path: &str, features: Vec<Feature>) -> Result<Vec<County>> {
        let location = self.storage.describe(path);
        let mut seen = HashSet::new();
        let mut counties = Vec::with_capacity(features.len());

        for (index, feature) in features.into_iter().enumerate() {
            let reader = PropertyReader::new(&location, index, feature.properties.as_ref());
            let name = reader.required_str("NAME")?;
            let boundary = reader.boundary(feature.geometry)?;

            if !seen.insert(county_key(&name)) {
                return Err(LoadError::DuplicateCounty { path: location, name }.into());
            }

            counties.push(County {
                name,
                boundary,
                stats: CountyStats::default(),
            });
        }

        Ok(counties)
    }

    fn parse_municipalities(&self, path: &str, features: Vec<Feature>, counties: &[County]) -> Result<Vec<Municipality>> {
        let location = self.storage.describe(path);
        let mut records = Vec::with_capacity(features.len());

        for (index, feature) in features.into_iter().enumerate() {
            let reader = PropertyReader::new(&location, index, feature.properties.as_ref());

            let name = reader.required_str("NAME")?;
            let county_ref = reader.required_str("COUNTY")?;
            let kind_raw = reader.required_str("TYPE")?;
            let kind = MunicipalityType::parse(&kind_raw)
                .ok_or_else(|| reader.invalid("TYPE", format!("expected city or village, found '{}'", kind_raw)))?;

            let population = reader.required_f64("POPULATION")?;
            if population < 0.0 {
                return Err(reader.invalid("POPULATION", "must not be negative").into());
            }
            let opportunity_score = reader.required_f64("OPPORTUNITY_SCORE")?;

            let opportunity_rank = match reader.optional_f64("OPPORTUNITY_RANK")? {
                Some(rank) if rank >= 1.0 && rank.fract() == 0.0 && rank <= f64::from(u32::MAX) => rank as u32,
                Some(rank) => return Err(reader.invalid("OPPORTUNITY_RANK", format!("{} is not a positive integer", rank)).into()),
                None => 0,
            };

            let county = counties
                .iter()
                .find(|c| c.matches(&county_ref))
                .ok_or_else(|| LoadError::UnresolvedCounty {
                    municipality: name.clone(),
                    county: county_ref.clone(),
                })?;

            let tier = self.thresholds.classify(opportunity_score);
            if let Some(label) = reader.optional_str("MARKET_TIER")? {
                match Tier::parse(&label) {
                    Some(file_tier) if file_tier != tier => tracing::warn!(
                        "{}: {} is labelled '{}' but its score {:.1} falls in '{}'; using '{}'",
                        location,
                        name,
                        label,
                        opportunity_score,
                        tier,
                        tier
                    ),
                    Some(_) => {}
                    None => tracing::warn!("{}: {} has unrecognised MARKET_TIER '{}'", location, name, label),
                }
            }

            records.push(Municipality {
                county: county.name.clone(),
                kind,
                population: population.round() as u64,
                median_income: reader.optional_f64("MEDIAN_INCOME")?,
                index_score: reader.optional_f64("ACUP_INDEX")?,
                opportunity_score,
                opportunity_rank,
                market_size: reader.optional_f64("MARKET_SIZE")?,
                tier,
                lifemode: reader.optional_str("LIFEMODE")?,
                boundary: reader.boundary(feature.geometry)?,
                name,
            });
        }

        Ok(records)
    }
}

/// When any record lacks `OPPORTUNITY_RANK`, ranks the whole layer by descending score (ties by name).
fn assign_missing_ranks(path: &str, records: &mut [Municipality]) {
    if records.iter().all(|m| m.opportunity_rank > 0) {
        return;
    }
    tracing::warn!("{}: OPPORTUNITY_RANK missing, ranking by opportunity score", path);

    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| {
        records[b]
            .opportunity_score
            .total_cmp(&records[a].opportunity_score)
            .then_with(|| records[a].name.cmp(&records[b].name))
    });
    for (rank, index) in order.into_iter().enumerate() {
        records[index].opportunity_rank = rank as u32 + 1;
    }
}

struct PropertyReader<'a> {
    path: &'a str,
    index: usize,
    properties: Option<&'a Map<String, Value>>,
}

impl<'a> PropertyReader<'a> {
    fn new(path: &'a str, index: usize, properties: Option<&'a Map<String, Value>>) -> Self {
        Self { path, index, properties }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.properties.and_then(|p| p.get(field)).filter(|v| !v.is_null())
    }

    fn missing(&self, field: &str) -> LoadError {
        LoadError::MissingField {
            path: self.path.to_string(),
            feature: self.index,
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> LoadError {
        LoadError::InvalidField {
            path: self.path.to_string(),
            feature: self.index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn required_str(&self, field: &str) -> std::result::Result<String, LoadError> {
        self.optional_str(field)?.ok_or_else(|| self.missing(field))
    }

    fn optional_str(&self, field: &str) -> std::result::Result<Option<String>, LoadError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(other) => Err(self.invalid(field, format!("expected text, found {}", other))),
        }
    }

    fn required_f64(&self, field: &str) -> std::result::Result<f64, LoadError> {
        self.optional_f64(field)?.ok_or_else(|| self.missing(field))
    }

    /// Numbers, or strings holding a number; anything else is invalid.
    fn optional_f64(&self, field: &str) -> std::result::Result<Option<f64>, LoadError> {
        let value = match self.get(field) {
            None => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match value {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.invalid(field, "expected a finite number")),
        }
    }

    fn boundary(&self, geometry: Option<Value>) -> std::result::Result<Boundary, LoadError> {
        let geometry = geometry.filter(|g| !g.is_null()).ok_or_else(|| self.missing("geometry"))?;
        Boundary::from_geojson(geometry).map_err(|reason| self.invalid("geometry", reason))
    }
}
