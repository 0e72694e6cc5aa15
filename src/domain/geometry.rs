use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    fn point(lon: f64, lat: f64) -> Self {
        Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    pub fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// `(lat, lon)` midpoint, the order map widgets expect.
    pub fn center(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

/// A validated Polygon or MultiPolygon kept in its GeoJSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    geometry: Value,
    bbox: BoundingBox,
}

impl Boundary {
    /// Returns a reason string when the value is not a usable polygon geometry.
    pub fn from_geojson(geometry: Value) -> std::result::Result<Self, String> {
        let kind = geometry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "geometry has no type".to_string())?;

        if kind != "Polygon" && kind != "MultiPolygon" {
            return Err(format!("expected Polygon or MultiPolygon, found {}", kind));
        }

        let coordinates = geometry
            .get("coordinates")
            .ok_or_else(|| "geometry has no coordinates".to_string())?;

        let mut bbox = None;
        collect_positions(coordinates, &mut bbox)?;
        let bbox = bbox.ok_or_else(|| "geometry has no positions".to_string())?;

        Ok(Self { geometry, bbox })
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn as_geojson(&self) -> &Value {
        &self.geometry
    }
}

fn collect_positions(value: &Value, bbox: &mut Option<BoundingBox>) -> std::result::Result<(), String> {
    let items = value
        .as_array()
        .ok_or_else(|| "coordinates must be nested arrays".to_string())?;

    // A position is an array whose first element is a number.
    if items.first().map(Value::is_number).unwrap_or(false) {
        let lon = items[0].as_f64();
        let lat = items.get(1).and_then(Value::as_f64);
        return match (lon, lat) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => {
                let point = BoundingBox::point(lon, lat);
                *bbox = Some(bbox.map_or(point, |b| b.union(point)));
                Ok(())
            }
            _ => Err("position must hold two finite numbers".to_string()),
        };
    }

    for item in items {
        collect_positions(item, bbox)?;
    }
    Ok(())
}
