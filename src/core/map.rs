use crate::domain::geometry::BoundingBox;
use crate::domain::model::{County, Municipality};
use crate::domain::tier::{Tier, TierThresholds};
use crate::utils::format::{currency, escape_html, one_decimal, thousands, title_case};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Used when the selection is empty.
pub const DEFAULT_CENTER: (f64, f64) = (41.5, -73.9);
pub const DEFAULT_ZOOM: u8 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBy {
    #[default]
    Tier,
    Score,
}

impl ColorBy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tier" | "market tier" | "market_tier" => Some(ColorBy::Tier),
            "score" | "opportunity score" | "opportunity_score" => Some(ColorBy::Score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TileLayer {
    pub name: &'static str,
    pub url: &'static str,
    pub attribution: &'static str,
}

pub const BASE_LAYERS: [TileLayer; 2] = [
    TileLayer {
        name: "Light Basemap",
        url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
        attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
    },
    TileLayer {
        name: "Dark Basemap",
        url: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
        attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
    },
];

/// Leaflet path options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStyle {
    pub fill_color: String,
    pub color: &'static str,
    pub weight: u8,
    pub fill_opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<&'static str>,
}

impl RegionStyle {
    fn municipality(fill_color: &str) -> Self {
        Self {
            fill_color: fill_color.to_string(),
            color: "#333",
            weight: 1,
            fill_opacity: 0.7,
            dash_array: None,
        }
    }

    fn county_outline() -> Self {
        Self {
            fill_color: "transparent".to_string(),
            color: "#333",
            weight: 2,
            fill_opacity: 0.0,
            dash_array: Some("5, 5"),
        }
    }

    fn overlay(color: &'static str) -> Self {
        Self {
            fill_color: "transparent".to_string(),
            color,
            weight: 2,
            fill_opacity: 0.0,
            dash_array: None,
        }
    }

    fn highlight() -> Self {
        Self {
            fill_color: "#FFD700".to_string(),
            color: "#000",
            weight: 3,
            fill_opacity: 0.9,
            dash_array: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

/// Optional outline layer the user can toggle on top of the municipalities.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayLayer {
    pub name: &'static str,
    pub features: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
    pub bounds: Option<BoundingBox>,
    pub color_by: ColorBy,
    pub base_layers: &'static [TileLayer],
    pub counties: Value,
    pub municipalities: Value,
    pub highlight: RegionStyle,
    pub legend: Vec<LegendEntry>,
    pub overlays: Vec<OverlayLayer>,
}

impl MapView {
    /// Adds the city and village outline layers. Callers pass them already filtered.
    pub fn with_overlays(mut self, cities: &[&Municipality], villages: &[&Municipality]) -> Self {
        self.overlays = vec![
            overlay_layer("Cities", cities, "#6A1B9A"),
            overlay_layer("Villages", villages, "#00838F"),
        ];
        self
    }
}

pub fn build_map_view(
    records: &[&Municipality],
    counties: &[County],
    color_by: ColorBy,
    thresholds: &TierThresholds,
) -> MapView {
    let bounds = records.iter().map(|m| m.bbox()).reduce(BoundingBox::union);
    let (lat, lon) = bounds.map(|b| b.center()).unwrap_or(DEFAULT_CENTER);

    let county_features: Vec<Value> = counties.iter().map(county_feature).collect();
    let municipality_features: Vec<Value> = records
        .iter()
        .map(|m| municipality_feature(m, color_by, thresholds))
        .collect();

    MapView {
        center: [lat, lon],
        zoom: DEFAULT_ZOOM,
        bounds,
        color_by,
        base_layers: &BASE_LAYERS,
        counties: json!({ "type": "FeatureCollection", "features": county_features }),
        municipalities: json!({ "type": "FeatureCollection", "features": municipality_features }),
        highlight: RegionStyle::highlight(),
        legend: Tier::ALL
            .into_iter()
            .map(|tier| LegendEntry {
                label: thresholds.legend_label(tier),
                color: tier.color(),
            })
            .collect(),
        overlays: Vec::new(),
    }
}

fn overlay_layer(name: &'static str, records: &[&Municipality], color: &'static str) -> OverlayLayer {
    let features: Vec<Value> = records
        .iter()
        .map(|m| {
            json!({
                "type": "Feature",
                "geometry": m.boundary.as_geojson(),
                "properties": {
                    "name": m.name,
                    "county": m.county,
                    "tooltip": format!("{} ({})", m.name, title_case(m.kind.as_str())),
                    "style": RegionStyle::overlay(color),
                }
            })
        })
        .collect();

    OverlayLayer {
        name,
        features: json!({ "type": "FeatureCollection", "features": features }),
    }
}

fn county_feature(county: &County) -> Value {
    json!({
        "type": "Feature",
        "geometry": county.boundary.as_geojson(),
        "properties": {
            "name": county.name,
            "tooltip": format!("County: {}", county.name),
            "style": RegionStyle::county_outline(),
        }
    })
}

pub fn fill_color(record: &Municipality, color_by: ColorBy, thresholds: &TierThresholds) -> &'static str {
    match color_by {
        ColorBy::Tier => record.tier.color(),
        ColorBy::Score => thresholds.score_color(record.opportunity_score),
    }
}

fn municipality_feature(record: &Municipality, color_by: ColorBy, thresholds: &TierThresholds) -> Value {
    json!({
        "type": "Feature",
        "geometry": record.boundary.as_geojson(),
        "properties": {
            "name": record.name,
            "county": record.county,
            "type": record.kind,
            "tier": record.tier,
            "opportunity_score": record.opportunity_score,
            "opportunity_rank": record.opportunity_rank,
            "tooltip": tooltip(record),
            "popup": popup_html(record, thresholds),
            "style": RegionStyle::municipality(fill_color(record, color_by, thresholds)),
        }
    })
}

pub fn tooltip(record: &Municipality) -> String {
    format!("{} - Score: {}", record.name, one_decimal(record.opportunity_score))
}

pub fn popup_html(record: &Municipality, thresholds: &TierThresholds) -> String {
    let or_na = |value: Option<String>| value.unwrap_or_else(|| "n/a".to_string());

    let rows = [
        ("Type", title_case(record.kind.as_str())),
        ("County", escape_html(&record.county)),
        ("Population", thousands(record.population as f64)),
        ("Median Income", or_na(record.median_income.map(currency))),
    ];
    let detail_rows = [
        ("Opportunity Rank", format!("#{}", record.opportunity_rank)),
        ("Market Index", or_na(record.index_score.map(one_decimal))),
        ("Market Size", or_na(record.market_size.map(thousands))),
    ];

    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div class="popup"><h4>"#);
    html.push_str(&escape_html(&record.name));
    html.push_str("</h4><table>");
    for (label, value) in rows {
        html.push_str(&format!("<tr><td><strong>{}:</strong></td><td>{}</td></tr>", label, value));
    }
    html.push_str(&format!(
        r#"<tr class="score"><td><strong>Opportunity Score:</strong></td><td style="color: {};">{}</td></tr>"#,
        thresholds.score_color(record.opportunity_score),
        one_decimal(record.opportunity_score)
    ));
    for (label, value) in detail_rows {
        html.push_str(&format!("<tr><td><strong>{}:</strong></td><td>{}</td></tr>", label, value));
    }
    html.push_str(&format!(
        r#"<tr><td><strong>Market Tier:</strong></td><td><span class="tier-badge" style="background-color: {};">{}</span></td></tr>"#,
        record.tier.color(),
        record.tier.label()
    ));
    html.push_str(&format!(
        "<tr><td><strong>LifeMode:</strong></td><td>{}</td></tr>",
        or_na(record.lifemode.as_deref().map(escape_html))
    ));
    html.push_str("</table></div>");
    html
}
