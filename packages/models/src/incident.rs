//! Incident points returned by `GET /heatmap_data`.
//!
//! The endpoint returns an array of loosely-typed objects. Records are
//! validated one at a time; anything without usable coordinates is dropped
//! rather than failing the whole batch.

use serde::Serialize;
use serde_json::Value;

/// Hex color the server assigns to its top decile of locations.
pub const HIGH_RISK_COLOR: &str = "#ff4444";

/// Hex color the server assigns to the 70th-90th percentile.
pub const MEDIUM_RISK_COLOR: &str = "#ffbb33";

/// Hex color the server assigns to everything else.
pub const LOW_RISK_COLOR: &str = "#00C851";

/// Placeholder shown for missing category or district names.
pub const UNKNOWN: &str = "Unknown";

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// A zero-area box around a single point.
    #[must_use]
    pub const fn from_point(lat: f64, lng: f64) -> Self {
        Self::new(lng, lat, lng, lat)
    }

    /// Grows the box to include the given point.
    pub fn extend(&mut self, lat: f64, lng: f64) {
        self.west = self.west.min(lng);
        self.east = self.east.max(lng);
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);
    }

    /// Smallest box containing every `(lat, lng)` pair, or `None` if the
    /// iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lat, lng) = iter.next()?;
        let mut bbox = Self::from_point(lat, lng);
        for (lat, lng) in iter {
            bbox.extend(lat, lng);
        }
        Some(bbox)
    }

    /// Corners as `[[south, west], [north, east]]`, the order tile-map
    /// libraries expect for `fitBounds`.
    #[must_use]
    pub const fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

/// Risk tier derived from a point's marker color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Top decile of incident counts.
    High,
    /// 70th-90th percentile.
    Medium,
    /// Everything else.
    Low,
}

impl RiskTier {
    /// Returns all tiers, most severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::High, Self::Medium, Self::Low]
    }

    /// Exact string match against the two known hex constants. Anything
    /// else, including a missing color, is [`RiskTier::Low`].
    #[must_use]
    pub fn from_color(color: Option<&str>) -> Self {
        match color {
            Some(HIGH_RISK_COLOR) => Self::High,
            Some(MEDIUM_RISK_COLOR) => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Popup and legend label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Medium => "Medium Risk",
            Self::Low => "Low Risk",
        }
    }

    /// Canonical palette color for this tier.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => HIGH_RISK_COLOR,
            Self::Medium => MEDIUM_RISK_COLOR,
            Self::Low => LOW_RISK_COLOR,
        }
    }
}

/// A validated incident location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentPoint {
    /// Latitude, `[-90, 90]`.
    pub lat: f64,
    /// Longitude, `[-180, 180]`.
    pub lng: f64,
    /// Marker radius in pixels.
    pub radius: Option<f64>,
    /// Marker fill color (hex).
    pub color: Option<String>,
    /// Incident category.
    pub category: Option<String>,
    /// Police district.
    pub district: Option<String>,
    /// Number of incidents aggregated into this point.
    pub count: Option<u64>,
}

impl IncidentPoint {
    /// Validates one raw record.
    ///
    /// Returns `None` when the record is not an object or its coordinates
    /// are missing, non-numeric, non-finite or out of range.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let lat = numeric(obj.get("lat")?).filter(|v| (-90.0..=90.0).contains(v))?;
        let lng = numeric(obj.get("lng")?).filter(|v| (-180.0..=180.0).contains(v))?;

        Some(Self {
            lat,
            lng,
            radius: obj
                .get("radius")
                .and_then(Value::as_f64)
                .filter(|r| r.is_finite() && *r > 0.0),
            color: obj
                .get("color")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from),
            category: obj.get("category").and_then(label),
            district: obj.get("district").and_then(label),
            count: obj.get("count").and_then(count),
        })
    }

    /// Tier derived from this point's color.
    #[must_use]
    pub fn tier(&self) -> RiskTier {
        RiskTier::from_color(self.color.as_deref())
    }

    /// Category name, or `"Unknown"`.
    #[must_use]
    pub fn category_or_unknown(&self) -> &str {
        self.category.as_deref().unwrap_or(UNKNOWN)
    }

    /// District name, or `"Unknown"`.
    #[must_use]
    pub fn district_or_unknown(&self) -> &str {
        self.district.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Accepts JSON numbers and numeric strings.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    numeric(value)
        .filter(|f| *f >= 0.0)
        .map(|f| f.round() as u64)
}

/// The usable part of one `/heatmap_data` response.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentBatch {
    /// Number of records in the response array.
    pub received: usize,
    /// Records that passed validation, in response order.
    pub points: Vec<IncidentPoint>,
}

impl IncidentBatch {
    /// Validates every record of a response body.
    ///
    /// Returns `None` if the body is not a JSON array.
    #[must_use]
    pub fn from_json(body: &Value) -> Option<Self> {
        let records = body.as_array()?;
        Some(Self {
            received: records.len(),
            points: records.iter().filter_map(IncidentPoint::from_json).collect(),
        })
    }

    /// Number of records dropped during validation.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.received - self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_out_of_range_and_non_numeric_coordinates() {
        let body = json!([
            {"lat": 37.77, "lng": -122.41},
            {"lat": 91.0, "lng": -122.41},
            {"lat": 37.77, "lng": -181.0},
            {"lat": "abc", "lng": -122.41},
            {"lat": null, "lng": -122.41},
            {"lng": -122.41},
            {"lat": true, "lng": 1.0},
            "not an object",
            {"lat": "37.5", "lng": "-122.5"}
        ]);
        let batch = IncidentBatch::from_json(&body).unwrap();
        assert_eq!(batch.received, 9);
        assert_eq!(batch.points.len(), 2);
        assert_eq!(batch.dropped(), 7);
        assert!((batch.points[1].lat - 37.5).abs() < 1e-9);
        for point in &batch.points {
            assert!((-90.0..=90.0).contains(&point.lat));
            assert!((-180.0..=180.0).contains(&point.lng));
        }
    }

    #[test]
    fn boundary_coordinates_are_valid() {
        let body = json!([
            {"lat": 90, "lng": -180},
            {"lat": -90, "lng": 180},
            {"lat": 0, "lng": 0}
        ]);
        let batch = IncidentBatch::from_json(&body).unwrap();
        assert_eq!(batch.points.len(), 3);
    }

    #[test]
    fn non_array_body_is_none() {
        assert!(IncidentBatch::from_json(&json!({"error": "Failed"})).is_none());
        assert!(IncidentBatch::from_json(&Value::Null).is_none());
        let empty = IncidentBatch::from_json(&json!([])).unwrap();
        assert_eq!(empty.received, 0);
        assert!(empty.points.is_empty());
    }

    #[test]
    fn optional_fields_fall_back() {
        let point = IncidentPoint::from_json(&json!({
            "lat": 37.7, "lng": -122.4, "radius": 0, "color": "", "category": ""
        }))
        .unwrap();
        assert_eq!(point.radius, None);
        assert_eq!(point.color, None);
        assert_eq!(point.category_or_unknown(), "Unknown");
        assert_eq!(point.district_or_unknown(), "Unknown");
        assert_eq!(point.count, None);
        assert_eq!(point.tier(), RiskTier::Low);
    }

    #[test]
    fn negative_radius_is_dropped_and_string_count_parsed() {
        let point = IncidentPoint::from_json(&json!({
            "lat": 0, "lng": 0, "radius": -3, "count": "12"
        }))
        .unwrap();
        assert_eq!(point.radius, None);
        assert_eq!(point.count, Some(12));

        let point = IncidentPoint::from_json(&json!({
            "lat": 0, "lng": 0, "count": "-4"
        }))
        .unwrap();
        assert_eq!(point.count, None);
    }

    #[test]
    fn full_record_parses() {
        let point = IncidentPoint::from_json(&json!({
            "lat": 37.7, "lng": -122.4, "radius": 8, "color": "#ff4444",
            "category": "Larceny Theft", "district": "Central", "count": 14
        }))
        .unwrap();
        assert_eq!(point.radius, Some(8.0));
        assert_eq!(point.category_or_unknown(), "Larceny Theft");
        assert_eq!(point.district_or_unknown(), "Central");
        assert_eq!(point.count, Some(14));
        assert_eq!(point.tier(), RiskTier::High);
    }

    #[test]
    fn color_maps_to_tier_label() {
        assert_eq!(RiskTier::from_color(Some("#ff4444")).label(), "High Risk");
        assert_eq!(RiskTier::from_color(Some("#ffbb33")).label(), "Medium Risk");
        assert_eq!(RiskTier::from_color(Some("#00C851")).label(), "Low Risk");
        assert_eq!(RiskTier::from_color(Some("#FF4444")).label(), "Low Risk");
        assert_eq!(RiskTier::from_color(None).label(), "Low Risk");
    }

    #[test]
    fn bounding_box_covers_all_points() {
        let bbox =
            BoundingBox::from_points([(37.7, -122.5), (37.8, -122.4), (37.75, -122.45)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-122.5, 37.7, -122.4, 37.8));
        assert_eq!(bbox.corners(), [[37.7, -122.5], [37.8, -122.4]]);
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
