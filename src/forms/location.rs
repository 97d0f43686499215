// Map-location values - a single point or a geofence polygon

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// What a map-location field captures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    #[default]
    Point,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationValue {
    Point { point: GeoPoint },
    Polygon { vertices: Vec<GeoPoint> },
}

impl LocationValue {
    pub fn mode(&self) -> LocationMode {
        match self {
            LocationValue::Point { .. } => LocationMode::Point,
            LocationValue::Polygon { .. } => LocationMode::Polygon,
        }
    }

    /// A point must lie on the globe; a geofence needs three valid vertices
    pub fn is_well_formed(&self) -> bool {
        match self {
            LocationValue::Point { point } => point.is_valid(),
            LocationValue::Polygon { vertices } => {
                vertices.len() >= 3 && vertices.iter().all(GeoPoint::is_valid)
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Accepts the stored object form or its stringified form
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => serde_json::from_str(text).ok(),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polygon_needs_three_vertices() {
        let fence = LocationValue::Polygon {
            vertices: vec![GeoPoint::new(24.7, 46.6), GeoPoint::new(24.8, 46.7)],
        };
        assert!(!fence.is_well_formed());

        let fence = LocationValue::Polygon {
            vertices: vec![
                GeoPoint::new(24.7, 46.6),
                GeoPoint::new(24.8, 46.7),
                GeoPoint::new(24.9, 46.6),
            ],
        };
        assert!(fence.is_well_formed());
    }

    #[test]
    fn test_from_stringified_value() {
        let stored = json!({"kind": "point", "point": {"lat": 24.71, "lng": 46.67}});
        let text = Value::String(stored.to_string());

        let parsed = LocationValue::from_value(&text).unwrap();
        assert_eq!(parsed.mode(), LocationMode::Point);
        assert_eq!(LocationValue::from_value(&stored), Some(parsed));
        assert_eq!(LocationValue::from_value(&json!(12)), None);
    }
}
