use parser::{columns, CdrRecord};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub count: u64,
}

/// Group calls by first-cell coordinate.
///
/// Reads `lat-long-azimuthfirstcellid` ("lat,lng,azimuth"). Records without a
/// parseable pair are skipped. Points keep first-seen order.
pub fn geo_points(records: &[CdrRecord]) -> Vec<GeoPoint> {
    let mut points: Vec<GeoPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some((lat, lng)) = record
            .get(columns::LAT_LONG_AZIMUTH)
            .and_then(|v| v.as_text())
            .and_then(parse_lat_lng)
        else {
            continue;
        };

        let key = format!("{lat},{lng}");
        match index.get(&key) {
            Some(&idx) => points[idx].count += 1,
            None => {
                index.insert(key, points.len());
                points.push(GeoPoint { lat, lng, count: 1 });
            }
        }
    }
    points
}

/// Mean of the point coordinates, unweighted.
pub fn map_center(points: &[GeoPoint]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
    Some((lat, lng))
}

fn parse_lat_lng(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.split(',');
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lng = parts.next()?.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::CdrValue;

    fn record(lat_long: Option<&str>) -> CdrRecord {
        let mut fields = vec![("date", CdrValue::Text("2024-01-01".into()))];
        if let Some(v) = lat_long {
            fields.push(("Lat-Long-Azimuth (First CellID)", CdrValue::Text(v.into())));
        }
        fields.into_iter().collect()
    }

    #[test]
    fn test_groups_identical_coordinates() {
        let records = vec![
            record(Some("18.52,73.85,120")),
            record(Some("19.07,72.87,90")),
            record(Some("18.52, 73.85, 240")),
        ];
        let points = geo_points(&records);
        assert_eq!(
            points,
            vec![
                GeoPoint { lat: 18.52, lng: 73.85, count: 2 },
                GeoPoint { lat: 19.07, lng: 72.87, count: 1 },
            ]
        );
    }

    #[test]
    fn test_skips_missing_and_invalid() {
        let records = vec![
            record(None),
            record(Some("n/a")),
            record(Some("18.52")),
            record(Some("abc,73.85")),
        ];
        assert!(geo_points(&records).is_empty());
    }

    #[test]
    fn test_map_center() {
        assert_eq!(map_center(&[]), None);
        let points = vec![
            GeoPoint { lat: 10.0, lng: 20.0, count: 5 },
            GeoPoint { lat: 20.0, lng: 40.0, count: 1 },
        ];
        assert_eq!(map_center(&points), Some((15.0, 30.0)));
    }
}
