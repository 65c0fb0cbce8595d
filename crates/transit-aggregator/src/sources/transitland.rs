use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use urlencoding::encode;

use super::{SEARCH_RADIUS_METERS, StopSource, geometry_point, point};
use crate::model::{Coordinate, Mode, Stop};
use crate::provider::Provider;
use crate::upstream::{self, text};

const NAME: &str = "transitland";
const DEFAULT_URL: &str = "https://transit.land/api/v2/rest";
const TIMEOUT: Duration = Duration::from_secs(10);
const PER_PAGE: u32 = 100;

/// Provider B: the Transitland REST API. An API key is optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transitland;

#[async_trait]
impl<P: Provider> StopSource<P> for Transitland {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_stops(
        &self, provider: &P, center: Coordinate, _mode: Mode,
    ) -> Result<Vec<Stop>> {
        let base = upstream::setting(provider, "TRANSITLAND_URL", DEFAULT_URL).await;
        let mut url = format!(
            "{base}/stops?lat={}&lon={}&r={SEARCH_RADIUS_METERS}&per_page={PER_PAGE}",
            center.latitude, center.longitude
        );
        if let Some(key) = upstream::optional_setting(provider, "TRANSITLAND_API_KEY").await {
            url.push_str(&format!("&api_key={}", encode(&key)));
        }

        let body: Value = upstream::get_json(provider, NAME, &url, TIMEOUT).await?;
        Ok(normalize(&body))
    }
}

fn normalize(body: &Value) -> Vec<Stop> {
    let Some(records) = body.get("stops").and_then(Value::as_array) else {
        return vec![];
    };
    records.iter().filter_map(stop).collect()
}

fn stop(record: &Value) -> Option<Stop> {
    let location = geometry_point(record)
        .or_else(|| point(record.get("latitude"), record.get("longitude")))?;

    let name = record.get("name").or_else(|| record.get("stop_name")).and_then(text);
    let id = record
        .get("onestop_id")
        .and_then(text)
        .or_else(|| record.get("id").and_then(text))
        .unwrap_or_else(|| format!("tl:{}", name.as_deref().unwrap_or_default()));

    Some(Stop { id, name: name.unwrap_or_else(|| "Unknown".to_string()), location })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn geometry_stop() {
        let body = json!({
            "stops": [{
                "id": 5_812_345,
                "onestop_id": "s-u281z9u2yn-marienplatz",
                "stop_name": "Marienplatz",
                "geometry": {"type": "Point", "coordinates": [11.5755, 48.1374]}
            }],
            "meta": {"after": 5_812_345}
        });

        assert_eq!(
            normalize(&body),
            vec![Stop {
                id: "s-u281z9u2yn-marienplatz".to_string(),
                name: "Marienplatz".to_string(),
                location: Coordinate { latitude: 48.1374, longitude: 11.5755 },
            }]
        );
    }

    #[test]
    fn flat_coordinates() {
        let body = json!({
            "stops": [{"id": 42, "name": "Sendlinger Tor", "latitude": 48.1339, "longitude": 11.5667}]
        });

        let stops = normalize(&body);
        assert_eq!(stops[0].id, "42");
        assert_eq!(stops[0].location, Coordinate { latitude: 48.1339, longitude: 11.5667 });
    }

    #[test]
    fn name_fallbacks() {
        let body = json!({
            "stops": [
                {"name": "Isartor", "latitude": 48.1336, "longitude": 11.5834},
                {"latitude": 48.1, "longitude": 11.6}
            ]
        });

        let stops = normalize(&body);
        assert_eq!(stops[0].id, "tl:Isartor");
        assert_eq!(stops[1].id, "tl:");
        assert_eq!(stops[1].name, "Unknown");
    }

    #[test]
    fn drops_records_without_coordinates() {
        let body = json!({"stops": [{"id": "x", "name": "Nowhere", "latitude": null}]});
        assert!(normalize(&body).is_empty());
    }

    #[test]
    fn missing_stops_array() {
        assert!(normalize(&json!({"error": "unauthorized"})).is_empty());
        assert!(normalize(&json!([])).is_empty());
    }
}
