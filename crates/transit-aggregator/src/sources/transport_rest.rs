use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{SEARCH_RADIUS_METERS, StopSource, geometry_point, point};
use crate::model::{Coordinate, Mode, Stop};
use crate::provider::Provider;
use crate::upstream::{self, text};

const NAME: &str = "transport.rest";
const DEFAULT_URL: &str = "https://v6.transport.rest";
const TIMEOUT: Duration = Duration::from_secs(8);

/// Provider A: the public transport.rest API.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportRest;

#[async_trait]
impl<P: Provider> StopSource<P> for TransportRest {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_stops(
        &self, provider: &P, center: Coordinate, _mode: Mode,
    ) -> Result<Vec<Stop>> {
        let base = upstream::setting(provider, "TRANSPORT_REST_URL", DEFAULT_URL).await;
        let url = format!(
            "{base}/stops?lat={}&lon={}&distance={SEARCH_RADIUS_METERS}",
            center.latitude, center.longitude
        );

        let body: Value = upstream::get_json(provider, NAME, &url, TIMEOUT).await?;
        Ok(normalize(&body))
    }
}

fn normalize(body: &Value) -> Vec<Stop> {
    let Some(records) = body.as_array() else {
        return vec![];
    };
    records.iter().enumerate().filter_map(|(index, record)| stop(index, record)).collect()
}

fn stop(index: usize, record: &Value) -> Option<Stop> {
    let location = geometry_point(record).or_else(|| {
        let location = record.get("location")?;
        point(
            location.get("latitude").or_else(|| location.get("lat")),
            location.get("longitude").or_else(|| location.get("lon")),
        )
    })?;

    let name = record.get("name").and_then(text);
    let id = record.get("id").and_then(text).unwrap_or_else(|| match &name {
        Some(name) => format!("tr:{name}"),
        None => format!("tr:{index}"),
    });

    Some(Stop { id, name: name.unwrap_or_else(|| "Unknown".to_string()), location })
}
