//! Current-position lookup for the emergency screen.

use crate::domain::{Coordinates, LocationError};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

pub trait LocationProvider {
    fn locate(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Deserialize)]
struct IpInfo {
    loc: Option<String>,
}

/// Parses an ipinfo-style `"lat,lon"` pair.
fn parse_loc(loc: &str) -> Option<Coordinates> {
    let (lat, lon) = loc.split_once(',')?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let longitude: f64 = lon.trim().parse().ok()?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(Coordinates { latitude, longitude })
}

/// Geolocates this machine by its public IP address.
pub struct IpLocationProvider {
    client: Client,
    url: String,
}

impl IpLocationProvider {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        Ok(Self { client, url: url.into() })
    }
}

impl LocationProvider for IpLocationProvider {
    fn locate(&self) -> Result<Coordinates, LocationError> {
        let info: IpInfo = self
            .client
            .get(&self.url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json())
            .map_err(|e| {
                warn!(error = %e, "location lookup failed");
                LocationError::Unavailable(e.to_string())
            })?;

        let coordinates = info
            .loc
            .as_deref()
            .and_then(parse_loc)
            .ok_or_else(|| LocationError::Unavailable("no coordinates in response".to_string()))?;

        info!(%coordinates, "located device");
        Ok(coordinates)
    }
}

/// Always answers with the same position, or always fails.
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    position: Option<Coordinates>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

impl LocationProvider for FixedLocationProvider {
    fn locate(&self) -> Result<Coordinates, LocationError> {
        self.position
            .ok_or_else(|| LocationError::Unavailable("no fixed position configured".to_string()))
    }
}
