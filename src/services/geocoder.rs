use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{configuration::GeocoderSettings, domain::coordinate::Coordinate};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Human readable address for the coordinate, or `None` when the
    /// service has no answer for it.
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Option<String>;
}

pub struct NominatimClient {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct ReverseQuery {
    lat: f64,
    lon: f64,
    format: &'static str,
    addressdetails: u8,
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimClient {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(NominatimClient {
            client,
            url: format!("{}/reverse", settings.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Option<String> {
        let query = ReverseQuery {
            lat: coordinate.latitude,
            lon: coordinate.longitude,
            format: "json",
            addressdetails: 1,
        };

        match self.client.get(&self.url).query(&query).send().await {
            Ok(res) if res.status() == StatusCode::OK => match res.json::<ReverseResponse>().await
            {
                Ok(ReverseResponse {
                    display_name: Some(address),
                    ..
                }) => {
                    log::info!("Reverse geocoded {:?} to {}", coordinate, address);
                    Some(address)
                }
                Ok(ReverseResponse { error, .. }) => {
                    log::warn!(
                        "No address for {:?}: {}",
                        coordinate,
                        error.unwrap_or("missing display_name".to_string())
                    );
                    None
                }
                Err(e) => {
                    log::error!("Error when deserializing geocoder response: {:?}", e);
                    None
                }
            },
            Ok(res) => {
                log::error!(
                    "Geocoder answered {} for {:?}",
                    res.status(),
                    coordinate
                );
                None
            }
            Err(e) => {
                log::error!("No response from geocoder, error: {:?}", e);
                None
            }
        }
    }
}
