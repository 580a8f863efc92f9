//! Postal-code lookup against the Omniva address-search API.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::fetch::Fetch;

pub const OMNIVA_ZIP_ENDPOINT: &str =
    "https://www.omniva.ee/wp-json/custom/v1/omniva-zip-search";

#[derive(Debug, Deserialize)]
struct ZipcodeResponse {
    addresses: Vec<ZipcodeAddress>,
}

#[derive(Debug, Deserialize)]
struct ZipcodeAddress {
    #[allow(dead_code)]
    address: String,
    #[serde(rename = "zipCode")]
    zip_code: String,
}

/// Free-text address to postal-code resolver.
///
/// Every failure mode (bad URL, network error, malformed body, no match)
/// degrades to an empty string; a missing postal code must never fail the
/// record being parsed.
#[derive(Clone)]
pub struct ZipLookup {
    fetch: Arc<dyn Fetch>,
    endpoint: String,
}

impl ZipLookup {
    pub fn new(fetch: Arc<dyn Fetch>) -> Self {
        Self::with_endpoint(fetch, OMNIVA_ZIP_ENDPOINT)
    }

    pub fn with_endpoint(fetch: Arc<dyn Fetch>, endpoint: impl Into<String>) -> Self {
        Self {
            fetch,
            endpoint: endpoint.into(),
        }
    }

    pub async fn postal_code_for(&self, address: &str) -> String {
        let url = match Url::parse_with_params(&self.endpoint, [("search", address)]) {
            Ok(url) => url,
            Err(err) => {
                warn!(address, error = %err, "could not build zip code lookup URL");
                return String::new();
            }
        };

        let body = match self.fetch.get_bytes(url.as_str()).await {
            Ok(body) => body,
            Err(err) => {
                warn!(address, error = %err, "zip code lookup request failed");
                return String::new();
            }
        };

        let parsed: ZipcodeResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(address, error = %err, "zip code lookup returned malformed JSON");
                return String::new();
            }
        };

        parsed
            .addresses
            .into_iter()
            .next()
            .map(|a| a.zip_code)
            .unwrap_or_default()
    }
}
