//! Euroapteek serves its pharmacy list as plain JSON. The source assigns
//! no record ids and no modification timestamps, so the natural id is a
//! checksum of the name and `modified_at` stays at the epoch, which makes
//! the chain effectively insert-only.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use apteek_core::{Chain, Pharmacy, PharmacyStore};

use crate::fetch::Fetch;
use crate::zipcode::ZipLookup;
use crate::{natural_id_from_name, reconcile, ChainScraper, ScrapeError};

pub const EUROAPTEEK_ENDPOINT: &str = "https://www.euroapteek.ee/apteegid";

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\+372)? *([\d ]+)").unwrap());

#[derive(Debug, Deserialize)]
struct EuroapteekPharmacy {
    name: String,
    #[serde(rename = "phoneNumber", default)]
    phone_number: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
    // the source mislabels the county field
    #[serde(rename = "country", default)]
    county: String,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lng: String,
}

/// Strip whitespace from the local digits and prefix the country code.
/// A number without any digits is logged and left unset.
fn normalize_phone(raw: &str, name: &str) -> String {
    match PHONE.captures(raw) {
        Some(groups) => format!("+372{}", groups[2].replace(' ', "")),
        None => {
            warn!(name, raw, "could not extract a phone number");
            String::new()
        }
    }
}

pub struct EuroapteekScraper {
    fetch: Arc<dyn Fetch>,
    endpoint: String,
    zip: ZipLookup,
    store: Arc<dyn PharmacyStore>,
}

impl EuroapteekScraper {
    pub fn new(fetch: Arc<dyn Fetch>, store: Arc<dyn PharmacyStore>) -> Self {
        Self {
            zip: ZipLookup::new(fetch.clone()),
            fetch,
            endpoint: EUROAPTEEK_ENDPOINT.to_string(),
            store,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_zip_lookup(mut self, zip: ZipLookup) -> Self {
        self.zip = zip;
        self
    }

    async fn to_pharmacy(&self, raw: EuroapteekPharmacy) -> Option<Pharmacy> {
        let mut pharmacy = Pharmacy::new(Chain::Euroapteek);
        pharmacy.natural_id = natural_id_from_name(&raw.name);

        pharmacy.latitude = match raw.lat.parse() {
            Ok(lat) => lat,
            Err(_) => {
                warn!(name = %raw.name, value = %raw.lat, "invalid latitude, skipping record");
                return None;
            }
        };
        pharmacy.longitude = match raw.lng.parse() {
            Ok(lng) => lng,
            Err(_) => {
                warn!(name = %raw.name, value = %raw.lng, "invalid longitude, skipping record");
                return None;
            }
        };

        pharmacy.phone_number = normalize_phone(&raw.phone_number, &raw.name);
        pharmacy.postal_code = self
            .zip
            .postal_code_for(&format!("{}, {}, {}", raw.address, raw.city, raw.county))
            .await;
        pharmacy.name = raw.name;
        pharmacy.address = raw.address;
        pharmacy.city = raw.city;
        pharmacy.county = raw.county;
        Some(pharmacy)
    }
}

#[async_trait]
impl ChainScraper for EuroapteekScraper {
    fn chain(&self) -> Chain {
        Chain::Euroapteek
    }

    async fn scrape(&self) -> Result<(), ScrapeError> {
        info!(chain = %Chain::Euroapteek, "scraping pharmacy locations");
        let existing = self.store.find_by_chain(Chain::Euroapteek).await?;

        let body = self.fetch.get_bytes(&self.endpoint).await?;
        let listing: Vec<EuroapteekPharmacy> = serde_json::from_slice(&body)
            .map_err(|e| ScrapeError::Parse(format!("pharmacy listing: {e}")))?;

        let mut candidates = Vec::with_capacity(listing.len());
        for raw in listing {
            if let Some(pharmacy) = self.to_pharmacy(raw).await {
                candidates.push(pharmacy);
            }
        }

        let batch = reconcile(candidates, &existing);
        info!(chain = %Chain::Euroapteek, count = batch.len(), "persisting reconciled pharmacies");
        self.store.store_all(&batch).await?;
        Ok(())
    }
}
