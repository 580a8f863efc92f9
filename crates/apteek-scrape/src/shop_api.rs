//! Apotheka and Südameapteek run near-identical store-locator APIs, so one
//! parser and one scraper cover both chains.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, info, warn};

use apteek_core::{Chain, Pharmacy, PharmacyStore};

use crate::fetch::Fetch;
use crate::zipcode::ZipLookup;
use crate::{reconcile, ChainScraper, ScrapeError};

pub const APOTHEKA_ENDPOINT: &str = "https://www.apotheka.ee/shops/shop/shops";
pub const SYDAMEAPTEEK_ENDPOINT: &str = "https://www.sudameapteek.ee/shops/shop/shops";

#[derive(Debug, Deserialize)]
struct ShopListing {
    #[allow(dead_code)]
    #[serde(rename = "totalRecords", default)]
    total_records: i64,
    items: Vec<Shop>,
}

#[derive(Debug, Deserialize)]
struct Shop {
    shop_id: String,
    name: String,
    #[serde(default)]
    city: String,
    #[serde(rename = "districtName", default)]
    county: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    updated_at: String,
    #[serde(default)]
    location_latitude: f32,
    #[serde(default)]
    location_longitude: f32,
}

/// Scraper for either of the two shop-API chains.
pub struct ShopApiScraper {
    chain: Chain,
    endpoint: String,
    fetch: Arc<dyn Fetch>,
    zip: ZipLookup,
    store: Arc<dyn PharmacyStore>,
}

impl ShopApiScraper {
    pub fn apotheka(fetch: Arc<dyn Fetch>, store: Arc<dyn PharmacyStore>) -> Self {
        Self::new(Chain::Apotheka, APOTHEKA_ENDPOINT, fetch, store)
    }

    pub fn sydameapteek(fetch: Arc<dyn Fetch>, store: Arc<dyn PharmacyStore>) -> Self {
        Self::new(Chain::Sudameapteek, SYDAMEAPTEEK_ENDPOINT, fetch, store)
    }

    pub fn new(
        chain: Chain,
        endpoint: impl Into<String>,
        fetch: Arc<dyn Fetch>,
        store: Arc<dyn PharmacyStore>,
    ) -> Self {
        Self {
            chain,
            endpoint: endpoint.into(),
            zip: ZipLookup::new(fetch.clone()),
            fetch,
            store,
        }
    }

    pub fn with_zip_lookup(mut self, zip: ZipLookup) -> Self {
        self.zip = zip;
        self
    }

    async fn to_pharmacy(&self, shop: Shop) -> Option<Pharmacy> {
        let natural_id: i64 = match shop.shop_id.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(chain = %self.chain, name = %shop.name, shop_id = %shop.shop_id,
                    "shop carries a non-numeric id, skipping");
                return None;
            }
        };

        let mut pharmacy = Pharmacy::new(self.chain);
        pharmacy.natural_id = natural_id;
        pharmacy.name = shop.name;

        // The source packs "street, city, county" into one field; the first
        // segment is the street address proper.
        pharmacy.address = shop
            .address
            .split(',')
            .next()
            .unwrap_or(&shop.address)
            .trim()
            .to_string();
        pharmacy.city = shop.city;
        pharmacy.county = shop.county;
        pharmacy.postal_code = self.zip.postal_code_for(&shop.address).await;
        pharmacy.email = shop.email;
        pharmacy.phone_number = format!("+372{}", shop.phone.replace(' ', ""));

        match NaiveDateTime::parse_from_str(&shop.updated_at, "%Y-%m-%d %H:%M:%S") {
            Ok(ts) => pharmacy.modified_at = ts.and_utc(),
            Err(_) => {
                warn!(chain = %self.chain, name = %pharmacy.name,
                    "could not parse the shop's modification timestamp");
            }
        }

        pharmacy.latitude = shop.location_latitude;
        pharmacy.longitude = shop.location_longitude;
        Some(pharmacy)
    }
}

#[async_trait]
impl ChainScraper for ShopApiScraper {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn scrape(&self) -> Result<(), ScrapeError> {
        info!(chain = %self.chain, "scraping pharmacy locations");
        let existing = self.store.find_by_chain(self.chain).await?;

        debug!(endpoint = %self.endpoint, "fetching shop listing");
        let body = self.fetch.get_bytes(&self.endpoint).await?;
        let listing: ShopListing = serde_json::from_slice(&body)
            .map_err(|e| ScrapeError::Parse(format!("shop listing: {e}")))?;

        let mut candidates = Vec::with_capacity(listing.items.len());
        for shop in listing.items {
            if let Some(pharmacy) = self.to_pharmacy(shop).await {
                candidates.push(pharmacy);
            }
        }

        let batch = reconcile(candidates, &existing);
        info!(chain = %self.chain, count = batch.len(), "persisting reconciled pharmacies");
        self.store.store_all(&batch).await?;
        Ok(())
    }
}
