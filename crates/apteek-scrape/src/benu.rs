//! Benu publishes its pharmacy list as a JSON object assigned to a
//! `pharmacies` variable inside a script tag on the store-locator page.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{info, warn};

use apteek_core::{Chain, Pharmacy, PharmacyStore};

use crate::fetch::Fetch;
use crate::{reconcile, ChainScraper, ScrapeError};

pub const BENU_ENDPOINT: &str = "https://www.benu.ee/leia-apteek";

static EMBEDDED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^.*?pharmacies = (\{.+\}).*$").unwrap());

// The address field is a dash-separated composite whose arity varies:
// "City - Name - Street" with an optional trailing district segment, or
// just "Name - Street, City" for the short form.
static ADDRESS_PARTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?) *- *(.*?)( *- *(.*?))?( *- *(.*))?$").unwrap());

#[derive(Debug, Deserialize)]
struct BenuPharmacy {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    address: String,
    #[serde(rename = "postCode", default)]
    post_code: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    email: String,
    #[serde(rename = "modTime", default)]
    mod_time: String,
}

impl BenuPharmacy {
    fn into_pharmacy(self) -> Result<Pharmacy, String> {
        let mut pharmacy = Pharmacy::new(Chain::Benu);
        pharmacy.natural_id = self.id;
        pharmacy.county = self.region;
        pharmacy.postal_code = self.post_code;
        pharmacy.email = self.email;
        pharmacy.phone_number = format!("+372{}", self.phone.replace(' ', ""));

        pharmacy.latitude = self
            .latitude
            .parse()
            .map_err(|_| format!("invalid latitude {:?}", self.latitude))?;
        pharmacy.longitude = self
            .longitude
            .parse()
            .map_err(|_| format!("invalid longitude {:?}", self.longitude))?;

        pharmacy.modified_at = NaiveDateTime::parse_from_str(&self.mod_time, "%Y-%m-%d %H:%M:%S")
            .map(|ts| ts.and_utc())
            // a missing timestamp is common; treat the record as fresh
            .unwrap_or_else(|_| Utc::now());

        if let Some(groups) = ADDRESS_PARTS.captures(&self.address) {
            let group = |i: usize| groups.get(i).map(|m| m.as_str()).unwrap_or("");
            if !group(6).is_empty() {
                pharmacy.city = group(1).to_string();
                pharmacy.name = group(4).to_string();
                pharmacy.address = format!("{}, {}", group(6), group(2));
            } else if !group(4).is_empty() {
                pharmacy.city = group(1).to_string();
                pharmacy.name = group(2).to_string();
                pharmacy.address = group(4).to_string();
            } else if !group(2).is_empty() {
                pharmacy.name = group(1).to_string();
                let parts: Vec<&str> = group(2).split(',').collect();
                if parts.len() == 2 {
                    pharmacy.address = parts[0].trim().to_string();
                    pharmacy.city = parts[1].trim().to_string();
                }
            }
        }

        Ok(pharmacy)
    }
}

pub struct BenuScraper {
    fetch: Arc<dyn Fetch>,
    endpoint: String,
    store: Arc<dyn PharmacyStore>,
}

impl BenuScraper {
    pub fn new(fetch: Arc<dyn Fetch>, store: Arc<dyn PharmacyStore>) -> Self {
        Self {
            fetch,
            endpoint: BENU_ENDPOINT.to_string(),
            store,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Pull the pharmacy JSON blob out of the locator page's script tag.
fn extract_embedded_json(html: &str) -> Result<String, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("main div.bnContainer script")
        .map_err(|e| ScrapeError::Parse(format!("bad selector: {e}")))?;

    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::Parse("locator page carries no script tag".to_string()))?;
    let text: String = script.text().collect();

    let captures = EMBEDDED_JSON
        .captures(&text)
        .ok_or_else(|| ScrapeError::Parse("no pharmacies assignment in script".to_string()))?;
    Ok(captures[1].to_string())
}

fn parse_pharmacies(json: &str) -> Result<Vec<Pharmacy>, ScrapeError> {
    let listing: HashMap<String, BenuPharmacy> = serde_json::from_str(json)
        .map_err(|e| ScrapeError::Parse(format!("pharmacy listing: {e}")))?;

    let mut out = Vec::with_capacity(listing.len());
    for (_, raw) in listing {
        let natural_id = raw.id;
        match raw.into_pharmacy() {
            Ok(p) => out.push(p),
            Err(reason) => {
                warn!(natural_id, reason, "skipping malformed record");
            }
        }
    }
    Ok(out)
}

#[async_trait]
impl ChainScraper for BenuScraper {
    fn chain(&self) -> Chain {
        Chain::Benu
    }

    async fn scrape(&self) -> Result<(), ScrapeError> {
        info!(chain = %Chain::Benu, "scraping pharmacy locations");
        let existing = self.store.find_by_chain(Chain::Benu).await?;

        let body = self.fetch.get_bytes(&self.endpoint).await?;
        let html = String::from_utf8_lossy(&body);
        let json = extract_embedded_json(&html)?;
        let candidates = parse_pharmacies(&json)?;

        let batch = reconcile(candidates, &existing);
        info!(chain = %Chain::Benu, count = batch.len(), "persisting reconciled pharmacies");
        self.store.store_all(&batch).await?;
        Ok(())
    }
}
