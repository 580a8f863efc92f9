//! End-to-end scrape cycles against canned HTTP payloads and an in-memory
//! pharmacy store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use apteek_core::{Chain, KindRating, Pharmacy, PharmacyStore, Point, RatedPharmacy, StoreError};
use apteek_scrape::benu::BenuScraper;
use apteek_scrape::euroapteek::EuroapteekScraper;
use apteek_scrape::shop_api::ShopApiScraper;
use apteek_scrape::zipcode::ZipLookup;
use apteek_scrape::{natural_id_from_name, ChainScraper, Fetch, FetchError};

const SHOP_LISTING: &str = include_str!("fixtures/apotheka_shops.json");
const EUROAPTEEK_LISTING: &str = include_str!("fixtures/euroapteek_pharmacies.json");
const BENU_PAGE: &str = include_str!("fixtures/benu_locator.html");
const ZIP_RESPONSE: &str =
    r#"{"addresses":[{"address":"Suur-Sõjamäe 4, Tallinn","zipCode":"11415"}]}"#;

/// Serves a canned body per URL prefix, 404 otherwise.
struct CannedFetch {
    routes: Vec<(&'static str, String)>,
}

#[async_trait]
impl Fetch for CannedFetch {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        for (prefix, body) in &self.routes {
            if url.starts_with(prefix) {
                return Ok(body.clone().into_bytes());
            }
        }
        Err(FetchError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }
}

#[derive(Default)]
struct MemoryStore {
    pharmacies: Mutex<HashMap<i64, Pharmacy>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    fn seed(&self, mut pharmacy: Pharmacy) {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        pharmacy.id = *next;
        self.pharmacies
            .lock()
            .unwrap()
            .insert(pharmacy.id, pharmacy);
    }

    fn all(&self) -> Vec<Pharmacy> {
        let mut rows: Vec<Pharmacy> = self.pharmacies.lock().unwrap().values().cloned().collect();
        rows.sort_by_key(|p| p.id);
        rows
    }
}

#[async_trait]
impl PharmacyStore for MemoryStore {
    async fn find_in_bounds(&self, _sw: Point, _ne: Point) -> Result<Vec<Pharmacy>, StoreError> {
        Ok(self.all())
    }

    async fn find_by_chain(&self, chain: Chain) -> Result<Vec<Pharmacy>, StoreError> {
        Ok(self.all().into_iter().filter(|p| p.chain == chain).collect())
    }

    async fn ratings_for_pharmacy(&self, _pharmacy_id: i64) -> Result<Vec<KindRating>, StoreError> {
        Ok(vec![])
    }

    async fn ratings_in_bounds(
        &self,
        _sw: Point,
        _ne: Point,
    ) -> Result<Vec<RatedPharmacy>, StoreError> {
        Ok(vec![])
    }

    async fn store_all(&self, pharmacies: &[Pharmacy]) -> Result<(), StoreError> {
        let mut rows = self.pharmacies.lock().unwrap();
        for pharmacy in pharmacies {
            let mut pharmacy = pharmacy.clone();
            if !pharmacy.is_persisted() {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                pharmacy.id = *next;
            }
            rows.insert(pharmacy.id, pharmacy);
        }
        Ok(())
    }
}

fn fetcher() -> Arc<CannedFetch> {
    Arc::new(CannedFetch {
        routes: vec![
            ("https://www.apotheka.ee/shops", SHOP_LISTING.to_string()),
            ("https://listing.test/euroapteek", EUROAPTEEK_LISTING.to_string()),
            ("https://listing.test/benu", BENU_PAGE.to_string()),
            ("https://www.omniva.ee/", ZIP_RESPONSE.to_string()),
        ],
    })
}

#[tokio::test]
async fn first_cycle_inserts_every_listed_shop() {
    let fetch = fetcher();
    let store = Arc::new(MemoryStore::default());
    let scraper = ShopApiScraper::apotheka(fetch.clone(), store.clone())
        .with_zip_lookup(ZipLookup::new(fetch));

    scraper.scrape().await.unwrap();

    let rows = store.all();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|p| p.chain == Chain::Apotheka));
    assert!(rows.iter().all(|p| p.is_persisted()));
    assert_eq!(rows[0].postal_code, "11415");
    // the listing's third entry has a non-numeric shop id and is skipped
    assert!(rows.iter().all(|p| p.natural_id == 17 || p.natural_id == 42));
}

#[tokio::test]
async fn second_cycle_updates_only_the_newer_record() {
    let fetch = fetcher();
    let store = Arc::new(MemoryStore::default());

    // shop 17 is stale locally, shop 42 is already current
    let mut stale = Pharmacy::new(Chain::Apotheka);
    stale.natural_id = 17;
    stale.name = "Ülemiste Apteek (old listing)".to_string();
    stale.modified_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.seed(stale);

    let mut current = Pharmacy::new(Chain::Apotheka);
    current.natural_id = 42;
    current.name = "Viru Apteek".to_string();
    current.modified_at = Utc.with_ymd_and_hms(2025, 3, 14, 8, 30, 0).unwrap();
    store.seed(current);

    let scraper = ShopApiScraper::apotheka(fetch.clone(), store.clone())
        .with_zip_lookup(ZipLookup::new(fetch));
    scraper.scrape().await.unwrap();

    let rows = store.all();
    assert_eq!(rows.len(), 2);

    let refreshed = rows.iter().find(|p| p.natural_id == 17).unwrap();
    assert_eq!(refreshed.id, 1, "update keeps the surrogate id");
    assert_eq!(refreshed.name, "Ülemiste Apteek");

    let untouched = rows.iter().find(|p| p.natural_id == 42).unwrap();
    assert_eq!(untouched.name, "Viru Apteek");
}

#[tokio::test]
async fn euroapteek_cycle_keeps_well_formed_records_and_stays_insert_only() {
    let fetch = fetcher();
    let store = Arc::new(MemoryStore::default());
    let scraper = EuroapteekScraper::new(fetch.clone(), store.clone())
        .with_endpoint("https://listing.test/euroapteek")
        .with_zip_lookup(ZipLookup::new(fetch));

    scraper.scrape().await.unwrap();

    // the second listing entry has an unparsable latitude and is dropped
    let rows = store.all();
    assert_eq!(rows.len(), 1);

    let sikupilli = &rows[0];
    assert_eq!(sikupilli.chain, Chain::Euroapteek);
    assert_eq!(sikupilli.natural_id, natural_id_from_name("Sikupilli Apteek"));
    assert_eq!(sikupilli.phone_number, "+3726558415");
    assert_eq!(sikupilli.county, "Harjumaa");
    assert_eq!(sikupilli.postal_code, "11415");
    assert_eq!(sikupilli.modified_at, apteek_core::epoch());

    // the source reports no timestamps, so a re-scrape persists nothing
    scraper.scrape().await.unwrap();
    let rows = store.all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, sikupilli.id);
}

#[tokio::test]
async fn benu_cycle_parses_the_embedded_listing() {
    let fetch = fetcher();
    let store = Arc::new(MemoryStore::default());
    let scraper =
        BenuScraper::new(fetch, store.clone()).with_endpoint("https://listing.test/benu");

    scraper.scrape().await.unwrap();

    // the record with an empty latitude is dropped
    let rows = store.all();
    assert_eq!(rows.len(), 1);

    let solaris = &rows[0];
    assert_eq!(solaris.chain, Chain::Benu);
    assert_eq!(solaris.natural_id, 101);
    assert_eq!(solaris.name, "Benu Apteek Solaris");
    assert_eq!(solaris.city, "Tallinn");
    assert_eq!(solaris.address, "Estonia pst 9");
    assert_eq!(solaris.postal_code, "10143");
    assert_eq!(solaris.phone_number, "+3726670440");
    assert_eq!(
        solaris.modified_at,
        Utc.with_ymd_and_hms(2025, 2, 10, 9, 15, 0).unwrap()
    );
}
