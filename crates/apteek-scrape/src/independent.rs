//! Hand-curated independent pharmacies shipped as an embedded dataset.
//! There is no upstream to poll, so records never carry a modification
//! timestamp and existing rows are left alone.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use apteek_core::{Chain, Pharmacy, PharmacyStore};

use crate::{natural_id_from_name, reconcile, ChainScraper, ScrapeError};

const CURATED_JSON: &str = include_str!("../data/independent-pharmacies.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CuratedPharmacy {
    chain: Chain,
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    county: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    lat: f32,
    #[serde(default)]
    lng: f32,
}

impl CuratedPharmacy {
    fn into_pharmacy(self) -> Pharmacy {
        let mut pharmacy = Pharmacy::new(self.chain);
        pharmacy.natural_id = natural_id_from_name(&self.name);
        pharmacy.name = self.name;
        pharmacy.address = self.address;
        pharmacy.city = self.city;
        pharmacy.county = self.county;
        pharmacy.postal_code = self.postal_code;
        pharmacy.email = self.email;
        pharmacy.phone_number = self.phone_number;
        pharmacy.latitude = self.lat;
        pharmacy.longitude = self.lng;
        pharmacy
    }
}

pub struct IndependentScraper {
    store: Arc<dyn PharmacyStore>,
    dataset: &'static str,
}

impl IndependentScraper {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self {
            store,
            dataset: CURATED_JSON,
        }
    }

    #[cfg(test)]
    fn with_dataset(mut self, dataset: &'static str) -> Self {
        self.dataset = dataset;
        self
    }
}

#[async_trait]
impl ChainScraper for IndependentScraper {
    fn chain(&self) -> Chain {
        Chain::Kalamaja
    }

    async fn scrape(&self) -> Result<(), ScrapeError> {
        info!("loading curated independent pharmacies");
        let curated: Vec<CuratedPharmacy> = serde_json::from_str(self.dataset)
            .map_err(|e| ScrapeError::Parse(format!("curated dataset: {e}")))?;

        let mut candidates: Vec<Pharmacy> =
            curated.into_iter().map(CuratedPharmacy::into_pharmacy).collect();
        // one pseudo-chain per curated entry is possible; reconcile per chain
        candidates.sort_by_key(|p| p.chain.as_str());

        let mut batch = Vec::new();
        for chunk in candidates.chunk_by(|a, b| a.chain == b.chain) {
            let existing = self.store.find_by_chain(chunk[0].chain).await?;
            let merged = reconcile(chunk.to_vec(), &existing);
            if merged.len() < chunk.len() {
                info!(chain = %chunk[0].chain, "curated entries already stored");
            }
            batch.extend(merged);
        }

        if batch.is_empty() {
            return Ok(());
        }
        info!(count = batch.len(), "persisting curated pharmacies");
        self.store.store_all(&batch).await.map_err(|e| {
            warn!(error = %e, "could not persist curated pharmacies");
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apteek_core::{KindRating, Point, RatedPharmacy, StoreError};
    use std::sync::Mutex;

    struct RecordingStore {
        existing: Vec<Pharmacy>,
        stored: Mutex<Vec<Pharmacy>>,
    }

    #[async_trait]
    impl PharmacyStore for RecordingStore {
        async fn find_in_bounds(&self, _sw: Point, _ne: Point) -> Result<Vec<Pharmacy>, StoreError> {
            Ok(vec![])
        }
        async fn find_by_chain(&self, chain: Chain) -> Result<Vec<Pharmacy>, StoreError> {
            Ok(self
                .existing
                .iter()
                .filter(|p| p.chain == chain)
                .cloned()
                .collect())
        }
        async fn ratings_for_pharmacy(&self, _id: i64) -> Result<Vec<KindRating>, StoreError> {
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
            self.stored.lock().unwrap().extend_from_slice(pharmacies);
            Ok(())
        }
    }

    #[tokio::test]
    async fn embedded_dataset_parses_and_inserts() {
        let store = Arc::new(RecordingStore {
            existing: vec![],
            stored: Mutex::new(vec![]),
        });
        IndependentScraper::new(store.clone()).scrape().await.unwrap();

        let stored = store.stored.lock().unwrap();
        assert!(!stored.is_empty());
        assert_eq!(stored[0].chain, Chain::Kalamaja);
        assert_eq!(stored[0].natural_id, natural_id_from_name(&stored[0].name));
        assert_eq!(stored[0].modified_at, apteek_core::epoch());
    }

    #[tokio::test]
    async fn already_stored_entries_are_not_rewritten() {
        let mut existing = Pharmacy::new(Chain::Kalamaja);
        existing.id = 7;
        existing.natural_id = natural_id_from_name("Kalamaja Apteek");
        existing.name = "Kalamaja Apteek".to_string();

        let store = Arc::new(RecordingStore {
            existing: vec![existing],
            stored: Mutex::new(vec![]),
        });
        IndependentScraper::new(store.clone())
            .with_dataset(
                r#"[{"chain":"Kalamaja","name":"Kalamaja Apteek","address":"Kotzebue 9","city":"Tallinn"}]"#,
            )
            .scrape()
            .await
            .unwrap();

        assert!(store.stored.lock().unwrap().is_empty());
    }
}
