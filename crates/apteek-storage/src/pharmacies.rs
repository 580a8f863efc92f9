use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use apteek_core::{
    Chain, KindRating, Pharmacy, PharmacyStore, Point, RatedPharmacy, StoreError,
};

#[derive(Clone)]
pub struct PgPharmacyStore {
    pool: PgPool,
}

impl PgPharmacyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn pharmacy_from_row(row: &PgRow) -> Result<Pharmacy, StoreError> {
    let chain: String = row.try_get("chain").map_err(StoreError::decode)?;
    Ok(Pharmacy {
        id: row.try_get("id").map_err(StoreError::decode)?,
        natural_id: row.try_get("natural_id").map_err(StoreError::decode)?,
        chain: chain.parse::<Chain>().map_err(StoreError::decode)?,
        name: row.try_get("name").map_err(StoreError::decode)?,
        address: row.try_get("address").map_err(StoreError::decode)?,
        city: row.try_get("city").map_err(StoreError::decode)?,
        county: row.try_get("county").map_err(StoreError::decode)?,
        postal_code: row.try_get("postal_code").map_err(StoreError::decode)?,
        email: row.try_get("email").map_err(StoreError::decode)?,
        phone_number: row.try_get("phone_number").map_err(StoreError::decode)?,
        modified_at: row.try_get("modified_at").map_err(StoreError::decode)?,
        latitude: row.try_get("latitude").map_err(StoreError::decode)?,
        longitude: row.try_get("longitude").map_err(StoreError::decode)?,
    })
}

const PHARMACY_COLUMNS: &str = "id, natural_id, chain, name, address, city, county, \
     postal_code, email, phone_number, modified_at, latitude, longitude";

#[async_trait]
impl PharmacyStore for PgPharmacyStore {
    async fn find_in_bounds(&self, sw: Point, ne: Point) -> Result<Vec<Pharmacy>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PHARMACY_COLUMNS}
              FROM pharmacies
             WHERE latitude >= $1 AND longitude >= $2
               AND latitude <= $3 AND longitude <= $4
             ORDER BY id
            "#
        ))
        .bind(sw.lat)
        .bind(sw.lng)
        .bind(ne.lat)
        .bind(ne.lng)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        rows.iter().map(pharmacy_from_row).collect()
    }

    async fn find_by_chain(&self, chain: Chain) -> Result<Vec<Pharmacy>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PHARMACY_COLUMNS}
              FROM pharmacies
             WHERE chain = $1
             ORDER BY id
            "#
        ))
        .bind(chain.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        rows.iter().map(pharmacy_from_row).collect()
    }

    async fn ratings_for_pharmacy(&self, pharmacy_id: i64) -> Result<Vec<KindRating>, StoreError> {
        // ROLLUP adds the overall average as a row with NULL hrt_kind; for a
        // pharmacy without reviews that row's average is NULL and is dropped.
        let rows = sqlx::query(
            r#"
            SELECT hrt_kind, AVG(stars)::float4 AS stars
              FROM pharmacy_reviews
             WHERE pharmacy_id = $1
             GROUP BY ROLLUP (hrt_kind)
             ORDER BY hrt_kind NULLS FIRST
            "#,
        )
        .bind(pharmacy_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let stars: Option<f32> = row.try_get("stars").map_err(StoreError::decode)?;
            let Some(stars) = stars else { continue };
            let kind: Option<String> = row.try_get("hrt_kind").map_err(StoreError::decode)?;
            let hrt_kind = kind
                .map(|k| k.parse().map_err(StoreError::decode))
                .transpose()?;
            out.push(KindRating { hrt_kind, stars });
        }
        Ok(out)
    }

    async fn ratings_in_bounds(
        &self,
        sw: Point,
        ne: Point,
    ) -> Result<Vec<RatedPharmacy>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id,
                   p.name,
                   COALESCE(AVG(pr.stars), 0)::float4 AS avg_rating,
                   COALESCE(AVG(pr.stars) FILTER (WHERE pr.hrt_kind = 'e'), 0)::float4 AS avg_e_rating,
                   COALESCE(AVG(pr.stars) FILTER (WHERE pr.hrt_kind = 't'), 0)::float4 AS avg_t_rating
              FROM pharmacies p
              LEFT JOIN pharmacy_reviews pr ON pr.pharmacy_id = p.id
             WHERE p.latitude >= $1 AND p.latitude <= $2
               AND p.longitude >= $3 AND p.longitude <= $4
             GROUP BY p.id, p.name
             ORDER BY avg_rating DESC, avg_e_rating DESC, avg_t_rating DESC, p.name
            "#,
        )
        .bind(sw.lat)
        .bind(ne.lat)
        .bind(sw.lng)
        .bind(ne.lng)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(RatedPharmacy {
                id: row.try_get("id").map_err(StoreError::decode)?,
                name: row.try_get("name").map_err(StoreError::decode)?,
                avg_rating: row.try_get("avg_rating").map_err(StoreError::decode)?,
                avg_e_rating: row.try_get("avg_e_rating").map_err(StoreError::decode)?,
                avg_t_rating: row.try_get("avg_t_rating").map_err(StoreError::decode)?,
            });
        }
        Ok(out)
    }

    async fn store_all(&self, pharmacies: &[Pharmacy]) -> Result<(), StoreError> {
        if pharmacies.is_empty() {
            return Ok(());
        }
        debug!(count = pharmacies.len(), "persisting pharmacy batch");

        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        for pharmacy in pharmacies {
            if pharmacy.is_persisted() {
                sqlx::query(
                    r#"
                    UPDATE pharmacies
                       SET natural_id = $1, chain = $2, name = $3, address = $4,
                           city = $5, county = $6, postal_code = $7, email = $8,
                           phone_number = $9, modified_at = $10,
                           latitude = $11, longitude = $12
                     WHERE id = $13
                    "#,
                )
                .bind(pharmacy.natural_id)
                .bind(pharmacy.chain.as_str())
                .bind(&pharmacy.name)
                .bind(&pharmacy.address)
                .bind(&pharmacy.city)
                .bind(&pharmacy.county)
                .bind(&pharmacy.postal_code)
                .bind(&pharmacy.email)
                .bind(&pharmacy.phone_number)
                .bind(pharmacy.modified_at)
                .bind(pharmacy.latitude)
                .bind(pharmacy.longitude)
                .bind(pharmacy.id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::database)?;
            } else {
                sqlx::query(
                    r#"
                    INSERT INTO pharmacies
                        (natural_id, chain, name, address, city, county,
                         postal_code, email, phone_number, modified_at,
                         latitude, longitude)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    "#,
                )
                .bind(pharmacy.natural_id)
                .bind(pharmacy.chain.as_str())
                .bind(&pharmacy.name)
                .bind(&pharmacy.address)
                .bind(&pharmacy.city)
                .bind(&pharmacy.county)
                .bind(&pharmacy.postal_code)
                .bind(&pharmacy.email)
                .bind(&pharmacy.phone_number)
                .bind(pharmacy.modified_at)
                .bind(pharmacy.latitude)
                .bind(pharmacy.longitude)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::database)?;
            }
        }
        tx.commit().await.map_err(StoreError::database)
    }
}
