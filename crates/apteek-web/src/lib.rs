//! REST API for pharmacy geo queries, rating aggregation and reviews.

pub mod captcha;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod token;


use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use apteek_core::{PharmacyStore, ReviewStore};

pub use captcha::{CaptchaDisabled, CaptchaVerifier, RecaptchaVerifier};

pub struct AppState {
    pub pharmacies: Arc<dyn PharmacyStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub captcha: Arc<dyn CaptchaVerifier>,
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/pharmacies", get(handlers::pharmacies::pharmacies_in_bounds))
        .route("/pharmacies/ratings", get(handlers::ratings::ratings_in_bounds))
        .route(
            "/pharmacies/{id}/ratings",
            get(handlers::ratings::ratings_for_pharmacy),
        )
        .route(
            "/pharmacies/{id}/reviews",
            get(handlers::reviews::list_reviews).post(handlers::reviews::create_review),
        )
        .route(
            "/pharmacies/{id}/reviews/{review_id}",
            axum::routing::patch(handlers::reviews::patch_review)
                .delete(handlers::reviews::delete_review),
        );

    Router::new()
        .nest("/api/v1", api)
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(addr = bind_addr, "serving the pharmacy API");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
