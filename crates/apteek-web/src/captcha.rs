//! CAPTCHA gate for review writes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const RECAPTCHA_VERIFY_ENDPOINT: &str = "https://www.google.com/recaptcha/api/siteverify";

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether the submitted challenge response checks out.
    async fn verify(&self, response: &str) -> bool;
}

/// Pass-through used when no CAPTCHA secret is configured.
pub struct CaptchaDisabled;

#[async_trait]
impl CaptchaVerifier for CaptchaDisabled {
    async fn verify(&self, _response: &str) -> bool {
        true
    }
}

#[derive(Serialize)]
struct VerificationRequest<'a> {
    secret: &'a str,
    response: &'a str,
}

#[derive(Deserialize)]
struct VerificationResponse {
    success: bool,
    #[serde(default)]
    hostname: String,
}

pub struct RecaptchaVerifier {
    client: reqwest::Client,
    endpoint: String,
    secret: String,
    allowed_domains: Vec<String>,
}

impl RecaptchaVerifier {
    pub fn new(secret: impl Into<String>, allowed_domains: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: RECAPTCHA_VERIFY_ENDPOINT.to_string(),
            secret: secret.into(),
            allowed_domains,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, response: &str) -> bool {
        let request = VerificationRequest {
            secret: &self.secret,
            response,
        };

        let resp = match self.client.post(&self.endpoint).json(&request).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "captcha verification request failed");
                return false;
            }
        };
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "captcha verification endpoint rejected the call");
            return false;
        }

        match resp.json::<VerificationResponse>().await {
            Ok(verdict) => {
                verdict.success && self.allowed_domains.iter().any(|d| d == &verdict.hostname)
            }
            Err(err) => {
                warn!(error = %err, "captcha verification response was malformed");
                false
            }
        }
    }
}
