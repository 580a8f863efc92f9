use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One retail pharmacy brand being scraped, plus the `Kalamaja`
/// pseudo-chain for hand-curated independent pharmacies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    Apotheka,
    #[serde(rename = "Südameapteek")]
    Sudameapteek,
    Benu,
    Euroapteek,
    Kalamaja,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Apotheka => "Apotheka",
            Chain::Sudameapteek => "Südameapteek",
            Chain::Benu => "Benu",
            Chain::Euroapteek => "Euroapteek",
            Chain::Kalamaja => "Kalamaja",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Apotheka" => Ok(Chain::Apotheka),
            "Südameapteek" => Ok(Chain::Sudameapteek),
            "Benu" => Ok(Chain::Benu),
            "Euroapteek" => Ok(Chain::Euroapteek),
            "Kalamaja" => Ok(Chain::Kalamaja),
            other => Err(UnknownChain(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown pharmacy chain {0:?}")]
pub struct UnknownChain(pub String);

/// A single pharmacy location.
///
/// `id` is the surrogate database key; `0` means the record has not been
/// persisted yet. `natural_id` is the source-assigned identifier (or a
/// checksum of the name for sources without one) and is unique within a
/// chain. Neither the natural id nor the modification timestamp is exposed
/// over the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: i64,
    #[serde(skip_serializing)]
    pub natural_id: i64,
    pub chain: Chain,
    pub name: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub postal_code: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub modified_at: DateTime<Utc>,
    #[serde(rename = "lat")]
    pub latitude: f32,
    #[serde(rename = "lng")]
    pub longitude: f32,
}

impl Pharmacy {
    /// An unpersisted, field-empty record for `chain`, stamped with the
    /// epoch placeholder timestamp.
    pub fn new(chain: Chain) -> Self {
        Self {
            id: 0,
            natural_id: 0,
            chain,
            name: String::new(),
            address: String::new(),
            city: String::new(),
            county: String::new(),
            postal_code: String::new(),
            email: String::new(),
            phone_number: String::new(),
            modified_at: crate::epoch(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}
