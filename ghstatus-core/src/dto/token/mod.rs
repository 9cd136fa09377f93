//! GitHub App token DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `POST /app/installations/{id}/access_tokens`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationToken {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// JWT claims identifying a GitHub App
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppClaims {
    /// Issued at, backdated to tolerate clock drift
    pub iat: i64,
    pub exp: i64,
    /// The app id
    pub iss: String,
}
