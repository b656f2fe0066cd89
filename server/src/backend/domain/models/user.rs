use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// SHA-256 hex digest of the API token
    pub api_token_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// A fresh 64 character API token
    pub fn generate_api_token() -> String {
        format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        )
    }

    pub fn hash_api_token(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        digest.iter().map(|byte| format!("{:02x}", byte)).collect()
    }
}
