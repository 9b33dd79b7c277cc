use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::expiry;

#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    /// Plaintext, or an envelope ciphertext when `salt` is set.
    pub content: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub salt: Option<Vec<u8>>,
}

impl Paste {
    pub fn is_protected(&self) -> bool {
        self.salt.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        expiry::is_expired(self.expire_at, now)
    }
}
