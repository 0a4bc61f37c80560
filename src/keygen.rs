use crate::error::{ServiceError, ValidationError};
use crate::store::{url_key, LinkStore, LINK_TTL};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error};

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
pub const GENERATED_ID_LENGTH: usize = 5;
pub const MAX_ATTEMPTS: usize = 5;
pub const MIN_ALIAS_LENGTH: usize = 3;
pub const MAX_ID_LENGTH: usize = 20;

/// Allocates short ids by drawing random candidates and reserving them in the store.
///
/// Reservation is the store's conditional insert, so two requests drawing the
/// same candidate cannot both win it.
#[derive(Clone)]
pub struct KeyGenerator {
    store: Arc<dyn LinkStore>,
}

impl KeyGenerator {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    pub async fn generate(&self, original_url: &str) -> Result<String, ServiceError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = random_id(GENERATED_ID_LENGTH);
            if self
                .store
                .set_if_absent(&url_key(&candidate), original_url, LINK_TTL)
                .await?
            {
                return Ok(candidate);
            }
            debug!(id = %candidate, attempt, "Short id collision");
        }
        error!(url = %original_url, "Could not reserve a short id after {} attempts", MAX_ATTEMPTS);
        Err(ServiceError::Exhausted)
    }

    /// Reserves a caller-chosen alias. A taken alias is a conflict, never a retry.
    pub async fn reserve_alias(&self, alias: &str, original_url: &str) -> Result<String, ServiceError> {
        if !is_valid_alias(alias) {
            return Err(ValidationError::InvalidAlias.into());
        }
        if self
            .store
            .set_if_absent(&url_key(alias), original_url, LINK_TTL)
            .await?
        {
            Ok(alias.to_string())
        } else {
            Err(ServiceError::AliasConflict)
        }
    }
}

pub fn random_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn is_alphanumeric(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub fn is_valid_alias(alias: &str) -> bool {
    (MIN_ALIAS_LENGTH..=MAX_ID_LENGTH).contains(&alias.len()) && is_alphanumeric(alias)
}
