//! Registration and login.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings. Session
//! and token transport belong to the HTTP layer, not here; login returns
//! the player's profile and nothing else.

use crate::error::{GameError, Result};
use crate::ledger::LedgerDb;
use crate::models::{User, UserId};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Hash a password, returning the PHC-formatted string (salt and
/// parameters included).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| GameError::PasswordHash(err.to_string()))
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| GameError::PasswordHash(format!("stored hash is malformed: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    ledger: Arc<Mutex<LedgerDb>>,
}

impl AuthService {
    pub fn new(ledger: Arc<Mutex<LedgerDb>>) -> Self {
        Self { ledger }
    }

    /// Register a new player. Duplicate usernames are a conflict.
    pub fn register(&self, username: &str, password: &str) -> Result<UserId> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(GameError::InvalidArgument(
                "username and password are required".into(),
            ));
        }

        let hash = hash_password(password)?;
        let id = self.ledger.lock().insert_user(username, &hash)?;
        info!("registered user '{username}' as {id}");
        Ok(id)
    }

    /// Verify credentials and return the player. The same error covers an
    /// unknown username and a wrong password.
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .ledger
            .lock()
            .user_by_username(username)?
            .ok_or(GameError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(GameError::InvalidCredentials);
        }
        Ok(user)
    }
}
