//! Credential store for [`super::Model`]: password hashing and bearer tokens.
//!
//! Token state lives on the user row. Mutating operations only change the
//! in-memory model; callers persist the change through [`Model::token_changes`]
//! or by saving the [`ActiveModel`].

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
};
use thiserror::Error;
use tracing::{debug, trace};

use super::{ActiveModel, Column, Entity, Model};

/// Number of random bytes in a token; hex encoding doubles the length.
pub const TOKEN_BYTES: usize = 32;

/// Lifetime of a freshly issued token unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// A live token is handed out again only if it outlives this margin.
const TOKEN_REUSE_MARGIN_SECS: i64 = 60;

/// Errors raised while deriving credentials
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Hash `plaintext` with Argon2id and a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Verify `plaintext` against a PHC hash string. Any parse or hashing
/// failure counts as a mismatch.
pub fn verify_password(password_hash: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Hash verified when no user matches, so unknown usernames cost the same
/// Argon2 work as wrong passwords.
fn dummy_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("muckr-unknown-user").unwrap_or_default())
}

/// Spend one password verification on a login that matched no user.
pub fn verify_unknown_user(plaintext: &str) {
    std::hint::black_box(verify_password(dummy_hash(), plaintext));
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Model {
    pub fn check_password(&self, plaintext: &str) -> bool {
        verify_password(&self.password_hash, plaintext)
    }

    /// Whether `candidate` is this user's token and is still live at `now`.
    pub fn token_is_valid_at(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        !candidate.is_empty()
            && self.token.as_deref() == Some(candidate)
            && self.token_expiration.is_some_and(|expiration| expiration > now)
    }

    /// Return the current token, issuing a new one if the current token is
    /// missing or about to expire.
    pub fn get_token(&mut self, expires_in: Duration) -> String {
        self.get_token_at(Utc::now(), expires_in)
    }

    pub fn get_token_at(&mut self, now: DateTime<Utc>, expires_in: Duration) -> String {
        if let (Some(token), Some(expiration)) = (&self.token, self.token_expiration) {
            if expiration > now + Duration::seconds(TOKEN_REUSE_MARGIN_SECS) {
                trace!(user_id = self.id, "Reusing live token");
                return token.clone();
            }
        }

        let token = generate_token();
        self.token = Some(token.clone());
        self.token_expiration = Some(now + expires_in);
        debug!(user_id = self.id, expires_at = ?self.token_expiration, "Issued new token");
        token
    }

    /// Expire the current token immediately.
    pub fn revoke_token(&mut self) {
        self.revoke_token_at(Utc::now());
    }

    pub fn revoke_token_at(&mut self, now: DateTime<Utc>) {
        self.token_expiration = Some(now - Duration::seconds(1));
        debug!(user_id = self.id, "Revoked token");
    }

    /// Active model that writes back only the token columns of this user.
    pub fn token_changes(&self) -> ActiveModel {
        ActiveModel {
            id: Unchanged(self.id),
            token: Set(self.token.clone()),
            token_expiration: Set(self.token_expiration),
            ..Default::default()
        }
    }
}

impl ActiveModel {
    /// Replace the stored password hash. The plaintext is not retained.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), CredentialError> {
        self.password_hash = Set(hash_password(plaintext)?);
        Ok(())
    }
}

impl Entity {
    /// Resolve a bearer token to the user holding it, if it is still live.
    pub async fn check_token<C>(db: &C, token: &str) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        if token.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let user = Entity::find()
            .filter(Column::Token.eq(token))
            .one(db)
            .await?;

        Ok(user.filter(|user| user.token_is_valid_at(token, now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> Model {
        Model {
            id: 1,
            username: "john".to_string(),
            email: "john@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            token: None,
            token_expiration: None,
            is_admin: false,
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let user = user_with_password("secret");

        assert!(user.check_password("secret"));
        assert!(!user.check_password("Secret"));
        assert!(!user.check_password(""));
        assert!(!user.password_hash.contains("secret"));
    }

    #[test]
    fn test_password_check_fails_closed_on_garbage_hash() {
        let mut user = user_with_password("secret");
        user.password_hash = "xxxx".to_string();

        assert!(!user.check_password("secret"));
        assert!(!user.check_password("xxxx"));
    }

    #[test]
    fn test_set_password_on_active_model() {
        let mut active = ActiveModel::default();
        active.set_password("hunter2").unwrap();

        let Set(hash) = active.password_hash else {
            panic!("password hash should be set");
        };
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn test_unknown_user_check_runs_a_real_verification() {
        let parsed = PasswordHash::new(dummy_hash()).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");

        verify_unknown_user("anything");
        assert!(!verify_password(dummy_hash(), "anything"));
    }

    #[test]
    fn test_salt_differs_between_hashes() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_get_token_issues_hex_token() {
        let mut user = user_with_password("secret");
        let now = Utc::now();

        let token = user.get_token_at(now, Duration::hours(1));

        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(user.token.as_deref(), Some(token.as_str()));
        assert_eq!(user.token_expiration, Some(now + Duration::hours(1)));
        assert!(user.token_is_valid_at(&token, now));
    }

    #[test]
    fn test_get_token_reuses_live_token() {
        let mut user = user_with_password("secret");
        let now = Utc::now();

        let first = user.get_token_at(now, Duration::hours(1));
        let second = user.get_token_at(now + Duration::minutes(30), Duration::hours(1));

        assert_eq!(first, second);
        assert_eq!(user.token_expiration, Some(now + Duration::hours(1)));
    }

    #[test]
    fn test_get_token_replaces_token_close_to_expiry() {
        let mut user = user_with_password("secret");
        let now = Utc::now();

        let first = user.get_token_at(now, Duration::hours(1));
        let later = now + Duration::minutes(59) + Duration::seconds(30);
        let second = user.get_token_at(later, Duration::hours(1));

        assert_ne!(first, second);
        assert!(!user.token_is_valid_at(&first, later));
        assert!(user.token_is_valid_at(&second, later));
    }

    #[test]
    fn test_token_expires() {
        let mut user = user_with_password("secret");
        let now = Utc::now();
        let token = user.get_token_at(now, Duration::hours(1));

        assert!(user.token_is_valid_at(&token, now + Duration::minutes(59)));
        assert!(!user.token_is_valid_at(&token, now + Duration::hours(1)));
    }

    #[test]
    fn test_revoke_token() {
        let mut user = user_with_password("secret");
        let now = Utc::now();
        let token = user.get_token_at(now, Duration::hours(1));

        user.revoke_token_at(now);

        assert!(!user.token_is_valid_at(&token, now));
        let reissued = user.get_token_at(now, Duration::hours(1));
        assert_ne!(token, reissued);
    }

    #[test]
    fn test_empty_or_foreign_token_is_rejected() {
        let mut user = user_with_password("secret");
        let now = Utc::now();

        assert!(!user.token_is_valid_at("", now));
        user.get_token_at(now, Duration::hours(1));
        assert!(!user.token_is_valid_at("", now));
        assert!(!user.token_is_valid_at(&"0".repeat(64), now));
    }

    #[test]
    fn test_token_changes_only_touch_token_columns() {
        let mut user = user_with_password("secret");
        user.get_token(Duration::hours(1));

        let changes = user.token_changes();

        assert_eq!(changes.id, Unchanged(1));
        assert_eq!(changes.token, Set(user.token.clone()));
        assert!(!changes.username.is_set());
        assert!(!changes.password_hash.is_set());
    }
}
