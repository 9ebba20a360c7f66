use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::RngCore;
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewUser, ProfilePatch, User};
use crate::domain::error::DomainError;
use crate::infra::storage::{mapper, token, user};

/// Byte length of raw API tokens; hex-encoded they come out as 40 characters.
const TOKEN_BYTES: usize = 20;

/// Domain service containing business logic for account management
#[derive(Clone)]
pub struct Service {
    db: DatabaseConnection,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_password_len: usize,
    pub max_name_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_password_len: 5,
            max_name_len: 255,
        }
    }
}

impl Service {
    pub fn new(db: DatabaseConnection, config: ServiceConfig) -> Self {
        Self { db, config }
    }

    #[instrument(name = "accounts.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        debug!("Getting user by id");

        let row = user::find_by_id(&self.db, id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        Ok(mapper::user_to_contract(row))
    }

    #[instrument(name = "accounts.service.create_user", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");
        self.register(new_user, false).await
    }

    /// Like [`Service::create_user`] but the account is flagged staff and superuser.
    #[instrument(name = "accounts.service.create_superuser", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create_superuser(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new superuser");
        self.register(new_user, true).await
    }

    async fn register(&self, new_user: NewUser, superuser: bool) -> Result<User, DomainError> {
        self.validate_new_user(&new_user)?;

        let email = normalize_email(&new_user.email);

        // Check for email uniqueness
        if user::email_exists(&self.db, &email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::email_already_exists(email));
        }

        let password_hash = self.hash_password(&new_user.password)?;
        let now = Utc::now();

        let row = user::NewUserRow {
            id: Uuid::new_v4(),
            email: email.clone(),
            name: new_user.name,
            password_hash,
            is_staff: superuser,
            is_superuser: superuser,
            created_at: now,
            updated_at: now,
        };

        // A concurrent registration can slip in between the existence check and
        // the insert; the unique index on email is the source of truth.
        let created = match user::create(&self.db, row).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(DomainError::email_already_exists(email))
            }
            Err(e) => return Err(DomainError::database(e.to_string())),
        };

        let created_user = mapper::user_to_contract(created);
        info!("Successfully created user with id={}", created_user.id);
        Ok(created_user)
    }

    /// Verify email/password credentials and return the matching account.
    #[instrument(name = "accounts.service.authenticate", skip(self, password), fields(email = %email))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        debug!("Authenticating user");

        let email = normalize_email(email);

        let row = user::find_by_email(&self.db, &email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or(DomainError::InvalidCredentials)?;

        if !verify_password(password, &row.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }

        Ok(mapper::user_to_contract(row))
    }

    /// Issue a fresh API token for the user. The plaintext token is returned
    /// exactly once; only its SHA-256 digest is stored.
    #[instrument(name = "accounts.service.issue_token", skip(self), fields(user_id = %user_id))]
    pub async fn issue_token(&self, user_id: Uuid) -> Result<String, DomainError> {
        let mut raw = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        let plaintext = hex::encode(raw);

        let row = token::NewTokenRow {
            id: Uuid::new_v4(),
            user_id,
            digest: token_digest(&plaintext),
            created_at: Utc::now(),
        };

        token::create(&self.db, row)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("Issued token for user");
        Ok(plaintext)
    }

    /// Look up the account a plaintext token belongs to.
    /// Returns `Ok(None)` for unknown tokens; the caller decides how to reject.
    #[instrument(name = "accounts.service.resolve_token", skip_all)]
    pub async fn resolve_token(&self, plaintext: &str) -> Result<Option<User>, DomainError> {
        let digest = token_digest(plaintext);

        let Some(row) = token::find_by_digest(&self.db, &digest)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        else {
            return Ok(None);
        };

        let found = user::find_by_id(&self.db, row.user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        Ok(found.map(mapper::user_to_contract))
    }

    #[instrument(name = "accounts.service.update_profile", skip(self, patch), fields(user_id = %id))]
    pub async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, DomainError> {
        info!("Updating user profile");

        self.validate_profile_patch(&patch)?;

        let existing = user::find_by_id(&self.db, id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        let email = patch.email.as_deref().map(normalize_email);

        // Check email uniqueness if email is being changed
        if let Some(ref new_email) = email {
            if new_email != &existing.email
                && user::email_exists(&self.db, new_email)
                    .await
                    .map_err(|e| DomainError::database(e.to_string()))?
            {
                return Err(DomainError::email_already_exists(new_email.clone()));
            }
        }

        let password_hash = match patch.password.as_deref() {
            Some(p) => Some(self.hash_password(p)?),
            None => None,
        };

        let update = user::UpdateUserRow {
            email: email.clone(),
            name: patch.name,
            password_hash,
            updated_at: Utc::now(),
        };

        let updated = match user::update(&self.db, id, update).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(DomainError::email_already_exists(email.unwrap_or_default()))
            }
            Err(e) => return Err(DomainError::database(e.to_string())),
        };

        info!("Successfully updated user profile");
        Ok(mapper::user_to_contract(updated))
    }

    /// Validate new user data
    fn validate_new_user(&self, new_user: &NewUser) -> Result<(), DomainError> {
        self.validate_email(&new_user.email)?;
        self.validate_password(&new_user.password)?;
        self.validate_name(&new_user.name)?;
        Ok(())
    }

    /// Validate profile patch data
    fn validate_profile_patch(&self, patch: &ProfilePatch) -> Result<(), DomainError> {
        if let Some(ref email) = patch.email {
            self.validate_email(email)?;
        }
        if let Some(ref password) = patch.password {
            self.validate_password(password)?;
        }
        if let Some(ref name) = patch.name {
            self.validate_name(name)?;
        }
        Ok(())
    }

    /// Validate email format
    fn validate_email(&self, email: &str) -> Result<(), DomainError> {
        let Some((local, domain)) = email.rsplit_once('@') else {
            return Err(DomainError::invalid_email(email));
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(DomainError::invalid_email(email));
        }
        Ok(())
    }

    /// Validate password length
    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_len {
            return Err(DomainError::password_too_short(self.config.min_password_len));
        }
        Ok(())
    }

    /// Validate display name
    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::empty_name());
        }
        if name.len() > self.config.max_name_len {
            return Err(DomainError::name_too_long(name.len(), self.config.max_name_len));
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DomainError::password_hash(e.to_string()))
    }
}

/// Lowercase the domain part of an email; the local part is preserved as typed.
fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn token_digest(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
