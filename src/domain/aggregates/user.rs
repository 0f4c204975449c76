//! User Aggregate

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MIN_USERNAME_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Cashier,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self { Self::Customer => "customer", Self::Cashier => "cashier", Self::Admin => "admin" }
    }
}

impl FromStr for Role {
    type Err = UserError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "cashier" => Ok(Self::Cashier),
            "admin" => Ok(Self::Admin),
            other => Err(UserError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
}

#[derive(Clone, Debug)]
pub struct User {
    id: Uuid,
    username: String,
    password_hash: String,
    role: Role,
    profile: Profile,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

/// What the API hands out; never carries the hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    #[serde(flatten)]
    pub profile: Profile,
    pub is_verified: bool,
}

impl User {
    pub fn register(username: &str, password: &str, role: Role, profile: Profile, now: DateTime<Utc>) -> Result<Self, UserError> {
        let username = username.trim();
        let len = username.chars().count();
        if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) { return Err(UserError::InvalidUsername); }
        Ok(Self {
            id: Uuid::now_v7(), username: username.to_string(), password_hash: hash_password(password)?,
            role, profile, is_verified: false, created_at: now,
        })
    }

    pub fn rehydrate(
        id: Uuid, username: String, password_hash: String, role: Role, profile: Profile, is_verified: bool, created_at: DateTime<Utc>,
    ) -> Self {
        Self { id, username, password_hash, role, profile, is_verified, created_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn username(&self) -> &str { &self.username }
    pub fn password_hash(&self) -> &str { &self.password_hash }
    pub fn role(&self) -> Role { self.role }
    pub fn profile(&self) -> &Profile { &self.profile }
    pub fn is_verified(&self) -> bool { self.is_verified }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Constant-time check against the stored PHC string.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), UserError> {
        self.password_hash = hash_password(password)?;
        Ok(())
    }

    pub fn update(&mut self, profile: Profile, role: Role, is_verified: bool) {
        self.profile = profile;
        self.role = role;
        self.is_verified = is_verified;
    }

    pub fn mark_verified(&mut self) { self.is_verified = true; }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id, username: self.username.clone(), role: self.role, profile: self.profile.clone(),
            is_verified: self.is_verified,
        }
    }
}

fn hash_password(password: &str) -> Result<String, UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN { return Err(UserError::WeakPassword); }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| UserError::Hash(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserError { InvalidUsername, WeakPassword, UnknownRole(String), Hash(String) }
impl std::error::Error for UserError {}
impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername => write!(f, "Username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters long."),
            Self::WeakPassword => write!(f, "Password must be at least {MIN_PASSWORD_LEN} characters long."),
            Self::UnknownRole(r) => write!(f, "Unknown role: {r}"),
            Self::Hash(e) => write!(f, "Password hashing failed: {e}"),
        }
    }
}

impl From<UserError> for crate::GroceryError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Hash(msg) => Self::Storage(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_hashed_and_verified() {
        let u = User::register("maria@example.com", "s3cret-pass", Role::Customer, Profile::default(), Utc::now()).unwrap();
        assert_ne!(u.password_hash(), "s3cret-pass");
        assert!(u.password_hash().starts_with("$argon2"));
        assert!(u.verify_password("s3cret-pass"));
        assert!(!u.verify_password("wrong-pass"));
    }

    #[test]
    fn test_registration_rules() {
        let short = User::register("bob", "longenough", Role::Customer, Profile::default(), Utc::now());
        assert_eq!(short.unwrap_err(), UserError::InvalidUsername);
        let weak = User::register("bobby@example.com", "short", Role::Customer, Profile::default(), Utc::now());
        assert_eq!(weak.unwrap_err(), UserError::WeakPassword);
    }

    #[test]
    fn test_public_view_has_no_hash() {
        let u = User::register("cashier01", "password123", Role::Cashier, Profile::default(), Utc::now()).unwrap();
        let json = serde_json::to_value(u.public()).unwrap();
        assert_eq!(json["role"], "cashier");
        assert!(json.get("password_hash").is_none());
    }
}
