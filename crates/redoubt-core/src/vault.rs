//! Master password vault backing the hardcore override.
//!
//! The stored record is `v1$<salt-hex>$<mac-hex>`: a 16-byte random salt
//! keying an HMAC-SHA256 over the password bytes. Plaintext is never
//! retained. Absence of the record means no override capability exists;
//! that state is explicit (the record is removed outright), never an
//! empty-string sentinel.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::storage::Database;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted master password length.
pub const MIN_PASSWORD_LEN: usize = 8;

const RECORD_KEY: &str = "master_password";
const RECORD_VERSION: &str = "v1";
const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let mac = compute_mac(&salt, password);
    format!(
        "{RECORD_VERSION}${}${}",
        hex::encode(salt),
        hex::encode(mac)
    )
}

/// Verify a password against a stored record. Unparseable records and
/// wrong passwords both verify as `false`.
pub fn verify_password(password: &str, record: &str) -> bool {
    let mut parts = record.split('$');
    let (Some(version), Some(salt_hex), Some(mac_hex), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if version != RECORD_VERSION {
        return false;
    }
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(mac_hex) else {
        return false;
    };
    let actual = compute_mac(&salt, password);
    constant_time_eq(&actual, &expected)
}

fn compute_mac(salt: &[u8], password: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC can take keys of any size");
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Settings-backed vault. Presence of the record is the capability
/// check; callers distinguish "no override capability" from "wrong
/// password" via [`PasswordVault::is_set`], not the verify result.
pub struct PasswordVault<'a> {
    db: &'a Database,
}

impl<'a> PasswordVault<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store a new master password, replacing any previous record.
    /// Rejects passwords shorter than [`MIN_PASSWORD_LEN`].
    pub fn set(&self, password: &str) -> Result<(), CoreError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        self.db.kv_set(RECORD_KEY, &hash_password(password))?;
        Ok(())
    }

    /// Whether override capability exists at all.
    pub fn is_set(&self) -> Result<bool, DatabaseError> {
        Ok(self.db.kv_get(RECORD_KEY)?.is_some())
    }

    /// Constant-time verification. Returns `false` when no record is
    /// stored, never an error.
    pub fn verify(&self, password: &str) -> Result<bool, DatabaseError> {
        match self.db.kv_get(RECORD_KEY)? {
            Some(record) => Ok(verify_password(password, &record)),
            None => Ok(false),
        }
    }

    /// Remove the record, disabling the override capability outright.
    pub fn clear(&self) -> Result<(), DatabaseError> {
        self.db.kv_delete(RECORD_KEY)
    }
}
