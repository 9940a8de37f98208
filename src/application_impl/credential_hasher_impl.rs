use super::legacy_checksum;
use crate::application_port::*;
use crate::logger::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::str::FromStr;
use std::sync::Arc;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = match PasswordHash::new(password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("stored password is not a valid PHC string: {}", e);
                return Ok(false);
            }
        };

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                warn!("stored argon2 hash could not be checked: {}", e);
                Ok(false)
            }
        }
    }
}

/// The CRC-32 digest the legacy back office reads and writes.
pub struct LegacyChecksumHasher;

#[async_trait::async_trait]
impl CredentialHasher for LegacyChecksumHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(legacy_checksum::checksum_hex(password))
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        Ok(legacy_checksum::verify(password, password_hash))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    Legacy,
    Argon2,
}

impl FromStr for PasswordScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(PasswordScheme::Legacy),
            "argon2" => Ok(PasswordScheme::Argon2),
            other => Err(format!("unknown password scheme: {}", other)),
        }
    }
}

/// Verifies whichever scheme a stored value was written with and writes new
/// values with the configured one.
pub struct MigratingPasswordHasher {
    legacy: Arc<dyn CredentialHasher>,
    argon2: Arc<dyn CredentialHasher>,
    scheme: PasswordScheme,
}

impl MigratingPasswordHasher {
    pub fn new(scheme: PasswordScheme) -> Self {
        MigratingPasswordHasher {
            legacy: Arc::new(LegacyChecksumHasher),
            argon2: Arc::new(Argon2PasswordHasher),
            scheme,
        }
    }

    fn is_argon2(password_hash: &str) -> bool {
        password_hash.trim_start().starts_with("$argon2")
    }
}

#[async_trait::async_trait]
impl CredentialHasher for MigratingPasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        match self.scheme {
            PasswordScheme::Legacy => self.legacy.hash_password(password).await,
            PasswordScheme::Argon2 => self.argon2.hash_password(password).await,
        }
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        if Self::is_argon2(password_hash) {
            if password.is_empty() {
                return Ok(false);
            }
            self.argon2
                .verify_password(password, password_hash.trim())
                .await
        } else {
            self.legacy.verify_password(password, password_hash).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn legacy_scheme_writes_checksum() {
        let hasher = MigratingPasswordHasher::new(PasswordScheme::Legacy);
        assert_eq!(hasher.hash_password("123456").await.unwrap(), "972D361");
        assert!(hasher.verify_password("123456", "972D361").await.unwrap());
        assert!(!hasher.verify_password("123457", "972D361").await.unwrap());
    }

    #[tokio::test]
    async fn argon2_values_verify_under_either_scheme() {
        let writer = MigratingPasswordHasher::new(PasswordScheme::Argon2);
        let stored = writer.hash_password("pass123").await.unwrap();
        assert!(stored.starts_with("$argon2"));

        let reader = MigratingPasswordHasher::new(PasswordScheme::Legacy);
        assert!(reader.verify_password("pass123", &stored).await.unwrap());
        assert!(!reader.verify_password("pass124", &stored).await.unwrap());
        assert!(!reader.verify_password("", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_argon2_value_is_a_mismatch() {
        let hasher = MigratingPasswordHasher::new(PasswordScheme::Argon2);
        for stored in ["$argon2id$", "$argon2id$v=19$m=bad$salt$hash", "$argon2"] {
            assert!(!hasher.verify_password("pass123", stored).await.unwrap());
        }
    }

    #[test]
    fn parses_scheme_names() {
        assert_eq!("legacy".parse(), Ok(PasswordScheme::Legacy));
        assert_eq!("argon2".parse(), Ok(PasswordScheme::Argon2));
        assert!("md5".parse::<PasswordScheme>().is_err());
    }
}
