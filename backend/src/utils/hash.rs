use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use crate::error::AppError;

/// The shared admin password, kept only as an argon2 hash.
///
/// Verification goes through argon2, so a wrong guess costs the same time
/// no matter how many leading bytes match.
#[derive(Clone, Default)]
pub struct AdminCredential {
    hash: Option<Arc<str>>,
}

impl AdminCredential {
    /// Hashes `password`; `None` yields a credential that rejects everything.
    pub fn new(password: Option<&str>) -> Result<Self, AppError> {
        let hash = match password {
            Some(password) => Some(Arc::from(hash_password(password)?)),
            None => None,
        };
        Ok(Self { hash })
    }

    pub fn is_configured(&self) -> bool {
        self.hash.is_some()
    }

    pub fn verify(&self, attempt: &str) -> Result<bool, AppError> {
        match &self.hash {
            Some(hash) => verify_password(attempt, hash),
            None => Ok(false),
        }
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

fn verify_password(attempt: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(attempt.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_credential_accepts_only_the_password() {
        let credential = AdminCredential::new(Some("s3cret")).unwrap();
        assert!(credential.is_configured());
        assert!(credential.verify("s3cret").unwrap());
        assert!(!credential.verify("s3cre").unwrap());
        assert!(!credential.verify("").unwrap());
    }

    #[test]
    fn unconfigured_credential_rejects_everything() {
        let credential = AdminCredential::new(None).unwrap();
        assert!(!credential.is_configured());
        assert!(!credential.verify("admin123").unwrap());
    }
}
