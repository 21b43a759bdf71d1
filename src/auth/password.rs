use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// One-way, salted password hashing backed by bcrypt.
///
/// Both operations are CPU-bound; handlers run them through `web::block`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Returns `false` for a wrong password and for a malformed digest.
    pub fn verify(&self, password: &str, hashed_password: &str) -> bool {
        match verify(password, hashed_password) {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("password digest could not be verified: {}", e);
                false
            }
        }
    }
}
