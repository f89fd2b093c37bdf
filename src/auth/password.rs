use bcrypt::DEFAULT_COST;

use crate::error::Result;

/// Bcrypt password hashing.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        let cost = if cost == 0 { DEFAULT_COST } else { cost };
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Checks `password` against a stored hash. A malformed hash counts as
    /// a mismatch rather than an error so login failures stay uniform.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
