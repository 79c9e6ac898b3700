//! Capacity limits and boundary validation
//!
//! Default limits: 10 conflict candidates, 20 history entries per data item.

use serde::{Deserialize, Serialize};

use crate::error::{IntegrityError, IntegrityResult};

/// Longest accepted device or data identifier
pub const MAX_ID_LEN: usize = 36;

/// Longest accepted device display name
pub const MAX_NAME_LEN: usize = 64;

/// Largest accepted verification proof
pub const MAX_PROOF_LEN: usize = 128;

pub const DEFAULT_MAX_CANDIDATES: usize = 10;
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Per-item capacity configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Candidates an open conflict may hold; further distinct hashes are rejected
    pub max_candidates: usize,
    /// History entries kept per data item; the oldest is evicted beyond this
    pub max_history: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl EngineLimits {
    pub fn new(max_candidates: usize, max_history: usize) -> Self {
        Self {
            max_candidates,
            max_history,
        }
    }

    /// Standard limits (10/20)
    pub fn standard() -> Self {
        Self::default()
    }
}

pub(crate) fn check_id(kind: &str, value: &str) -> IntegrityResult<()> {
    if value.is_empty() {
        return Err(IntegrityError::InvalidInput(format!("{} must not be empty", kind)));
    }
    if value.len() > MAX_ID_LEN {
        return Err(IntegrityError::InvalidInput(format!(
            "{} exceeds {} bytes: {}",
            kind,
            MAX_ID_LEN,
            value.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_name(name: &str) -> IntegrityResult<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(IntegrityError::InvalidInput(format!(
            "device name exceeds {} bytes: {}",
            MAX_NAME_LEN,
            name.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_proof(proof: &[u8]) -> IntegrityResult<()> {
    if proof.len() > MAX_PROOF_LEN {
        return Err(IntegrityError::InvalidInput(format!(
            "proof exceeds {} bytes: {}",
            MAX_PROOF_LEN,
            proof.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_limits() {
        let limits = EngineLimits::standard();
        assert_eq!(limits.max_candidates, 10);
        assert_eq!(limits.max_history, 20);
    }

    #[test]
    fn id_bounds() {
        assert!(check_id("data id", "").is_err());
        assert!(check_id("data id", &"x".repeat(36)).is_ok());
        assert!(check_id("data id", &"x".repeat(37)).is_err());
    }

    #[test]
    fn name_and_proof_bounds() {
        assert!(check_name("").is_ok());
        assert!(check_name(&"n".repeat(65)).is_err());
        assert!(check_proof(&[0u8; 128]).is_ok());
        assert!(check_proof(&[0u8; 129]).is_err());
    }
}
