//! Two-state admin gate. The reference hash comes from configuration; the
//! gate never stores the plaintext credential.

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::error::{KioskError, KioskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Unlocked,
}

/// Guards the admin menu. A fresh gate is locked; `lock` is called when the
/// operator leaves admin mode so the next visit re-authenticates.
#[derive(Debug, Clone)]
pub struct AdminGate {
    reference: Option<[u8; 32]>,
    salt: String,
    state: GateState,
}

impl AdminGate {
    pub fn new(reference_hex: Option<&str>, salt: impl Into<String>) -> Self {
        Self {
            reference: reference_hex.and_then(decode_hex),
            salt: salt.into(),
            state: GateState::Locked,
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.password_sha256.as_deref(), config.salt.clone())
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// False when no credential was configured; such a gate never opens.
    pub fn is_configured(&self) -> bool {
        self.reference.is_some()
    }

    /// Try to unlock with `candidate`. On mismatch the gate stays locked and
    /// an `Auth` error is returned for the caller to display.
    pub fn unlock(&mut self, candidate: &str) -> KioskResult<()> {
        let Some(reference) = self.reference else {
            warn!("admin login attempted but no credential is configured");
            return Err(KioskError::Auth(
                "Admin mode is disabled: no admin credential configured.".to_string(),
            ));
        };

        let digest = salted_digest(&self.salt, candidate);
        if constant_time_eq(&digest, &reference) {
            self.state = GateState::Unlocked;
            info!("admin gate unlocked");
            Ok(())
        } else {
            self.state = GateState::Locked;
            warn!("admin login rejected");
            Err(KioskError::Auth("Incorrect password. Try again.".to_string()))
        }
    }

    pub fn lock(&mut self) {
        if self.state == GateState::Unlocked {
            info!("admin gate locked");
        }
        self.state = GateState::Locked;
    }
}

/// Hex-encoded SHA-256 of `salt || password`, the format stored in config.
pub fn hash_password(salt: &str, password: &str) -> String {
    salted_digest(salt, password)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn salted_digest(salt: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(left: &[u8; 32], right: &[u8; 32]) -> bool {
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn decode_hex(raw: &str) -> Option<[u8; 32]> {
    let raw = raw.trim();
    if raw.len() != 64 || !raw.is_ascii() {
        return None;
    }
    let mut out = [0u8; 32];
    for (idx, slot) in out.iter_mut().enumerate() {
        *slot = u8::from_str_radix(&raw[idx * 2..idx * 2 + 2], 16).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsalted_hash_matches_known_digest() {
        assert_eq!(
            hash_password("", "admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
    }

    #[test]
    fn correct_password_unlocks_once() {
        let reference = hash_password("salt", "s3cret");
        let mut gate = AdminGate::new(Some(&reference), "salt");
        assert_eq!(gate.state(), GateState::Locked);

        gate.unlock("s3cret").unwrap();
        assert!(gate.is_unlocked());

        gate.lock();
        assert_eq!(gate.state(), GateState::Locked);
    }

    #[test]
    fn wrong_password_stays_locked_indefinitely() {
        let reference = hash_password("salt", "s3cret");
        let mut gate = AdminGate::new(Some(&reference), "salt");

        for attempt in ["", "S3CRET", "s3cret ", "salts3cret"] {
            let err = gate.unlock(attempt).unwrap_err();
            assert!(matches!(err, KioskError::Auth(_)));
            assert!(!gate.is_unlocked());
        }

        gate.unlock("s3cret").unwrap();
        assert!(gate.is_unlocked());
    }

    #[test]
    fn salt_changes_the_digest() {
        assert_ne!(hash_password("a", "pw"), hash_password("b", "pw"));
        let mut gate = AdminGate::new(Some(&hash_password("a", "pw")), "b");
        assert!(gate.unlock("pw").is_err());
    }

    #[test]
    fn unconfigured_gate_never_opens() {
        let mut gate = AdminGate::new(None, "");
        assert!(!gate.is_configured());
        assert!(gate.unlock("").is_err());
        assert!(gate.unlock("admin123").is_err());
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn uppercase_reference_hex_is_accepted() {
        let reference = hash_password("", "pw").to_uppercase();
        let mut gate = AdminGate::new(Some(&reference), "");
        assert!(gate.unlock("pw").is_ok());
    }
}
