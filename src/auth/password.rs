use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::config::PasswordConfig;

/// Upper bound on accepted plaintext length, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// Argon2id hasher configured with the deployment's work factor.
#[derive(Clone)]
pub struct Passwords {
    argon2: Argon2<'static>,
}

impl Passwords {
    pub fn from_config(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(
            cfg.memory_kib.unwrap_or(Params::DEFAULT_M_COST),
            cfg.iterations.unwrap_or(Params::DEFAULT_T_COST),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        if plain.len() > MAX_PASSWORD_BYTES {
            anyhow::bail!("password exceeds {MAX_PASSWORD_BYTES} bytes");
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Hashes on the blocking pool; argon2 is CPU bound.
    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.hash(&plain)).await?
    }
}

/// Checks `plain` against a PHC hash string. Malformed hashes never match.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "argon2 parse hash error");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?)
}

#[cfg(test)]
pub(crate) fn fast_passwords() -> Passwords {
    Passwords::from_config(&PasswordConfig {
        memory_kib: Some(1024),
        iterations: Some(1),
    })
    .expect("valid test params")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let passwords = fast_passwords();
        let hash = passwords.hash("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(verify_password("Secur3P@ssw0rd!", &hash));
        assert!(!hash.contains("Secur3P@ssw0rd!"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let passwords = fast_passwords();
        let hash = passwords.hash("correct-horse-battery-staple").unwrap();
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn same_input_hashes_differently() {
        let passwords = fast_passwords();
        let a = passwords.hash("securepassword").unwrap();
        let b = passwords.hash("securepassword").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("securepassword", &a));
        assert!(verify_password("securepassword", &b));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn rejects_oversized_input() {
        let passwords = fast_passwords();
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(passwords.hash(&long).is_err());
    }

    #[test]
    fn default_config_uses_argon2_defaults() {
        let passwords = Passwords::from_config(&PasswordConfig::default()).unwrap();
        let hash = passwords.hash("pw").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains(&format!("m={}", Params::DEFAULT_M_COST)));
    }

    #[tokio::test]
    async fn blocking_helpers_agree() {
        let passwords = fast_passwords();
        let hash = passwords.hash_blocking("pw123456".into()).await.unwrap();
        assert!(verify_password_blocking("pw123456".into(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("nope".into(), hash).await.unwrap());
    }
}
