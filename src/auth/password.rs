use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Complexity policy: at least 6 characters with a lowercase letter, an
/// uppercase letter, a digit and a non-alphanumeric character. Equivalent to
/// `^(?=.*[a-z])(?=.*[A-Z])(?=.*\d)(?=.*[\W_]).{6,}$`; the regex crate has no
/// lookahead, so the predicate is spelled out.
pub fn meets_complexity_policy(password: &str) -> bool {
    password.chars().count() >= 6
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        let msg = err.to_string();
        assert!(!msg.is_empty());
    }

    #[test]
    fn policy_accepts_compliant_password() {
        assert!(meets_complexity_policy("Abcdef1!"));
        assert!(meets_complexity_policy("xY3_qq"));
    }

    #[test]
    fn policy_rejects_weak_passwords() {
        assert!(!meets_complexity_policy("abc"));
        assert!(!meets_complexity_policy("abcdef1!")); // no uppercase
        assert!(!meets_complexity_policy("ABCDEF1!")); // no lowercase
        assert!(!meets_complexity_policy("Abcdefg!")); // no digit
        assert!(!meets_complexity_policy("Abcdef12")); // no special
        assert!(!meets_complexity_policy("Ab1!x")); // too short
    }

    #[test]
    fn policy_counts_underscore_as_special() {
        // `[\W_]` in the source pattern includes the underscore.
        assert!(meets_complexity_policy("Abcde1_"));
    }
}
