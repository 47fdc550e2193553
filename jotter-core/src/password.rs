//! PBKDF2-HMAC-SHA256 password hashes.
//!
//! Stored form: `pbkdf2_sha256$<iterations>$<salt-hex>$<hash-hex>`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2_sha256";
const HASH_LEN: usize = 32;
pub const DEFAULT_ITERATIONS: u32 = 600_000;

pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4();
    hash_with(password, salt.as_bytes(), DEFAULT_ITERATIONS)
}

/// Constant-time compare against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iters), Some(salt_hex), Some(hash_hex), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(iterations) = iters.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
        return false;
    };
    if iterations == 0 || salt.is_empty() || expected.len() != HASH_LEN {
        return false;
    }

    let actual = derive(password, &salt, iterations);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

fn hash_with(password: &str, salt: &[u8], iterations: u32) -> String {
    format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(derive(password, salt, iterations))
    )
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_wrong_password() {
        let h = hash_with("hunter2", b"0123456789abcdef", 10);
        assert!(h.starts_with("pbkdf2_sha256$10$"));
        assert!(verify_password("hunter2", &h));
        assert!(!verify_password("hunter3", &h));
    }

    #[test]
    fn test_matches_rfc7914_vector() {
        // PBKDF2-HMAC-SHA256("passwd", "salt", 1), first 32 bytes
        let h = hash_with("passwd", b"salt", 1);
        assert_eq!(
            h,
            "pbkdf2_sha256$1$73616c74$55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_with("same", b"salt-one", 10);
        let b = hash_with("same", b"salt-two", 10);
        assert_ne!(a, b);
        assert!(hash_password("same").starts_with("pbkdf2_sha256$600000$"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let good = hash_with("x", b"salt", 10);
        let digest_hex = good.rsplit('$').next().unwrap();

        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "pbkdf2_sha256$abc$00$00"));
        assert!(!verify_password("x", &format!("sha256$10$73616c74${digest_hex}")));
        assert!(!verify_password("x", &format!("pbkdf2_sha256$0$73616c74${digest_hex}")));
        assert!(!verify_password("x", &format!("pbkdf2_sha256$10$zz${digest_hex}")));
        assert!(!verify_password("x", &format!("pbkdf2_sha256$10$${digest_hex}")));
        assert!(!verify_password("x", "pbkdf2_sha256$10$73616c74$00"));
        assert!(!verify_password("x", &format!("{good}$extra")));
    }
}
