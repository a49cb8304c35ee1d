use sha2::{Digest, Sha256};

/// Digest of a password as stored in the `password` column.
///
/// Deliberately unsalted SHA-256 for compatibility with already-stored
/// credentials; swapping in a salted KDF requires a migration of every
/// existing digest.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}

/// Exactly one `@`, no whitespace, non-empty local part, and a domain with
/// an interior dot.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.find('.') {
        Some(position) => position > 0 && position < domain.len() - 1,
        None => false,
    }
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_round_trips() {
        let digest = hash_password("secret1");
        assert!(verify_password("secret1", &digest));
        assert!(!verify_password("secret2", &digest));
    }

    #[test]
    fn digest_is_deterministic_hex() {
        let digest = hash_password("user@password");
        assert_eq!(digest, hash_password("user@password"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("john.doe@sub.example.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@x."));
        assert!(!is_valid_email("plainaddress"));
    }

    #[test]
    fn password_length_boundary() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
