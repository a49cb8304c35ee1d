use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "RESTAURANT")]
    Restaurant,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityKind {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "restaurant")]
    Restaurant,
}

/// The authenticated subject carried inside a token. Immutable once issued;
/// there is no server-side revocation, a token only stops working when it
/// expires.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub kind: IdentityKind,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    identity: Identity,
    iat: i64,
    exp: i64,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub fn issue(secret: &str, identity: Identity) -> Result<String, Error> {
    issue_at(secret, identity, Utc::now())
}

fn issue_at(secret: &str, identity: Identity, now: DateTime<Utc>) -> Result<String, Error> {
    let header = Header {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = Claims {
        identity,
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
    };

    let header = serde_json::to_vec(&header).map_err(|err| {
        tracing::error!("Failed to serialize token header: {}", err);
        Error::UnexpectedError
    })?;
    let claims = serde_json::to_vec(&claims).map_err(|err| {
        tracing::error!("Failed to serialize token claims: {}", err);
        Error::UnexpectedError
    })?;

    let message = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claims)
    );

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|err| {
        tracing::error!("Failed to initialize token signer: {}", err);
        Error::UnexpectedError
    })?;
    mac.update(message.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", message, signature))
}

/// Decodes and checks a token. Any failure (malformed segments, unknown
/// algorithm, bad signature, expiry) yields `None`; callers treat the
/// request as unauthenticated.
pub fn verify(secret: &str, token: &str) -> Option<Identity> {
    verify_at(secret, token, Utc::now())
}

fn verify_at(secret: &str, token: &str, now: DateTime<Utc>) -> Option<Identity> {
    let mut segments = token.split('.');
    let (header, claims, signature) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(header), Some(claims), Some(signature), None) => (header, claims, signature),
        _ => return None,
    };

    let decoded_header = URL_SAFE_NO_PAD.decode(header).ok()?;
    let decoded_header = serde_json::from_slice::<Header>(&decoded_header).ok()?;
    if decoded_header.alg != "HS256" {
        return None;
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(claims.as_bytes());
    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
    mac.verify_slice(&signature).ok()?;

    let claims = URL_SAFE_NO_PAD.decode(claims).ok()?;
    let claims = serde_json::from_slice::<Claims>(&claims).ok()?;

    // A correctly signed but expired token is just as invalid.
    if claims.exp <= now.timestamp() {
        return None;
    }

    Some(claims.identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-token-secret";

    fn identity() -> Identity {
        Identity {
            id: "01J3ZK7F9QW9R2M9V1T5B8C6D4".to_string(),
            email: "a@x.com".to_string(),
            role: Role::User,
            kind: IdentityKind::User,
        }
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let token = issue(SECRET, identity()).unwrap();
        assert_eq!(verify(SECRET, &token), Some(identity()));
    }

    #[test]
    fn expired_token_is_invalid() {
        let issued = Utc::now() - Duration::days(TOKEN_LIFETIME_DAYS) - Duration::minutes(1);
        let token = issue_at(SECRET, identity(), issued).unwrap();
        assert_eq!(verify(SECRET, &token), None);
    }

    #[test]
    fn token_is_valid_until_expiry() {
        let issued = Utc::now();
        let token = issue_at(SECRET, identity(), issued).unwrap();

        let just_before = issued + Duration::days(TOKEN_LIFETIME_DAYS) - Duration::minutes(1);
        assert!(verify_at(SECRET, &token, just_before).is_some());

        let at_expiry = issued + Duration::days(TOKEN_LIFETIME_DAYS);
        assert_eq!(verify_at(SECRET, &token, at_expiry), None);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = issue(SECRET, identity()).unwrap();
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(verify(SECRET, &tampered), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(SECRET, identity()).unwrap();
        assert_eq!(verify("another-secret", &token), None);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(verify(SECRET, ""), None);
        assert_eq!(verify(SECRET, "only-one-segment"), None);
        assert_eq!(verify(SECRET, "a.b"), None);
        assert_eq!(verify(SECRET, "a.b.c.d"), None);
        assert_eq!(verify(SECRET, "not!base64.also not.nope"), None);
    }

    #[test]
    fn restaurant_identity_round_trips() {
        let identity = Identity {
            id: "01J3ZKAQ2B7N8V5X1W9Y0D6E3C".to_string(),
            email: "bella@italia.com".to_string(),
            role: Role::Restaurant,
            kind: IdentityKind::Restaurant,
        };
        let token = issue(SECRET, identity.clone()).unwrap();
        assert_eq!(verify(SECRET, &token), Some(identity));
    }
}
