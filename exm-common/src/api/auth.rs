//! Signed admin bearer tokens
//!
//! # Format
//!
//! `<payload>.<signature>` where
//! - `payload` is the base64url (unpadded) encoding of the JSON claims
//! - `signature` is SHA-256 over `payload` followed by the signing secret,
//!   rendered as 64 lowercase hex characters
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. Extracting the token from a
//! request and mapping failures to HTTP statuses happens in the service.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Admin token lifetime
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Role carried by tokens issued at login
pub const ADMIN_ROLE: &str = "admin";

/// Contact address placed in issued tokens
pub const ADMIN_EMAIL: &str = "admin@excessmusic.com";

// ========================================
// Error Types
// ========================================

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not `<payload>.<signature>`, bad base64 or bad JSON
    Malformed(String),

    /// Signature does not match the payload
    InvalidSignature,

    /// `exp` is in the past
    Expired { exp: i64, now: i64 },
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed(reason) => write!(f, "Malformed token: {}", reason),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Expired { exp, now } => {
                write!(f, "Token expired {}s ago", now - exp)
            }
        }
    }
}

impl std::error::Error for TokenError {}

// ========================================
// Claims
// ========================================

/// Claims carried by an admin token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Subject (admin username, or `dev-admin` for the development bypass)
    pub sub: String,
    pub role: String,
    pub email: String,
    /// Issued-at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
}

impl AdminClaims {
    /// Claims for a fresh admin session starting at `now`
    pub fn admin(username: &str, now: DateTime<Utc>) -> Self {
        AdminClaims {
            sub: username.to_string(),
            role: ADMIN_ROLE.to_string(),
            email: ADMIN_EMAIL.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        }
    }

    /// Synthetic identity granted when auth is bypassed in development
    pub fn dev_admin() -> Self {
        AdminClaims {
            sub: "dev-admin".to_string(),
            role: ADMIN_ROLE.to_string(),
            email: ADMIN_EMAIL.to_string(),
            iat: 0,
            exp: i64::MAX,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

// ========================================
// Signing and Verification
// ========================================

/// Signature over an encoded payload
///
/// # Examples
///
/// ```
/// use exm_common::api::auth::calculate_signature;
///
/// let sig = calculate_signature("eyJzdWIiOiJhZG1pbiJ9", "secret");
/// assert_eq!(sig.len(), 64);
/// ```
pub fn calculate_signature(payload: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Encode and sign claims
pub fn sign_token(claims: &AdminClaims, secret: &str) -> String {
    // Serializing a struct of strings and integers cannot fail
    let json = serde_json::to_vec(claims).unwrap_or_default();
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = calculate_signature(&payload, secret);
    format!("{}.{}", payload, signature)
}

/// Issue a 30-day admin token for `username`
pub fn issue_admin_token(username: &str, secret: &str, now: DateTime<Utc>) -> String {
    sign_token(&AdminClaims::admin(username, now), secret)
}

/// Verify signature and expiry, returning the claims
///
/// # Examples
///
/// ```
/// use exm_common::api::auth::{issue_admin_token, verify_token};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let token = issue_admin_token("admin", "secret", now);
/// let claims = verify_token(&token, "secret", now).unwrap();
/// assert_eq!(claims.role, "admin");
/// assert!(verify_token(&token, "other", now).is_err());
/// ```
pub fn verify_token(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<AdminClaims, TokenError> {
    let (payload, signature) = token
        .trim()
        .split_once('.')
        .ok_or_else(|| TokenError::Malformed("missing separator".to_string()))?;

    let expected = calculate_signature(payload, secret);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(TokenError::InvalidSignature);
    }

    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::Malformed(e.to_string()))?;
    let claims: AdminClaims =
        serde_json::from_slice(&json).map_err(|e| TokenError::Malformed(e.to_string()))?;

    let now = now.timestamp();
    if claims.exp <= now {
        return Err(TokenError::Expired {
            exp: claims.exp,
            now,
        });
    }

    Ok(claims)
}

/// Random signing secret for sessions that did not configure one
pub fn generate_secret() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_carries_admin_claims() {
        let now = Utc::now();
        let token = issue_admin_token("admin", "secret", now);
        let claims = verify_token(&token, "secret", now).unwrap();

        assert_eq!(claims.sub, "admin");
        assert!(claims.is_admin());
        assert_eq!(claims.email, ADMIN_EMAIL);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let token = issue_admin_token("admin", "secret", now);
        assert_eq!(
            verify_token(&token, "not-the-secret", now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let now = Utc::now();
        let token = issue_admin_token("admin", "secret", now);
        let (_, sig) = token.split_once('.').unwrap();

        let mut forged = AdminClaims::admin("admin", now);
        forged.sub = "mallory".to_string();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let tampered = format!("{}.{}", forged_payload, sig);
        assert_eq!(
            verify_token(&tampered, "secret", now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - Duration::days(TOKEN_TTL_DAYS + 1);
        let token = issue_admin_token("admin", "secret", issued);
        assert!(matches!(
            verify_token(&token, "secret", Utc::now()),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let now = Utc::now();
        assert!(matches!(
            verify_token("no-separator", "secret", now),
            Err(TokenError::Malformed(_))
        ));

        // Correctly signed garbage still fails to decode
        let payload = "!!!not-base64";
        let token = format!("{}.{}", payload, calculate_signature(payload, "secret"));
        assert!(matches!(
            verify_token(&token, "secret", now),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_admin_role_verifies_but_is_not_admin() {
        let now = Utc::now();
        let mut claims = AdminClaims::admin("editor", now);
        claims.role = "editor".to_string();
        let token = sign_token(&claims, "secret");

        let verified = verify_token(&token, "secret", now).unwrap();
        assert!(!verified.is_admin());
    }

    #[test]
    fn test_generated_secrets_differ() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert!(a.len() >= 40);
    }
}
