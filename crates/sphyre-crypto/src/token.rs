//! Dilithium-signed bearer tokens.
//!
//! Tokens use the compact `header.claims.signature` layout with base64url
//! (no padding) segments. The signature covers the two encoded segments
//! joined by a dot.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sphyre_core::{Clock, Timestamp};

use crate::error::CryptoError;
use crate::keys::{SigningKeyPair, SigningPublicKey};
use crate::signing::{self, Signature};

/// Algorithm name carried in every token header.
pub const TOKEN_ALG: &str = "Dilithium2";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    /// Key reference, usually `<issuer did>#keys-1`.
    pub kid: String,
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer DID.
    pub iss: String,
    /// Subject DID.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub iat: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<Timestamp>,
    pub exp: Timestamp,
    /// Unique token id (UUIDv7).
    pub jti: String,
}

impl TokenClaims {
    /// Claims valid from `now` for `ttl_secs` seconds.
    pub fn new(issuer_did: &str, subject_did: &str, now: Timestamp, ttl_secs: u64) -> Self {
        Self {
            iss: issuer_did.to_string(),
            sub: subject_did.to_string(),
            aud: None,
            iat: now,
            nbf: Some(now),
            exp: now.saturating_add(ttl_secs),
            jti: uuid::Uuid::now_v7().to_string(),
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.aud = Some(audience.into());
        self
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, CryptoError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| CryptoError::InvalidInput(format!("token serialization: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> Result<T, CryptoError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| CryptoError::MalformedToken(format!("{} is not base64url: {}", what, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CryptoError::MalformedToken(format!("{} is not valid JSON: {}", what, e)))
}

struct TokenParts<'a> {
    header: TokenHeader,
    claims: TokenClaims,
    signing_input: &'a str,
    signature: &'a str,
}

fn split(token: &str) -> Result<TokenParts<'_>, CryptoError> {
    let (signing_input, signature) = token
        .rsplit_once('.')
        .ok_or_else(|| CryptoError::MalformedToken("expected three segments".into()))?;
    let (header_b64, claims_b64) = signing_input
        .split_once('.')
        .ok_or_else(|| CryptoError::MalformedToken("expected three segments".into()))?;
    if claims_b64.contains('.') {
        return Err(CryptoError::MalformedToken("expected three segments".into()));
    }
    Ok(TokenParts {
        header: decode_segment(header_b64, "header")?,
        claims: decode_segment(claims_b64, "claims")?,
        signing_input,
        signature,
    })
}

/// Issue a signed token for `claims`.
pub fn issue_token(claims: &TokenClaims, keypair: &SigningKeyPair) -> Result<String, CryptoError> {
    let header = TokenHeader {
        alg: TOKEN_ALG.to_string(),
        typ: "JWT".to_string(),
        kid: format!("{}#keys-1", claims.iss),
    };
    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(claims)?);
    let signature = signing::sign(signing_input.as_bytes(), keypair);

    tracing::debug!(jti = %claims.jti, sub = %claims.sub, exp = claims.exp, "issued token");
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.as_bytes())
    ))
}

/// Verify a token's signature and validity window.
///
/// Any structural problem, a foreign algorithm, a bad signature, `now > exp`,
/// or `now < nbf` rejects the token.
pub fn verify_token(
    token: &str,
    public_key: &SigningPublicKey,
    clock: &dyn Clock,
) -> Result<TokenClaims, CryptoError> {
    let parts = split(token)?;
    if parts.header.alg != TOKEN_ALG {
        return Err(CryptoError::MalformedToken(format!(
            "unsupported algorithm '{}'",
            parts.header.alg
        )));
    }

    let sig_bytes = URL_SAFE_NO_PAD
        .decode(parts.signature)
        .map_err(|e| CryptoError::MalformedToken(format!("signature is not base64url: {}", e)))?;
    let signature = Signature::from_bytes(&sig_bytes)
        .map_err(|e| CryptoError::MalformedToken(e.to_string()))?;
    if !signing::verify(parts.signing_input.as_bytes(), &signature, public_key) {
        return Err(CryptoError::TokenSignatureInvalid);
    }

    let now = clock.now();
    let claims = parts.claims;
    if now > claims.exp {
        return Err(CryptoError::TokenExpired {
            expired_at: claims.exp,
            now,
        });
    }
    if let Some(not_before) = claims.nbf {
        if now < not_before {
            return Err(CryptoError::TokenNotYetValid { not_before, now });
        }
    }
    Ok(claims)
}

/// Decode header and claims without checking anything. Inspection only.
pub fn decode_unverified(token: &str) -> Result<(TokenHeader, TokenClaims), CryptoError> {
    let parts = split(token)?;
    Ok((parts.header, parts.claims))
}
