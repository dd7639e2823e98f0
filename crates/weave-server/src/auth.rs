//! Bearer-token verification.
//!
//! The server never stores raw tokens. Configuration lists the hex SHA-256
//! digest of each token together with the subject it identifies; incoming
//! tokens are hashed and looked up.

use std::{collections::HashMap, sync::Arc};

use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use weave_api::Caller;

use crate::error::Error;

/// Resolves a bearer token to the subject it was issued for.
pub trait TokenVerifier: Send + Sync {
  fn verify(&self, token: &str) -> Option<String>;
}

/// One configured token: `sha256` is the lowercase hex digest of the token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenEntry {
  pub sub:    String,
  pub sha256: String,
}

/// Hex SHA-256 of `token`.
pub fn digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

// ─── Digest table ─────────────────────────────────────────────────────────────

/// [`TokenVerifier`] over a table of token digests.
#[derive(Debug, Default, Clone)]
pub struct DigestTokens {
  subjects: HashMap<[u8; 32], String>,
}

impl DigestTokens {
  pub fn from_entries(entries: &[TokenEntry]) -> Result<Self, Error> {
    let mut subjects = HashMap::with_capacity(entries.len());
    for entry in entries {
      let invalid = |reason: String| Error::InvalidDigest {
        sub: entry.sub.clone(),
        reason,
      };
      let bytes = hex::decode(entry.sha256.trim()).map_err(|e| invalid(e.to_string()))?;
      let key: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| invalid(format!("expected 32 bytes, got {}", b.len())))?;
      subjects.insert(key, entry.sub.clone());
    }
    Ok(Self { subjects })
  }

  pub fn len(&self) -> usize { self.subjects.len() }

  pub fn is_empty(&self) -> bool { self.subjects.is_empty() }
}

impl TokenVerifier for DigestTokens {
  fn verify(&self, token: &str) -> Option<String> {
    let key: [u8; 32] = Sha256::digest(token.as_bytes()).into();
    self.subjects.get(&key).cloned()
  }
}

// ─── Issuing ──────────────────────────────────────────────────────────────────

/// A freshly minted token and the configuration entry that accepts it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
  pub token: String,
  pub entry: TokenEntry,
}

/// Mint a random 256-bit token for `sub`.
pub fn issue_token(sub: &str) -> IssuedToken {
  let mut raw = [0u8; 32];
  OsRng.fill_bytes(&mut raw);
  let token = URL_SAFE_NO_PAD.encode(raw);
  let entry = TokenEntry { sub: sub.to_string(), sha256: digest(&token) };
  IssuedToken { token, entry }
}

// ─── Middleware ───────────────────────────────────────────────────────────────

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Verify the bearer token and attach the resulting [`Caller`] to the
/// request, or reject with 401.
pub async fn require_bearer(
  State(verifier): State<Arc<dyn TokenVerifier>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let sub = bearer_token(req.headers())
    .and_then(|token| verifier.verify(token))
    .ok_or(Error::Unauthorized)?;
  tracing::debug!(%sub, "authenticated");
  req.extensions_mut().insert(Caller::new(sub));
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  #[test]
  fn digest_is_hex_sha256() {
    assert_eq!(
      digest("abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn issued_tokens_verify_against_their_entry() {
    let issued = issue_token("auth0|ada");
    let tokens = DigestTokens::from_entries(&[issued.entry.clone()]).unwrap();
    assert_eq!(tokens.verify(&issued.token).as_deref(), Some("auth0|ada"));
    assert_eq!(tokens.verify("not-the-token"), None);

    let other = issue_token("auth0|ada");
    assert_ne!(issued.token, other.token);
  }

  #[test]
  fn malformed_digests_are_rejected() {
    let bad_hex = TokenEntry { sub: "a".into(), sha256: "zz".into() };
    assert!(matches!(
      DigestTokens::from_entries(&[bad_hex]),
      Err(Error::InvalidDigest { .. })
    ));

    let short = TokenEntry { sub: "a".into(), sha256: "abcd".into() };
    assert!(matches!(
      DigestTokens::from_entries(&[short]),
      Err(Error::InvalidDigest { .. })
    ));
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k3n"));
    assert_eq!(bearer_token(&headers), Some("t0k3n"));
  }
}
