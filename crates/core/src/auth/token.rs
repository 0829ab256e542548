use async_trait::async_trait;
use std::collections::HashMap;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::config::TokenEntry;

/// Authenticator backed by a static list of bearer tokens.
///
/// Each configured token maps to a user id, and that user id is what session
/// ownership is keyed on. Tokens are compared in constant time. Accepts the
/// token from `Authorization: Bearer <token>` or an `X-API-Key` header.
pub struct TokenAuthenticator {
    tokens: Vec<TokenEntry>,
}

impl TokenAuthenticator {
    pub fn new(tokens: Vec<TokenEntry>) -> Self {
        Self { tokens }
    }

    fn extract_token(request: &AuthRequest) -> Option<&str> {
        if let Some(auth_header) = request.headers.get("authorization") {
            if let Some(token) = auth_header.strip_prefix("Bearer ") {
                return Some(token);
            }
            if let Some(token) = auth_header.strip_prefix("bearer ") {
                return Some(token);
            }
        }

        request.headers.get("x-api-key").map(|s| s.as_str())
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = Self::extract_token(request).ok_or(AuthError::NotAuthenticated)?;

        for entry in &self.tokens {
            if constant_time_eq(provided.as_bytes(), entry.token.as_bytes()) {
                return Ok(Identity {
                    user_id: entry.user_id.clone(),
                    method: "token".to_string(),
                    claims: HashMap::new(),
                });
            }
        }

        Err(AuthError::InvalidCredentials(
            "unknown bearer token".to_string(),
        ))
    }

    fn method_name(&self) -> &'static str {
        "token"
    }
}

/// Constant-time byte comparison to avoid timing side channels.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
