use anyhow::Result;
use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;

/// Claims carried by the backend's access tokens.
#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
}

/// Decode JWT claims without validation.
///
/// Only used to read `exp` so an expired session can be dropped before it
/// is sent to the backend. The backend stays the authority on validity.
pub fn decode_jwt_claims(token: &str) -> Result<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    let [_, payload, _] = parts.as_slice() else {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    };

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: JwtClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
