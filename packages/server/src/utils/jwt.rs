use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::utils::keys::{KeyError, resolve_public_key_pem};

/// Claims of a token issued by the club site for the CTF platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Teams whose notification groups the holder joins.
    #[serde(default)]
    pub teams: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

/// Verifies RS256 tokens against the distributed public key.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_rsa_pem(pem: &[u8], issuer: &str, audience: &str) -> Result<Self, KeyError> {
        let key = DecodingKey::from_rsa_pem(pem)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        Ok(Self { key, validation })
    }

    pub fn from_config(auth: &AuthConfig) -> Result<Self, KeyError> {
        let pem = resolve_public_key_pem(
            auth.public_key_path.as_deref(),
            auth.public_key_pem.as_deref(),
        )?;
        Self::from_rsa_pem(pem.as_bytes(), &auth.issuer, &auth.audience)
    }

    /// Verify and decode a token.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(token_data.claims)
    }
}
