//! Signed session tokens (HS256 JWT).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::CrmError;
use crate::model::{EmployeeId, Role};

use super::Principal;

/// Opaque bearer token identifying a logged-in employee.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Signs and checks tokens with one shared secret.
pub(crate) struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub(crate) fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    pub(crate) fn encode(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<Token, CrmError> {
        let claims = Claims {
            sub: principal.id().to_string(),
            role: principal.role(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(Token)
            .map_err(|e| CrmError::Storage(format!("token signing failed: {e}")))
    }

    pub(crate) fn decode(&self, token: &str) -> Result<Principal, CrmError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => CrmError::Unauthenticated("session expired".into()),
                _ => CrmError::Unauthenticated("invalid session token".into()),
            }
        })?;
        let id: i64 = data
            .claims
            .sub
            .parse()
            .map_err(|_| CrmError::Unauthenticated("invalid session token".into()))?;
        Ok(Principal::new(EmployeeId::from(id), data.claims.role))
    }
}
