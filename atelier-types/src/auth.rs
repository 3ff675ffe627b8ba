use std::{fmt::Display, str::FromStr};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Access level a route demands before its handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Only the admin identity may call the route.
    Admin,
    /// Any authenticated user may call the route.
    Authenticated,
    /// Anyone may call the route. Used by the dynamic dispatch surface.
    Unauthenticated,
}

/// The verified caller of a request. Inserted as a request extension by
/// the auth layer after token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(ApiError::unauthorized()),
        }
    }
}

/// A stateless session token: `<user_id>:<role>:<hex hmac-sha256 sig>`.
///
/// Session issuance lives outside this system; everything here only needs
/// to verify that a presented token was minted with the shared session
/// secret and recover the caller identity from it.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub user_id: String,
    pub role: Role,
}

impl SessionToken {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Serialize and sign the token with the session secret.
    #[must_use]
    pub fn sign(&self, secret: &str) -> String {
        let payload = format!("{}:{}", self.user_id, self.role);
        format!("{payload}:{}", signature(&payload, secret))
    }

    /// Verify a presented token and recover the caller identity.
    ///
    /// # Errors
    ///
    /// Returns an unauthorized error when the token is malformed or its
    /// signature does not match the session secret.
    pub fn verify(raw: &str, secret: &str) -> Result<Identity, ApiError> {
        let (payload, sig) = raw.rsplit_once(':').ok_or_else(ApiError::unauthorized)?;
        let (user_id, role) = payload.rsplit_once(':').ok_or_else(ApiError::unauthorized)?;
        if user_id.is_empty() {
            return Err(ApiError::unauthorized());
        }
        let role = Role::from_str(role)?;

        let sig = hex::decode(sig).map_err(|_| ApiError::unauthorized())?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| ApiError::internal_error())?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig).map_err(|_| ApiError::unauthorized())?;

        Ok(Identity {
            user_id: user_id.to_string(),
            is_admin: role == Role::Admin,
        })
    }
}

fn signature(payload: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
