//! Subjects, roles and the signed claim set.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed `sub` claim carried by every access credential.
pub const ACCESS_TOKEN_SUBJECT: &str = "access_token";

/// Default `iss` claim.
pub const DEFAULT_ISSUER: &str = "github.com/gitwub5/go_todo_app";

/// Opaque user identifier. Stored as the revocation entry value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of roles. Converted from the wire string once, at decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary user.
    #[default]
    #[serde(rename = "user", alias = "standard")]
    Standard,
    /// Elevated role for admin-only routes.
    Admin,
}

impl Role {
    /// Wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role meets `required`.
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::Standard => true,
            Role::Admin => self == Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "standard" => Ok(Self::Standard),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// An authenticated principal, owned by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// User identifier.
    pub id: SubjectId,
    /// Display / login name.
    pub name: String,
    /// Role granted to this user.
    pub role: Role,
}

/// JWT claim set as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Credential ID (UUID v4).
    pub jti: String,
    /// Issuer.
    pub iss: String,
    /// Always [`ACCESS_TOKEN_SUBJECT`].
    pub sub: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Role of the subject at issuance.
    pub role: Role,
    /// Name of the subject at issuance.
    pub user_name: String,
}

/// A credential whose signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Credential ID.
    pub id: String,
    /// Issuer.
    pub issuer: String,
    /// Issued-at.
    pub issued_at: DateTime<Utc>,
    /// Signed expiry.
    pub expires_at: DateTime<Utc>,
    /// Role claim.
    pub role: Role,
    /// Subject name claim.
    pub subject_name: String,
}

impl Credential {
    /// Whether the signed expiry is still ahead of `now` (whole seconds).
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.timestamp() > now.timestamp()
    }
}

impl TryFrom<Claims> for Credential {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub != ACCESS_TOKEN_SUBJECT {
            return Err(format!("unexpected subject claim: {}", claims.sub));
        }
        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| format!("iat out of range: {}", claims.iat))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| format!("exp out of range: {}", claims.exp))?;

        Ok(Self {
            id: claims.jti,
            issuer: claims.iss,
            issued_at,
            expires_at,
            role: claims.role,
            subject_name: claims.user_name,
        })
    }
}
