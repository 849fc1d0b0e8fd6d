use crate::utils::jwt::decode_jwt_claims;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Role tag remembered alongside the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unclassified,
    Staff,
    Manager,
}

impl Role {
    /// Map the backend's `user_type` values.
    pub fn from_user_type(user_type: &str) -> Self {
        match user_type {
            "funcionario" => Role::Staff,
            "gerente" => Role::Manager,
            _ => Role::Unclassified,
        }
    }

    pub fn user_type(&self) -> &'static str {
        match self {
            Role::Staff => "funcionario",
            Role::Manager => "gerente",
            Role::Unclassified => "cliente",
        }
    }
}

/// Bearer credential of an authenticated session.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: Secret<String>,
    refresh_token: Option<Secret<String>>,
    role: Role,
    display_name: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, role: Role) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: None,
            role,
            display_name: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token.into()));
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_ref()
            .map(|token| token.expose_secret().as_str())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether the access token's `exp` lies at or before `now` (unix seconds).
    ///
    /// Tokens that are not JWTs carry no expiry and never expire here.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match decode_jwt_claims(self.access_token()) {
            Ok(claims) => claims.exp <= now,
            Err(_) => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}
