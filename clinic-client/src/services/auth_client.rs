use crate::error::ClientError;
use crate::models::{Credential, RegistrationForm, Role, UserProfile};
use crate::services::api_client::ApiClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Display name used right after login when the profile cannot be read.
pub const LOGIN_FALLBACK_NAME: &str = "Usuário";
/// Display name used on the dashboard when the profile cannot be read.
pub const DASHBOARD_FALLBACK_NAME: &str = "Veterinário";

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Exchange username/password for a credential.
    ///
    /// The profile lookup that follows only decorates the credential with a
    /// display name; its failure does not fail the login.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Credential, ClientError> {
        let url = self.api.endpoint(&self.api.settings().token_path);

        let tokens: TokenPair = self
            .api
            .post_json(&url, &TokenRequest { username, password }, None)
            .await
            .inspect_err(|e| {
                tracing::warn!(username = %username, error = %e, "Login rejected");
            })?;

        let mut credential = Credential::new(tokens.access, role);
        if let Some(refresh) = tokens.refresh {
            credential = credential.with_refresh_token(refresh);
        }

        let display_name = match self.fetch_profile(&credential).await {
            Ok(profile) => profile
                .display_name()
                .unwrap_or(LOGIN_FALLBACK_NAME)
                .to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch user profile after login");
                LOGIN_FALLBACK_NAME.to_string()
            }
        };

        tracing::info!(
            username = %username,
            role = ?role,
            "User logged in successfully"
        );

        Ok(credential.with_display_name(display_name))
    }

    pub async fn fetch_profile(&self, credential: &Credential) -> Result<UserProfile, ClientError> {
        let url = self.api.endpoint(&self.api.settings().user_path);
        self.api.get_json(&url, Some(credential)).await
    }

    /// Display name for a restored session that lacks one.
    ///
    /// Falls back to [`DASHBOARD_FALLBACK_NAME`] unless the backend rejected
    /// the credential itself.
    pub async fn fetch_display_name(&self, credential: &Credential) -> Result<String, ClientError> {
        match self.fetch_profile(credential).await {
            Ok(profile) => Ok(profile
                .display_name()
                .unwrap_or(DASHBOARD_FALLBACK_NAME)
                .to_string()),
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch user profile");
                Ok(DASHBOARD_FALLBACK_NAME.to_string())
            }
        }
    }

    /// Validate locally, then create the account.
    pub async fn register(&self, form: &RegistrationForm) -> Result<(), ClientError> {
        form.validate()?;

        let url = self.api.endpoint(&self.api.settings().register_path);
        let _: serde_json::Value = self.api.post_json(&url, &form.payload(), None).await?;

        tracing::info!(
            username = %form.username,
            user_type = form.role.user_type(),
            "Account registered"
        );

        Ok(())
    }
}
