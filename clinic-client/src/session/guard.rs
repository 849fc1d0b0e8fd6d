use crate::config::SessionSettings;
use crate::error::ClientError;
use crate::models::Credential;
use crate::session::navigator::Navigator;
use crate::session::store::{PersistedSession, SessionStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of the once-per-page-load access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        self == AccessDecision::Allowed
    }

    pub fn into_result(self, page_id: &str) -> Result<(), ClientError> {
        match self {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied => Err(ClientError::AuthRequired {
                page: page_id.to_string(),
            }),
        }
    }
}

/// Page identifier of a location path: its last non-empty segment.
///
/// `/` and the empty path map to `home`.
pub fn page_identifier(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("home")
        .to_string()
}

/// Owner of the session credential and gatekeeper of non-public pages.
///
/// Anonymous until [`establish_session`](Self::establish_session);
/// back to anonymous on [`clear_session`](Self::clear_session), on local
/// expiry detection or when the backend rejects the credential.
pub struct SessionGuard {
    credential: Option<Credential>,
    public_pages: HashSet<String>,
    entry_point: String,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    pub fn new(
        settings: &SessionSettings,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            credential: None,
            public_pages: settings.public_pages.iter().cloned().collect(),
            entry_point: settings.entry_point.clone(),
            store,
            navigator,
        }
    }

    /// Build a guard from whatever session `store` holds.
    ///
    /// A persisted credential that has already expired is discarded, and so
    /// is one the store can no longer read: the guard then starts anonymous.
    pub async fn restore(
        settings: &SessionSettings,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let persisted = match store.load().await {
            Ok(persisted) => persisted,
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::warn!(error = %reason, "Unreadable persisted session, discarding");
                store.clear().await.map_err(ClientError::Session)?;
                None
            }
        };
        let mut guard = Self::new(settings, store, navigator);
        guard.credential = persisted.map(Credential::from);

        if guard.expire_if_stale().await? {
            tracing::info!("Discarded expired persisted session");
        }

        Ok(guard)
    }

    pub fn is_public(&self, page_id: &str) -> bool {
        self.public_pages.contains(page_id)
    }

    pub fn current_credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Deny and redirect anonymous visitors of non-public pages.
    pub fn require_auth_or_redirect(&self, page_id: &str, redirect_target: &str) -> AccessDecision {
        if !self.is_public(page_id) && self.credential.is_none() {
            tracing::info!(
                page = %page_id,
                destination = %redirect_target,
                "Anonymous access to protected page denied"
            );
            self.navigator.navigate(redirect_target);
            return AccessDecision::Denied;
        }

        AccessDecision::Allowed
    }

    /// Send an authenticated visitor of `page_id` (a login page) elsewhere.
    ///
    /// Returns whether a redirect happened.
    pub fn redirect_if_authenticated(&self, page_id: &str, redirect_target: &str) -> bool {
        if self.credential.is_none() {
            return false;
        }

        tracing::debug!(
            page = %page_id,
            destination = %redirect_target,
            "Already authenticated, skipping page"
        );
        self.navigator.navigate(redirect_target);
        true
    }

    /// Store `credential` as the session, replacing any previous one.
    ///
    /// The in-memory session only changes once persistence succeeded.
    pub async fn establish_session(&mut self, credential: Credential) -> Result<(), ClientError> {
        self.store
            .save(&PersistedSession::from(&credential))
            .await
            .map_err(ClientError::Session)?;

        tracing::info!(role = ?credential.role(), "Session established");
        self.credential = Some(credential);

        Ok(())
    }

    /// Update the display name of the active session.
    pub async fn set_display_name(&mut self, display_name: &str) -> Result<(), ClientError> {
        let Some(credential) = self.credential.clone() else {
            return Ok(());
        };

        self.establish_session(credential.with_display_name(display_name))
            .await
    }

    /// Log out: forget the session and go to the entry point.
    pub async fn clear_session(&mut self) -> Result<(), ClientError> {
        let cleared = self.forget().await;
        tracing::info!("Session cleared");

        self.navigator.navigate(&self.entry_point);
        cleared
    }

    /// Drop a credential the backend refused.
    pub async fn invalidate(&mut self) -> Result<(), ClientError> {
        if self.credential.is_some() {
            tracing::warn!("Backend rejected the session credential, signing out");
        }
        self.forget().await
    }

    /// Drop the credential if its token has expired. Returns whether it did.
    pub async fn expire_if_stale(&mut self) -> Result<bool, ClientError> {
        let expired = self
            .credential
            .as_ref()
            .is_some_and(Credential::is_expired);

        if expired {
            self.forget().await?;
        }

        Ok(expired)
    }

    async fn forget(&mut self) -> Result<(), ClientError> {
        self.credential = None;
        self.store.clear().await.map_err(ClientError::Session)
    }
}
