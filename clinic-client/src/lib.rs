//! clinic-client: session guard, paginated collection aggregation and form
//! submission for the veterinary clinic REST API.
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

use config::{PaginationSettings, Settings};
use error::ClientError;
use models::{ConsultationForm, ConsultationOutcome, Credential, PatientForm, Role, TutorForm};
use serde_json::Value;
use service_core::retry::{RetryConfig, retry_with_backoff};
use services::{
    api_client::ApiClient, auth_client::AuthClient, collection_fetcher::PagedCollectionFetcher,
    forms::FormSubmitter,
};
use session::{FileSessionStore, MemorySessionStore, Navigator, SessionGuard, SessionStore};
use std::sync::Arc;

/// Session plus the backend clients that act on its behalf.
///
/// Any call the backend answers with 401 signs the session out.
pub struct ClinicClient {
    pub session: SessionGuard,
    pub auth: AuthClient,
    pub fetcher: PagedCollectionFetcher,
    pub forms: FormSubmitter,
}

impl ClinicClient {
    pub fn new(api: Arc<ApiClient>, pagination: &PaginationSettings, session: SessionGuard) -> Self {
        Self {
            session,
            auth: AuthClient::new(api.clone()),
            fetcher: PagedCollectionFetcher::new(api.clone(), pagination),
            forms: FormSubmitter::new(api),
        }
    }

    /// Build the client and restore the persisted session, if any.
    pub async fn from_settings(
        settings: &Settings,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let api = ApiClient::new(settings.api.clone()).map_err(|e| ClientError::Transport {
            target: settings.api.base_url.clone(),
            source: e,
        })?;

        let store: Arc<dyn SessionStore> = match &settings.session.store_path {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => Arc::new(MemorySessionStore::default()),
        };
        let session = SessionGuard::restore(&settings.session, store, navigator).await?;

        Ok(Self::new(Arc::new(api), &settings.pagination, session))
    }

    pub async fn login(&mut self, username: &str, password: &str, role: Role) -> Result<(), ClientError> {
        let credential = self.auth.login(username, password, role).await?;
        self.session.establish_session(credential).await
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.session.clear_session().await
    }

    /// Every item of collection `name`, as seen from page `page_id`.
    ///
    /// Anonymous visitors of a protected page are redirected and get
    /// [`ClientError::AuthRequired`].
    pub async fn fetch_collection(
        &mut self,
        page_id: &str,
        name: &str,
        search: Option<&str>,
    ) -> Result<Vec<Value>, ClientError> {
        let url = self.guarded_collection_url(page_id, name, search).await?;

        let result = self
            .fetcher
            .fetch_all(&url, self.session.current_credential())
            .await;

        self.observe(result).await
    }

    /// [`fetch_collection`](Self::fetch_collection), re-run from the first
    /// page on transient failures.
    pub async fn fetch_collection_with_retry(
        &mut self,
        page_id: &str,
        name: &str,
        search: Option<&str>,
        retry: &RetryConfig,
    ) -> Result<Vec<Value>, ClientError> {
        let url = self.guarded_collection_url(page_id, name, search).await?;

        let fetcher = &self.fetcher;
        let credential = self.session.current_credential();
        let target = url.as_str();
        let result = retry_with_backoff(retry, name, move || fetcher.fetch_all(target, credential)).await;

        self.observe(result).await
    }

    pub async fn submit_consultation(
        &mut self,
        form: &ConsultationForm,
    ) -> Result<ConsultationOutcome, ClientError> {
        let credential = self.session_credential("consulta").await?;

        let result = self.forms.submit_consultation(form, &credential).await;
        self.observe(result).await
    }

    /// Register a tutor and return the created record.
    pub async fn register_tutor(&mut self, form: &TutorForm) -> Result<Value, ClientError> {
        let credential = self.session_credential("novo-tutor").await?;

        let result = self.forms.submit_tutor(form, &credential).await;
        self.observe(result).await
    }

    /// Register a patient and return the created record.
    pub async fn register_patient(&mut self, form: &PatientForm) -> Result<Value, ClientError> {
        let credential = self.session_credential("novo-paciente").await?;

        let result = self.forms.submit_patient(form, &credential).await;
        self.observe(result).await
    }

    /// Display name of the session, looked up when the session lacks one.
    pub async fn display_name(&mut self) -> Result<Option<String>, ClientError> {
        let Some(credential) = self.session.current_credential() else {
            return Ok(None);
        };

        if let Some(name) = credential.display_name() {
            return Ok(Some(name.to_string()));
        }

        let name = self.auth.fetch_display_name(credential).await;
        let name = self.observe(name).await?;
        self.session.set_display_name(&name).await?;

        Ok(Some(name))
    }

    async fn guarded_collection_url(
        &mut self,
        page_id: &str,
        name: &str,
        search: Option<&str>,
    ) -> Result<String, ClientError> {
        self.session.expire_if_stale().await?;
        self.session
            .require_auth_or_redirect(page_id, self.session.entry_point())
            .into_result(page_id)?;

        self.fetcher.collection_url(name, search)
    }

    /// Live credential for a form submitted from `page`.
    async fn session_credential(&mut self, page: &str) -> Result<Credential, ClientError> {
        self.session.expire_if_stale().await?;

        self.session
            .current_credential()
            .cloned()
            .ok_or_else(|| ClientError::AuthRequired {
                page: page.to_string(),
            })
    }

    async fn observe<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result
            && e.is_unauthorized()
        {
            self.session.invalidate().await?;
        }

        result
    }
}
