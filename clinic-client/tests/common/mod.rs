#![allow(dead_code)]

use base64::{Engine as _, engine::general_purpose};
use clinic_client::ClinicClient;
use clinic_client::config::{ApiSettings, PaginationSettings, SessionSettings};
use clinic_client::services::api_client::ApiClient;
use clinic_client::services::collection_fetcher::PagedCollectionFetcher;
use clinic_client::session::{MemorySessionStore, RecordingNavigator, SessionGuard};
use std::sync::Arc;
use wiremock::MockServer;

pub const API_PREFIX: &str = "/api/v1";

pub struct TestApp {
    pub server: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self {
            server: MockServer::start().await,
            store: Arc::new(MemorySessionStore::default()),
            navigator: Arc::new(RecordingNavigator::default()),
        }
    }

    /// Absolute URL of an API path on the mock backend.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.server.uri(), API_PREFIX, path)
    }

    pub fn api(&self) -> Arc<ApiClient> {
        let settings = ApiSettings::new(format!("{}{}", self.server.uri(), API_PREFIX));
        Arc::new(ApiClient::new(settings).expect("Failed to build API client"))
    }

    pub fn fetcher(&self) -> PagedCollectionFetcher {
        PagedCollectionFetcher::new(self.api(), &PaginationSettings::default())
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(
            &SessionSettings::default(),
            self.store.clone(),
            self.navigator.clone(),
        )
    }

    pub fn client(&self) -> ClinicClient {
        ClinicClient::new(self.api(), &PaginationSettings::default(), self.guard())
    }
}

/// JWT-shaped access token expiring at `exp` (unix seconds).
pub fn jwt_expiring_at(exp: i64) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "token_type": "access", "exp": exp, "user_id": 1 }).to_string(),
    );
    format!("{}.{}.signature", header, payload)
}
