//! HTTP plumbing shared by every backend call.
//!
//! All requests carry W3C trace context; authorized ones also carry the
//! session's bearer token. Responses are decoded in one place so every
//! caller gets the same failure taxonomy.

use crate::config::ApiSettings;
use crate::error::{BackendErrorPayload, ClientError};
use crate::models::{Credential, Page};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use service_core::observability::TracedClientExt;

pub struct ApiClient {
    client: Client,
    settings: ApiSettings,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(settings.timeout()).build()?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    /// Absolute URL of an API path such as `/token/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// URL of a collection (`{base}/{name}/`), with an optional search term.
    pub fn collection_url(&self, name: &str, search: Option<&str>) -> Result<String, ClientError> {
        let target = self.endpoint(&format!("{}/", name.trim_matches('/')));
        let mut url = Url::parse(&target).map_err(|e| ClientError::InvalidEndpoint {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        if let Some(search) = search.map(str::trim).filter(|search| !search.is_empty()) {
            url.query_pairs_mut().append_pair("search", search);
        }

        Ok(url.into())
    }

    /// GET one page of a collection.
    ///
    /// `aggregation_id` is sent as `x-request-id` so the backend can group
    /// the pages of one aggregation.
    pub async fn get_page(
        &self,
        target: &str,
        credential: Option<&Credential>,
        aggregation_id: &str,
    ) -> Result<Page, ClientError> {
        self.get(target, credential, Some(aggregation_id)).await
    }

    /// GET `target` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        target: &str,
        credential: Option<&Credential>,
    ) -> Result<T, ClientError> {
        self.get(target, credential, None).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        target: &str,
        credential: Option<&Credential>,
        request_id: Option<&str>,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .traced_get(target)
            .maybe_bearer_auth(credential.map(Credential::access_token))
            .request_id(request_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %target, error = %e, "Failed to send GET request");
                ClientError::Transport {
                    target: target.to_string(),
                    source: e,
                }
            })?;

        decode_response(target, response).await
    }

    /// POST a JSON body to `target` and decode the JSON answer.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        target: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .traced_post(target)
            .maybe_bearer_auth(credential.map(Credential::access_token))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %target, error = %e, "Failed to send POST request");
                ClientError::Transport {
                    target: target.to_string(),
                    source: e,
                }
            })?;

        decode_response(target, response).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    target: &str,
    response: Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::Transport {
            target: target.to_string(),
            source: e,
        })?;

    if !status.is_success() {
        let payload = BackendErrorPayload::from_bytes(&body);
        tracing::warn!(
            url = %target,
            status = %status,
            error = %payload.message(),
            "Backend returned non-success status"
        );
        return Err(ClientError::Backend {
            target: target.to_string(),
            status,
            payload,
        });
    }

    serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(url = %target, error = %e, "Failed to parse response body");
        ClientError::Parse {
            target: target.to_string(),
            source: e,
        }
    })
}
