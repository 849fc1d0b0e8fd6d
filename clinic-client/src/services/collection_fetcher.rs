//! Exhaustive aggregation of paginated collections.
//!
//! A collection is followed page by page through its `next` links until the
//! backend stops supplying one. The result is either every item of every
//! page, in order, or an error: accumulated items are dropped on failure.

use crate::config::PaginationSettings;
use crate::error::ClientError;
use crate::models::Credential;
use crate::services::api_client::ApiClient;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct PagedCollectionFetcher {
    api: Arc<ApiClient>,
    max_pages: usize,
}

impl PagedCollectionFetcher {
    pub fn new(api: Arc<ApiClient>, settings: &PaginationSettings) -> Self {
        Self {
            api,
            max_pages: settings.max_pages,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// See [`ApiClient::collection_url`].
    pub fn collection_url(&self, name: &str, search: Option<&str>) -> Result<String, ClientError> {
        self.api.collection_url(name, search)
    }

    /// Fetch every page starting at `initial_endpoint`.
    ///
    /// `credential`, when given, is sent as bearer token on every page.
    pub async fn fetch_all(
        &self,
        initial_endpoint: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<Value>, ClientError> {
        self.fetch_all_cancellable(initial_endpoint, credential, &CancellationToken::new())
            .await
    }

    /// Like [`fetch_all`](Self::fetch_all), aborting with
    /// [`ClientError::Cancelled`] once `cancel` fires.
    #[tracing::instrument(
        name = "fetch_all",
        skip(self, credential, cancel),
        fields(
            endpoint = %initial_endpoint,
            authenticated = credential.is_some(),
            aggregation_id = tracing::field::Empty
        )
    )]
    pub async fn fetch_all_cancellable(
        &self,
        initial_endpoint: &str,
        credential: Option<&Credential>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, ClientError> {
        let aggregation_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("aggregation_id", aggregation_id.as_str());

        let mut items = Vec::new();
        let mut pages = 0usize;
        let mut next_target = Some(initial_endpoint.to_string());

        while let Some(current) = next_target.take() {
            if pages >= self.max_pages {
                tracing::warn!(
                    url = %current,
                    limit = self.max_pages,
                    "Pagination ceiling reached, aborting aggregation"
                );
                return Err(ClientError::PageLimitExceeded {
                    target: current,
                    limit: self.max_pages,
                });
            }

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(url = %current, pages, "Aggregation cancelled");
                    return Err(ClientError::Cancelled { target: current.clone() });
                }
                page = self.api.get_page(&current, credential, &aggregation_id) => page?,
            };

            pages += 1;
            tracing::debug!(
                url = %current,
                page = pages,
                items = page.items.len(),
                "Fetched collection page"
            );

            next_target = page
                .next
                .as_deref()
                .map(|next| resolve_next(&current, next))
                .transpose()?;
            items.extend(page.items);
        }

        tracing::info!(pages, items = items.len(), "Collection aggregation complete");

        Ok(items)
    }
}

/// `next` links are normally absolute; relative ones resolve against the
/// page that carried them.
fn resolve_next(current: &str, next: &str) -> Result<String, ClientError> {
    let invalid = |reason: String| ClientError::InvalidEndpoint {
        target: next.to_string(),
        reason,
    };

    match Url::parse(next) {
        Ok(url) => Ok(url.into()),
        Err(_) => {
            let base = Url::parse(current).map_err(|e| invalid(e.to_string()))?;
            base.join(next)
                .map(String::from)
                .map_err(|e| invalid(e.to_string()))
        }
    }
}
