pub mod api_client;
pub mod auth_client;
pub mod collection_fetcher;
pub mod forms;
