pub mod guard;
pub mod navigator;
pub mod store;

pub use guard::{AccessDecision, SessionGuard, page_identifier};
pub use navigator::{LoggingNavigator, Navigator, RecordingNavigator};
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};
