use std::sync::Mutex;

/// Performs the navigation side effect of a guard decision or a logout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

/// Reports navigations through tracing; used by the CLI.
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, destination: &str) {
        tracing::info!(destination = %destination, "Redirecting");
    }
}

/// Remembers every navigation, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        self.visits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(destination.to_string());
    }
}
