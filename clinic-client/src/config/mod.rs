use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub pagination: PaginationSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Root of the versioned REST API, e.g. `http://localhost:8000/api/v1`.
    pub base_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_user_path")]
    pub user_path: String,
    #[serde(default = "default_register_path")]
    pub register_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_path() -> String {
    "/token/".to_string()
}

fn default_user_path() -> String {
    "/auth/user/".to_string()
}

fn default_register_path() -> String {
    "/auth/register/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_path: default_token_path(),
            user_path: default_user_path(),
            register_path: default_register_path(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct PaginationSettings {
    /// Ceiling on pages followed by one aggregation. Guards against
    /// backends whose `next` links cycle.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

pub const DEFAULT_MAX_PAGES: usize = 10_000;

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    /// Page identifiers reachable without a credential.
    #[serde(default = "default_public_pages")]
    pub public_pages: Vec<String>,
    /// Where anonymous visitors and logged-out users are sent.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Where authenticated visitors of a login page are sent.
    #[serde(default = "default_dashboard")]
    pub dashboard: String,
    /// JSON file holding the persisted session. In-memory when unset.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

/// Home, login and registration pages, each also in the legacy `.html` form
/// the backend router still emits.
pub fn default_public_pages() -> Vec<String> {
    let bare = [
        "",
        "home",
        "login",
        "registro",
        "login-cliente",
        "login-funcionario",
        "login-gerente",
        "registro-cliente",
        "registro-funcionario",
        "registro-gerente",
    ];
    let legacy = [
        "index.html",
        "login.html",
        "registro.html",
        "login-cliente.html",
        "login-funcionario.html",
        "login-gerente.html",
        "registro-cliente.html",
        "registro-funcionario.html",
        "registro-gerente.html",
    ];

    bare.iter().chain(legacy.iter()).map(|page| page.to_string()).collect()
}

fn default_entry_point() -> String {
    "/".to_string()
}

fn default_dashboard() -> String {
    "/dashboard/".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            public_pages: default_public_pages(),
            entry_point: default_entry_point(),
            dashboard: default_dashboard(),
            store_path: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g. http://tempo:4317). Export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

pub fn get_configuration() -> anyhow::Result<Settings> {
    let configuration_directory = service_core::config::configuration_directory("clinic-client")
        .map_err(|e| anyhow::anyhow!("Failed to determine the current directory: {}", e))?;

    let settings = service_core::config::load_settings::<Settings>(&configuration_directory)?;

    Ok(settings)
}
