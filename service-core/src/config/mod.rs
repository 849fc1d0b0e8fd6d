use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve the `config` directory of a workspace crate.
///
/// Binaries are launched either from the workspace root or from inside the
/// crate directory, so both layouts are accepted.
pub fn configuration_directory(crate_name: &str) -> std::io::Result<PathBuf> {
    let base_path = std::env::current_dir()?;

    let directory = if base_path.ends_with(crate_name) {
        base_path.join("config")
    } else {
        base_path.join(crate_name).join("config")
    };

    Ok(directory)
}

/// Load `base.yaml` from `configuration_directory`, then apply `APP_`
/// environment overrides (`APP_API__BASE_URL` overrides `api.base_url`).
pub fn load_settings<T: DeserializeOwned>(configuration_directory: &Path) -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<T>()
}
