use crate::error::AppError;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable selecting the optional overlay file
/// (`config/{APP_ENVIRONMENT}.yaml`).
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Locate `config/` for a crate whether the process was started from the
/// workspace root or from inside the crate directory.
pub fn configuration_directory(base_path: &Path, crate_dir: &str) -> PathBuf {
    if base_path.ends_with(crate_dir) {
        base_path.join("config")
    } else {
        base_path.join(crate_dir).join("config")
    }
}

/// Load layered settings: `base.yaml` (required), an optional environment
/// overlay, then `APP_`-prefixed variables with `__` as the nesting separator.
pub fn load<T: DeserializeOwned>(crate_dir: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let base_path = std::env::current_dir()?;
    let directory = configuration_directory(&base_path, crate_dir);
    let overlay = std::env::var(ENVIRONMENT_VAR).ok();

    load_from(&directory, overlay.as_deref())
}

pub fn load_from<T: DeserializeOwned>(
    directory: &Path,
    overlay: Option<&str>,
) -> Result<T, AppError> {
    let mut builder =
        Config::builder().add_source(File::from(directory.join("base.yaml")).required(true));

    if let Some(name) = overlay {
        builder = builder
            .add_source(File::from(directory.join(format!("{}.yaml", name))).required(false));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}
