use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Process-wide configuration, resolved once from defaults and `HERO_*` env vars.
pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: invalid HERO_* configuration"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub basic: BasicConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            database_url: "sqlite:superheroes.db".to_string(),
            loglevel: "info".to_string(),
        }
    }
}

/// Where uploaded image bytes live.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageStorageMode {
    /// Files under `upload_dir`, served statically under `uploads_prefix`.
    #[default]
    Disk,
    /// Bytes stored in the `images.image_data` column.
    Blob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub mode: ImageStorageMode,
    pub upload_dir: PathBuf,
    pub uploads_prefix: String,
    pub max_body_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: ImageStorageMode::Disk,
            upload_dir: PathBuf::from("uploads"),
            uploads_prefix: "/uploads".to_string(),
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Defaults overridden by env, e.g. `HERO_STORAGE__MODE=blob`.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("HERO_").split("__"))
            .extract()
    }
}
