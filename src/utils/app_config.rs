use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use config::{Environment, Source};
use lazy_static::lazy_static;

use super::error::Result;

static DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/default_config.toml"));

/// A new type to impl `config::Source`
#[derive(Debug, Clone, serde::Deserialize)]
struct Preset(HashMap<String, config::Value>);

impl config::Source for Preset {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> std::result::Result<HashMap<String, config::Value>, config::ConfigError> {
        let mut kv = self.0.clone();
        // a preset must not bring more presets with it
        kv.remove("presets");
        Ok(kv)
    }
}

/// The main structure holding application config
pub struct AppConfig(config::Config);

impl AppConfig {
    pub(crate) fn new() -> Self {
        Self(config::Config::new())
    }

    /// Start over from the embedded defaults
    pub fn setup(&mut self) -> Result<&mut Self> {
        self.0 = config::Config::new();
        self.0
            .merge(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))?;
        Ok(self)
    }

    /// Load config from a file
    pub fn use_file(&mut self, path: &Path) -> Result<&mut Self> {
        self.0.merge(config::File::from(path))?;
        Ok(self)
    }

    /// Overlay the table `presets.<name>`
    pub fn use_preset(&mut self, name: &str) -> Result<&mut Self> {
        let preset: Preset = self.get(format!("presets.{}", name))?;
        self.0.merge(preset)?;
        Ok(self)
    }

    /// Overlay `STEALSIM_*` environment variables, `__` separating nested keys
    pub fn use_env(&mut self) -> Result<&mut Self> {
        self.0
            .merge(Environment::with_prefix("STEALSIM").separator("__"))?;
        Ok(self)
    }

    /// Get a single value and deserialize to the given type
    pub fn get<T, K>(&self, key: K) -> Result<T>
    where
        // the read lock is released before returning, so T can not borrow
        T: serde::de::DeserializeOwned,
        K: AsRef<str>,
    {
        Ok(self.0.get(key.as_ref())?)
    }
}

lazy_static! {
    /// global AppConfig instance
    static ref CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::new());
}

/// Build the global config: defaults, then file, then preset, then environment
pub fn init(file: Option<&Path>, preset: Option<&str>) -> Result<()> {
    let mut cfg = config_mut();
    cfg.setup()?;
    if let Some(file) = file {
        cfg.use_file(file)?;
    }
    if let Some(preset) = preset {
        cfg.use_preset(preset)?;
    }
    cfg.use_env()?;
    Ok(())
}

/// global AppConfig instance
pub fn config() -> RwLockReadGuard<'static, AppConfig> {
    CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

/// mutable global AppConfig instance
pub fn config_mut() -> RwLockWriteGuard<'static, AppConfig> {
    CONFIG.write().unwrap_or_else(PoisonError::into_inner)
}

pub mod prelude {
    pub use super::{config, config_mut};
}
