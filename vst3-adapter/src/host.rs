//! Adapter entry point and host configuration

use crate::{
    audio::AudioConfig,
    discovery::{self, PluginLocator, StandardLocator},
    error::{Error, Result},
    loader::{LibraryLoader, NativeLoader},
    plugin::Plugin,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host configuration, loadable from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Audio processing configuration
    pub audio: AudioConfig,
    /// Directory searched first when resolving plugin names
    pub plugin_root: Option<PathBuf>,
    /// Extra directories searched after the root
    pub scan_paths: Vec<PathBuf>,
}

impl HostConfig {
    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the audio configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate.is_nan() || self.audio.sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.audio.sample_rate
            )));
        }
        if self.audio.block_size == 0 {
            return Err(Error::InvalidConfig(
                "block size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Creates and opens VST3 plugins with a shared configuration
pub struct Vst3Adapter {
    config: HostConfig,
    locator: Arc<dyn PluginLocator>,
    loader: Arc<dyn LibraryLoader>,
}

impl Vst3Adapter {
    /// Create an adapter with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create an adapter builder
    pub fn builder() -> Vst3AdapterBuilder {
        Vst3AdapterBuilder::default()
    }

    /// Create an unopened plugin, or `None` if `name` cannot be resolved
    pub fn new_plugin(&self, name: &str) -> Option<Plugin> {
        Plugin::new(
            name,
            self.config.plugin_root.as_deref(),
            self.config.audio,
            self.locator.as_ref(),
            Arc::clone(&self.loader),
        )
    }

    /// Create and open a plugin
    pub fn open_plugin(&self, name: &str) -> Result<Plugin> {
        let mut plugin = self
            .new_plugin(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        plugin.open()?;
        Ok(plugin)
    }

    /// Whether `name` resolves to a plugin bundle
    pub fn plugin_exists(&self, name: &str) -> bool {
        discovery::plugin_exists(
            self.locator.as_ref(),
            name,
            self.config.plugin_root.as_deref(),
        )
    }

    /// Log the search locations and list every bundle found in them
    pub fn list_available_plugins(&self) -> Vec<PathBuf> {
        discovery::list_available_plugins(
            self.locator.as_ref(),
            self.config.plugin_root.as_deref(),
        )
    }

    /// Host configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

/// Builder for [`Vst3Adapter`]
#[derive(Default)]
pub struct Vst3AdapterBuilder {
    config: HostConfig,
    locator: Option<Arc<dyn PluginLocator>>,
    loader: Option<Arc<dyn LibraryLoader>>,
}

impl Vst3AdapterBuilder {
    /// Start from an existing configuration
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sample rate
    pub fn sample_rate(mut self, rate: f64) -> Self {
        self.config.audio.sample_rate = rate;
        self
    }

    /// Set the block size
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.audio.block_size = size;
        self
    }

    /// Set the directory searched first
    pub fn plugin_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.config.plugin_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Add a directory searched after the root
    pub fn add_scan_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.scan_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Use a custom location resolver instead of [`StandardLocator`]
    pub fn locator<L: PluginLocator + 'static>(mut self, locator: L) -> Self {
        self.locator = Some(Arc::new(locator));
        self
    }

    /// Use a custom library loader instead of [`NativeLoader`]
    pub fn loader<L: LibraryLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Build the adapter
    pub fn build(self) -> Result<Vst3Adapter> {
        self.config.validate()?;

        let locator: Arc<dyn PluginLocator> = match self.locator {
            Some(locator) => locator,
            None => Arc::new(StandardLocator::with_paths(self.config.scan_paths.clone())),
        };
        let loader: Arc<dyn LibraryLoader> = match self.loader {
            Some(loader) => loader,
            None => Arc::new(NativeLoader),
        };

        Ok(Vst3Adapter {
            config: self.config,
            locator,
            loader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_block_size() {
        let result = Vst3Adapter::builder().block_size(0).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        assert!(Vst3Adapter::builder().sample_rate(0.0).build().is_err());
        assert!(Vst3Adapter::builder().sample_rate(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_applies_settings() {
        let adapter = Vst3Adapter::builder()
            .sample_rate(48000.0)
            .block_size(256)
            .plugin_root("/plugins")
            .add_scan_path("/opt/vst3")
            .build()
            .unwrap();

        let config = adapter.config();
        assert_eq!(config.audio.sample_rate, 48000.0);
        assert_eq!(config.audio.block_size, 256);
        assert_eq!(config.plugin_root.as_deref(), Some(Path::new("/plugins")));
        assert_eq!(config.scan_paths, vec![PathBuf::from("/opt/vst3")]);
    }

    #[test]
    fn missing_json_fields_take_defaults() {
        let config = HostConfig::from_json_str(r#"{ "audio": { "block_size": 128 } }"#).unwrap();
        assert_eq!(config.audio.sample_rate, 44100.0);
        assert_eq!(config.audio.block_size, 128);
        assert!(config.plugin_root.is_none());
        assert!(config.scan_paths.is_empty());
    }
}
