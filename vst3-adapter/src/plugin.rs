//! Host-facing plugin object

use crate::{
    audio::{AudioConfig, SampleBuffer},
    discovery::PluginLocator,
    error::{Error, Result},
    lifecycle::{PluginHandle, PluginState, PluginType},
    loader::LibraryLoader,
    settings::PluginSetting,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A VST3 plugin as seen by the rest of the host.
///
/// `process` always leaves the output buffer fully populated: when the plugin
/// cannot process a block, input is passed through instead.
pub struct Plugin {
    name: String,
    absolute_path: PathBuf,
    location: PathBuf,
    config: AudioConfig,
    loader: Arc<dyn LibraryLoader>,
    handle: PluginHandle,
}

impl Plugin {
    /// Resolve `name` under `root` and create an unopened plugin.
    ///
    /// Returns `None` when no bundle can be found.
    pub fn new(
        name: &str,
        root: Option<&Path>,
        config: AudioConfig,
        locator: &dyn PluginLocator,
        loader: Arc<dyn LibraryLoader>,
    ) -> Option<Self> {
        let Some(absolute_path) = locator.resolve(name, root) else {
            log::debug!("VST3 plugin '{}' not found", name);
            return None;
        };
        let location = absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Some(Self {
            name: name.to_string(),
            absolute_path,
            location,
            config,
            loader,
            handle: PluginHandle::new(),
        })
    }

    /// Load, instantiate and activate the plugin
    pub fn open(&mut self) -> Result<()> {
        if !self.absolute_path.exists() {
            return Err(Error::NotFound(self.absolute_path.display().to_string()));
        }
        self.handle
            .open(&self.absolute_path, self.loader.as_ref(), &self.config)
    }

    /// Release every plugin resource. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.handle.state() != PluginState::Closed {
            log::debug!("Closing VST3 plugin '{}'", self.name);
        }
        self.handle.close();
    }

    /// Process one block, falling back to pass-through.
    ///
    /// Returns whether the plugin produced the output.
    pub fn process(&mut self, inputs: &mut SampleBuffer, outputs: &mut SampleBuffer) -> bool {
        match self.handle.process(inputs, outputs) {
            Ok(()) => true,
            Err(e) => {
                match e {
                    Error::ProcessingFailure(_)
                    | Error::BlockSizeMismatch { .. }
                    | Error::BlockTooLarge { .. } => {
                        log::warn!("VST3 plugin '{}': {}", self.name, e)
                    }
                    _ => log::trace!("VST3 plugin '{}' passing through: {}", self.name, e),
                }
                outputs.copy_and_map_channels(inputs);
                false
            }
        }
    }

    /// Parameter changes are not supported; always returns `false`
    pub fn set_parameter(&mut self, index: u32, value: f32) -> bool {
        log::debug!(
            "Setting parameters is not supported for VST3 plugin '{}' (index {}, value {})",
            self.name,
            index,
            value
        );
        false
    }

    /// Answer a settings query
    pub fn get_setting(&self, setting: PluginSetting) -> i32 {
        self.handle.get_setting(setting)
    }

    /// Instrument/effect classification, `Unknown` before open
    pub fn plugin_type(&self) -> PluginType {
        self.handle.plugin_type()
    }

    /// Name the plugin was requested by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the resolved bundle
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Directory containing the bundle
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Audio configuration used when opening
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Log a short description of the plugin
    pub fn display_info(&self) {
        log::info!("Information for VST3 plugin '{}'", self.name);
        log::info!("  Location: {}", self.location.display());
        if let Some(class) = self.handle.class_info() {
            log::info!("  Class: {} ({})", class.name, class.category);
        }
        log::info!("  Type: {:?}", self.plugin_type());
        if self.handle.is_active() {
            log::info!(
                "  Buses: {} input, {} output",
                self.handle.input_bus_count(),
                self.handle.output_bus_count()
            );
        }
    }

    /// Whether the plugin is open and accepting process calls
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// The underlying lifecycle handle
    pub fn handle(&self) -> &PluginHandle {
        &self.handle
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("absolute_path", &self.absolute_path)
            .field("state", &self.handle.state())
            .finish()
    }
}
